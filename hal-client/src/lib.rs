//! # hal-client
//!
//! Navigation engine for HAL+JSON hypermedia APIs.
//!
//! Documents are interpreted into [`Representation`]s: a property map plus
//! an index of [`Link`]s keyed by both their literal and CURIE-expanded
//! relations. Following a relation yields a [`RepresentationSet`] whose
//! members are fetched lazily, exactly once, through the [`Transport`] held
//! by the [`HalClient`].
//!
//! ```ignore
//! use hal_client::{HalClient, TemplateVars};
//!
//! let client = HalClient::new(transport);
//! let blog = client.get("http://blog.example.com/")?;
//! for author in blog.related("authors")?.iter() {
//!     println!("{}", author.property("name")?);
//! }
//! let hits = blog.related_with("search", &TemplateVars::new().with("q", "rust"))?;
//! ```
//!
//! ## Modules
//!
//! - [`interpreter`]: raw JSON to [`Representation`]
//! - [`representation`], [`representation_set`]: navigation and writes
//! - [`editor`]: immutable editing with dirty tracking
//! - [`collection`], [`navigator`]: paged collections and multi-step walks
//! - [`form`]: HAL-FORMS submission
//! - [`transport`]: the fetch/write contract and an in-memory implementation

pub mod client;
pub mod collection;
pub mod curie;
pub mod editor;
pub mod error;
pub mod form;
pub mod future;
pub mod interpreter;
pub mod link;
pub mod location;
pub mod navigator;
pub mod representation;
pub mod representation_set;
pub mod transport;
pub mod uri_template;

pub use client::HalClient;
pub use collection::Collection;
pub use curie::CurieResolver;
pub use editor::{RejectOptions, RepresentationEditor};
pub use error::{HalError, Result, TransportError};
pub use form::{Field, FieldType, Form, FormMethod};
pub use future::{FetchState, RepresentationFuture};
pub use interpreter::{interpret, interpret_with_options, InterpretOptions};
pub use link::{Link, LinkBuilder, LinkKind, RawHref};
pub use location::Location;
pub use navigator::Navigator;
pub use representation::{Item, Representation};
pub use representation_set::RepresentationSet;
pub use transport::{Headers, MemoryTransport, ParsedDocument, RecordedWrite, Transport, Verb};
pub use uri_template::{TemplateVars, UriTemplate};
