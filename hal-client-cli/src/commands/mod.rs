pub mod get;
pub mod items;
pub mod links;
