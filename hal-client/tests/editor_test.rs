//! Behaviour of RepresentationEditor against a representative document

use hal_client::{
    interpret, HalClient, HalError, Location, MemoryTransport, RejectOptions, Representation,
    RepresentationEditor,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

fn raw_hal() -> JsonValue {
    json!({
        "age": 10,
        "_links": {
            "self": {"href": "http://example.com/a_repr"},
            "up": [{"href": "http://example.com/c1"}, {"href": "http://example.com/c2"}],
            "about": {"href": "http://example.com/another"},
            "broken-link": {"href": "http://example.com/missing"}
        },
        "_embedded": {
            "replies": [{"value": "+1"}, {"value": "-1"}]
        }
    })
}

fn a_repr() -> Representation {
    let transport = Arc::new(
        MemoryTransport::new().with_resource("http://example.com/another", json!({"n": 1})),
    );
    interpret(
        &raw_hal(),
        &Location::anonymous(),
        &HalClient::from_arc(transport),
    )
    .unwrap()
}

fn editor() -> RepresentationEditor {
    RepresentationEditor::new(a_repr())
}

/// Entries of `section.rel`, normalizing single entries to a list.
fn entries(editor: &RepresentationEditor, section: &str, rel: &str) -> Vec<JsonValue> {
    let raw = editor.raw().unwrap();
    match raw.get(section).and_then(|s| s.get(rel)) {
        None => Vec::new(),
        Some(JsonValue::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
    }
}

fn link_hrefs(editor: &RepresentationEditor, rel: &str) -> Vec<String> {
    entries(editor, "_links", rel)
        .iter()
        .filter_map(|l| l["href"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_unedited_raw_matches_original() {
    let editor = editor();
    assert_eq!(editor.raw().unwrap(), raw_hal());
    let reparsed: JsonValue = serde_json::from_str(&editor.to_hal().unwrap()).unwrap();
    assert_eq!(reparsed, raw_hal());
    assert!(!editor.is_dirty().unwrap());
}

#[test]
fn test_reject_links() {
    let altered = editor().reject_links("up").unwrap();
    assert!(link_hrefs(&altered, "up").is_empty());
    assert!(altered.is_dirty().unwrap());
}

#[test]
fn test_reject_links_matching_predicate() {
    let altered = editor()
        .reject_links_where("up", RejectOptions::default(), |repr| {
            Ok(repr.href().map_or(false, |href| href.ends_with("/c1")))
        })
        .unwrap();
    assert_eq!(link_hrefs(&altered, "up"), vec!["http://example.com/c2"]);
}

#[test]
fn test_reject_absent_rel_is_noop() {
    let altered = editor().reject_links("absent-rel").unwrap();
    assert_eq!(altered.raw().unwrap(), raw_hal());
    assert!(!altered.is_dirty().unwrap());
}

#[test]
fn test_predicate_always_false_stays_clean() {
    let altered = editor()
        .reject_links_where("about", RejectOptions::default(), |_| Ok(false))
        .unwrap();
    assert!(!altered.is_dirty().unwrap());
}

#[test]
fn test_broken_link_in_predicate() {
    let err = editor()
        .reject_links_where("broken-link", RejectOptions::default(), |repr| {
            repr.property("t").map(|_| true)
        })
        .unwrap_err();
    assert!(matches!(
        err,
        HalError::Transport(ref transport) if transport.status() == Some(404)
    ));

    let altered = editor()
        .reject_related_where("broken-link", RejectOptions::ignoring_broken_links(), |repr| {
            repr.property("t").map(|_| true)
        })
        .unwrap();
    assert!(link_hrefs(&altered, "broken-link").is_empty());
}

#[test]
fn test_reject_embedded() {
    let altered = editor().reject_embedded("replies").unwrap();
    assert!(entries(&altered, "_embedded", "replies").is_empty());

    let filtered = editor()
        .reject_embedded_where("replies", RejectOptions::default(), |repr| {
            Ok(repr.property("value")? == json!("+1"))
        })
        .unwrap();
    assert_eq!(
        entries(&filtered, "_embedded", "replies"),
        vec![json!({"value": "-1"})]
    );
    assert!(filtered.is_dirty().unwrap());
}

#[test]
fn test_reject_related_covers_both_sections() {
    let altered = editor().reject_related("replies").unwrap();
    assert!(entries(&altered, "_embedded", "replies").is_empty());
    assert!(altered.is_dirty().unwrap());

    let altered = editor()
        .reject_related_where("up", RejectOptions::default(), |repr| {
            Ok(repr.href().map_or(false, |href| href.ends_with("/c1")))
        })
        .unwrap();
    assert_eq!(link_hrefs(&altered, "up"), vec!["http://example.com/c2"]);
}

#[test]
fn test_set_property() {
    let editor = editor();
    let renamed = editor.set_property("name", json!("new-name")).unwrap();
    assert_eq!(renamed.raw().unwrap()["name"], json!("new-name"));

    let older = editor.set_property("age", json!(20)).unwrap();
    assert_eq!(older.raw().unwrap()["age"], json!(20));
    assert!(older.is_dirty().unwrap());

    let same = editor.set_property("age", json!(10)).unwrap();
    assert!(!same.is_dirty().unwrap());

    // the original is untouched
    assert_eq!(editor.original().property("age").unwrap(), json!(10));
    assert!(!editor.original().has_property("name").unwrap());
}

#[test]
fn test_add_link() {
    let added = editor()
        .add_link("related", "http://example.com/third", false)
        .unwrap();
    assert_eq!(
        entries(&added, "_links", "related"),
        vec![json!({"href": "http://example.com/third"})]
    );

    let extra_about = editor()
        .add_link("about", "http://example.com/third", false)
        .unwrap();
    assert_eq!(
        link_hrefs(&extra_about, "about"),
        vec!["http://example.com/another", "http://example.com/third"]
    );

    let templated = editor()
        .add_link("related", "http://example.com/third{?wat}", true)
        .unwrap();
    assert_eq!(
        entries(&templated, "_links", "related"),
        vec![json!({"href": "http://example.com/third{?wat}", "templated": true})]
    );
}

#[test]
fn test_add_link_requires_target() {
    assert!(matches!(
        editor().add_link("nowhere", "", false),
        Err(HalError::Argument(_))
    ));
}

#[test]
fn test_dirty_tracking_of_links() {
    assert!(editor()
        .add_link("up", "http://example.com/new", false)
        .unwrap()
        .is_dirty()
        .unwrap());

    let readded = editor()
        .reject_links("about")
        .unwrap()
        .add_link("about", "http://example.com/another", false)
        .unwrap();
    assert!(!readded.is_dirty().unwrap());
}

#[test]
fn test_anonymous_embeds_compare_by_content() {
    // Both replies are anonymous; dropping one and keeping the other must be
    // detected even though anonymous links never compare equal.
    let altered = editor()
        .reject_embedded_where("replies", RejectOptions::default(), |repr| {
            Ok(repr.property("value")? == json!("-1"))
        })
        .unwrap();
    assert!(altered.is_dirty().unwrap());

    let untouched = editor()
        .reject_embedded_where("replies", RejectOptions::default(), |_| Ok(false))
        .unwrap();
    assert!(!untouched.is_dirty().unwrap());
}
