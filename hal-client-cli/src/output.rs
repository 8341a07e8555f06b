use crate::error::CliResult;
use comfy_table::{ContentArrangement, Table};
use hal_client::{Link, LinkKind};
use serde_json::Value as JsonValue;

/// Strings print bare; everything else as pretty JSON.
pub fn format_json(value: &JsonValue) -> CliResult<String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    }
}

pub fn format_links_table(links: &[Link]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["rel", "href", "templated", "embedded"]);

    for link in links {
        let href = match link.kind() {
            LinkKind::Malformed { path, message, .. } => format!("(malformed at {path}: {message})"),
            _ => link.href_str().unwrap_or_default(),
        };
        table.add_row(vec![
            link.literal_rel().to_string(),
            href,
            link.is_templated().to_string(),
            link.is_embedded().to_string(),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_client::{interpret, HalClient, Location, MemoryTransport};
    use serde_json::json;

    #[test]
    fn test_format_json_strings_are_bare() {
        assert_eq!(format_json(&json!("Ada")).unwrap(), "Ada");
        assert_eq!(format_json(&json!(3)).unwrap(), "3");
    }

    #[test]
    fn test_links_table_lists_every_link() {
        let client = HalClient::new(MemoryTransport::new());
        let repr = interpret(
            &json!({
                "_links": {
                    "self": {"href": "http://example.com/"},
                    "search": {"href": "http://example.com/{?q}", "templated": true},
                    "bad": 42
                },
                "_embedded": {"child": {"a": 1}}
            }),
            &Location::anonymous(),
            &client,
        )
        .unwrap();

        let table = format_links_table(&repr.links().unwrap());
        assert!(table.contains("http://example.com/{?q}"));
        assert!(table.contains("search"));
        assert!(table.contains("child"));
        assert!(table.contains("malformed"));
    }
}
