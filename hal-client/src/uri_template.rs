//! RFC 6570 URI Templates (expansion up to level 4)

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Everything except RFC 3986 unreserved characters.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Everything except unreserved and reserved characters.
const UNRESERVED_OR_RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// Variables available to a template expansion.
///
/// Strings, numbers and booleans are scalar values, arrays are lists and
/// objects are associative arrays. `null` (or absence) leaves a variable
/// undefined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateVars(Map<String, JsonValue>);

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, JsonValue>> for TemplateVars {
    fn from(map: Map<String, JsonValue>) -> Self {
        TemplateVars(map)
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for TemplateVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TemplateVars(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A URI Template, kept in its unexpanded form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UriTemplate {
    pattern: String,
}

impl UriTemplate {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Names of all variables referenced by the template, in order.
    pub fn variable_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for part in parse(&self.pattern) {
            if let Part::Expression(_, specs) = part {
                for spec in specs {
                    if !names.contains(&spec.name) {
                        names.push(spec.name);
                    }
                }
            }
        }
        names
    }

    /// Expand the template.
    pub fn expand(&self, vars: &TemplateVars) -> String {
        let mut out = String::with_capacity(self.pattern.len());
        for part in parse(&self.pattern) {
            match part {
                Part::Literal(text) => out.push_str(&encode(text, true)),
                Part::Verbatim(text) => out.push_str(text),
                Part::Expression(op, specs) => expand_expression(&mut out, op, &specs, vars),
            }
        }
        out
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    Reserved,
    Fragment,
    Label,
    Path,
    PathParam,
    Query,
    QueryContinuation,
}

impl Operator {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '+' => Operator::Reserved,
            '#' => Operator::Fragment,
            '.' => Operator::Label,
            '/' => Operator::Path,
            ';' => Operator::PathParam,
            '?' => Operator::Query,
            '&' => Operator::QueryContinuation,
            _ => return None,
        })
    }

    fn first(self) -> &'static str {
        match self {
            Operator::Simple | Operator::Reserved => "",
            Operator::Fragment => "#",
            Operator::Label => ".",
            Operator::Path => "/",
            Operator::PathParam => ";",
            Operator::Query => "?",
            Operator::QueryContinuation => "&",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Operator::Simple | Operator::Reserved | Operator::Fragment => ",",
            Operator::Label => ".",
            Operator::Path => "/",
            Operator::PathParam => ";",
            Operator::Query | Operator::QueryContinuation => "&",
        }
    }

    fn named(self) -> bool {
        matches!(
            self,
            Operator::PathParam | Operator::Query | Operator::QueryContinuation
        )
    }

    fn if_empty(self) -> &'static str {
        match self {
            Operator::Query | Operator::QueryContinuation => "=",
            _ => "",
        }
    }

    fn allow_reserved(self) -> bool {
        matches!(self, Operator::Reserved | Operator::Fragment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modifier {
    None,
    Prefix(usize),
    Explode,
}

#[derive(Debug, Clone)]
struct VarSpec {
    name: String,
    modifier: Modifier,
}

#[derive(Debug)]
enum Part<'a> {
    Literal(&'a str),
    /// Text from an unterminated `{` onwards, copied unencoded
    Verbatim(&'a str),
    Expression(Operator, Vec<VarSpec>),
}

fn parse(pattern: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            parts.push(Part::Literal(&rest[..open]));
        }
        let Some(len) = rest[open..].find('}') else {
            parts.push(Part::Verbatim(&rest[open..]));
            return parts;
        };
        let body = &rest[open + 1..open + len];
        parts.push(parse_expression(body));
        rest = &rest[open + len + 1..];
    }
    if !rest.is_empty() {
        parts.push(Part::Literal(rest));
    }
    parts
}

fn parse_expression(body: &str) -> Part<'_> {
    let (op, list) = match body.chars().next().and_then(Operator::from_char) {
        Some(op) => (op, &body[1..]),
        None => (Operator::Simple, body),
    };

    let specs = list
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|spec| {
            if let Some(name) = spec.strip_suffix('*') {
                VarSpec {
                    name: name.to_string(),
                    modifier: Modifier::Explode,
                }
            } else if let Some((name, len)) = spec.split_once(':') {
                VarSpec {
                    name: name.to_string(),
                    modifier: len
                        .parse()
                        .map(Modifier::Prefix)
                        .unwrap_or(Modifier::None),
                }
            } else {
                VarSpec {
                    name: spec.to_string(),
                    modifier: Modifier::None,
                }
            }
        })
        .collect();

    Part::Expression(op, specs)
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

enum Value {
    Scalar(String),
    List(Vec<String>),
    Assoc(Vec<(String, String)>),
}

fn scalar(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Convert a variable to a template value; `None` means undefined.
fn lookup(vars: &TemplateVars, name: &str) -> Option<Value> {
    match vars.get(name)? {
        JsonValue::Null => None,
        JsonValue::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(scalar).collect();
            (!items.is_empty()).then_some(Value::List(items))
        }
        JsonValue::Object(map) => {
            let pairs: Vec<(String, String)> = map
                .iter()
                .filter_map(|(k, v)| scalar(v).map(|v| (k.clone(), v)))
                .collect();
            (!pairs.is_empty()).then_some(Value::Assoc(pairs))
        }
        other => scalar(other).map(Value::Scalar),
    }
}

fn encode(value: &str, allow_reserved: bool) -> String {
    if !allow_reserved {
        return utf8_percent_encode(value, UNRESERVED).to_string();
    }

    // Reserved expansion keeps existing pct-encoded triplets intact.
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(value.len());
    let mut idx = 0;
    while idx < value.len() {
        if bytes[idx] == b'%'
            && idx + 2 < value.len()
            && bytes[idx + 1].is_ascii_hexdigit()
            && bytes[idx + 2].is_ascii_hexdigit()
        {
            out.push_str(&value[idx..idx + 3]);
            idx += 3;
            continue;
        }
        let Some(ch) = value[idx..].chars().next() else {
            break;
        };
        let mut buf = [0u8; 4];
        out.extend(utf8_percent_encode(ch.encode_utf8(&mut buf), UNRESERVED_OR_RESERVED));
        idx += ch.len_utf8();
    }
    out
}

fn expand_expression(out: &mut String, op: Operator, specs: &[VarSpec], vars: &TemplateVars) {
    let mut first = true;
    let allow_reserved = op.allow_reserved();

    for spec in specs {
        let Some(value) = lookup(vars, &spec.name) else {
            continue;
        };
        out.push_str(if first { op.first() } else { op.separator() });
        first = false;

        match value {
            Value::Scalar(s) => {
                let s = match spec.modifier {
                    Modifier::Prefix(len) => s.chars().take(len).collect(),
                    _ => s,
                };
                if op.named() {
                    out.push_str(&encode(&spec.name, false));
                    if s.is_empty() {
                        out.push_str(op.if_empty());
                        continue;
                    }
                    out.push('=');
                }
                out.push_str(&encode(&s, allow_reserved));
            }
            Value::List(items) if spec.modifier == Modifier::Explode => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|item| {
                        if op.named() {
                            named_pair(&spec.name, item, op, allow_reserved)
                        } else {
                            encode(item, allow_reserved)
                        }
                    })
                    .collect();
                out.push_str(&rendered.join(op.separator()));
            }
            Value::List(items) => {
                if op.named() {
                    out.push_str(&encode(&spec.name, false));
                    out.push('=');
                }
                let rendered: Vec<String> =
                    items.iter().map(|i| encode(i, allow_reserved)).collect();
                out.push_str(&rendered.join(","));
            }
            Value::Assoc(pairs) if spec.modifier == Modifier::Explode => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| {
                        if op.named() {
                            named_pair(k, v, op, allow_reserved)
                        } else {
                            format!("{}={}", encode(k, allow_reserved), encode(v, allow_reserved))
                        }
                    })
                    .collect();
                out.push_str(&rendered.join(op.separator()));
            }
            Value::Assoc(pairs) => {
                if op.named() {
                    out.push_str(&encode(&spec.name, false));
                    out.push('=');
                }
                let rendered: Vec<String> = pairs
                    .iter()
                    .flat_map(|(k, v)| [encode(k, allow_reserved), encode(v, allow_reserved)])
                    .collect();
                out.push_str(&rendered.join(","));
            }
        }
    }
}

fn named_pair(name: &str, value: &str, op: Operator, allow_reserved: bool) -> String {
    if value.is_empty() {
        format!("{}{}", encode(name, false), op.if_empty())
    } else {
        format!("{}={}", encode(name, false), encode(value, allow_reserved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rfc_vars() -> TemplateVars {
        TemplateVars::new()
            .with("var", "value")
            .with("hello", "Hello World!")
            .with("path", "/foo/bar")
            .with("empty", "")
            .with("x", "1024")
            .with("y", "768")
            .with("list", json!(["red", "green", "blue"]))
            .with("keys", json!({"semi": ";", "dot": ".", "comma": ","}))
    }

    fn expand(pattern: &str) -> String {
        UriTemplate::new(pattern).expand(&rfc_vars())
    }

    #[test]
    fn test_simple_and_reserved() {
        assert_eq!(expand("{var}"), "value");
        assert_eq!(expand("{hello}"), "Hello%20World%21");
        assert_eq!(expand("{+hello}"), "Hello%20World!");
        assert_eq!(expand("{+path}/here"), "/foo/bar/here");
        assert_eq!(expand("{#path,x}/here"), "#/foo/bar,1024/here");
        assert_eq!(expand("{var:3}"), "val");
    }

    #[test]
    fn test_query_forms() {
        assert_eq!(expand("{?x,y}"), "?x=1024&y=768");
        assert_eq!(expand("{?x,y,empty}"), "?x=1024&y=768&empty=");
        assert_eq!(expand("?fixed=yes{&x}"), "?fixed=yes&x=1024");
        assert_eq!(expand("{?undef}"), "");
        assert_eq!(expand("{?list}"), "?list=red,green,blue");
        assert_eq!(expand("{?list*}"), "?list=red&list=green&list=blue");
        assert_eq!(expand("{?keys*}"), "?semi=%3B&dot=.&comma=%2C");
    }

    #[test]
    fn test_path_label_and_params() {
        assert_eq!(expand("{/var,x}/here"), "/value/1024/here");
        assert_eq!(expand("{/list*}"), "/red/green/blue");
        assert_eq!(expand("X{.var}"), "X.value");
        assert_eq!(expand("{;x,y,empty}"), ";x=1024;y=768;empty");
        assert_eq!(expand("{;list*}"), ";list=red;list=green;list=blue");
        assert_eq!(expand("{keys}"), "semi,%3B,dot,.,comma,%2C");
        assert_eq!(expand("{keys*}"), "semi=%3B,dot=.,comma=%2C");
    }

    #[test]
    fn test_link_style_template() {
        let tmpl = UriTemplate::new("http://example.com/{?name}");
        let vars = TemplateVars::new().with("name", "bob");
        assert_eq!(tmpl.expand(&vars), "http://example.com/?name=bob");
        assert_eq!(tmpl.expand(&TemplateVars::new()), "http://example.com/");
    }

    #[test]
    fn test_variable_names() {
        let tmpl = UriTemplate::new("http://example.com/{id}/x{?q,page}{&q}");
        assert_eq!(tmpl.variable_names(), vec!["id", "q", "page"]);
    }

    #[test]
    fn test_unterminated_expression_is_literal() {
        let tmpl = UriTemplate::new("http://example.com/{oops");
        assert_eq!(tmpl.expand(&rfc_vars()), "http://example.com/{oops");
        assert_eq!(
            UriTemplate::new("/a b/{x}/{oops").expand(&TemplateVars::new().with("x", "1")),
            "/a%20b/1/{oops"
        );
    }
}
