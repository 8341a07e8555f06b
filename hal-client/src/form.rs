//! HAL-FORMS
//!
//! A [`Form`] describes a request the server invites the client to make:
//! a target URI template, a method, a content type and a list of fields.
//! Only `hidden` and `string` fields are understood; every other field
//! type is treated as `string`.

use crate::client::HalClient;
use crate::error::{HalError, Result};
use crate::representation::Representation;
use crate::transport::{Headers, Verb};
use crate::uri_template::{TemplateVars, UriTemplate};
use serde_json::{Map, Value as JsonValue};

/// HTTP method of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Write(Verb),
}

impl FormMethod {
    fn parse(method: &str) -> Result<Self> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Ok(FormMethod::Get),
            "post" => Ok(FormMethod::Write(Verb::Post)),
            "put" => Ok(FormMethod::Write(Verb::Put)),
            "patch" => Ok(FormMethod::Write(Verb::Patch)),
            "delete" => Ok(FormMethod::Write(Verb::Delete)),
            other => Err(HalError::Argument(format!("unsupported form method '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Hidden,
    String,
}

/// One input of a form
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    field_type: FieldType,
    value: Option<JsonValue>,
    path: Option<String>,
}

impl Field {
    pub fn from_json(raw: &JsonValue) -> Result<Self> {
        let name = raw
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| HalError::Argument("field doesn't have a name".to_string()))?;
        let field_type = match raw.get("type").and_then(JsonValue::as_str) {
            Some(t) if t.eq_ignore_ascii_case("hidden") => FieldType::Hidden,
            _ => FieldType::String,
        };
        Ok(Self {
            name: name.to_string(),
            field_type,
            value: raw.get("value").filter(|v| !v.is_null()).cloned(),
            path: raw.get("path").and_then(JsonValue::as_str).map(str::to_string),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// JSON pointer at which the answer is placed in JSON bodies.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The value this field submits given `answers`.
    ///
    /// Hidden fields always submit their own value. Other fields submit the
    /// answer named after them, falling back to their default value, as a
    /// string; `Null` when neither exists.
    pub fn extract_answer(&self, answers: &TemplateVars) -> JsonValue {
        if self.field_type == FieldType::Hidden {
            return self.value.clone().unwrap_or(JsonValue::Null);
        }
        match answers.get(&self.name).or(self.value.as_ref()) {
            None | Some(JsonValue::Null) => JsonValue::Null,
            Some(JsonValue::String(s)) => JsonValue::String(s.clone()),
            Some(other) => JsonValue::String(other.to_string()),
        }
    }
}

/// A fillable, submittable HAL form
#[derive(Debug, Clone)]
pub struct Form {
    target: UriTemplate,
    method: FormMethod,
    content_type: Option<String>,
    fields: Vec<Field>,
    client: HalClient,
}

impl Form {
    pub fn from_json(raw: &JsonValue, client: HalClient) -> Result<Self> {
        let target = raw
            .pointer("/_links/target/href")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| HalError::Argument("form has no target href".to_string()))?;
        let method = raw
            .get("method")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| HalError::Argument("form doesn't specify a method".to_string()))?;
        let method = FormMethod::parse(method)?;

        let content_type = match method {
            FormMethod::Get => None,
            FormMethod::Write(_) => Some(
                raw.get("contentType")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| {
                        HalError::Argument("form doesn't specify a content type".to_string())
                    })?
                    .to_string(),
            ),
        };

        let fields = raw
            .get("fields")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| HalError::Argument("form doesn't have a fields member".to_string()))?
            .iter()
            .map(Field::from_json)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            target: UriTemplate::new(target),
            method,
            content_type,
            fields,
            client,
        })
    }

    pub fn method(&self) -> FormMethod {
        self.method
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The target URL with `answers` substituted into the template.
    pub fn target_url(&self, answers: &TemplateVars) -> String {
        self.target.expand(answers)
    }

    /// Submit the form and interpret the response.
    pub fn submit(&self, answers: &TemplateVars) -> Result<Representation> {
        let url = self.target_url(answers);
        match self.method {
            FormMethod::Get => self.client.get(&url),
            FormMethod::Write(verb) => {
                let content_type = self.content_type.clone().unwrap_or_default();
                let body = self.body(&content_type, answers)?;
                let mut headers = Headers::new();
                headers.insert("Content-Type".to_string(), content_type);
                self.client.write(verb, &url, Some(&body), &headers)
            }
        }
    }

    fn body(&self, content_type: &str, answers: &TemplateVars) -> Result<JsonValue> {
        if !content_type.to_ascii_lowercase().ends_with("json") {
            return Err(HalError::NotImplemented(format!(
                "{content_type} is not a supported content type"
            )));
        }
        let mut body = JsonValue::Object(Map::new());
        for field in &self.fields {
            // Fields without a path only feed the target template
            if let Some(path) = field.path() {
                pointer_add(&mut body, path, field.extract_answer(answers))?;
            }
        }
        Ok(body)
    }
}

/// JSON Patch `add` of `value` at `path`, creating missing parent objects.
fn pointer_add(doc: &mut JsonValue, path: &str, value: JsonValue) -> Result<()> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(HalError::Argument(format!("invalid JSON pointer '{path}'")));
    };
    let tokens: Vec<String> = rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect();
    let (last, parents) = match tokens.split_last() {
        Some(split) => split,
        None => return Err(HalError::Argument(format!("invalid JSON pointer '{path}'"))),
    };

    let mut target = doc;
    for token in parents {
        target = match target {
            JsonValue::Object(map) => map
                .entry(token.clone())
                .or_insert_with(|| JsonValue::Object(Map::new())),
            JsonValue::Array(items) => token
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get_mut(idx))
                .ok_or_else(|| HalError::Argument(format!("no element '{token}' in '{path}'")))?,
            _ => {
                return Err(HalError::Argument(format!(
                    "cannot descend into scalar at '{token}' in '{path}'"
                )))
            }
        };
    }

    match target {
        JsonValue::Object(map) => {
            map.insert(last.clone(), value);
        }
        JsonValue::Array(items) if last == "-" => items.push(value),
        JsonValue::Array(items) => match last.parse::<usize>() {
            Ok(idx) if idx <= items.len() => items.insert(idx, value),
            _ => return Err(HalError::Argument(format!("bad array index in '{path}'"))),
        },
        _ => {
            return Err(HalError::Argument(format!(
                "cannot add to scalar at '{path}'"
            )))
        }
    }
    Ok(())
}
