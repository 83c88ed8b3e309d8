//! Output schemas for structured roles, and validation of raw model text
//! against them.
//!
//! Validation is deliberately shallow: every declared field must be
//! present with the declared kind, list items must be objects whose
//! declared fields are strings, and undeclared fields are kept as-is.

use aura_core::StructuredResult;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    /// A list of objects with the given fields.
    List(Vec<FieldSpec>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Shown to the model as the example value.
    pub hint: String,
}

impl FieldSpec {
    pub fn text(name: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
            hint: hint.into(),
        }
    }

    pub fn list(name: impl Into<String>, items: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::List(items),
            hint: String::new(),
        }
    }

    fn example(&self) -> Value {
        match &self.kind {
            FieldKind::Text => Value::String(self.hint.clone()),
            FieldKind::List(items) => Value::Array(vec![example_object(items)]),
        }
    }
}

fn example_object(fields: &[FieldSpec]) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|f| (f.name.clone(), f.example()))
            .collect(),
    )
}

/// A named JSON contract a structured role must honor.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Example object with every field filled by its hint.
    pub fn example(&self) -> Value {
        example_object(&self.fields)
    }

    /// Format instructions appended to the role's system prompt.
    pub fn prompt_instructions(&self) -> String {
        let example = serde_json::to_string_pretty(&self.example()).unwrap_or_default();
        format!(
            "You MUST return the output as strict JSON with exactly this structure, \
             with no text before or after it:\n{example}"
        )
    }

    /// Check already-parsed JSON against the schema.
    pub fn check(&self, value: Value) -> Result<Map<String, Value>, String> {
        let Value::Object(fields) = value else {
            return Err(format!("expected a JSON object, got {}", kind_of(&value)));
        };
        check_fields(&self.fields, &fields, "")?;
        Ok(fields)
    }

    /// Parse and check, stripping code fences only when the reply is not
    /// already JSON. Never fails: a violation becomes
    /// [`StructuredResult::Malformed`] carrying the raw text.
    pub fn validate(&self, raw: &str) -> StructuredResult {
        let parsed = serde_json::from_str::<Value>(raw.trim())
            .or_else(|_| serde_json::from_str::<Value>(strip_code_fences(raw)))
            .map_err(|e| format!("invalid JSON: {e}"))
            .and_then(|v| self.check(v));

        match parsed {
            Ok(fields) => StructuredResult::Record {
                schema: self.name.clone(),
                fields,
            },
            Err(error) => StructuredResult::Malformed {
                raw: raw.to_string(),
                error,
            },
        }
    }
}

fn check_fields(specs: &[FieldSpec], obj: &Map<String, Value>, path: &str) -> Result<(), String> {
    for spec in specs {
        let at = format!("{path}{}", spec.name);
        let value = obj
            .get(&spec.name)
            .ok_or_else(|| format!("missing field '{at}'"))?;

        match &spec.kind {
            FieldKind::Text => {
                if !value.is_string() {
                    return Err(format!("field '{at}' must be a string, got {}", kind_of(value)));
                }
            }
            FieldKind::List(items) => {
                let list = value
                    .as_array()
                    .ok_or_else(|| format!("field '{at}' must be a list, got {}", kind_of(value)))?;
                for (i, item) in list.iter().enumerate() {
                    let item_path = format!("{at}[{i}]");
                    let obj = item.as_object().ok_or_else(|| {
                        format!("'{item_path}' must be an object, got {}", kind_of(item))
                    })?;
                    check_fields(items, obj, &format!("{item_path}."))?;
                }
            }
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Remove Markdown code-fence delimiters around a model reply.
///
/// Handles ```` ```json ... ``` ````, bare ```` ``` ```` fences, single-line
/// fences and a missing closing fence. Text without fences is only trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(start) = text.find("```") else {
        return text;
    };

    let after = &text[start + 3..];
    // Skip the language tag (`json`, `JSON`, ...), if any.
    let tag_len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(after.len());
    let body = &after[tag_len..];

    // The closing fence is the last one, so fences inside string values survive.
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
