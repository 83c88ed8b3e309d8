//! Per-request value objects of the routing protocol.
//!
//! A [`RouterRequest`] comes in, exactly one [`RouterDecision`] goes out.
//! Structured agents produce a [`StructuredResult`]. None of these are
//! persisted.

use serde::{Deserialize, Serialize};

/// Marker prefixed to malformed agent output when it is flattened to text.
pub const MALFORMED_MARKER: &str = "[warning: output did not match the expected format]";

/// An incoming chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterRequest {
    pub message: String,

    #[serde(default = "default_user")]
    pub user_id: String,
}

pub fn default_user() -> String {
    "default".into()
}

impl RouterRequest {
    pub fn new(message: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_id: user_id.into(),
        }
    }
}

/// The outcome of one classification.
///
/// Serializes to the `/api/chat` wire shape: `{"response": ...}` for a
/// direct answer, the raw navigation object for a directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RouterDecision {
    DirectAnswer {
        #[serde(rename = "response")]
        text: String,
    },
    ToolInvocation {
        tool_name: String,
        derived_prompt: String,
    },
    NavigationDirective(NavigationDirective),
}

impl RouterDecision {
    pub fn answer(text: impl Into<String>) -> Self {
        Self::DirectAnswer { text: text.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DirectAnswer { .. } => "direct_answer",
            Self::ToolInvocation { .. } => "tool_invocation",
            Self::NavigationDirective(_) => "navigation",
        }
    }
}

/// Tells the caller to send the user to another part of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "NavigationWire", try_from = "NavigationWire")]
pub struct NavigationDirective {
    pub target_path: String,
    pub explanation: String,
}

/// `{"type":"action","action":"navigate","path":...,"message":...}`
#[derive(Serialize, Deserialize)]
struct NavigationWire {
    #[serde(rename = "type")]
    kind: String,
    action: String,
    path: String,
    message: String,
}

impl From<NavigationDirective> for NavigationWire {
    fn from(d: NavigationDirective) -> Self {
        Self {
            kind: "action".into(),
            action: "navigate".into(),
            path: d.target_path,
            message: d.explanation,
        }
    }
}

impl TryFrom<NavigationWire> for NavigationDirective {
    type Error = String;

    fn try_from(w: NavigationWire) -> Result<Self, Self::Error> {
        if w.kind != "action" || w.action != "navigate" {
            return Err(format!(
                "not a navigation action (type={}, action={})",
                w.kind, w.action
            ));
        }
        Ok(Self {
            target_path: w.path,
            explanation: w.message,
        })
    }
}

/// The output of one Structured Agent invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredResult {
    Text { text: String },
    Record {
        schema: String,
        fields: serde_json::Map<String, serde_json::Value>,
    },
    /// Output that failed schema validation, preserved verbatim.
    Malformed { raw: String, error: String },
}

impl StructuredResult {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Plain-text form used when a result is relayed through the Router.
    pub fn flatten(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Record { fields, .. } => serde_json::Value::Object(fields.clone()).to_string(),
            Self::Malformed { raw, .. } => format!("{MALFORMED_MARKER}\n{raw}"),
        }
    }
}
