use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

// ─── Configuration Types ──────────────────────────────────────────────────────

/// How a request body is put on the wire.
///
/// Stored as a free-form string; anything other than `json` or `form` is
/// treated as `raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BodyKind {
    #[default]
    Json,
    Form,
    Raw,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Json => "json",
            BodyKind::Form => "form",
            BodyKind::Raw => "raw",
        }
    }
}

impl From<String> for BodyKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => BodyKind::Json,
            "form" => BodyKind::Form,
            _ => BodyKind::Raw,
        }
    }
}

impl From<BodyKind> for String {
    fn from(kind: BodyKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Named base URL plus default headers for a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Reusable request shape attached to a logical API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiTemplate {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    pub method: String,
    pub url_path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query_params: Map<String, Value>,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub body_type: BodyKind,
}

/// A runnable request plus the rules its response must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub body_type: BodyKind,
    #[serde(default)]
    pub assertions: Vec<super::AssertionRule>,
    #[serde(default)]
    pub api_id: Option<u64>,
}

/// Ad-hoc request sent from the debug console, optionally against an environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub body_type: BodyKind,
}

// ─── HTTP Types ───────────────────────────────────────────────────────────────

/// Body as it will be sent. At most one encoding is ever populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    None,
    Json(Value),
    Form(Vec<(String, String)>),
    Raw(String),
}

/// Fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: String,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
    pub timeout: Duration,
}

/// Response body: parsed JSON when possible, the raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Parse `text` as JSON, keeping it verbatim when it is not.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ResponseBody::Json(value) => value.clone(),
            ResponseBody::Text(text) => Value::String(text.clone()),
        }
    }
}

/// Everything captured from one outbound call.
///
/// `status_code == 0` marks a transport failure; `error` is set exactly then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseResult {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<ResponseBody>,
    /// Wall-clock seconds from call start to completion or failure.
    pub duration: f64,
    pub error: Option<String>,
}

impl ResponseResult {
    pub fn transport_error(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            status_code: 0,
            headers: HashMap::new(),
            body: None,
            duration: duration.as_secs_f64(),
            error: Some(message.into()),
        }
    }

    pub fn is_transport_error(&self) -> bool {
        self.status_code == 0
    }

    /// Body as a JSON tree for path extraction; `null` when nothing was received.
    pub fn body_value(&self) -> Value {
        self.body
            .as_ref()
            .map(ResponseBody::to_value)
            .unwrap_or(Value::Null)
    }
}
