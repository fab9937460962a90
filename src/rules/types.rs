//! Rule types
//!
//! The output records consumed by the gateway, and the handler descriptors
//! they reference.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Handler name of the authorizer attached to every generated rule
pub const ALLOW_AUTHORIZER: &str = "allow";

/// A named gateway handler (authenticator, mutator, authorizer or error handler)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    /// Gateway handler name (e.g. `jwt`, `cookie_session`, `id_token`)
    pub handler: String,

    /// Opaque handler configuration, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl HandlerDescriptor {
    /// Create a descriptor without configuration
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            config: None,
        }
    }

    /// Create a descriptor carrying configuration
    pub fn with_config(handler: impl Into<String>, config: Value) -> Self {
        Self {
            handler: handler.into(),
            config: Some(config),
        }
    }

    /// The allow-all authorizer
    pub fn allow() -> Self {
        Self::new(ALLOW_AUTHORIZER)
    }
}

/// URL pattern and methods a rule applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub url: String,
    pub methods: Vec<String>,
}

/// One access rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub description: String,
    #[serde(rename = "match")]
    pub matcher: RuleMatch,
    pub authenticators: Vec<HandlerDescriptor>,
    pub authorizer: HandlerDescriptor,
    pub mutators: Vec<HandlerDescriptor>,
    pub errors: Vec<HandlerDescriptor>,
}

/// HTTP methods that produce rules, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Emission order for operations sharing a path
    pub const PRIORITY: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
