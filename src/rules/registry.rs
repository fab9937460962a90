//! Handler registry
//!
//! Maps handler names to descriptors, one namespace per handler kind. A
//! single registry is shared by every source of a run: definitions made
//! while processing one source are visible to all sources processed after
//! it, so the configured source order decides which names are available.

use crate::config::GatewayConfig;
use crate::error::HandlerNotFound;
use crate::rules::types::HandlerDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Registry namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Authenticator,
    Mutator,
    ErrorHandler,
}

impl HandlerKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Authenticator => "authenticator",
            HandlerKind::Mutator => "mutator",
            HandlerKind::ErrorHandler => "error handler",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named handler lookup tables plus the run-level error handler chain
///
/// Error handlers have no separate names: they are selected from the chain
/// by handler name, and a name selects every chain entry using that
/// handler. Two `redirect` entries that differ only in their `when`
/// conditions therefore both reach a rule that selects `redirect`.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    authenticators: HashMap<String, HandlerDescriptor>,
    mutators: HashMap<String, HandlerDescriptor>,
    /// Error handlers attached to rules that make no explicit selection
    error_chain: Vec<HandlerDescriptor>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-seeded from the `[gateway]` configuration
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut registry = Self::new();

        for (name, descriptor) in &config.authenticators {
            registry.define(HandlerKind::Authenticator, name, descriptor.clone());
        }
        for (name, descriptor) in &config.mutators {
            registry.define(HandlerKind::Mutator, name, descriptor.clone());
        }
        for descriptor in &config.errors {
            registry.append_error_handler(descriptor.clone());
        }

        registry
    }

    /// Insert or overwrite a handler, returning the previous definition.
    ///
    /// Error handlers are keyed by their handler name, so `name` only
    /// applies to authenticators and mutators; an error handler is appended
    /// to the chain instead.
    pub fn define(
        &mut self,
        kind: HandlerKind,
        name: impl Into<String>,
        descriptor: HandlerDescriptor,
    ) -> Option<HandlerDescriptor> {
        let name = name.into();
        debug!(kind = %kind, name = %name, handler = %descriptor.handler, "Defining handler");

        let namespace = match kind {
            HandlerKind::Authenticator => &mut self.authenticators,
            HandlerKind::Mutator => &mut self.mutators,
            HandlerKind::ErrorHandler => {
                self.error_chain.push(descriptor);
                return None;
            }
        };

        let previous = namespace.insert(name.clone(), descriptor);
        if let Some(prev) = &previous {
            debug!(kind = %kind, name = %name, previous = %prev.handler, "Handler redefined");
        }
        previous
    }

    /// Every handler registered under `name`, in definition order
    fn lookup<'a: 'b, 'b>(
        &'a self,
        kind: HandlerKind,
        name: &'b str,
    ) -> Box<dyn Iterator<Item = &'a HandlerDescriptor> + 'b> {
        match kind {
            HandlerKind::Authenticator => Box::new(self.authenticators.get(name).into_iter()),
            HandlerKind::Mutator => Box::new(self.mutators.get(name).into_iter()),
            HandlerKind::ErrorHandler => Box::new(
                self.error_chain
                    .iter()
                    .filter(move |descriptor| descriptor.handler == name),
            ),
        }
    }

    /// Look up a handler by name; for error handlers, the first chain entry
    pub fn resolve(
        &self,
        kind: HandlerKind,
        name: &str,
    ) -> Result<&HandlerDescriptor, HandlerNotFound> {
        self.lookup(kind, name).next().ok_or_else(|| HandlerNotFound {
            kind,
            name: name.to_string(),
        })
    }

    /// Look up several handlers, preserving order; fails on the first unknown name.
    ///
    /// An error handler name expands to every chain entry using that handler.
    pub fn resolve_all<I, S>(
        &self,
        kind: HandlerKind,
        names: I,
    ) -> Result<Vec<HandlerDescriptor>, HandlerNotFound>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolved = Vec::new();
        for name in names {
            let name = name.as_ref();
            let before = resolved.len();
            resolved.extend(self.lookup(kind, name).cloned());
            if resolved.len() == before {
                return Err(HandlerNotFound {
                    kind,
                    name: name.to_string(),
                });
            }
        }
        Ok(resolved)
    }

    /// Append an error handler to the chain
    pub fn append_error_handler(&mut self, descriptor: HandlerDescriptor) {
        let name = descriptor.handler.clone();
        self.define(HandlerKind::ErrorHandler, name, descriptor);
    }

    /// The run-level error handler chain, in definition order
    pub fn error_chain(&self) -> &[HandlerDescriptor] {
        &self.error_chain
    }

    /// Check whether a handler name is defined
    pub fn contains(&self, kind: HandlerKind, name: &str) -> bool {
        self.lookup(kind, name).next().is_some()
    }
}
