//! Vendor extension decoding
//!
//! Extensions are free-form JSON. Each recognised extension is decoded into
//! a fixed shape; a value of any other shape is an error rather than being
//! treated as absent.

use crate::error::{ResolveError, ResolveResult};
use crate::rules::HandlerDescriptor;
use crate::sources::openapi::document::Extensions;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Authenticator handler of a security scheme
pub const AUTHENTICATOR: &str = "x-oathkeeper-authenticator";

/// Mutator schemes: scheme name → `{handler, config}`
pub const MUTATOR_SCHEMES: &str = "x-oathkeeper-mutatorSchemes";

/// Mutator scheme names applied to an operation (or the whole document)
pub const MUTATORS: &str = "x-oathkeeper-mutators";

fn invalid(location: &str, extension: &str, reason: impl Into<String>) -> ResolveError {
    ResolveError::InvalidExtension {
        location: location.to_string(),
        extension: extension.to_string(),
        reason: reason.into(),
    }
}

/// Decode an extension into `T`, or `None` when it is absent
fn decode<T: DeserializeOwned>(
    extensions: &Extensions,
    extension: &str,
    location: &str,
) -> ResolveResult<Option<T>> {
    extensions
        .get(extension)
        .map(|value| T::deserialize(value).map_err(|e| invalid(location, extension, e.to_string())))
        .transpose()
}

/// Decode a `{handler, config}` object; sequences are rejected as well
fn descriptor(value: &Value, extension: &str, location: &str) -> ResolveResult<HandlerDescriptor> {
    if !value.is_object() {
        return Err(invalid(
            location,
            extension,
            format!("expected a {{handler, config}} object, found {}", kind_of(value)),
        ));
    }

    let descriptor = HandlerDescriptor::deserialize(value)
        .map_err(|e| invalid(location, extension, e.to_string()))?;
    if descriptor.handler.is_empty() {
        return Err(invalid(location, extension, "handler name is empty"));
    }
    Ok(descriptor)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The authenticator declared on a security scheme, as a name or `{handler, config}`
pub fn authenticator(
    extensions: &Extensions,
    location: &str,
) -> ResolveResult<Option<HandlerDescriptor>> {
    let Some(value) = extensions.get(AUTHENTICATOR) else {
        return Ok(None);
    };

    match value {
        Value::String(name) if name.is_empty() => {
            Err(invalid(location, AUTHENTICATOR, "handler name is empty"))
        }
        Value::String(name) => Ok(Some(HandlerDescriptor::new(name.as_str()))),
        other => descriptor(other, AUTHENTICATOR, location).map(Some),
    }
}

/// Mutator schemes declared on a node; empty when absent
pub fn mutator_schemes(
    extensions: &Extensions,
    location: &str,
) -> ResolveResult<BTreeMap<String, HandlerDescriptor>> {
    let schemes: BTreeMap<String, Value> =
        decode(extensions, MUTATOR_SCHEMES, location)?.unwrap_or_default();

    schemes
        .into_iter()
        .map(|(name, value)| {
            let location = format!("{location}.{name}");
            descriptor(&value, MUTATOR_SCHEMES, &location).map(|d| (name, d))
        })
        .collect()
}

/// Mutator scheme names listed on a node
pub fn mutator_names(extensions: &Extensions, location: &str) -> ResolveResult<Option<Vec<String>>> {
    decode(extensions, MUTATORS, location)
}
