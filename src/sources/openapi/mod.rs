//! OpenAPI3 source adapter
//!
//! Recognised vendor extensions:
//!
//! | Extension | Node | Value |
//! |---|---|---|
//! | `x-oathkeeper-authenticator` | security scheme | handler name or `{handler, config}` |
//! | `x-oathkeeper-mutatorSchemes` | `components` or root | scheme name → `{handler, config}` |
//! | `x-oathkeeper-mutators` | operation or root | list of mutator scheme names |
//!
//! Security scheme names double as authenticator names, so an operation's
//! `security` requirements select its authenticators directly.

pub mod document;
pub mod extensions;
pub mod transformer;

pub use document::OpenApiDocument;
pub use transformer::OpenApiSource;
