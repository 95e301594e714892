//! Shared leaf crate for the kestrel compiler backend.
//!
//! ## Modules
//!
//! - [`ast`]: The abstract syntax tree as closed tagged variants
//! - [`diag`]: The append-only diagnostics sink
//! - [`error`]: Semantic error taxonomy rendered into diagnostics
//! - [`types`]: Type-name classification, reserved names, and descriptors

pub mod ast;
pub mod diag;
pub mod error;
pub mod types;

pub use diag::{Diagnostic, DiagnosticSink, Severity};
pub use error::SemanticError;
pub use types::TypeName;
