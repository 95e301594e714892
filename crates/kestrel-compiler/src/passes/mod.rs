//! Semantic passes.
//!
//! - [`environment`]: pass 1 - populate per-class symbol tables and validate
//!   declarations, including override compatibility
//! - [`typecheck`]: pass 2 - assign a static type to every expression and
//!   enforce the typing rules

pub mod environment;
pub mod typecheck;

pub use environment::EnvironmentBuilder;
pub use typecheck::TypeChecker;
