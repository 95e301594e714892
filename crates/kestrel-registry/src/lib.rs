//! Class hierarchy registry and scoped symbol tables.
//!
//! - [`symbol_table`]: stack-of-scopes name binding shared by the field and
//!   method namespaces
//! - [`registry`]: the class-hierarchy arena addressed by [`ClassId`]

pub mod registry;
pub mod symbol_table;

pub use registry::{ClassId, ClassNode, ClassRegistry, HierarchyError, MethodSig};
pub use symbol_table::SymbolTable;
