pub use kestrel_compiler as compiler;
pub use kestrel_core as core;
pub use kestrel_registry as registry;

pub mod prelude {
    pub use kestrel_compiler::{
        CompilationResult, Compiler, EmittedClass, EmittedField, EmittedMethod,
    };
    pub use kestrel_compiler::codegen::{CodeGenerator, Instr, Label};
    pub use kestrel_compiler::passes::{EnvironmentBuilder, TypeChecker};
    pub use kestrel_core::ast::*;
    pub use kestrel_core::types::TypeName;
    pub use kestrel_core::{Diagnostic, DiagnosticSink, SemanticError, Severity};
    pub use kestrel_registry::{ClassId, ClassRegistry, HierarchyError, MethodSig, SymbolTable};
}
