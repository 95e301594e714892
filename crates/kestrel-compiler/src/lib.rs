//! Semantic analysis and code generation.
//!
//! The pipeline over a parsed program:
//!
//! - **Hierarchy** ([`kestrel_registry::ClassRegistry`]): class arena, parent
//!   links, duplicate and cycle detection.
//! - **Environment** ([`passes::EnvironmentBuilder`]): per-class field and
//!   method tables with inheritance-aware scope levels.
//! - **Type checking** ([`passes::TypeChecker`]): assigns a static type to
//!   every expression and accumulates diagnostics without aborting.
//! - **Code generation** ([`codegen::CodeGenerator`]): lowers to textual
//!   stack-machine assembly, only when analysis reported no errors.
//!
//! [`Compiler::compile`] runs the whole pipeline.

pub mod codegen;
pub mod passes;

pub use codegen::{CodeGenerator, EmittedClass, EmittedField, EmittedMethod, Instr, Label};
pub use passes::{EnvironmentBuilder, TypeChecker};

use kestrel_core::ast::Program;
use kestrel_core::{Diagnostic, DiagnosticSink, Severity};
use kestrel_registry::{ClassRegistry, HierarchyError};

/// The result of running the full pipeline.
///
/// `classes` is empty whenever any diagnostic is an error; partial output is
/// never produced.
#[derive(Debug)]
pub struct CompilationResult {
    pub classes: Vec<EmittedClass>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    pub fn succeeded(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|diag| diag.severity == Severity::Error)
    }
}

/// Front door for the whole pipeline.
pub struct Compiler;

impl Compiler {
    /// Analyze `program` and, if it is clean, lower it.
    pub fn compile(mut program: Program) -> CompilationResult {
        let mut sink = DiagnosticSink::new();

        let mut registry = match ClassRegistry::from_program(&program) {
            Ok(registry) => registry,
            Err(error) => {
                report_hierarchy_error(&mut sink, &program, &error);
                return CompilationResult {
                    classes: Vec::new(),
                    diagnostics: sink.into_diagnostics(),
                };
            }
        };

        EnvironmentBuilder::new(&mut registry, &mut sink).run(&program);
        TypeChecker::new(&registry, &mut sink).run(&mut program);

        let classes = if sink.is_clean() {
            CodeGenerator::new(&registry).run(&program)
        } else {
            Vec::new()
        };
        CompilationResult {
            classes,
            diagnostics: sink.into_diagnostics(),
        }
    }
}

/// Attribute a hierarchy error to the declaration that caused it.
fn report_hierarchy_error(sink: &mut DiagnosticSink, program: &Program, error: &HierarchyError) {
    let offender = match error {
        HierarchyError::DuplicateClass { name } => name,
        HierarchyError::UnknownParent { class, .. } => class,
        HierarchyError::InheritanceCycle { class } => class,
    };
    // Duplicates point at the later declaration.
    let decl = program
        .classes
        .iter()
        .rev()
        .find(|class| class.name == *offender);
    match decl {
        Some(class) => sink.register(Severity::Error, &class.file, class.line, error),
        None => sink.register(Severity::Error, "<unknown>", 0, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::ast::Class;

    fn class(name: &str, parent: &str, line: u32) -> Class {
        Class {
            file: "prog.kst".into(),
            name: name.into(),
            parent: parent.into(),
            line,
            members: Vec::new(),
        }
    }

    #[test]
    fn empty_class_compiles_to_one_emitted_class() {
        let program = Program {
            classes: vec![class("A", "Object", 1)],
        };
        let result = Compiler::compile(program);
        assert!(result.succeeded());
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].name, "A");
    }

    #[test]
    fn duplicate_class_reports_the_later_declaration() {
        let program = Program {
            classes: vec![class("A", "Object", 1), class("A", "Object", 7)],
        };
        let result = Compiler::compile(program);
        assert!(!result.succeeded());
        assert!(result.classes.is_empty());
        let diag = &result.diagnostics[0];
        assert_eq!(diag.line, 7);
        assert!(diag.message.contains("declared more than once"));
    }

    #[test]
    fn inheritance_cycle_yields_no_output() {
        let program = Program {
            classes: vec![class("A", "B", 1), class("B", "A", 2)],
        };
        let result = Compiler::compile(program);
        assert!(!result.succeeded());
        assert!(result.classes.is_empty());
    }
}
