//! Type checking.
//!
//! Second pass: walks every method body, assigns a static type to each
//! expression node, and enforces the typing rules. Requires every class's
//! environment to be built first so cross-class dispatch can resolve any
//! method table.
//!
//! Every check is non-fatal. After a failed check the checker substitutes
//! the universal reference type `Object` and keeps going, so one run
//! surfaces as many diagnostics as possible.
//!
//! Locals (formals and declared variables) live in a checker-owned scoped
//! table consulted before the class's field table; the shared registry is
//! never mutated by this pass.

pub mod conform;
mod expr;
mod stmt;

use kestrel_core::ast::{Class, Field, Member, Method, Program};
use kestrel_core::types::{TypeName, is_reserved};
use kestrel_core::{DiagnosticSink, SemanticError};
use kestrel_registry::{ClassId, ClassRegistry, SymbolTable};

use conform::conforms;

/// Runs type checking over a whole program.
pub struct TypeChecker<'a> {
    registry: &'a ClassRegistry,
    sink: &'a mut DiagnosticSink,
}

impl<'a> TypeChecker<'a> {
    pub fn new(registry: &'a ClassRegistry, sink: &'a mut DiagnosticSink) -> Self {
        Self { registry, sink }
    }

    pub fn run(&mut self, program: &mut Program) {
        for class in &mut program.classes {
            let Some(class_id) = self.registry.resolve(&class.name) else {
                continue;
            };
            let mut checker = ClassChecker::new(self.registry, self.sink, class_id, class);
            checker.check_class(class);
        }
    }
}

/// Checks one class's members. Method context (declared return type, local
/// scopes, loop depth) is reset per method.
pub(crate) struct ClassChecker<'a> {
    pub(crate) registry: &'a ClassRegistry,
    pub(crate) sink: &'a mut DiagnosticSink,
    pub(crate) class_id: ClassId,
    pub(crate) file: String,
    pub(crate) class_name: String,
    pub(crate) method_name: String,
    pub(crate) return_ty: TypeName,
    pub(crate) locals: SymbolTable<TypeName>,
    pub(crate) loop_depth: u32,
}

impl<'a> ClassChecker<'a> {
    fn new(
        registry: &'a ClassRegistry,
        sink: &'a mut DiagnosticSink,
        class_id: ClassId,
        class: &Class,
    ) -> Self {
        Self {
            registry,
            sink,
            class_id,
            file: class.file.clone(),
            class_name: class.name.clone(),
            method_name: String::new(),
            return_ty: TypeName::void(),
            locals: SymbolTable::new(),
            loop_depth: 0,
        }
    }

    fn check_class(&mut self, class: &mut Class) {
        for member in &mut class.members {
            match member {
                Member::Field(field) => self.check_field_init(field),
                Member::Method(method) => self.check_method(method),
            }
        }
    }

    fn check_field_init(&mut self, field: &mut Field) {
        let line = field.line;
        let Some(init) = &mut field.init else {
            return;
        };
        let found = self.check_expr(init);

        if found.is_void() {
            self.error(
                line,
                SemanticError::VoidFieldInit {
                    name: field.name.clone(),
                },
            );
        } else if field.ty.is_primitive() {
            if found != field.ty {
                self.error(
                    line,
                    SemanticError::FieldInitMismatch {
                        found,
                        name: field.name.clone(),
                        declared: field.ty.clone(),
                    },
                );
            }
        } else if !conforms(self.registry, &found, &field.ty) {
            self.error(
                line,
                SemanticError::FieldInitNonConforming {
                    found,
                    name: field.name.clone(),
                    declared: field.ty.clone(),
                },
            );
        }
    }

    fn check_method(&mut self, method: &mut Method) {
        self.method_name = method.name.clone();
        self.return_ty = method.return_ty.clone();
        self.locals = SymbolTable::new();
        self.locals.enter_scope();
        self.loop_depth = 0;

        for formal in &method.formals {
            if is_reserved(&formal.name) {
                self.error(
                    formal.line,
                    SemanticError::ReservedName {
                        kind: "formals",
                        name: formal.name.clone(),
                    },
                );
                continue;
            }
            if self.locals.peek(&formal.name).is_some() {
                self.error(
                    formal.line,
                    SemanticError::DuplicateFormal {
                        name: formal.name.clone(),
                        method: method.name.clone(),
                    },
                );
                continue;
            }
            if self.registry.type_exists(&formal.ty) {
                self.locals.add(formal.name.clone(), formal.ty.clone());
            } else {
                self.error(
                    formal.line,
                    SemanticError::UndefinedFormalType {
                        ty: formal.ty.clone(),
                        name: formal.name.clone(),
                    },
                );
                self.locals.add(formal.name.clone(), TypeName::object());
            }
        }

        for stmt in &mut method.body {
            self.check_stmt(stmt);
        }
        self.locals.exit_scope();
    }

    // ========================================================================
    // Shared resolution helpers
    // ========================================================================

    /// The declared type of a field visible in this class (own or inherited).
    pub(crate) fn field_ty(&self, name: &str) -> Option<TypeName> {
        self.registry
            .node(self.class_id)
            .fields
            .lookup(name)
            .cloned()
    }

    /// The declared type of a field visible in the parent class.
    pub(crate) fn super_field_ty(&self, name: &str) -> Option<TypeName> {
        let parent = self.registry.node(self.class_id).parent?;
        self.registry.node(parent).fields.lookup(name).cloned()
    }

    /// The name of the parent class, `Object` at the top of the chain.
    pub(crate) fn parent_name(&self) -> TypeName {
        match self.registry.node(self.class_id).parent {
            Some(parent) => TypeName::new(self.registry.node(parent).name.clone()),
            None => TypeName::object(),
        }
    }

    pub(crate) fn error(&mut self, line: u32, error: SemanticError) {
        self.sink.error(&self.file, line, error);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::passes::EnvironmentBuilder;

    /// Build environments and type check `program`, returning the sink.
    pub(crate) fn check(program: &mut Program) -> DiagnosticSink {
        let mut registry = ClassRegistry::from_program(program).unwrap();
        let mut sink = DiagnosticSink::new();
        EnvironmentBuilder::new(&mut registry, &mut sink).run(program);
        TypeChecker::new(&registry, &mut sink).run(program);
        sink
    }
}
