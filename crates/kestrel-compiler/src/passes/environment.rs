//! Class environment building.
//!
//! First pass: for every class, validate each declared member and register
//! the valid ones in the class's symbol tables. A class's tables start as a
//! copy of its parent's (already-populated) tables with one fresh scope
//! pushed for the class's own declarations, so chain lookups see inherited
//! members at lower scope levels than own members.
//!
//! No invalid member is ever registered, and every violation produces its own
//! diagnostic; the pass never aborts on a bad declaration.

use kestrel_core::ast::{Class, Field, Method, Member, Program};
use kestrel_core::types::{TypeName, is_reserved};
use kestrel_core::{DiagnosticSink, SemanticError};
use kestrel_registry::{ClassRegistry, MethodSig, SymbolTable};

/// Populates class symbol tables from declared members.
pub struct EnvironmentBuilder<'a> {
    registry: &'a mut ClassRegistry,
    sink: &'a mut DiagnosticSink,
}

impl<'a> EnvironmentBuilder<'a> {
    pub fn new(registry: &'a mut ClassRegistry, sink: &'a mut DiagnosticSink) -> Self {
        Self { registry, sink }
    }

    /// Build every class's environment, parents before children.
    pub fn run(&mut self, program: &Program) {
        for id in self.registry.preorder() {
            let node = self.registry.node(id);
            let Some(decl_index) = node.decl else {
                // Built-ins have no declared members to validate.
                continue;
            };
            let class = &program.classes[decl_index];

            let (mut fields, mut methods) = match node.parent {
                Some(parent) => {
                    let parent = self.registry.node(parent);
                    (parent.fields.clone(), parent.methods.clone())
                }
                None => (SymbolTable::new(), SymbolTable::new()),
            };
            fields.enter_scope();
            methods.enter_scope();

            for member in &class.members {
                match member {
                    Member::Field(field) => self.check_field(class, field, &mut fields),
                    Member::Method(method) => self.check_method(class, method, &mut methods),
                }
            }

            let node = self.registry.node_mut(id);
            node.fields = fields;
            node.methods = methods;
        }
    }

    fn check_field(&mut self, class: &Class, field: &Field, fields: &mut SymbolTable<TypeName>) {
        let mut valid = true;

        if is_reserved(&field.name) {
            self.sink.error(
                &class.file,
                field.line,
                SemanticError::ReservedName {
                    kind: "fields",
                    name: field.name.clone(),
                },
            );
            valid = false;
        }

        if fields.peek(&field.name).is_some() {
            self.sink.error(
                &class.file,
                field.line,
                SemanticError::DuplicateField {
                    name: field.name.clone(),
                    class: class.name.clone(),
                },
            );
            valid = false;
        }

        if !self.registry.type_exists(&field.ty) {
            self.sink.error(
                &class.file,
                field.line,
                SemanticError::UndefinedFieldType {
                    ty: field.ty.clone(),
                    name: field.name.clone(),
                },
            );
            valid = false;
        }

        if valid {
            fields.add(field.name.clone(), field.ty.clone());
            // Alias for qualified self-access (`this.x`).
            fields.add(format!("this.{}", field.name), field.ty.clone());
        }
    }

    fn check_method(
        &mut self,
        class: &Class,
        method: &Method,
        methods: &mut SymbolTable<MethodSig>,
    ) {
        let mut valid = true;

        if !(method.return_ty.is_void() || self.registry.type_exists(&method.return_ty)) {
            self.sink.error(
                &class.file,
                method.line,
                SemanticError::UndefinedReturnType {
                    ty: method.return_ty.clone(),
                    name: method.name.clone(),
                },
            );
            valid = false;
        }

        if is_reserved(&method.name) {
            self.sink.error(
                &class.file,
                method.line,
                SemanticError::ReservedName {
                    kind: "methods",
                    name: method.name.clone(),
                },
            );
            valid = false;
        }

        if methods.peek(&method.name).is_some() {
            self.sink.error(
                &class.file,
                method.line,
                SemanticError::DuplicateMethod {
                    name: method.name.clone(),
                    class: class.name.clone(),
                },
            );
            valid = false;
        }

        // A chain hit at a lower scope level than the current one is an
        // inherited method: this declaration is an override and must keep
        // the inherited signature.
        if let Some(inherited) = methods.lookup(&method.name).cloned()
            && methods.scope_level(&method.name) != Some(methods.current_level())
        {
            if inherited.return_ty != method.return_ty {
                self.sink.error(
                    &class.file,
                    method.line,
                    SemanticError::OverrideReturnMismatch {
                        name: method.name.clone(),
                        found: method.return_ty.clone(),
                        inherited: inherited.return_ty.clone(),
                    },
                );
                valid = false;
            } else if method.formals.len() != inherited.params.len() {
                self.sink.error(
                    &class.file,
                    method.line,
                    SemanticError::OverrideArityMismatch {
                        name: method.name.clone(),
                        found: method.formals.len(),
                        inherited: inherited.params.len(),
                    },
                );
                valid = false;
            } else {
                // Each mismatched formal is reported independently.
                for (position, (formal, inherited_ty)) in
                    method.formals.iter().zip(&inherited.params).enumerate()
                {
                    if formal.ty != *inherited_ty {
                        self.sink.error(
                            &class.file,
                            method.line,
                            SemanticError::OverrideFormalMismatch {
                                name: method.name.clone(),
                                position: position + 1,
                                found: formal.ty.clone(),
                                inherited: inherited_ty.clone(),
                            },
                        );
                        valid = false;
                    }
                }
            }
        }

        if valid {
            methods.add(method.name.clone(), MethodSig::of(method));
        }
    }
}
