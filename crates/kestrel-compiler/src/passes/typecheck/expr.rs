//! Expression typing rules.
//!
//! `check_expr` computes each node's static type, records it on the node,
//! and returns it. On any violation the node is typed with a safe fallback
//! (usually `Object`) so checking continues.

use kestrel_core::SemanticError;
use kestrel_core::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use kestrel_core::types::TypeName;

use super::ClassChecker;
use super::conform::conforms;

impl ClassChecker<'_> {
    pub(crate) fn check_expr(&mut self, expr: &mut Expr) -> TypeName {
        let line = expr.line;
        let ty = match &mut expr.kind {
            ExprKind::IntConst(_) => TypeName::int(),
            ExprKind::BoolConst(_) => TypeName::boolean(),
            ExprKind::StrConst(_) => TypeName::string(),
            ExprKind::Var { qualifier, name } => {
                let qualifier = qualifier.clone();
                let name = name.clone();
                self.check_var(qualifier.as_deref(), &name, line)
            }
            ExprKind::Assign {
                qualifier,
                name,
                value,
            } => {
                let qualifier = qualifier.clone();
                let name = name.clone();
                let found = self.check_expr(value);
                self.check_assign(qualifier.as_deref(), &name, found, line)
            }
            ExprKind::ArrayAssign { name, index, value } => {
                let name = name.clone();
                let index_ty = self.check_expr(index);
                let found = self.check_expr(value);
                self.check_array_assign(&name, index_ty, found, line)
            }
            ExprKind::Dispatch {
                receiver,
                method,
                args,
            } => {
                let method = method.clone();
                let receiver_ty = self.check_expr(receiver);
                let arg_tys: Vec<TypeName> =
                    args.iter_mut().map(|arg| self.check_expr(arg)).collect();
                self.check_dispatch(receiver_ty, &method, &arg_tys, line)
            }
            ExprKind::New { class } => {
                let class = class.clone();
                self.check_new(&class, line)
            }
            ExprKind::NewArray { element, size } => {
                let element = element.clone();
                let size_ty = self.check_expr(size);
                self.check_new_array(&element, size_ty, line)
            }
            ExprKind::InstanceOf { expr, target } => {
                let target = target.clone();
                let operand_ty = self.check_expr(expr);
                self.check_instanceof(operand_ty, &target, line)
            }
            ExprKind::Cast { target, expr } => {
                let target = target.clone();
                let operand_ty = self.check_expr(expr);
                self.check_cast(operand_ty, &target, line)
            }
            ExprKind::Binary { op, left, right } => {
                let op = *op;
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                self.check_binary(op, left_ty, right_ty, line)
            }
            ExprKind::Unary { op, operand } => {
                let op = *op;
                let assignable = matches!(operand.kind, ExprKind::Var { .. });
                let operand_ty = self.check_expr(operand);
                self.check_unary(op, operand_ty, assignable, line)
            }
            ExprKind::Index { target, index } => {
                let target_ty = self.check_expr(target);
                let index_ty = self.check_expr(index);
                self.check_index(target_ty, index_ty, line)
            }
        };
        expr.ty = Some(ty.clone());
        ty
    }

    // ========================================================================
    // Variables and assignment
    // ========================================================================

    fn check_var(&mut self, qualifier: Option<&str>, name: &str, line: u32) -> TypeName {
        match qualifier {
            None => match name {
                "this" => TypeName::new(self.class_name.clone()),
                "super" => self.parent_name(),
                "null" => TypeName::null(),
                _ => {
                    if let Some(ty) = self.locals.lookup(name).cloned() {
                        ty
                    } else if let Some(ty) = self.field_ty(name) {
                        ty
                    } else {
                        self.error(line, SemanticError::UndeclaredVariable { name: name.into() });
                        TypeName::object()
                    }
                }
            },
            Some("this") => self.field_ty(name).unwrap_or_else(|| {
                self.error(line, SemanticError::UndeclaredVariable { name: name.into() });
                TypeName::object()
            }),
            Some("super") => self.super_field_ty(name).unwrap_or_else(|| {
                self.error(line, SemanticError::UndeclaredVariable { name: name.into() });
                TypeName::object()
            }),
            Some(other) => {
                self.error(
                    line,
                    SemanticError::IllegalFieldQualifier {
                        qualifier: other.into(),
                    },
                );
                TypeName::object()
            }
        }
    }

    fn check_assign(
        &mut self,
        qualifier: Option<&str>,
        name: &str,
        found: TypeName,
        line: u32,
    ) -> TypeName {
        let declared = match qualifier {
            // A bare name falls back from the innermost lexical scope to
            // the class's fields.
            None => self.locals.lookup(name).cloned().or_else(|| self.field_ty(name)),
            Some("this") => self.field_ty(name),
            Some("super") => self.super_field_ty(name),
            Some(other) => {
                self.error(
                    line,
                    SemanticError::IllegalFieldQualifier {
                        qualifier: other.into(),
                    },
                );
                return found;
            }
        };

        let Some(declared) = declared else {
            self.error(line, SemanticError::UndeclaredVariable { name: name.into() });
            return found;
        };

        let accepted = found == declared
            || (!declared.is_primitive() && conforms(self.registry, &found, &declared));
        if !accepted {
            self.error(
                line,
                SemanticError::IncompatibleAssignment {
                    found: found.clone(),
                    declared,
                    name: name.into(),
                },
            );
        }
        // Assignment-as-expression: the node's type is the assigned value's.
        found
    }

    fn check_array_assign(
        &mut self,
        name: &str,
        index_ty: TypeName,
        found: TypeName,
        line: u32,
    ) -> TypeName {
        let target = self.locals.lookup(name).cloned().or_else(|| self.field_ty(name));
        let Some(target) = target else {
            self.error(line, SemanticError::UndeclaredVariable { name: name.into() });
            return found;
        };

        let Some(element) = target.element() else {
            self.error(line, SemanticError::IndexNonArray { ty: target });
            return found;
        };
        if !index_ty.is_int() {
            self.error(line, SemanticError::IndexNotInt { found: index_ty });
        }
        if found != element {
            self.error(
                line,
                SemanticError::IncompatibleAssignment {
                    found: found.clone(),
                    declared: element,
                    name: name.into(),
                },
            );
        }
        found
    }

    // ========================================================================
    // Dispatch and construction
    // ========================================================================

    fn check_dispatch(
        &mut self,
        receiver_ty: TypeName,
        method: &str,
        arg_tys: &[TypeName],
        line: u32,
    ) -> TypeName {
        if receiver_ty.is_primitive() || receiver_ty.is_void() || receiver_ty.is_null() {
            self.error(line, SemanticError::BadDispatchReceiver { ty: receiver_ty });
            return TypeName::object();
        }

        // Arrays have no methods of their own; dispatch resolves against
        // the root class.
        let class_name = if receiver_ty.is_array() {
            "Object".to_string()
        } else {
            receiver_ty.as_str().to_string()
        };
        let Some(class_id) = self.registry.resolve(&class_name) else {
            self.error(
                line,
                SemanticError::UnknownMethod {
                    method: method.into(),
                    class: class_name,
                },
            );
            return TypeName::object();
        };

        let Some(sig) = self.registry.node(class_id).methods.lookup(method).cloned() else {
            self.error(
                line,
                SemanticError::UnknownMethod {
                    method: method.into(),
                    class: class_name,
                },
            );
            return TypeName::object();
        };

        if arg_tys.len() != sig.params.len() {
            self.error(
                line,
                SemanticError::DispatchArityMismatch {
                    method: method.into(),
                    class: class_name,
                    expected: sig.params.len(),
                    found: arg_tys.len(),
                },
            );
            // Positions that do line up are still type checked.
        }

        for (position, (found, expected)) in arg_tys.iter().zip(&sig.params).enumerate() {
            if found.is_void() {
                self.error(
                    line,
                    SemanticError::VoidArgument {
                        position: position + 1,
                        method: method.into(),
                    },
                );
            } else if expected.is_primitive() {
                if found != expected {
                    self.error(
                        line,
                        SemanticError::ArgumentTypeMismatch {
                            position: position + 1,
                            method: method.into(),
                            found: found.clone(),
                            expected: expected.clone(),
                        },
                    );
                }
            } else if !conforms(self.registry, found, expected) {
                self.error(
                    line,
                    SemanticError::ArgumentTypeMismatch {
                        position: position + 1,
                        method: method.into(),
                        found: found.clone(),
                        expected: expected.clone(),
                    },
                );
            }
        }

        sig.return_ty
    }

    fn check_new(&mut self, class: &TypeName, line: u32) -> TypeName {
        if class.is_primitive() {
            self.error(line, SemanticError::NewPrimitive { ty: class.clone() });
            return TypeName::object();
        }
        if self.registry.resolve(class.as_str()).is_none() {
            self.error(line, SemanticError::NewUndefined { ty: class.clone() });
            return TypeName::object();
        }
        class.clone()
    }

    fn check_new_array(&mut self, element: &TypeName, size_ty: TypeName, line: u32) -> TypeName {
        if !size_ty.is_int() {
            self.error(line, SemanticError::ArraySizeNotInt { found: size_ty });
        }
        if !element.is_primitive() {
            self.error(
                line,
                SemanticError::BadArrayElementType { ty: element.clone() },
            );
            return TypeName::object();
        }
        TypeName::array_of(element)
    }

    // ========================================================================
    // instanceof and casts
    // ========================================================================

    fn check_instanceof(&mut self, operand: TypeName, target: &TypeName, line: u32) -> TypeName {
        if operand.is_primitive() || operand.is_void() {
            self.error(line, SemanticError::BadInstanceofOperand { ty: operand });
        }
        let target_is_class =
            !target.is_primitive() && !target.is_array() && self.registry.resolve(target.as_str()).is_some();
        if !target_is_class {
            self.error(line, SemanticError::BadInstanceofTarget { ty: target.clone() });
        }
        TypeName::boolean()
    }

    fn check_cast(&mut self, operand: TypeName, target: &TypeName, line: u32) -> TypeName {
        if target.is_primitive() {
            self.error(line, SemanticError::CastPrimitiveTarget { ty: target.clone() });
            return TypeName::object();
        }
        if !self.registry.type_exists(target) {
            self.error(line, SemanticError::CastUndefinedTarget { ty: target.clone() });
            return TypeName::object();
        }
        if operand.is_primitive() || operand.is_void() {
            self.error(line, SemanticError::CastPrimitiveOperand { ty: operand });
            return target.clone();
        }
        // Up- and downcasts are both legal; unrelated types are not.
        let convertible = conforms(self.registry, &operand, target)
            || conforms(self.registry, target, &operand);
        if !convertible {
            self.error(
                line,
                SemanticError::CastInconvertible {
                    from: operand,
                    to: target.clone(),
                },
            );
        }
        target.clone()
    }

    // ========================================================================
    // Operators and indexing
    // ========================================================================

    fn check_binary(
        &mut self,
        op: BinaryOp,
        left: TypeName,
        right: TypeName,
        line: u32,
    ) -> TypeName {
        if let Some(expected) = op.operand_ty() {
            if left != expected {
                self.error(
                    line,
                    SemanticError::BinaryOperandMismatch {
                        op: op.name(),
                        side: "lefthand",
                        found: left,
                        expected: expected.clone(),
                    },
                );
            }
            if right != expected {
                self.error(
                    line,
                    SemanticError::BinaryOperandMismatch {
                        op: op.name(),
                        side: "righthand",
                        found: right,
                        expected,
                    },
                );
            }
        } else {
            // Equality: if either operand is primitive (or void) the types
            // must match exactly; any two reference types are comparable.
            let strict = left.is_primitive()
                || right.is_primitive()
                || left.is_void()
                || right.is_void();
            if strict && left != right {
                self.error(
                    line,
                    SemanticError::IncomparableTypes {
                        op: op.name(),
                        left,
                        right,
                    },
                );
            }
        }
        op.result_ty()
    }

    fn check_unary(
        &mut self,
        op: UnaryOp,
        operand: TypeName,
        assignable: bool,
        line: u32,
    ) -> TypeName {
        if matches!(op, UnaryOp::Incr | UnaryOp::Decr) && !assignable {
            self.error(line, SemanticError::OperandNotAssignable { op: op.name() });
        }
        if operand != op.operand_ty() {
            self.error(
                line,
                SemanticError::UnaryOperandMismatch {
                    op: op.name(),
                    found: operand,
                    expected: op.operand_ty(),
                },
            );
        }
        op.result_ty()
    }

    fn check_index(&mut self, target: TypeName, index: TypeName, line: u32) -> TypeName {
        let Some(element) = target.element() else {
            self.error(line, SemanticError::IndexNonArray { ty: target });
            return TypeName::object();
        };
        if !index.is_int() {
            self.error(line, SemanticError::IndexNotInt { found: index });
            return TypeName::object();
        }
        element
    }
}
