//! Statement-level typing rules.

use kestrel_core::SemanticError;
use kestrel_core::ast::{Expr, ExprKind, Stmt, UnaryOp};
use kestrel_core::types::{TypeName, is_reserved};

use super::ClassChecker;
use super::conform::conforms;

impl ClassChecker<'_> {
    pub(crate) fn check_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Decl {
                name,
                ty,
                init,
                line,
            } => {
                let name = name.clone();
                let declared = ty.clone();
                let line = *line;
                self.check_decl(&name, &declared, init, line);
            }
            Stmt::Expr { expr, line } => {
                let line = *line;
                self.check_expr(expr);
                if !is_legal_statement(expr) {
                    self.error(line, SemanticError::NotAStatement);
                }
            }
            Stmt::If {
                pred,
                then_stmt,
                else_stmt,
                line,
            } => {
                let line = *line;
                self.check_predicate(pred, "if", line);
                self.check_stmt(then_stmt);
                if let Some(else_stmt) = else_stmt {
                    self.check_stmt(else_stmt);
                }
            }
            Stmt::While { pred, body, line } => {
                let line = *line;
                self.check_predicate(pred, "while", line);
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
            }
            Stmt::For {
                init,
                pred,
                update,
                body,
                line,
            } => {
                let line = *line;
                if let Some(init) = init {
                    self.check_expr(init);
                }
                if let Some(pred) = pred {
                    self.check_predicate(pred, "for", line);
                }
                if let Some(update) = update {
                    self.check_expr(update);
                }
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
            }
            Stmt::Break { line } => {
                if self.loop_depth == 0 {
                    self.error(*line, SemanticError::BreakOutsideLoop);
                }
            }
            Stmt::Block { stmts, line: _ } => {
                self.locals.enter_scope();
                for stmt in stmts {
                    self.check_stmt(stmt);
                }
                self.locals.exit_scope();
            }
            Stmt::Return { expr, line } => {
                let line = *line;
                self.check_return(expr.as_mut(), line);
            }
        }
    }

    fn check_decl(&mut self, name: &str, declared: &TypeName, init: &mut Expr, line: u32) {
        // The initializer is typed first so its diagnostics precede the
        // declaration's own.
        let found = self.check_expr(init);

        let mut registrable = true;
        if is_reserved(name) {
            self.error(
                line,
                SemanticError::ReservedName {
                    kind: "variables",
                    name: name.into(),
                },
            );
            registrable = false;
        }
        if self.locals.peek(name).is_some() {
            self.error(
                line,
                SemanticError::DuplicateVariable {
                    name: name.into(),
                    method: self.method_name.clone(),
                },
            );
            registrable = false;
        }

        // An undeclared type is reported but checking continues with the
        // universal reference type substituted.
        let declared = if self.registry.type_exists(declared) {
            declared.clone()
        } else {
            self.error(
                line,
                SemanticError::UndefinedVariableType {
                    ty: declared.clone(),
                    name: name.into(),
                },
            );
            TypeName::object()
        };

        if declared.is_primitive() {
            if found != declared {
                self.error(
                    line,
                    SemanticError::DeclInitMismatch {
                        found,
                        name: name.into(),
                        declared: declared.clone(),
                    },
                );
            }
        } else if !conforms(self.registry, &found, &declared) {
            self.error(
                line,
                SemanticError::DeclInitNonConforming {
                    found,
                    name: name.into(),
                    declared: declared.clone(),
                },
            );
        }

        if registrable {
            self.locals.add(name, declared);
        }
    }

    fn check_predicate(&mut self, pred: &mut Expr, construct: &'static str, line: u32) {
        let found = self.check_expr(pred);
        if !found.is_boolean() {
            self.error(line, SemanticError::NonBooleanPredicate { construct });
        }
    }

    fn check_return(&mut self, expr: Option<&mut Expr>, line: u32) {
        let declared = self.return_ty.clone();
        let found = match expr {
            Some(expr) => {
                let mut found = self.check_expr(expr);
                if found.is_void() {
                    self.error(
                        line,
                        SemanticError::VoidReturnValue {
                            method: self.method_name.clone(),
                        },
                    );
                    found = TypeName::object();
                }
                found
            }
            None => TypeName::void(),
        };

        if declared.is_primitive() || declared.is_void() {
            if found != declared {
                self.error(
                    line,
                    SemanticError::ReturnTypeMismatch {
                        found,
                        declared,
                        method: self.method_name.clone(),
                    },
                );
            }
        } else if !conforms(self.registry, &found, &declared) {
            self.error(
                line,
                SemanticError::ReturnTypeNonConforming {
                    found,
                    declared,
                    method: self.method_name.clone(),
                },
            );
        }
    }
}

/// The expression kinds that may stand alone as a statement.
fn is_legal_statement(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Assign { .. }
            | ExprKind::ArrayAssign { .. }
            | ExprKind::New { .. }
            | ExprKind::Dispatch { .. }
            | ExprKind::Unary {
                op: UnaryOp::Incr | UnaryOp::Decr,
                ..
            }
    )
}
