//! Statement lowering.
//!
//! Statements are stack neutral: whatever a statement pushes it also
//! consumes, so the depth before and after any statement is equal. That
//! property is what makes the linear depth history in the emitter sound
//! across branches.

use kestrel_core::ast::{Expr, Stmt};

use super::instr::Instr as I;
use super::{Local, MethodGen};

impl MethodGen<'_> {
    pub(crate) fn gen_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl {
                name, ty, init, ..
            } => {
                self.gen_expr(init);
                let slot = self.emitter.alloc_slot();
                self.store_local(slot, ty);
                self.slots.add(
                    name.clone(),
                    Local {
                        slot,
                        ty: ty.clone(),
                    },
                );
            }
            Stmt::Expr { expr, .. } => {
                self.gen_expr(expr);
                self.discard_value(expr);
            }
            Stmt::If {
                pred,
                then_stmt,
                else_stmt,
                ..
            } => self.gen_if(pred, then_stmt, else_stmt.as_deref()),
            Stmt::While { pred, body, .. } => self.gen_while(pred, body),
            Stmt::For {
                init,
                pred,
                update,
                body,
                ..
            } => self.gen_for(init.as_ref(), pred.as_ref(), update.as_ref(), body),
            Stmt::Break { .. } => {
                if let Some(end) = self.emitter.break_target() {
                    self.emitter.emit(I::Goto(end));
                }
            }
            Stmt::Block { stmts, .. } => {
                self.slots.enter_scope();
                for stmt in stmts {
                    self.gen_stmt(stmt);
                }
                self.slots.exit_scope();
            }
            Stmt::Return { expr, .. } => {
                match expr {
                    Some(expr) => {
                        self.gen_expr(expr);
                        if self.return_ty.is_primitive() {
                            self.emitter.emit(I::ReturnInt);
                        } else {
                            self.emitter.emit(I::ReturnRef);
                        }
                    }
                    None => self.emitter.emit(I::ReturnVoid),
                }
            }
        }
    }

    fn gen_if(&mut self, pred: &Expr, then_stmt: &Stmt, else_stmt: Option<&Stmt>) {
        self.gen_expr(pred);
        match else_stmt {
            Some(else_stmt) => {
                let else_label = self.emitter.fresh_label();
                let end_label = self.emitter.fresh_label();
                self.emitter.emit(I::BranchFalse(else_label));
                self.gen_stmt(then_stmt);
                self.emitter.emit(I::Goto(end_label));
                self.emitter.mark(else_label);
                self.gen_stmt(else_stmt);
                self.emitter.mark(end_label);
            }
            None => {
                let end_label = self.emitter.fresh_label();
                self.emitter.emit(I::BranchFalse(end_label));
                self.gen_stmt(then_stmt);
                self.emitter.mark(end_label);
            }
        }
    }

    fn gen_while(&mut self, pred: &Expr, body: &Stmt) {
        let start = self.emitter.fresh_label();
        let end = self.emitter.fresh_label();
        self.emitter.mark(start);
        self.gen_expr(pred);
        self.emitter.emit(I::BranchFalse(end));
        self.emitter.enter_loop(end);
        self.gen_stmt(body);
        self.emitter.exit_loop();
        self.emitter.emit(I::Goto(start));
        self.emitter.mark(end);
    }

    fn gen_for(
        &mut self,
        init: Option<&Expr>,
        pred: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) {
        if let Some(init) = init {
            self.gen_expr(init);
            self.discard_value(init);
        }
        let start = self.emitter.fresh_label();
        let end = self.emitter.fresh_label();
        self.emitter.mark(start);
        if let Some(pred) = pred {
            self.gen_expr(pred);
            self.emitter.emit(I::BranchFalse(end));
        }
        self.emitter.enter_loop(end);
        self.gen_stmt(body);
        self.emitter.exit_loop();
        // The update runs under its own label so the fall-through edge out
        // of the body is explicit in the stream.
        let update_label = self.emitter.fresh_label();
        self.emitter.mark(update_label);
        if let Some(update) = update {
            self.gen_expr(update);
            self.discard_value(update);
        }
        self.emitter.emit(I::Goto(start));
        self.emitter.mark(end);
    }

    /// Pop the value an expression statement left behind, if it left one.
    fn discard_value(&mut self, expr: &Expr) {
        if !Self::ty_of(expr).is_void() {
            self.emitter.emit(I::Pop);
        }
    }
}
