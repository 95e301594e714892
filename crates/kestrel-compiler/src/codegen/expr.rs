//! Expression lowering.
//!
//! Every expression leaves exactly one value on the operand stack, except a
//! dispatch to a `void` method which leaves none. Assignment forms keep the
//! assigned value on the stack, so they work both as statements (the caller
//! pops) and as subexpressions.

use kestrel_core::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use kestrel_core::types::TypeName;

use super::MethodGen;
use super::instr::Instr as I;

impl MethodGen<'_> {
    pub(crate) fn gen_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::IntConst(value) => self.emitter.emit(I::PushInt(*value)),
            ExprKind::BoolConst(value) => self.emitter.emit(I::PushBool(*value)),
            ExprKind::StrConst(value) => self.emitter.emit(I::PushString(value.clone())),
            ExprKind::Var { qualifier, name } => self.gen_var(qualifier.as_deref(), name),
            ExprKind::Assign {
                qualifier,
                name,
                value,
            } => self.gen_assign(qualifier.as_deref(), name, value),
            ExprKind::ArrayAssign { name, index, value } => {
                self.gen_array_assign(name, index, value)
            }
            ExprKind::Dispatch {
                receiver,
                method,
                args,
            } => self.gen_dispatch(receiver, method, args),
            ExprKind::New { class } => {
                let internal = class.internal_name();
                self.emitter.emit(I::New(internal.clone()));
                self.emitter.emit(I::Dup);
                self.emitter.emit(I::InvokeCtor(internal));
            }
            ExprKind::NewArray { element, size } => {
                self.gen_expr(size);
                self.emitter.emit(I::NewArray(element.as_str().into()));
            }
            ExprKind::InstanceOf { expr, target } => {
                self.gen_expr(expr);
                self.emitter.emit(I::Instanceof(target.internal_name()));
            }
            ExprKind::Cast { target, expr } => {
                self.gen_expr(expr);
                self.emitter.emit(I::Checkcast(target.internal_name()));
            }
            ExprKind::Binary { op, left, right } => self.gen_binary(*op, left, right),
            ExprKind::Unary { op, operand } => self.gen_unary(*op, operand),
            ExprKind::Index { target, index } => {
                self.gen_expr(target);
                self.gen_expr(index);
                self.emitter.emit(I::ArrayLoad);
            }
        }
    }

    fn gen_var(&mut self, qualifier: Option<&str>, name: &str) {
        match qualifier {
            None => match name {
                "null" => self.emitter.emit(I::PushNull),
                "this" | "super" => self.emitter.emit(I::LoadRef(0)),
                _ => {
                    if let Some(local) = self.slots.lookup(name).cloned() {
                        self.load_local(local.slot, &local.ty);
                    } else {
                        let ty = self.field_ty(name).unwrap_or_else(TypeName::object);
                        self.emitter.emit(I::LoadRef(0));
                        let class = self.class_name.clone();
                        self.get_field(&class, name, &ty);
                    }
                }
            },
            Some("super") => {
                let ty = self.super_field_ty(name).unwrap_or_else(TypeName::object);
                self.emitter.emit(I::LoadRef(0));
                let class = self.parent_class_name();
                self.get_field(&class, name, &ty);
            }
            Some(_) => {
                let ty = self.field_ty(name).unwrap_or_else(TypeName::object);
                self.emitter.emit(I::LoadRef(0));
                let class = self.class_name.clone();
                self.get_field(&class, name, &ty);
            }
        }
    }

    fn gen_assign(&mut self, qualifier: Option<&str>, name: &str, value: &Expr) {
        if qualifier.is_none()
            && let Some(local) = self.slots.lookup(name).cloned()
        {
            self.gen_expr(value);
            self.emitter.emit(I::Dup);
            self.store_local(local.slot, &local.ty);
            return;
        }

        let (class, ty) = match qualifier {
            Some("super") => (
                self.parent_class_name(),
                self.super_field_ty(name).unwrap_or_else(TypeName::object),
            ),
            _ => (
                self.class_name.clone(),
                self.field_ty(name).unwrap_or_else(TypeName::object),
            ),
        };
        self.emitter.emit(I::LoadRef(0));
        self.gen_expr(value);
        self.emitter.emit(I::DupX1);
        self.put_field(&class, name, &ty);
    }

    fn gen_array_assign(&mut self, name: &str, index: &Expr, value: &Expr) {
        if let Some(local) = self.slots.lookup(name).cloned() {
            self.emitter.emit(I::LoadRef(local.slot));
        } else {
            let ty = self.field_ty(name).unwrap_or_else(TypeName::object);
            self.emitter.emit(I::LoadRef(0));
            let class = self.class_name.clone();
            self.get_field(&class, name, &ty);
        }
        self.gen_expr(index);
        self.gen_expr(value);
        // The stored value is the expression's value; keep a copy beneath
        // the three operands the store consumes.
        self.emitter.emit(I::DupX2);
        self.emitter.emit(I::ArrayStore);
    }

    fn gen_dispatch(&mut self, receiver: &Expr, method: &str, args: &[Expr]) {
        self.gen_expr(receiver);
        for arg in args {
            self.gen_expr(arg);
        }

        let receiver_ty = Self::ty_of(receiver);
        let class_name = if receiver_ty.is_array() {
            TypeName::object()
        } else {
            receiver_ty
        };
        let sig = self
            .registry
            .resolve(class_name.as_str())
            .and_then(|id| self.registry.node(id).methods.lookup(method))
            .cloned();
        let (desc, returns_value) = match sig {
            Some(sig) => (sig.descriptor(), !sig.return_ty.is_void()),
            // Unreachable on a clean program; keep the stream well formed.
            None => ("()V".into(), false),
        };
        self.emitter.emit(I::InvokeVirtual {
            class: class_name.internal_name(),
            method: method.into(),
            desc,
            argc: args.len(),
            returns_value,
        });
    }

    fn gen_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) {
        self.gen_expr(left);
        self.gen_expr(right);
        let instr = match op {
            BinaryOp::Plus => I::Add,
            BinaryOp::Minus => I::Sub,
            BinaryOp::Times => I::Mul,
            BinaryOp::Divide => I::Div,
            BinaryOp::Modulus => I::Rem,
            BinaryOp::Lt => I::CmpLt,
            BinaryOp::Le => I::CmpLe,
            BinaryOp::Gt => I::CmpGt,
            BinaryOp::Ge => I::CmpGe,
            BinaryOp::And => I::And,
            BinaryOp::Or => I::Or,
            // Equality picks the comparison family from the operands'
            // static types; references compare by identity.
            BinaryOp::Eq | BinaryOp::Ne => {
                let negated = matches!(op, BinaryOp::Ne);
                match (negated, Self::ty_of(left).is_primitive()) {
                    (false, true) => I::CmpEq,
                    (true, true) => I::CmpNe,
                    (false, false) => I::RefCmpEq,
                    (true, false) => I::RefCmpNe,
                }
            }
        };
        self.emitter.emit(instr);
    }

    fn gen_unary(&mut self, op: UnaryOp, operand: &Expr) {
        match op {
            UnaryOp::Neg => {
                self.gen_expr(operand);
                self.emitter.emit(I::Neg);
            }
            UnaryOp::Not => {
                self.gen_expr(operand);
                self.emitter.emit(I::Not);
            }
            UnaryOp::Incr | UnaryOp::Decr => {
                let step = match op {
                    UnaryOp::Incr => I::Add,
                    _ => I::Sub,
                };
                let ExprKind::Var { qualifier, name } = &operand.kind else {
                    // Rejected by the checker; lower as a plain read.
                    self.gen_expr(operand);
                    return;
                };
                let name = name.clone();
                if qualifier.is_none()
                    && let Some(local) = self.slots.lookup(&name).cloned()
                {
                    let slot = local.slot;
                    self.emitter.emit(I::LoadInt(slot));
                    self.emitter.emit(I::PushInt(1));
                    self.emitter.emit(step);
                    self.emitter.emit(I::Dup);
                    self.emitter.emit(I::StoreInt(slot));
                    return;
                }
                let (class, ty) = match qualifier.as_deref() {
                    Some("super") => (
                        self.parent_class_name(),
                        self.super_field_ty(&name).unwrap_or_else(TypeName::int),
                    ),
                    _ => (
                        self.class_name.clone(),
                        self.field_ty(&name).unwrap_or_else(TypeName::int),
                    ),
                };
                self.emitter.emit(I::LoadRef(0));
                self.emitter.emit(I::LoadRef(0));
                self.get_field(&class, &name, &ty);
                self.emitter.emit(I::PushInt(1));
                self.emitter.emit(step);
                self.emitter.emit(I::DupX1);
                self.put_field(&class, &name, &ty);
            }
        }
    }
}
