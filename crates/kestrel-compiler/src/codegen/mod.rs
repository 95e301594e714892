//! Code generation.
//!
//! Third pass: lowers a type-checked program to textual stack-machine
//! assembly, one emitted class per source class. Runs only over programs the
//! earlier passes found clean, so resolution here never fails; every
//! expression node carries the static type the checker assigned.
//!
//! All mutable emission state (instructions, depth history, local slots,
//! label counter, loop stack) lives in a [`MethodEmitter`] constructed fresh
//! for each method body.

pub mod class;
pub mod emit;
mod expr;
pub mod instr;
mod stmt;

pub use class::{CodeGenerator, EmittedClass, EmittedField, EmittedMethod};
pub use emit::MethodEmitter;
pub use instr::{Instr, Label};

use kestrel_core::ast::{Expr, Method};
use kestrel_core::types::TypeName;
use kestrel_registry::{ClassId, ClassRegistry, SymbolTable};

use instr::Instr as I;

/// A local's assigned slot and declared type. The type picks the load and
/// store instruction family.
#[derive(Debug, Clone)]
pub(crate) struct Local {
    pub(crate) slot: u16,
    pub(crate) ty: TypeName,
}

/// Lowers one method body. Locals are mapped to slots in a scoped table that
/// mirrors the checker's scoping, with slot 0 reserved for the receiver.
pub(crate) struct MethodGen<'a> {
    pub(crate) registry: &'a ClassRegistry,
    pub(crate) class_id: ClassId,
    pub(crate) class_name: String,
    pub(crate) return_ty: TypeName,
    pub(crate) emitter: MethodEmitter,
    pub(crate) slots: SymbolTable<Local>,
}

impl<'a> MethodGen<'a> {
    pub(crate) fn new(registry: &'a ClassRegistry, class_id: ClassId, method: &Method) -> Self {
        let mut method_gen = Self {
            registry,
            class_name: registry.node(class_id).name.clone(),
            class_id,
            return_ty: method.return_ty.clone(),
            emitter: MethodEmitter::new(),
            slots: SymbolTable::new(),
        };
        method_gen.slots.enter_scope();
        for formal in &method.formals {
            let slot = method_gen.emitter.alloc_slot();
            method_gen.slots.add(
                formal.name.clone(),
                Local {
                    slot,
                    ty: formal.ty.clone(),
                },
            );
        }
        method_gen
    }

    pub(crate) fn run(mut self, method: &Method) -> (Vec<I>, u32, u16) {
        for stmt in &method.body {
            self.gen_stmt(stmt);
        }
        if !self.emitter.ends_with_return() {
            self.gen_default_return();
        }
        let max_stack = self.emitter.max_stack();
        let max_locals = self.emitter.locals_limit();
        (self.emitter.into_instrs(), max_stack, max_locals)
    }

    /// Fall-through guard when the body does not end in an explicit return.
    fn gen_default_return(&mut self) {
        if self.return_ty.is_void() {
            self.emitter.emit(I::ReturnVoid);
        } else if self.return_ty.is_primitive() {
            self.emitter.emit(I::PushInt(0));
            self.emitter.emit(I::ReturnInt);
        } else {
            self.emitter.emit(I::PushNull);
            self.emitter.emit(I::ReturnRef);
        }
    }

    // ========================================================================
    // Shared lowering helpers
    // ========================================================================

    /// The static type the checker assigned to `expr`.
    pub(crate) fn ty_of(expr: &Expr) -> TypeName {
        expr.ty.clone().unwrap_or_else(TypeName::object)
    }

    pub(crate) fn load_local(&mut self, slot: u16, ty: &TypeName) {
        if ty.is_primitive() {
            self.emitter.emit(I::LoadInt(slot));
        } else {
            self.emitter.emit(I::LoadRef(slot));
        }
    }

    pub(crate) fn store_local(&mut self, slot: u16, ty: &TypeName) {
        if ty.is_primitive() {
            self.emitter.emit(I::StoreInt(slot));
        } else {
            self.emitter.emit(I::StoreRef(slot));
        }
    }

    /// The declared type of a field visible in this class.
    pub(crate) fn field_ty(&self, name: &str) -> Option<TypeName> {
        self.registry
            .node(self.class_id)
            .fields
            .lookup(name)
            .cloned()
    }

    pub(crate) fn super_field_ty(&self, name: &str) -> Option<TypeName> {
        let parent = self.registry.node(self.class_id).parent?;
        self.registry.node(parent).fields.lookup(name).cloned()
    }

    pub(crate) fn parent_class_name(&self) -> String {
        match self.registry.node(self.class_id).parent {
            Some(parent) => self.registry.node(parent).name.clone(),
            None => "Object".into(),
        }
    }

    pub(crate) fn get_field(&mut self, class: &str, name: &str, ty: &TypeName) {
        self.emitter.emit(I::GetField {
            class: TypeName::new(class).internal_name(),
            name: name.into(),
            desc: ty.descriptor(),
        });
    }

    pub(crate) fn put_field(&mut self, class: &str, name: &str, ty: &TypeName) {
        self.emitter.emit(I::PutField {
            class: TypeName::new(class).internal_name(),
            name: name.into(),
            desc: ty.descriptor(),
        });
    }
}
