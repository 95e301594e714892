//! Per-method emission state.
//!
//! Every method body gets a freshly constructed emitter. The operand stack
//! depth is tracked at every emitted instruction by applying the
//! instruction's intrinsic effect, and the whole depth history is kept so
//! the stack limit is the recorded high-water mark rather than a running
//! maximum that a later refactor could forget to update.
//!
//! Local slot 0 is always the receiver, so slot allocation starts at 1.

use super::instr::{Instr, Label};

pub struct MethodEmitter {
    instrs: Vec<Instr>,
    depth: i32,
    history: Vec<i32>,
    next_slot: u16,
    next_label: u32,
    // Innermost-last stack of loop end labels, the targets for break.
    loop_ends: Vec<Label>,
}

impl MethodEmitter {
    pub fn new() -> Self {
        Self {
            instrs: Vec::new(),
            depth: 0,
            history: vec![0],
            next_slot: 1,
            next_label: 0,
            loop_ends: Vec::new(),
        }
    }

    pub fn emit(&mut self, instr: Instr) {
        self.depth += instr.stack_effect();
        debug_assert!(self.depth >= 0, "operand stack underflow at {instr}");
        self.history.push(self.depth);
        self.instrs.push(instr);
    }

    pub fn fresh_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn mark(&mut self, label: Label) {
        self.emit(Instr::LabelDef(label));
    }

    pub fn alloc_slot(&mut self) -> u16 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    pub fn enter_loop(&mut self, end: Label) {
        self.loop_ends.push(end);
    }

    pub fn exit_loop(&mut self) {
        self.loop_ends.pop();
    }

    /// The end label of the innermost enclosing loop, if any.
    pub fn break_target(&self) -> Option<Label> {
        self.loop_ends.last().copied()
    }

    /// High-water mark of the operand stack over the whole body.
    pub fn max_stack(&self) -> u32 {
        self.history.iter().copied().max().unwrap_or(0).max(0) as u32
    }

    /// Slot count for the `.limit locals` directive, receiver included.
    pub fn locals_limit(&self) -> u16 {
        self.next_slot
    }

    pub fn ends_with_return(&self) -> bool {
        self.instrs.last().is_some_and(Instr::is_return)
    }

    pub fn into_instrs(self) -> Vec<Instr> {
        self.instrs
    }
}

impl Default for MethodEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_water_mark_survives_later_pops() {
        let mut emitter = MethodEmitter::new();
        emitter.emit(Instr::PushInt(1));
        emitter.emit(Instr::PushInt(2));
        emitter.emit(Instr::PushInt(3));
        emitter.emit(Instr::Add);
        emitter.emit(Instr::Add);
        emitter.emit(Instr::Pop);
        assert_eq!(emitter.max_stack(), 3);
    }

    #[test]
    fn empty_body_has_zero_stack() {
        let emitter = MethodEmitter::new();
        assert_eq!(emitter.max_stack(), 0);
        assert!(!emitter.ends_with_return());
    }

    #[test]
    fn slots_start_after_receiver() {
        let mut emitter = MethodEmitter::new();
        assert_eq!(emitter.alloc_slot(), 1);
        assert_eq!(emitter.alloc_slot(), 2);
        assert_eq!(emitter.locals_limit(), 3);
    }

    #[test]
    fn labels_are_unique_per_emitter() {
        let mut emitter = MethodEmitter::new();
        let a = emitter.fresh_label();
        let b = emitter.fresh_label();
        assert_ne!(a, b);

        let mut other = MethodEmitter::new();
        assert_eq!(other.fresh_label(), a);
    }

    #[test]
    fn break_target_is_innermost() {
        let mut emitter = MethodEmitter::new();
        assert_eq!(emitter.break_target(), None);
        let outer = emitter.fresh_label();
        let inner = emitter.fresh_label();
        emitter.enter_loop(outer);
        emitter.enter_loop(inner);
        assert_eq!(emitter.break_target(), Some(inner));
        emitter.exit_loop();
        assert_eq!(emitter.break_target(), Some(outer));
        emitter.exit_loop();
        assert_eq!(emitter.break_target(), None);
    }

    #[test]
    fn return_detection() {
        let mut emitter = MethodEmitter::new();
        emitter.emit(Instr::PushInt(0));
        emitter.emit(Instr::ReturnInt);
        assert!(emitter.ends_with_return());
    }
}
