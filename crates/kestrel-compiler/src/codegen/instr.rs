//! The textual stack-machine instruction set.
//!
//! A closed set of instruction variants with, for each one, its net operand
//! stack effect. The effect is intrinsic to the instruction kind, so the
//! emitter can maintain a sound depth history no matter which pass emits
//! what. Rendering is Jasmin-flavored text handed to an external assembler.

use std::fmt;

/// A branch target, unique within one method's instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One emitted instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    // Constants
    PushInt(i32),
    PushBool(bool),
    PushString(String),
    PushNull,

    // Locals
    LoadInt(u16),
    LoadRef(u16),
    StoreInt(u16),
    StoreRef(u16),

    // Fields (by qualified name and type descriptor)
    GetField {
        class: String,
        name: String,
        desc: String,
    },
    PutField {
        class: String,
        name: String,
        desc: String,
    },

    // Arrays
    ArrayLoad,
    ArrayStore,
    NewArray(String),

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,

    // Comparison (pop two ints, push boolean)
    CmpEq,
    CmpNe,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,
    // Reference comparison
    RefCmpEq,
    RefCmpNe,

    // Logical
    And,
    Or,
    Not,

    // Stack shuffling
    Dup,
    DupX1,
    DupX2,
    Pop,

    // Objects
    New(String),
    InvokeCtor(String),
    InvokeVirtual {
        class: String,
        method: String,
        desc: String,
        argc: usize,
        returns_value: bool,
    },
    Instanceof(String),
    Checkcast(String),

    // Control flow
    BranchFalse(Label),
    Goto(Label),
    LabelDef(Label),

    // Returns
    ReturnInt,
    ReturnRef,
    ReturnVoid,
}

impl Instr {
    /// Net change to the operand stack depth when this instruction runs.
    pub fn stack_effect(&self) -> i32 {
        match self {
            Instr::PushInt(_)
            | Instr::PushBool(_)
            | Instr::PushString(_)
            | Instr::PushNull
            | Instr::LoadInt(_)
            | Instr::LoadRef(_)
            | Instr::Dup
            | Instr::DupX1
            | Instr::DupX2
            | Instr::New(_) => 1,

            // Field loads replace the reference with the value; array
            // allocation replaces the size with the reference.
            Instr::GetField { .. }
            | Instr::NewArray(_)
            | Instr::Neg
            | Instr::Not
            | Instr::Instanceof(_)
            | Instr::Checkcast(_)
            | Instr::Goto(_)
            | Instr::LabelDef(_)
            | Instr::ReturnVoid => 0,

            Instr::StoreInt(_)
            | Instr::StoreRef(_)
            | Instr::Pop
            | Instr::InvokeCtor(_)
            | Instr::BranchFalse(_)
            | Instr::ReturnInt
            | Instr::ReturnRef
            | Instr::Add
            | Instr::Sub
            | Instr::Mul
            | Instr::Div
            | Instr::Rem
            | Instr::CmpEq
            | Instr::CmpNe
            | Instr::CmpLt
            | Instr::CmpLe
            | Instr::CmpGt
            | Instr::CmpGe
            | Instr::RefCmpEq
            | Instr::RefCmpNe
            | Instr::And
            | Instr::Or => -1,

            Instr::PutField { .. } => -2,
            Instr::ArrayLoad => -1,
            Instr::ArrayStore => -3,

            Instr::InvokeVirtual {
                argc,
                returns_value,
                ..
            } => {
                let popped = 1 + *argc as i32;
                if *returns_value { 1 - popped } else { -popped }
            }
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Instr::ReturnInt | Instr::ReturnRef | Instr::ReturnVoid)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::PushInt(value) => write!(f, "ldc {value}"),
            Instr::PushBool(true) => f.write_str("iconst_1"),
            Instr::PushBool(false) => f.write_str("iconst_0"),
            Instr::PushString(value) => write!(f, "ldc \"{value}\""),
            Instr::PushNull => f.write_str("aconst_null"),
            Instr::LoadInt(slot) => write!(f, "iload {slot}"),
            Instr::LoadRef(slot) => write!(f, "aload {slot}"),
            Instr::StoreInt(slot) => write!(f, "istore {slot}"),
            Instr::StoreRef(slot) => write!(f, "astore {slot}"),
            Instr::GetField { class, name, desc } => {
                write!(f, "getfield {class}/{name} {desc}")
            }
            Instr::PutField { class, name, desc } => {
                write!(f, "putfield {class}/{name} {desc}")
            }
            Instr::ArrayLoad => f.write_str("iaload"),
            Instr::ArrayStore => f.write_str("iastore"),
            Instr::NewArray(element) => write!(f, "newarray {element}"),
            Instr::Add => f.write_str("iadd"),
            Instr::Sub => f.write_str("isub"),
            Instr::Mul => f.write_str("imul"),
            Instr::Div => f.write_str("idiv"),
            Instr::Rem => f.write_str("irem"),
            Instr::Neg => f.write_str("ineg"),
            Instr::CmpEq => f.write_str("icmpeq"),
            Instr::CmpNe => f.write_str("icmpne"),
            Instr::CmpLt => f.write_str("icmplt"),
            Instr::CmpLe => f.write_str("icmple"),
            Instr::CmpGt => f.write_str("icmpgt"),
            Instr::CmpGe => f.write_str("icmpge"),
            Instr::RefCmpEq => f.write_str("acmpeq"),
            Instr::RefCmpNe => f.write_str("acmpne"),
            Instr::And => f.write_str("iand"),
            Instr::Or => f.write_str("ior"),
            Instr::Not => f.write_str("inot"),
            Instr::Dup => f.write_str("dup"),
            Instr::DupX1 => f.write_str("dup_x1"),
            Instr::DupX2 => f.write_str("dup_x2"),
            Instr::Pop => f.write_str("pop"),
            Instr::New(class) => write!(f, "new {class}"),
            Instr::InvokeCtor(class) => write!(f, "invokespecial {class}/<init>()V"),
            Instr::InvokeVirtual {
                class,
                method,
                desc,
                ..
            } => write!(f, "invokevirtual {class}/{method}{desc}"),
            Instr::Instanceof(class) => write!(f, "instanceof {class}"),
            Instr::Checkcast(class) => write!(f, "checkcast {class}"),
            Instr::BranchFalse(label) => write!(f, "ifeq {label}"),
            Instr::Goto(label) => write!(f, "goto {label}"),
            Instr::LabelDef(label) => write!(f, "{label}:"),
            Instr::ReturnInt => f.write_str("ireturn"),
            Instr::ReturnRef => f.write_str("areturn"),
            Instr::ReturnVoid => f.write_str("return"),
        }
    }
}
