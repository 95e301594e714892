//! Abstract syntax tree.
//!
//! The tree arrives from the parser unannotated. Statements and expressions
//! are closed tagged variants so each pass is an exhaustive match: adding a
//! node kind fails to compile until every pass handles it.
//!
//! Every [`Expr`] carries a resolved-type slot (`ty`) that the type checker
//! writes exactly once; the code generator only reads it. An untyped node
//! reaching the code generator is a driver bug (codegen must be gated on a
//! clean diagnostics sink).

use crate::types::TypeName;

/// A whole compilation: every class in the run.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub classes: Vec<Class>,
}

/// One class declaration.
#[derive(Debug, Clone)]
pub struct Class {
    /// Source file the class was parsed from, carried into diagnostics.
    pub file: String,
    pub name: String,
    /// Declared parent class. Classes without an `extends` clause are
    /// parented to `Object` by the parser.
    pub parent: String,
    pub line: u32,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub enum Member {
    Field(Field),
    Method(Method),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: TypeName,
    pub init: Option<Expr>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub return_ty: TypeName,
    pub formals: Vec<Formal>,
    pub body: Vec<Stmt>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct Formal {
    pub name: String,
    pub ty: TypeName,
    pub line: u32,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `T name = init;`
    Decl {
        name: String,
        ty: TypeName,
        init: Expr,
        line: u32,
    },
    /// An expression in statement position.
    Expr { expr: Expr, line: u32 },
    If {
        pred: Expr,
        then_stmt: Box<Stmt>,
        else_stmt: Option<Box<Stmt>>,
        line: u32,
    },
    While {
        pred: Expr,
        body: Box<Stmt>,
        line: u32,
    },
    For {
        init: Option<Expr>,
        pred: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
        line: u32,
    },
    Break { line: u32 },
    Block { stmts: Vec<Stmt>, line: u32 },
    Return { expr: Option<Expr>, line: u32 },
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Stmt::Decl { line, .. }
            | Stmt::Expr { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::For { line, .. }
            | Stmt::Break { line }
            | Stmt::Block { line, .. }
            | Stmt::Return { line, .. } => *line,
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression node with its resolved-type slot.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
    /// Written once by the type checker, read by the code generator.
    pub ty: Option<TypeName>,
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Self {
            kind,
            line,
            ty: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// `name = value`, `this.name = value`, `super.name = value`.
    Assign {
        qualifier: Option<String>,
        name: String,
        value: Box<Expr>,
    },
    /// `name[index] = value`.
    ArrayAssign {
        name: String,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    /// `receiver.method(args)`. Bare calls are parsed with a `this` receiver.
    Dispatch {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// `new T()`.
    New { class: TypeName },
    /// `new T[size]`.
    NewArray { element: TypeName, size: Box<Expr> },
    /// `expr instanceof T`.
    InstanceOf { expr: Box<Expr>, target: TypeName },
    /// `(T)(expr)`.
    Cast { target: TypeName, expr: Box<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `name`, `this.name`, `super.name`; also the bare keywords `this`,
    /// `super`, and `null` (with no qualifier).
    Var {
        qualifier: Option<String>,
        name: String,
    },
    /// `target[index]`.
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    IntConst(i32),
    BoolConst(bool),
    StrConst(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Divide,
    Modulus,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulus => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_arith(self) -> bool {
        matches!(
            self,
            BinaryOp::Plus
                | BinaryOp::Minus
                | BinaryOp::Times
                | BinaryOp::Divide
                | BinaryOp::Modulus
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    pub fn is_relational(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// The fixed operand type each side must match, `None` for the equality
    /// operators (which compare any two reference types).
    pub fn operand_ty(self) -> Option<TypeName> {
        if self.is_arith() || self.is_relational() {
            Some(TypeName::int())
        } else if self.is_logical() {
            Some(TypeName::boolean())
        } else {
            None
        }
    }

    pub fn result_ty(self) -> TypeName {
        if self.is_arith() {
            TypeName::int()
        } else {
            TypeName::boolean()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation `-`.
    Neg,
    /// Logical complement `!`.
    Not,
    /// `++` (operand must be an `int` variable).
    Incr,
    /// `--` (operand must be an `int` variable).
    Decr,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Incr => "++",
            UnaryOp::Decr => "--",
        }
    }

    pub fn operand_ty(self) -> TypeName {
        match self {
            UnaryOp::Not => TypeName::boolean(),
            UnaryOp::Neg | UnaryOp::Incr | UnaryOp::Decr => TypeName::int(),
        }
    }

    pub fn result_ty(self) -> TypeName {
        self.operand_ty()
    }
}
