//! Semantic error taxonomy.
//!
//! One variant per diagnostic kind the passes can raise. Variants carry the
//! names and types involved; the `#[error]` messages are the exact text the
//! diagnostics sink records. Three families:
//!
//! - declaration errors (reserved/duplicate names, undefined declared types)
//! - override-incompatibility errors (return type, arity, per-formal type)
//! - type errors (predicates, operators, assignments, dispatch, casts, ...)

use thiserror::Error;

use crate::types::TypeName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    // ========================================================================
    // Declaration errors
    // ========================================================================
    /// A declaration uses one of the reserved identifiers.
    /// `kind` is the declaration site: "fields", "methods", "formals",
    /// or "variables".
    #[error("{kind} cannot be named '{name}'")]
    ReservedName { kind: &'static str, name: String },

    #[error("field '{name}' is already defined in class '{class}'")]
    DuplicateField { name: String, class: String },

    #[error("method '{name}' is already defined in class '{class}'")]
    DuplicateMethod { name: String, class: String },

    #[error("formal '{name}' is already defined in method '{method}'")]
    DuplicateFormal { name: String, method: String },

    #[error("variable '{name}' is already defined in method '{method}'")]
    DuplicateVariable { name: String, method: String },

    #[error("type '{ty}' of field '{name}' is undefined")]
    UndefinedFieldType { ty: TypeName, name: String },

    #[error("return type '{ty}' of method '{name}' is undefined")]
    UndefinedReturnType { ty: TypeName, name: String },

    #[error("type '{ty}' of formal '{name}' is undefined")]
    UndefinedFormalType { ty: TypeName, name: String },

    #[error("type '{ty}' of variable '{name}' is undefined")]
    UndefinedVariableType { ty: TypeName, name: String },

    // ========================================================================
    // Override-incompatibility errors
    // ========================================================================
    #[error(
        "overriding method '{name}' has return type '{found}', which differs \
         from the inherited method's return type '{inherited}'"
    )]
    OverrideReturnMismatch {
        name: String,
        found: TypeName,
        inherited: TypeName,
    },

    #[error(
        "overriding method '{name}' has {found} formals, which differs from \
         the inherited method ({inherited})"
    )]
    OverrideArityMismatch {
        name: String,
        found: usize,
        inherited: usize,
    },

    #[error(
        "overriding method '{name}' has formal type '{found}' for formal \
         {position}, which differs from the inherited method's formal type \
         '{inherited}'"
    )]
    OverrideFormalMismatch {
        name: String,
        position: usize,
        found: TypeName,
        inherited: TypeName,
    },

    // ========================================================================
    // Type errors: initializers, statements, control flow
    // ========================================================================
    #[error("expression type 'void' of field '{name}' cannot be void")]
    VoidFieldInit { name: String },

    #[error(
        "expression type '{found}' of field '{name}' does not match declared \
         type '{declared}'"
    )]
    FieldInitMismatch {
        found: TypeName,
        name: String,
        declared: TypeName,
    },

    #[error(
        "expression type '{found}' of field '{name}' does not conform to \
         declared type '{declared}'"
    )]
    FieldInitNonConforming {
        found: TypeName,
        name: String,
        declared: TypeName,
    },

    #[error(
        "expression type '{found}' of variable '{name}' does not match \
         declared type '{declared}'"
    )]
    DeclInitMismatch {
        found: TypeName,
        name: String,
        declared: TypeName,
    },

    #[error(
        "expression type '{found}' of variable '{name}' does not conform to \
         declared type '{declared}'"
    )]
    DeclInitNonConforming {
        found: TypeName,
        name: String,
        declared: TypeName,
    },

    #[error("not a statement")]
    NotAStatement,

    /// `construct` is "if", "while", or "for".
    #[error("predicate in {construct}-statement does not have type boolean")]
    NonBooleanPredicate { construct: &'static str },

    #[error("return expression in method '{method}' cannot have type 'void'")]
    VoidReturnValue { method: String },

    #[error(
        "return type '{found}' is not compatible with declared return type \
         '{declared}' in method '{method}'"
    )]
    ReturnTypeMismatch {
        found: TypeName,
        declared: TypeName,
        method: String,
    },

    #[error(
        "return type '{found}' does not conform to declared return type \
         '{declared}' in method '{method}'"
    )]
    ReturnTypeNonConforming {
        found: TypeName,
        declared: TypeName,
        method: String,
    },

    #[error("break statement is not inside a loop")]
    BreakOutsideLoop,

    // ========================================================================
    // Type errors: dispatch
    // ========================================================================
    #[error("methods cannot be invoked on an expression of type '{ty}'")]
    BadDispatchReceiver { ty: TypeName },

    #[error("method '{method}' is not defined in class '{class}'")]
    UnknownMethod { method: String, class: String },

    #[error(
        "method '{method}' in class '{class}' takes {expected} arguments, \
         but {found} were provided"
    )]
    DispatchArityMismatch {
        method: String,
        class: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {position} for method '{method}' cannot have type 'void'")]
    VoidArgument { position: usize, method: String },

    #[error(
        "argument {position} for method '{method}' has type '{found}', \
         but expected '{expected}'"
    )]
    ArgumentTypeMismatch {
        position: usize,
        method: String,
        found: TypeName,
        expected: TypeName,
    },

    // ========================================================================
    // Type errors: construction, arrays, instanceof, casts
    // ========================================================================
    #[error("type '{ty}' is primitive and cannot be constructed")]
    NewPrimitive { ty: TypeName },

    #[error("type '{ty}' of new-expression is undefined")]
    NewUndefined { ty: TypeName },

    #[error("array size must be of type 'int', but found '{found}'")]
    ArraySizeNotInt { found: TypeName },

    #[error("arrays may only have element type 'int' or 'boolean', not '{ty}'")]
    BadArrayElementType { ty: TypeName },

    #[error("cannot index non-array type '{ty}'")]
    IndexNonArray { ty: TypeName },

    #[error("array index must be of type 'int', but found '{found}'")]
    IndexNotInt { found: TypeName },

    #[error("the lefthand expression of instanceof cannot have type '{ty}'")]
    BadInstanceofOperand { ty: TypeName },

    #[error("the righthand type '{ty}' of instanceof must be a declared class")]
    BadInstanceofTarget { ty: TypeName },

    #[error("cannot cast to primitive type '{ty}'")]
    CastPrimitiveTarget { ty: TypeName },

    #[error("cast target type '{ty}' is undefined")]
    CastUndefinedTarget { ty: TypeName },

    #[error("cannot cast an expression of primitive type '{ty}'")]
    CastPrimitiveOperand { ty: TypeName },

    #[error("inconvertible types; cannot cast '{from}' to '{to}'")]
    CastInconvertible { from: TypeName, to: TypeName },

    // ========================================================================
    // Type errors: operators and assignment
    // ========================================================================
    /// `side` is "lefthand" or "righthand".
    #[error(
        "the {side} type '{found}' in the binary operation ('{op}') is \
         incorrect; should have been: {expected}"
    )]
    BinaryOperandMismatch {
        op: &'static str,
        side: &'static str,
        found: TypeName,
        expected: TypeName,
    },

    #[error(
        "the lefthand type '{left}' and righthand type '{right}' in the \
         binary operation ('{op}') are not compatible"
    )]
    IncomparableTypes {
        op: &'static str,
        left: TypeName,
        right: TypeName,
    },

    #[error(
        "the expression type '{found}' in the unary operation ('{op}') is \
         incorrect; should have been: {expected}"
    )]
    UnaryOperandMismatch {
        op: &'static str,
        found: TypeName,
        expected: TypeName,
    },

    #[error("the operand of ('{op}') must be a variable")]
    OperandNotAssignable { op: &'static str },

    #[error("variable '{name}' is not defined")]
    UndeclaredVariable { name: String },

    #[error(
        "fields are not accessible through '{qualifier}'; only 'this' and \
         'super' are legal qualifiers"
    )]
    IllegalFieldQualifier { qualifier: String },

    #[error(
        "the righthand type '{found}' does not conform to the lefthand type \
         '{declared}' in assignment to '{name}'"
    )]
    IncompatibleAssignment {
        found: TypeName,
        declared: TypeName,
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_diagnostic_wording() {
        let err = SemanticError::DuplicateField {
            name: "x".into(),
            class: "A".into(),
        };
        assert_eq!(err.to_string(), "field 'x' is already defined in class 'A'");

        let err = SemanticError::OverrideReturnMismatch {
            name: "foo".into(),
            found: TypeName::boolean(),
            inherited: TypeName::int(),
        };
        assert_eq!(
            err.to_string(),
            "overriding method 'foo' has return type 'boolean', which differs \
             from the inherited method's return type 'int'"
        );

        let err = SemanticError::ReservedName {
            kind: "fields",
            name: "this".into(),
        };
        assert_eq!(err.to_string(), "fields cannot be named 'this'");
    }
}
