//! Type names and their classification.
//!
//! The language identifies types by name: the primitives `int` and `boolean`,
//! the primitive array types `int[]` and `boolean[]`, `void` as a return type,
//! and class names for everything else. `TypeName` wraps the name and carries
//! the classification helpers every pass consults, plus the JVM-style
//! descriptor mapping the code generator needs.

use std::fmt;

/// Names that no field, method, formal, or variable may carry.
pub const RESERVED_NAMES: [&str; 3] = ["null", "this", "super"];

/// Whether `name` is one of the reserved identifiers.
///
/// Every declaration site consults this one check.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// A type identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn int() -> Self {
        Self::new("int")
    }

    pub fn boolean() -> Self {
        Self::new("boolean")
    }

    pub fn void() -> Self {
        Self::new("void")
    }

    pub fn object() -> Self {
        Self::new("Object")
    }

    pub fn string() -> Self {
        Self::new("String")
    }

    /// The type of the `null` literal. Conforms to any reference type.
    pub fn null() -> Self {
        Self::new("null")
    }

    pub fn array_of(element: &TypeName) -> Self {
        Self::new(format!("{}[]", element.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_int(&self) -> bool {
        self.0 == "int"
    }

    pub fn is_boolean(&self) -> bool {
        self.0 == "boolean"
    }

    /// `int` or `boolean`. Arrays are reference types.
    pub fn is_primitive(&self) -> bool {
        self.is_int() || self.is_boolean()
    }

    pub fn is_void(&self) -> bool {
        self.0 == "void"
    }

    pub fn is_null(&self) -> bool {
        self.0 == "null"
    }

    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }

    /// The element type of an array type, `None` for non-arrays.
    pub fn element(&self) -> Option<TypeName> {
        self.0
            .strip_suffix("[]")
            .map(|element| TypeName::new(element))
    }

    /// The JVM field/return descriptor for this type.
    pub fn descriptor(&self) -> String {
        match self.0.as_str() {
            "int" => "I".into(),
            "boolean" => "Z".into(),
            "void" => "V".into(),
            "int[]" => "[I".into(),
            "boolean[]" => "[Z".into(),
            name => format!("L{};", internal_name(name)),
        }
    }

    /// The internal (slash-qualified) class name used in instruction
    /// operands and `.super` directives. Built-ins map into `java/lang`.
    pub fn internal_name(&self) -> String {
        internal_name(&self.0)
    }
}

fn internal_name(name: &str) -> String {
    match name {
        "Object" => "java/lang/Object".into(),
        "String" => "java/lang/String".into(),
        other => other.into(),
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_classification() {
        assert!(TypeName::int().is_primitive());
        assert!(TypeName::boolean().is_primitive());
        assert!(!TypeName::void().is_primitive());
        assert!(!TypeName::new("int[]").is_primitive());
        assert!(!TypeName::object().is_primitive());
    }

    #[test]
    fn array_element_stripping() {
        assert_eq!(TypeName::new("int[]").element(), Some(TypeName::int()));
        assert_eq!(
            TypeName::new("boolean[]").element(),
            Some(TypeName::boolean())
        );
        assert_eq!(TypeName::int().element(), None);
    }

    #[test]
    fn descriptors() {
        assert_eq!(TypeName::int().descriptor(), "I");
        assert_eq!(TypeName::boolean().descriptor(), "Z");
        assert_eq!(TypeName::void().descriptor(), "V");
        assert_eq!(TypeName::new("int[]").descriptor(), "[I");
        assert_eq!(TypeName::string().descriptor(), "Ljava/lang/String;");
        assert_eq!(TypeName::new("A").descriptor(), "LA;");
    }

    #[test]
    fn internal_names_map_builtins() {
        assert_eq!(TypeName::object().internal_name(), "java/lang/Object");
        assert_eq!(TypeName::new("A").internal_name(), "A");
    }

    #[test]
    fn reserved_names() {
        assert!(is_reserved("this"));
        assert!(is_reserved("super"));
        assert!(is_reserved("null"));
        assert!(!is_reserved("x"));
    }
}
