//! Compatibility and conformance relations.
//!
//! `compatible` is exact type equality and governs primitives everywhere.
//! `conforms` is the reference-type relation: equality, acceptance by the
//! universal reference type `Object`, `null` conforming to any reference
//! type, and ancestor-chain subtyping (a class conforms to every class above
//! it in the hierarchy).

use kestrel_core::types::TypeName;
use kestrel_registry::ClassRegistry;

/// Exact type equality.
pub fn compatible(a: &TypeName, b: &TypeName) -> bool {
    a == b
}

/// Whether a value of type `a` is acceptable where `b` is expected.
pub fn conforms(registry: &ClassRegistry, a: &TypeName, b: &TypeName) -> bool {
    if compatible(a, b) {
        return true;
    }
    if b.as_str() == "Object" {
        return a.is_null() || is_reference(registry, a);
    }
    if a.is_null() {
        return is_reference(registry, b);
    }
    registry.is_subclass(a.as_str(), b.as_str())
}

/// Whether `ty` names a reference type: an array type or a known class.
pub fn is_reference(registry: &ClassRegistry, ty: &TypeName) -> bool {
    ty.is_array() || (!ty.is_primitive() && !ty.is_void() && registry.resolve(ty.as_str()).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::ast::{Class, Program};

    fn registry() -> ClassRegistry {
        let classes = ["A", "B", "C"]
            .iter()
            .zip(["Object", "A", "B"])
            .map(|(name, parent)| Class {
                file: format!("{name}.kst"),
                name: (*name).into(),
                parent: parent.into(),
                line: 1,
                members: Vec::new(),
            })
            .collect();
        ClassRegistry::from_program(&Program { classes }).unwrap()
    }

    #[test]
    fn compatibility_is_equality() {
        assert!(compatible(&TypeName::int(), &TypeName::int()));
        assert!(!compatible(&TypeName::int(), &TypeName::boolean()));
        assert!(!compatible(&TypeName::new("B"), &TypeName::new("A")));
    }

    #[test]
    fn everything_reference_conforms_to_object() {
        let registry = registry();
        assert!(conforms(&registry, &TypeName::new("C"), &TypeName::object()));
        assert!(conforms(&registry, &TypeName::new("int[]"), &TypeName::object()));
        assert!(conforms(&registry, &TypeName::null(), &TypeName::object()));
        assert!(!conforms(&registry, &TypeName::int(), &TypeName::object()));
        assert!(!conforms(&registry, &TypeName::void(), &TypeName::object()));
    }

    #[test]
    fn null_conforms_to_reference_types() {
        let registry = registry();
        assert!(conforms(&registry, &TypeName::null(), &TypeName::new("A")));
        assert!(conforms(&registry, &TypeName::null(), &TypeName::new("boolean[]")));
        assert!(!conforms(&registry, &TypeName::null(), &TypeName::int()));
    }

    #[test]
    fn subclass_chain_conforms_transitively() {
        let registry = registry();
        assert!(conforms(&registry, &TypeName::new("C"), &TypeName::new("A")));
        assert!(conforms(&registry, &TypeName::new("B"), &TypeName::new("A")));
        assert!(!conforms(&registry, &TypeName::new("A"), &TypeName::new("B")));
    }

    #[test]
    fn primitives_only_conform_to_themselves() {
        let registry = registry();
        assert!(conforms(&registry, &TypeName::int(), &TypeName::int()));
        assert!(!conforms(&registry, &TypeName::int(), &TypeName::new("A")));
        assert!(!conforms(&registry, &TypeName::boolean(), &TypeName::int()));
    }
}
