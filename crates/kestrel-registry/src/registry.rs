//! Class-hierarchy registry.
//!
//! The hierarchy is an arena of [`ClassNode`]s addressed by [`ClassId`];
//! parent and child links are ids, never object references, so the tree has
//! no ownership cycles. Each node owns the two symbol tables of its class
//! (fields and methods) and points back at the class declaration in the
//! [`Program`] by index. The built-in classes `Object` and `String` are
//! pre-registered, flagged built-in, and skipped by user-level codegen.
//!
//! Construction validates the declared hierarchy (duplicate class names,
//! unknown parents, inheritance cycles) and fails fast; the semantic passes
//! then populate and read the node tables.

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

use kestrel_core::ast::{Method, Program};
use kestrel_core::types::TypeName;

use crate::symbol_table::SymbolTable;

/// Stable identifier of a class node in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The signature of a registered method, as bound in a method table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub return_ty: TypeName,
    pub params: Vec<TypeName>,
}

impl MethodSig {
    pub fn of(method: &Method) -> Self {
        Self {
            name: method.name.clone(),
            return_ty: method.return_ty.clone(),
            params: method.formals.iter().map(|f| f.ty.clone()).collect(),
        }
    }

    /// The JVM-style method descriptor, e.g. `(IZ)V`.
    pub fn descriptor(&self) -> String {
        let mut desc = String::from("(");
        for param in &self.params {
            desc.push_str(&param.descriptor());
        }
        desc.push(')');
        desc.push_str(&self.return_ty.descriptor());
        desc
    }
}

/// One class in the hierarchy.
#[derive(Debug, Clone)]
pub struct ClassNode {
    pub name: String,
    pub parent: Option<ClassId>,
    pub children: Vec<ClassId>,
    /// Built-in classes skip user-level code generation.
    pub built_in: bool,
    /// Index of the declaration in `Program::classes`; `None` for built-ins.
    pub decl: Option<usize>,
    /// Field namespace: name (and its `this.<name>` alias) to declared type.
    pub fields: SymbolTable<TypeName>,
    /// Method namespace: name to signature.
    pub methods: SymbolTable<MethodSig>,
}

/// Errors raised while building the hierarchy, before any pass runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("class '{name}' is declared more than once")]
    DuplicateClass { name: String },

    #[error("class '{class}' extends undefined class '{parent}'")]
    UnknownParent { class: String, parent: String },

    #[error("class '{class}' participates in an inheritance cycle")]
    InheritanceCycle { class: String },
}

/// Arena of class nodes with name-based lookup.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    nodes: Vec<ClassNode>,
    by_name: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// A registry holding only the built-in classes.
    pub fn new() -> Self {
        let mut registry = Self {
            nodes: Vec::new(),
            by_name: FxHashMap::default(),
        };
        let object = registry.insert(ClassNode {
            name: "Object".into(),
            parent: None,
            children: Vec::new(),
            built_in: true,
            decl: None,
            fields: SymbolTable::new(),
            methods: SymbolTable::new(),
        });
        let string = registry.insert(ClassNode {
            name: "String".into(),
            parent: Some(object),
            children: Vec::new(),
            built_in: true,
            decl: None,
            fields: SymbolTable::new(),
            methods: SymbolTable::new(),
        });
        registry.nodes[object.index()].children.push(string);
        registry
    }

    /// Build the hierarchy for a program on top of the built-ins.
    pub fn from_program(program: &Program) -> Result<Self, HierarchyError> {
        let mut registry = Self::new();

        for (decl_index, class) in program.classes.iter().enumerate() {
            if registry.resolve(&class.name).is_some() {
                return Err(HierarchyError::DuplicateClass {
                    name: class.name.clone(),
                });
            }
            registry.insert(ClassNode {
                name: class.name.clone(),
                parent: None,
                children: Vec::new(),
                built_in: false,
                decl: Some(decl_index),
                fields: SymbolTable::new(),
                methods: SymbolTable::new(),
            });
        }

        // Classes may extend classes declared later, so link in a second pass.
        for class in &program.classes {
            let id = registry
                .resolve(&class.name)
                .expect("class was just inserted");
            let parent = registry.resolve(&class.parent).ok_or_else(|| {
                HierarchyError::UnknownParent {
                    class: class.name.clone(),
                    parent: class.parent.clone(),
                }
            })?;
            registry.nodes[id.index()].parent = Some(parent);
            registry.nodes[parent.index()].children.push(id);
        }

        // A parent chain longer than the arena means a cycle.
        for id in registry.ids() {
            let mut steps = 0;
            let mut cursor = registry.node(id).parent;
            while let Some(parent) = cursor {
                steps += 1;
                if steps > registry.nodes.len() {
                    return Err(HierarchyError::InheritanceCycle {
                        class: registry.node(id).name.clone(),
                    });
                }
                cursor = registry.node(parent).parent;
            }
        }

        Ok(registry)
    }

    fn insert(&mut self, node: ClassNode) -> ClassId {
        let id = ClassId(self.nodes.len() as u32);
        self.by_name.insert(node.name.clone(), id);
        self.nodes.push(node);
        id
    }

    /// Resolve a class name to its node id.
    pub fn resolve(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn node(&self, id: ClassId) -> &ClassNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: ClassId) -> &mut ClassNode {
        &mut self.nodes[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> + use<> {
        (0..self.nodes.len() as u32).map(ClassId)
    }

    /// Ids in parents-before-children order, starting at the roots.
    pub fn preorder(&self) -> Vec<ClassId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<ClassId> = self
            .ids()
            .filter(|id| self.node(*id).parent.is_none())
            .collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().copied());
        }
        order
    }

    /// Whether `ty` names a known type: a primitive, a primitive array
    /// type, or a registered class.
    pub fn type_exists(&self, ty: &TypeName) -> bool {
        ty.is_primitive()
            || ty.as_str() == "int[]"
            || ty.as_str() == "boolean[]"
            || self.resolve(ty.as_str()).is_some()
    }

    /// Whether `sub` names a class equal to or below `sup` in the hierarchy.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        let Some(mut cursor) = self.resolve(sub) else {
            return false;
        };
        loop {
            let node = self.node(cursor);
            if node.name == sup {
                return true;
            }
            match node.parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::ast::Class;

    fn class(name: &str, parent: &str) -> Class {
        Class {
            file: format!("{name}.kst"),
            name: name.into(),
            parent: parent.into(),
            line: 1,
            members: Vec::new(),
        }
    }

    fn program(classes: Vec<Class>) -> Program {
        Program { classes }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = ClassRegistry::new();
        let object = registry.resolve("Object").unwrap();
        let string = registry.resolve("String").unwrap();
        assert!(registry.node(object).built_in);
        assert_eq!(registry.node(string).parent, Some(object));
    }

    #[test]
    fn links_parents_and_children() {
        let registry =
            ClassRegistry::from_program(&program(vec![class("A", "Object"), class("B", "A")]))
                .unwrap();
        let a = registry.resolve("A").unwrap();
        let b = registry.resolve("B").unwrap();
        assert_eq!(registry.node(b).parent, Some(a));
        assert_eq!(registry.node(a).children, vec![b]);
    }

    #[test]
    fn forward_parent_reference_is_fine() {
        let registry =
            ClassRegistry::from_program(&program(vec![class("B", "A"), class("A", "Object")]));
        assert!(registry.is_ok());
    }

    #[test]
    fn duplicate_class_rejected() {
        let err =
            ClassRegistry::from_program(&program(vec![class("A", "Object"), class("A", "Object")]))
                .unwrap_err();
        assert_eq!(err, HierarchyError::DuplicateClass { name: "A".into() });
    }

    #[test]
    fn unknown_parent_rejected() {
        let err = ClassRegistry::from_program(&program(vec![class("A", "Missing")])).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::UnknownParent {
                class: "A".into(),
                parent: "Missing".into()
            }
        );
    }

    #[test]
    fn inheritance_cycle_rejected() {
        let err = ClassRegistry::from_program(&program(vec![class("A", "B"), class("B", "A")]))
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InheritanceCycle { .. }));
    }

    #[test]
    fn preorder_is_parents_first() {
        let registry = ClassRegistry::from_program(&program(vec![
            class("B", "A"),
            class("A", "Object"),
            class("C", "B"),
        ]))
        .unwrap();
        let order = registry.preorder();
        let position = |name: &str| {
            order
                .iter()
                .position(|id| registry.node(*id).name == name)
                .unwrap()
        };
        assert!(position("Object") < position("A"));
        assert!(position("A") < position("B"));
        assert!(position("B") < position("C"));
    }

    #[test]
    fn subclass_chain() {
        let registry =
            ClassRegistry::from_program(&program(vec![class("A", "Object"), class("B", "A")]))
                .unwrap();
        assert!(registry.is_subclass("B", "A"));
        assert!(registry.is_subclass("B", "Object"));
        assert!(registry.is_subclass("B", "B"));
        assert!(!registry.is_subclass("A", "B"));
    }

    #[test]
    fn type_existence() {
        let registry = ClassRegistry::from_program(&program(vec![class("A", "Object")])).unwrap();
        assert!(registry.type_exists(&TypeName::int()));
        assert!(registry.type_exists(&TypeName::new("boolean[]")));
        assert!(registry.type_exists(&TypeName::new("A")));
        assert!(registry.type_exists(&TypeName::string()));
        assert!(!registry.type_exists(&TypeName::new("Missing")));
    }

    #[test]
    fn method_sig_descriptor() {
        let sig = MethodSig {
            name: "m".into(),
            return_ty: TypeName::void(),
            params: vec![TypeName::int(), TypeName::new("A")],
        };
        assert_eq!(sig.descriptor(), "(ILA;)V");
    }
}
