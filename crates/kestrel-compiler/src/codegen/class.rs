//! Class-level generation and rendering.
//!
//! Produces one [`EmittedClass`] per source class: the class and superclass
//! directives, one field directive per declared field, a synthesized default
//! constructor chaining to the superclass constructor, the lowered body of
//! every declared method, and, on the entry class, a static bootstrap that
//! constructs an instance and invokes its `main`.

use std::fmt;

use kestrel_core::ast::{Class, Member, Method, Program};
use kestrel_core::types::TypeName;
use kestrel_registry::{ClassId, ClassRegistry, MethodSig};

use super::emit::MethodEmitter;
use super::instr::Instr as I;
use super::{Instr, MethodGen};

pub struct CodeGenerator<'a> {
    registry: &'a ClassRegistry,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(registry: &'a ClassRegistry) -> Self {
        Self { registry }
    }

    /// Lower every class of an already-checked program, in program order.
    pub fn run(&self, program: &Program) -> Vec<EmittedClass> {
        let entry = entry_class(program);
        program
            .classes
            .iter()
            .filter_map(|class| {
                let class_id = self.registry.resolve(&class.name)?;
                Some(self.gen_class(class_id, class, entry == Some(class.name.as_str())))
            })
            .collect()
    }

    fn gen_class(&self, class_id: ClassId, class: &Class, is_entry: bool) -> EmittedClass {
        let parent = self.registry.node(class_id).parent;
        let parent_internal = match parent {
            Some(parent) => TypeName::new(self.registry.node(parent).name.clone()).internal_name(),
            None => TypeName::object().internal_name(),
        };

        let mut fields = Vec::new();
        let mut methods = vec![gen_constructor(&parent_internal)];
        for member in &class.members {
            match member {
                Member::Field(field) => fields.push(EmittedField {
                    name: field.name.clone(),
                    desc: field.ty.descriptor(),
                }),
                Member::Method(method) => {
                    methods.push(self.gen_method(class_id, method));
                }
            }
        }
        if is_entry {
            methods.push(gen_bootstrap(&class.name));
        }

        EmittedClass {
            name: class.name.clone(),
            parent: parent_internal,
            fields,
            methods,
        }
    }

    fn gen_method(&self, class_id: ClassId, method: &Method) -> EmittedMethod {
        let method_gen = MethodGen::new(self.registry, class_id, method);
        let (instrs, max_stack, max_locals) = method_gen.run(method);
        EmittedMethod {
            name: method.name.clone(),
            desc: MethodSig::of(method).descriptor(),
            is_static: false,
            max_stack,
            max_locals,
            instrs,
        }
    }
}

/// Synthesized default constructor: chain to the superclass constructor.
fn gen_constructor(parent_internal: &str) -> EmittedMethod {
    let mut emitter = MethodEmitter::new();
    emitter.emit(I::LoadRef(0));
    emitter.emit(I::InvokeCtor(parent_internal.into()));
    emitter.emit(I::ReturnVoid);
    let max_stack = emitter.max_stack();
    let max_locals = emitter.locals_limit();
    EmittedMethod {
        name: "<init>".into(),
        desc: "()V".into(),
        is_static: false,
        max_stack,
        max_locals,
        instrs: emitter.into_instrs(),
    }
}

/// The entry class is the first class declaring a no-argument `void main`.
fn entry_class(program: &Program) -> Option<&str> {
    program.classes.iter().find_map(|class| {
        class.members.iter().any(|member| match member {
            Member::Method(method) => {
                method.name == "main" && method.formals.is_empty() && method.return_ty.is_void()
            }
            Member::Field(_) => false,
        })
        .then_some(class.name.as_str())
    })
}

/// The process entry point: constructs the entry class and calls its `main`.
fn gen_bootstrap(class: &str) -> EmittedMethod {
    let internal = TypeName::new(class).internal_name();
    let mut emitter = MethodEmitter::new();
    emitter.emit(I::New(internal.clone()));
    emitter.emit(I::Dup);
    emitter.emit(I::InvokeCtor(internal.clone()));
    emitter.emit(I::InvokeVirtual {
        class: internal,
        method: "main".into(),
        desc: "()V".into(),
        argc: 0,
        returns_value: false,
    });
    emitter.emit(I::ReturnVoid);
    let max_stack = emitter.max_stack();
    EmittedMethod {
        name: "main".into(),
        desc: "([Ljava/lang/String;)V".into(),
        is_static: true,
        max_stack,
        // Slot 0 holds the argument array.
        max_locals: 1,
        instrs: emitter.into_instrs(),
    }
}

// ============================================================================
// Emitted output
// ============================================================================

#[derive(Debug, Clone)]
pub struct EmittedClass {
    pub name: String,
    pub parent: String,
    pub fields: Vec<EmittedField>,
    pub methods: Vec<EmittedMethod>,
}

#[derive(Debug, Clone)]
pub struct EmittedField {
    pub name: String,
    pub desc: String,
}

#[derive(Debug, Clone)]
pub struct EmittedMethod {
    pub name: String,
    pub desc: String,
    pub is_static: bool,
    pub max_stack: u32,
    pub max_locals: u16,
    pub instrs: Vec<Instr>,
}

impl fmt::Display for EmittedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".class public {}", self.name)?;
        writeln!(f, ".super {}", self.parent)?;
        for field in &self.fields {
            writeln!(f)?;
            write!(f, "{field}")?;
        }
        for method in &self.methods {
            writeln!(f)?;
            write!(f, "{method}")?;
        }
        Ok(())
    }
}

impl fmt::Display for EmittedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".field protected {} {}", self.name, self.desc)
    }
}

impl fmt::Display for EmittedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = if self.is_static { "public static" } else { "public" };
        writeln!(f, ".method {} {}{}", modifiers, self.name, self.desc)?;
        writeln!(f, "    .limit stack {}", self.max_stack)?;
        writeln!(f, "    .limit locals {}", self.max_locals)?;
        for instr in &self.instrs {
            if matches!(instr, Instr::LabelDef(_)) {
                writeln!(f, "{instr}")?;
            } else {
                writeln!(f, "    {instr}")?;
            }
        }
        writeln!(f, ".end method")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::ast::{Expr, ExprKind, Field, Formal, Stmt};

    fn method(name: &str, return_ty: TypeName, body: Vec<Stmt>) -> Member {
        Member::Method(Method {
            name: name.into(),
            return_ty,
            formals: Vec::new(),
            body,
            line: 1,
        })
    }

    fn class(name: &str, parent: &str, members: Vec<Member>) -> Class {
        Class {
            file: format!("{name}.kst"),
            name: name.into(),
            parent: parent.into(),
            line: 1,
            members,
        }
    }

    fn typed(kind: ExprKind, ty: TypeName) -> Expr {
        let mut expr = Expr::new(kind, 1);
        expr.ty = Some(ty);
        expr
    }

    fn generate(program: &Program) -> Vec<EmittedClass> {
        let registry = ClassRegistry::from_program(program).unwrap();
        CodeGenerator::new(&registry).run(program)
    }

    #[test]
    fn constructor_chains_to_superclass() {
        let program = Program {
            classes: vec![
                class("A", "Object", Vec::new()),
                class("B", "A", Vec::new()),
            ],
        };
        let emitted = generate(&program);
        let init = &emitted[1].methods[0];
        assert_eq!(init.name, "<init>");
        assert_eq!(
            init.instrs,
            vec![I::LoadRef(0), I::InvokeCtor("A".into()), I::ReturnVoid]
        );
        assert_eq!(init.max_stack, 1);
        assert_eq!(init.max_locals, 1);

        let root_init = &emitted[0].methods[0];
        assert_eq!(root_init.instrs[1], I::InvokeCtor("java/lang/Object".into()));
    }

    #[test]
    fn bootstrap_only_on_entry_class() {
        let program = Program {
            classes: vec![
                class("Helper", "Object", Vec::new()),
                class(
                    "App",
                    "Object",
                    vec![method("main", TypeName::void(), Vec::new())],
                ),
            ],
        };
        let emitted = generate(&program);
        assert!(!emitted[0].methods.iter().any(|m| m.is_static));
        let bootstrap = emitted[1]
            .methods
            .iter()
            .find(|m| m.is_static)
            .expect("entry class gets a bootstrap");
        assert_eq!(bootstrap.desc, "([Ljava/lang/String;)V");
        assert_eq!(bootstrap.max_stack, 2);
        assert!(bootstrap
            .instrs
            .contains(&I::InvokeVirtual {
                class: "App".into(),
                method: "main".into(),
                desc: "()V".into(),
                argc: 0,
                returns_value: false,
            }));
    }

    #[test]
    fn fields_render_with_descriptors() {
        let program = Program {
            classes: vec![class(
                "A",
                "Object",
                vec![Member::Field(Field {
                    name: "count".into(),
                    ty: TypeName::int(),
                    init: None,
                    line: 2,
                })],
            )],
        };
        let text = generate(&program)[0].to_string();
        assert!(text.contains(".class public A"));
        assert!(text.contains(".super java/lang/Object"));
        assert!(text.contains(".field protected count I"));
    }

    #[test]
    fn void_method_gets_trailing_return() {
        let program = Program {
            classes: vec![class(
                "A",
                "Object",
                vec![method("run", TypeName::void(), Vec::new())],
            )],
        };
        let emitted = generate(&program);
        let run = &emitted[0].methods[1];
        assert_eq!(run.instrs, vec![I::ReturnVoid]);
        assert_eq!(run.max_stack, 0);
    }

    #[test]
    fn declared_locals_take_fresh_slots() {
        let body = vec![
            Stmt::Decl {
                name: "x".into(),
                ty: TypeName::int(),
                init: typed(ExprKind::IntConst(1), TypeName::int()),
                line: 2,
            },
            Stmt::Decl {
                name: "y".into(),
                ty: TypeName::int(),
                init: typed(ExprKind::IntConst(2), TypeName::int()),
                line: 3,
            },
        ];
        let program = Program {
            classes: vec![class(
                "A",
                "Object",
                vec![method("run", TypeName::void(), body)],
            )],
        };
        let run = &generate(&program)[0].methods[1];
        assert!(run.instrs.contains(&I::StoreInt(1)));
        assert!(run.instrs.contains(&I::StoreInt(2)));
        assert_eq!(run.max_locals, 3);
    }

    #[test]
    fn equality_family_follows_operand_types() {
        let int_var = |name: &str| {
            typed(
                ExprKind::Var {
                    qualifier: None,
                    name: name.into(),
                },
                TypeName::int(),
            )
        };
        let this_var = || {
            typed(
                ExprKind::Var {
                    qualifier: None,
                    name: "this".into(),
                },
                TypeName::new("A"),
            )
        };
        let ret = |left: Expr, right: Expr| Stmt::Return {
            expr: Some(typed(
                ExprKind::Binary {
                    op: kestrel_core::ast::BinaryOp::Eq,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                TypeName::boolean(),
            )),
            line: 2,
        };

        let int_eq = Method {
            name: "same".into(),
            return_ty: TypeName::boolean(),
            formals: vec![
                Formal {
                    name: "a".into(),
                    ty: TypeName::int(),
                    line: 1,
                },
                Formal {
                    name: "b".into(),
                    ty: TypeName::int(),
                    line: 1,
                },
            ],
            body: vec![ret(int_var("a"), int_var("b"))],
            line: 1,
        };
        let ref_eq = Method {
            name: "is_self".into(),
            return_ty: TypeName::boolean(),
            formals: Vec::new(),
            body: vec![ret(this_var(), this_var())],
            line: 1,
        };
        let program = Program {
            classes: vec![class(
                "A",
                "Object",
                vec![Member::Method(int_eq), Member::Method(ref_eq)],
            )],
        };

        let methods = &generate(&program)[0].methods;
        assert_eq!(
            methods[1].instrs,
            vec![I::LoadInt(1), I::LoadInt(2), I::CmpEq, I::ReturnInt]
        );
        assert_eq!(
            methods[2].instrs,
            vec![I::LoadRef(0), I::LoadRef(0), I::RefCmpEq, I::ReturnInt]
        );
    }

    #[test]
    fn formal_slots_follow_the_receiver() {
        let mut m = Method {
            name: "add".into(),
            return_ty: TypeName::int(),
            formals: vec![
                Formal {
                    name: "a".into(),
                    ty: TypeName::int(),
                    line: 1,
                },
                Formal {
                    name: "b".into(),
                    ty: TypeName::int(),
                    line: 1,
                },
            ],
            body: Vec::new(),
            line: 1,
        };
        m.body = vec![Stmt::Return {
            expr: Some(typed(
                ExprKind::Binary {
                    op: kestrel_core::ast::BinaryOp::Plus,
                    left: Box::new(typed(
                        ExprKind::Var {
                            qualifier: None,
                            name: "a".into(),
                        },
                        TypeName::int(),
                    )),
                    right: Box::new(typed(
                        ExprKind::Var {
                            qualifier: None,
                            name: "b".into(),
                        },
                        TypeName::int(),
                    )),
                },
                TypeName::int(),
            )),
            line: 2,
        }];
        let program = Program {
            classes: vec![class("A", "Object", vec![Member::Method(m)])],
        };
        let add = &generate(&program)[0].methods[1];
        assert_eq!(
            add.instrs,
            vec![I::LoadInt(1), I::LoadInt(2), I::Add, I::ReturnInt]
        );
        assert_eq!(add.max_stack, 2);
        assert_eq!(add.max_locals, 3);
        assert_eq!(add.desc, "(II)I");
    }
}
