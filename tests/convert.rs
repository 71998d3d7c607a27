//! End-to-end conversion of hand-built programs.

use exprconv::{
    convert, BinaryOperator, Block, Callee, ConversionFlags, Expression, ExpressionKind, Function,
    GlobalDecl, Handle, ImageClass, ImageDimension, Literal, Parameter, Program, Scalar, Span,
    Statement, StatementKind, TypeDenoter, UnaryOperator, VarDecl, VarIdent, VectorSize,
};

const FLOAT: TypeDenoter = TypeDenoter::Scalar(Scalar::F32);
const INT: TypeDenoter = TypeDenoter::Scalar(Scalar::I32);
const VEC3: TypeDenoter = TypeDenoter::Vector {
    size: VectorSize::Tri,
    scalar: Scalar::F32,
};
const BVEC3: TypeDenoter = TypeDenoter::Vector {
    size: VectorSize::Tri,
    scalar: Scalar::BOOL,
};
const STORAGE_IMAGE: TypeDenoter = TypeDenoter::Image {
    dim: ImageDimension::D1,
    arrayed: false,
    class: ImageClass::Storage,
    scalar: Scalar::I32,
    components: None,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct Builder {
    program: Program,
    offset: u32,
}

impl Builder {
    fn expr(&mut self, kind: ExpressionKind, ty: TypeDenoter) -> Handle<Expression> {
        let span = Span::new(self.offset, self.offset + 1);
        self.offset += 1;
        self.program.expressions.append(Expression { kind, ty }, span)
    }

    fn var(&mut self, name: &str, ty: TypeDenoter) -> Handle<Expression> {
        let ident = VarIdent {
            name: name.to_string(),
            ty: ty.clone(),
            indices: Vec::new(),
            next: None,
        };
        self.expr(ExpressionKind::Variable(ident), ty)
    }

    fn literal(&mut self, literal: Literal) -> Handle<Expression> {
        let ty = match literal {
            Literal::Bool(_) => TypeDenoter::Scalar(Scalar::BOOL),
            Literal::Int(_) => INT,
            Literal::Uint(_) => TypeDenoter::Scalar(Scalar::U32),
            Literal::Float(_) => FLOAT,
        };
        self.expr(ExpressionKind::Literal(literal), ty)
    }

    fn function(
        &mut self,
        name: &str,
        parameters: Vec<Parameter>,
        result: TypeDenoter,
        stmts: Vec<StatementKind>,
    ) -> Handle<GlobalDecl> {
        let stmts = stmts
            .into_iter()
            .map(|kind| Statement {
                kind,
                span: Span::default(),
            })
            .collect();
        self.program.decls.append(
            GlobalDecl::Function(Function {
                name: name.to_string(),
                parameters,
                result,
                body: Some(Block { stmts }),
            }),
            Span::default(),
        )
    }
}

/// Render the root expression of every statement in the body of `name`.
fn body_of(program: &Program, name: &str) -> Vec<String> {
    let function = program
        .decls
        .iter()
        .find_map(|(_, decl)| match *decl {
            GlobalDecl::Function(ref function) if function.name == name => Some(function),
            _ => None,
        })
        .unwrap();
    let mut out = Vec::new();
    for stmt in function.body.as_ref().unwrap().stmts.iter() {
        match stmt.kind {
            StatementKind::Expression(expr) => {
                out.push(program.display_expression(expr).to_string());
            }
            StatementKind::VarDecl(ref vars) => {
                for var in vars {
                    let init = var.init.unwrap();
                    out.push(format!(
                        "{} {} = {}",
                        var.ty,
                        var.name,
                        program.display_expression(init)
                    ));
                }
            }
            StatementKind::Return { value: Some(value) } => {
                out.push(format!("return {}", program.display_expression(value)));
            }
            ref other => panic!("unexpected statement {other:?}"),
        }
    }
    out
}

fn root_type(program: &Program, name: &str, index: usize) -> TypeDenoter {
    let Some((_, GlobalDecl::Function(function))) = program.decls.iter().find(|(_, decl)| {
        matches!(decl, GlobalDecl::Function(function) if function.name == name)
    }) else {
        panic!("no function `{name}`");
    };
    match function.body.as_ref().unwrap().stmts[index].kind {
        StatementKind::Expression(expr) => program.expressions[expr].ty.clone(),
        ref other => panic!("unexpected statement {other:?}"),
    }
}

#[test]
fn scalar_subscript() {
    init_logger();
    let mut b = Builder::default();
    let ident = VarIdent {
        name: "floatVar".to_string(),
        ty: FLOAT,
        indices: Vec::new(),
        next: Some(Box::new(VarIdent {
            name: "x".to_string(),
            ty: FLOAT,
            indices: Vec::new(),
            next: None,
        })),
    };
    let access = b.expr(ExpressionKind::Variable(ident), FLOAT);
    b.function(
        "main",
        Vec::new(),
        TypeDenoter::Void,
        vec![StatementKind::Expression(access)],
    );
    let mut program = b.program;

    convert(&mut program, ConversionFlags::VECTOR_SUBSCRIPTS).unwrap();
    assert_eq!(body_of(&program, "main"), ["floatVar"]);
    assert_eq!(root_type(&program, "main", 0), FLOAT);
}

#[test]
fn vector_comparison() {
    init_logger();
    let mut b = Builder::default();
    let left = b.var("vec3A", VEC3);
    let right = b.var("vec3B", VEC3);
    let less = b.expr(
        ExpressionKind::Binary {
            op: BinaryOperator::Less,
            left,
            right,
        },
        BVEC3,
    );
    b.function(
        "main",
        Vec::new(),
        TypeDenoter::Void,
        vec![StatementKind::Expression(less)],
    );
    let mut program = b.program;

    convert(&mut program, ConversionFlags::VECTOR_COMPARE).unwrap();
    assert_eq!(body_of(&program, "main"), ["lessThan(vec3A, vec3B)"]);
    assert_eq!(root_type(&program, "main", 0), BVEC3);
}

#[test]
fn image_store() {
    init_logger();
    let mut b = Builder::default();
    let idx = b.var("idx", INT);
    let target = b.expr(
        ExpressionKind::Variable(VarIdent {
            name: "myImage".to_string(),
            ty: STORAGE_IMAGE,
            indices: vec![idx],
            next: None,
        }),
        INT,
    );
    let five = b.literal(Literal::Int(5));
    let assign = b.expr(
        ExpressionKind::Assign {
            op: None,
            target,
            value: five,
        },
        INT,
    );
    b.function(
        "main",
        Vec::new(),
        TypeDenoter::Void,
        vec![StatementKind::Expression(assign)],
    );
    let mut program = b.program;

    convert(&mut program, ConversionFlags::IMAGE_ACCESS).unwrap();
    assert_eq!(body_of(&program, "main"), ["imageStore(myImage, idx, 5)"]);
    assert_eq!(root_type(&program, "main", 0), TypeDenoter::Void);
}

#[test]
fn double_negation() {
    init_logger();
    let mut b = Builder::default();
    let a = b.var("a", FLOAT);
    let inner = b.expr(
        ExpressionKind::Unary {
            op: UnaryOperator::Negate,
            expr: a,
        },
        FLOAT,
    );
    let outer = b.expr(
        ExpressionKind::Unary {
            op: UnaryOperator::Negate,
            expr: inner,
        },
        FLOAT,
    );
    b.function(
        "main",
        Vec::new(),
        TypeDenoter::Void,
        vec![StatementKind::Expression(outer)],
    );
    let mut program = b.program;

    convert(&mut program, ConversionFlags::WRAP_UNARY_EXPR).unwrap();
    assert_eq!(body_of(&program, "main"), ["-(-a)"]);
}

/// A function touching every rule at once.
fn shader() -> Program {
    let mut b = Builder::default();

    let value = b.var("value", INT);
    let scale = b.function(
        "scale",
        vec![Parameter {
            name: "value".to_string(),
            ty: FLOAT,
            default: None,
        }],
        FLOAT,
        vec![StatementKind::Return { value: Some(value) }],
    );

    // float s = scale(count.x);
    let count = b.expr(
        ExpressionKind::Variable(VarIdent {
            name: "count".to_string(),
            ty: INT,
            indices: Vec::new(),
            next: Some(Box::new(VarIdent {
                name: "x".to_string(),
                ty: INT,
                indices: Vec::new(),
                next: None,
            })),
        }),
        INT,
    );
    let call = b.expr(
        ExpressionKind::Call {
            callee: Callee::Function(scale),
            arguments: vec![count],
        },
        FLOAT,
    );

    // bvec3 mask = color >= s;
    let color = b.var("color", VEC3);
    let s = b.var("s", FLOAT);
    let mask = b.expr(
        ExpressionKind::Binary {
            op: BinaryOperator::GreaterEqual,
            left: color,
            right: s,
        },
        BVEC3,
    );

    // counters[i] += - -1;
    let i = b.var("i", TypeDenoter::Scalar(Scalar::U32));
    let target = b.expr(
        ExpressionKind::Variable(VarIdent {
            name: "counters".to_string(),
            ty: STORAGE_IMAGE,
            indices: vec![i],
            next: None,
        }),
        INT,
    );
    let one = b.literal(Literal::Int(-1));
    let negated = b.expr(
        ExpressionKind::Unary {
            op: UnaryOperator::Negate,
            expr: one,
        },
        INT,
    );
    let add = b.expr(
        ExpressionKind::Assign {
            op: Some(BinaryOperator::Add),
            target,
            value: negated,
        },
        INT,
    );

    b.function(
        "main",
        Vec::new(),
        TypeDenoter::Void,
        vec![
            StatementKind::VarDecl(vec![
                VarDecl {
                    name: "s".to_string(),
                    ty: FLOAT,
                    init: Some(call),
                },
                VarDecl {
                    name: "mask".to_string(),
                    ty: BVEC3,
                    init: Some(mask),
                },
            ]),
            StatementKind::Expression(add),
        ],
    );
    b.program
}

#[test]
fn all_rules_together() {
    init_logger();
    let mut program = shader();
    convert(&mut program, ConversionFlags::default()).unwrap();

    assert_eq!(body_of(&program, "scale"), ["return float(value)"]);
    assert_eq!(
        body_of(&program, "main"),
        [
            "float s = scale(float(count))",
            "bvec3 mask = greaterThanEqual(color, vec3(s))",
            "imageStore(counters, int(i), ivec4(imageLoad(counters, int(i)).x + -(-1)))",
        ]
    );
}

#[test]
fn second_pass_is_a_no_op() {
    init_logger();
    let mut program = shader();
    convert(&mut program, ConversionFlags::all()).unwrap();
    let expressions = program.expressions.len();
    let main = body_of(&program, "main");

    convert(&mut program, ConversionFlags::all()).unwrap();
    assert_eq!(program.expressions.len(), expressions);
    assert_eq!(body_of(&program, "main"), main);
}

#[test]
fn orphans_are_compacted() {
    init_logger();
    let mut program = shader();
    convert(&mut program, ConversionFlags::all()).unwrap();

    // Every expression left must be reachable: counting the nodes of the
    // rendered trees by walking operands from the roots finds them all.
    let mut reachable = vec![false; program.expressions.len()];
    let mut stack = Vec::new();
    for (_, decl) in program.decls.iter() {
        let GlobalDecl::Function(ref function) = *decl else {
            continue;
        };
        for stmt in function.body.as_ref().unwrap().stmts.iter() {
            match stmt.kind {
                StatementKind::Expression(expr) => stack.push(expr),
                StatementKind::VarDecl(ref vars) => {
                    stack.extend(vars.iter().filter_map(|var| var.init));
                }
                StatementKind::Return { value } => stack.extend(value),
                _ => {}
            }
        }
    }
    while let Some(handle) = stack.pop() {
        reachable[handle.index()] = true;
        stack.extend(program.expressions[handle].kind.operands());
    }
    assert!(reachable.iter().all(|&r| r));
}

#[test]
fn disabled_rules_leave_the_tree_alone() {
    init_logger();
    let mut program = shader();
    let expressions = program.expressions.len();
    let before = body_of(&program, "main");
    convert(&mut program, ConversionFlags::empty()).unwrap();
    assert_eq!(program.expressions.len(), expressions);
    assert_eq!(body_of(&program, "main"), before);

    convert(&mut program, ConversionFlags::WRAP_UNARY_EXPR).unwrap();
    assert_eq!(
        body_of(&program, "main")[2],
        "counters[i] += -(-1)"
    );
}
