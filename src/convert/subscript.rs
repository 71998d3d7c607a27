//! Dropping component accessors applied to scalars.
//!
//! The source language lets a scalar be used as a one-component vector, so
//! `f.x` and `f.r` are valid and mean `f`. The target language rejects any
//! swizzle on a scalar.

use super::Converter;
use crate::arena::Handle;
use crate::{Expression, ExpressionKind, VarIdent};

/// Accessors selecting the only component of a scalar.
const SCALAR_ACCESSORS: [&str; 2] = ["x", "r"];

fn is_scalar_accessor(name: &str) -> bool {
    SCALAR_ACCESSORS.contains(&name)
}

/// Whether `link.next` is a no-op accessor on the value of `link`.
fn has_scalar_subscript(link: &VarIdent) -> bool {
    let Some(ref next) = link.next else {
        return false;
    };
    next.indices.is_empty()
        && is_scalar_accessor(&next.name)
        && link.indexed_type().is_some_and(|ty| ty.is_scalar())
}

/// Strip no-op accessors from every link of the chain starting at `link`.
///
/// Returns `true` if anything was removed.
fn strip_scalar_subscripts(link: &mut VarIdent) -> bool {
    let mut changed = false;
    while has_scalar_subscript(link) {
        if let Some(next) = link.next.take() {
            link.next = next.next;
            changed = true;
        }
    }
    match link.next {
        Some(ref mut next) => strip_scalar_subscripts(next) || changed,
        None => changed,
    }
}

impl Converter<'_> {
    pub(super) fn convert_vector_subscript(
        &mut self,
        handle: Handle<Expression>,
    ) -> Option<Handle<Expression>> {
        let expr = &self.expressions[handle];
        match expr.kind {
            ExpressionKind::Member { base, ref member }
                if is_scalar_accessor(member) && self.expressions[base].ty.is_scalar() =>
            {
                Some(base)
            }
            ExpressionKind::Variable(ref ident) => {
                let mut stripped = ident.clone();
                if !strip_scalar_subscripts(&mut stripped) {
                    return None;
                }
                let ty = expr.ty.clone();
                Some(self.append(ExpressionKind::Variable(stripped), ty, handle))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::convert::tests::{init_logger, rendered_statements, Builder};
    use crate::{
        convert, Callee, ConversionFlags, Expression, ExpressionKind, Handle, Scalar,
        StatementKind, TypeDenoter, VarIdent, VectorSize,
    };

    const FLOAT: TypeDenoter = TypeDenoter::Scalar(Scalar::F32);

    fn member(
        builder: &mut Builder,
        base: Handle<Expression>,
        name: &str,
        ty: TypeDenoter,
    ) -> Handle<Expression> {
        builder.expr(
            ExpressionKind::Member {
                base,
                member: name.into(),
            },
            ty,
        )
    }

    #[test]
    fn scalar_member() {
        init_logger();
        let mut builder = Builder::default();
        let call = builder.expr(
            ExpressionKind::Call {
                callee: Callee::Intrinsic("length".into()),
                arguments: Vec::new(),
            },
            FLOAT,
        );
        let x = member(&mut builder, call, "x", FLOAT);
        let r = member(&mut builder, x, "r", FLOAT);
        let mut program = builder.finish(vec![StatementKind::Expression(r)]);
        convert(&mut program, ConversionFlags::VECTOR_SUBSCRIPTS).unwrap();
        assert_eq!(rendered_statements(&program), ["length()"]);
    }

    #[test]
    fn vector_members_are_kept() {
        init_logger();
        let vec3 = TypeDenoter::Vector {
            size: VectorSize::Tri,
            scalar: Scalar::F32,
        };
        let mut builder = Builder::default();
        let v = builder.var("v", vec3.clone());
        let x = member(&mut builder, v, "x", FLOAT);
        let f = builder.var("f", FLOAT);
        let xx = member(
            &mut builder,
            f,
            "xx",
            TypeDenoter::Vector {
                size: VectorSize::Bi,
                scalar: Scalar::F32,
            },
        );
        let mut program = builder.finish(vec![
            StatementKind::Expression(x),
            StatementKind::Expression(xx),
        ]);
        convert(&mut program, ConversionFlags::VECTOR_SUBSCRIPTS).unwrap();
        assert_eq!(rendered_statements(&program), ["v.x", "f.xx"]);
    }

    #[test]
    fn variable_chains() {
        init_logger();
        let mut builder = Builder::default();
        let i = builder.int(0);
        let ident = VarIdent {
            name: "weights".into(),
            ty: TypeDenoter::Array {
                base: Box::new(TypeDenoter::Struct {
                    name: "Weight".into(),
                }),
                size: Some(4),
            },
            indices: vec![i],
            next: Some(Box::new(VarIdent {
                name: "value".into(),
                ty: FLOAT,
                indices: Vec::new(),
                next: Some(Box::new(VarIdent {
                    name: "x".into(),
                    ty: FLOAT,
                    indices: Vec::new(),
                    next: Some(Box::new(VarIdent {
                        name: "r".into(),
                        ty: FLOAT,
                        indices: Vec::new(),
                        next: None,
                    })),
                })),
            })),
        };
        let weights = builder.expr(ExpressionKind::Variable(ident), FLOAT);
        let mut program = builder.finish(vec![StatementKind::Expression(weights)]);
        convert(&mut program, ConversionFlags::VECTOR_SUBSCRIPTS).unwrap();
        assert_eq!(rendered_statements(&program), ["weights[0].value"]);

        // Nothing left to strip.
        let len = program.expressions.len();
        convert(&mut program, ConversionFlags::VECTOR_SUBSCRIPTS).unwrap();
        assert_eq!(program.expressions.len(), len);
        assert_eq!(rendered_statements(&program), ["weights[0].value"]);
    }
}
