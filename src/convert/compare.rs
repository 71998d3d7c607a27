//! Component-wise comparison of vectors.
//!
//! Comparing two vectors with a relational operator yields a vector of
//! booleans in the source language. The target language only offers this
//! through builtins such as `lessThan`.

use super::{ConversionFlags, ConvertError, Converter};
use crate::arena::Handle;
use crate::{Builtin, Callee, Expression, ExpressionKind, Scalar, TypeDenoter, VectorSize};

impl Converter<'_> {
    pub(super) fn convert_vector_compare(
        &mut self,
        handle: Handle<Expression>,
    ) -> Result<Option<Handle<Expression>>, ConvertError> {
        let ExpressionKind::Binary { op, left, right } = self.expressions[handle].kind else {
            return Ok(None);
        };
        let Some(builtin) = Builtin::for_comparison(op) else {
            return Ok(None);
        };

        let left_ty = &self.expressions[left].ty;
        let right_ty = &self.expressions[right].ty;
        let casts = self.flags.contains(ConversionFlags::IMPLICIT_CASTS);
        let size = match (left_ty.vector_size(), right_ty.vector_size()) {
            (None, None) => return Ok(None),
            (Some(left_size), Some(right_size)) if left_size == right_size => left_size,
            // A scalar is replicated into every component, which takes a cast.
            (Some(size), None) if casts && left_ty.is_compatible_with(right_ty) => size,
            (None, Some(size)) if casts && right_ty.is_compatible_with(left_ty) => size,
            _ => {
                return Err(ConvertError::InvalidComparison {
                    left: left_ty.clone(),
                    right: right_ty.clone(),
                })
            }
        };

        let (left, right) = if casts {
            self.cast_comparison_operands(left, right, size)?
        } else {
            (left, right)
        };

        let ty = TypeDenoter::Vector {
            size,
            scalar: Scalar::BOOL,
        };
        let call = ExpressionKind::Call {
            callee: Callee::Builtin(builtin),
            arguments: vec![left, right],
        };
        Ok(Some(self.append(call, ty, handle)))
    }

    /// Bring both operands to a common vector type of `size` components.
    fn cast_comparison_operands(
        &mut self,
        left: Handle<Expression>,
        right: Handle<Expression>,
        size: VectorSize,
    ) -> Result<(Handle<Expression>, Handle<Expression>), ConvertError> {
        let (Some(left_scalar), Some(right_scalar)) = (
            self.expressions[left].ty.scalar_component(),
            self.expressions[right].ty.scalar_component(),
        ) else {
            return Err(ConvertError::InvalidComparison {
                left: self.expressions[left].ty.clone(),
                right: self.expressions[right].ty.clone(),
            });
        };
        let common = TypeDenoter::Vector {
            size,
            scalar: left_scalar.promote(right_scalar),
        };
        let left = self
            .convert_if_cast_required(left, &common, true)?
            .unwrap_or(left);
        let right = self
            .convert_if_cast_required(right, &common, true)?
            .unwrap_or(right);
        Ok((left, right))
    }
}

#[cfg(test)]
mod tests {
    use crate::convert::tests::{init_logger, rendered_statements, Builder};
    use crate::{
        convert, BinaryOperator, ConversionFlags, ConvertError, Expression, ExpressionKind,
        Handle, Scalar, StatementKind, TypeDenoter, VectorSize,
    };

    fn vector(size: VectorSize, scalar: Scalar) -> TypeDenoter {
        TypeDenoter::Vector { size, scalar }
    }

    fn compare(
        builder: &mut Builder,
        op: BinaryOperator,
        left: (&str, TypeDenoter),
        right: (&str, TypeDenoter),
    ) -> Handle<Expression> {
        let size = left.1.vector_size().or(right.1.vector_size());
        let left = builder.var(left.0, left.1);
        let right = builder.var(right.0, right.1);
        let ty = match size {
            Some(size) => vector(size, Scalar::BOOL),
            None => TypeDenoter::Scalar(Scalar::BOOL),
        };
        builder.expr(ExpressionKind::Binary { op, left, right }, ty)
    }

    #[test]
    fn every_operator() {
        init_logger();
        let vec2 = vector(VectorSize::Bi, Scalar::F32);
        let mut builder = Builder::default();
        let ops = [
            BinaryOperator::Less,
            BinaryOperator::LessEqual,
            BinaryOperator::Greater,
            BinaryOperator::GreaterEqual,
            BinaryOperator::Equal,
            BinaryOperator::NotEqual,
        ];
        let stmts = ops
            .into_iter()
            .map(|op| {
                StatementKind::Expression(compare(
                    &mut builder,
                    op,
                    ("a", vec2.clone()),
                    ("b", vec2.clone()),
                ))
            })
            .collect();
        let mut program = builder.finish(stmts);
        convert(&mut program, ConversionFlags::VECTOR_COMPARE).unwrap();
        assert_eq!(
            rendered_statements(&program),
            [
                "lessThan(a, b)",
                "lessThanEqual(a, b)",
                "greaterThan(a, b)",
                "greaterThanEqual(a, b)",
                "equal(a, b)",
                "notEqual(a, b)",
            ]
        );
    }

    #[test]
    fn scalars_stay_binary() {
        init_logger();
        let float = TypeDenoter::Scalar(Scalar::F32);
        let mut builder = Builder::default();
        let less = compare(
            &mut builder,
            BinaryOperator::Less,
            ("a", float.clone()),
            ("b", float),
        );
        let mut program = builder.finish(vec![StatementKind::Expression(less)]);
        convert(&mut program, ConversionFlags::VECTOR_COMPARE).unwrap();
        assert_eq!(rendered_statements(&program), ["a < b"]);
    }

    #[test]
    fn mixed_operands() {
        init_logger();
        let vec3 = vector(VectorSize::Tri, Scalar::F32);
        let int = TypeDenoter::Scalar(Scalar::I32);

        let mut builder = Builder::default();
        let less = compare(
            &mut builder,
            BinaryOperator::Less,
            ("v", vec3.clone()),
            ("i", int.clone()),
        );
        let mut program = builder.finish(vec![StatementKind::Expression(less)]);
        let err = convert(&mut program, ConversionFlags::VECTOR_COMPARE).unwrap_err();
        assert_eq!(
            err.as_inner(),
            &ConvertError::InvalidComparison {
                left: vec3.clone(),
                right: int.clone(),
            }
        );
        assert!(err.location().is_some());

        let mut builder = Builder::default();
        let less = compare(
            &mut builder,
            BinaryOperator::Less,
            ("v", vec3),
            ("i", int),
        );
        let mut program = builder.finish(vec![StatementKind::Expression(less)]);
        convert(
            &mut program,
            ConversionFlags::VECTOR_COMPARE | ConversionFlags::IMPLICIT_CASTS,
        )
        .unwrap();
        assert_eq!(rendered_statements(&program), ["lessThan(v, vec3(i))"]);
    }

    #[test]
    fn mismatched_widths() {
        init_logger();
        let mut builder = Builder::default();
        let less = compare(
            &mut builder,
            BinaryOperator::GreaterEqual,
            ("a", vector(VectorSize::Bi, Scalar::F32)),
            ("b", vector(VectorSize::Quad, Scalar::F32)),
        );
        let mut program = builder.finish(vec![StatementKind::Expression(less)]);
        let err = convert(&mut program, ConversionFlags::all()).unwrap_err();
        assert!(matches!(
            err.into_inner(),
            ConvertError::InvalidComparison { .. }
        ));

        // Only scalars are replicated; a matrix never meets a vector.
        let mat2 = TypeDenoter::Matrix {
            columns: VectorSize::Bi,
            rows: VectorSize::Bi,
            scalar: Scalar::F32,
        };
        let mut builder = Builder::default();
        let less = compare(
            &mut builder,
            BinaryOperator::Less,
            ("a", vector(VectorSize::Bi, Scalar::F32)),
            ("m", mat2.clone()),
        );
        let mut program = builder.finish(vec![StatementKind::Expression(less)]);
        let err = convert(&mut program, ConversionFlags::all()).unwrap_err();
        assert_eq!(
            err.into_inner(),
            ConvertError::InvalidComparison {
                left: vector(VectorSize::Bi, Scalar::F32),
                right: mat2,
            }
        );
    }

    #[test]
    fn operand_types_are_unified() {
        init_logger();
        let mut builder = Builder::default();
        let equal = compare(
            &mut builder,
            BinaryOperator::Equal,
            ("a", vector(VectorSize::Quad, Scalar::I32)),
            ("b", vector(VectorSize::Quad, Scalar::F32)),
        );
        let mut program = builder.finish(vec![StatementKind::Expression(equal)]);
        convert(&mut program, ConversionFlags::all()).unwrap();
        assert_eq!(rendered_statements(&program), ["equal(vec4(a), b)"]);

        // A second pass finds nothing to do.
        let len = program.expressions.len();
        convert(&mut program, ConversionFlags::all()).unwrap();
        assert_eq!(program.expressions.len(), len);
    }
}
