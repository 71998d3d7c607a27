//! Bracketing nested unary expressions.
//!
//! An emitter printing `-` in front of `-a` produces `--a`, which reads back
//! as a decrement. Wrapping the operand in brackets keeps the tokens apart.

use super::Converter;
use crate::arena::Handle;
use crate::{Expression, ExpressionKind, Literal, UnaryOperator};

impl Converter<'_> {
    /// The character the expression starts with when printed, if it is an
    /// operator character that could merge with a preceding operator.
    fn leading_sign(&self, handle: Handle<Expression>) -> Option<char> {
        match self.expressions[handle].kind {
            ExpressionKind::Unary { op, expr } if op.is_postfix() => self.leading_sign(expr),
            ExpressionKind::Unary { op, .. } => op.token().chars().next(),
            ExpressionKind::Literal(Literal::Int(value)) if value < 0 => Some('-'),
            ExpressionKind::Literal(Literal::Float(value)) if value.is_sign_negative() => Some('-'),
            _ => None,
        }
    }

    pub(super) fn convert_nested_unary(
        &mut self,
        handle: Handle<Expression>,
    ) -> Option<Handle<Expression>> {
        let expr = &self.expressions[handle];
        let ExpressionKind::Unary { op, expr: operand } = expr.kind else {
            return None;
        };
        if op.is_postfix() {
            return None;
        }
        let trailing = match op {
            UnaryOperator::Negate | UnaryOperator::PreDecrement => '-',
            UnaryOperator::Plus | UnaryOperator::PreIncrement => '+',
            _ => return None,
        };
        if self.leading_sign(operand) != Some(trailing) {
            return None;
        }

        let ty = expr.ty.clone();
        let operand_ty = self.expressions[operand].ty.clone();
        let bracket = self.append(ExpressionKind::Bracket(operand), operand_ty, operand);
        Some(self.append(
            ExpressionKind::Unary { op, expr: bracket },
            ty,
            handle,
        ))
    }
}
