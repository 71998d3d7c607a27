//! Explicit casts for implicit conversions.

use super::{ConvertError, Converter};
use crate::arena::Handle;
use crate::proc::{must_cast, CastDecision};
use crate::{Expression, ExpressionKind, TypeDenoter};

impl Converter<'_> {
    /// Wrap `handle` in a cast if its value can not be used as `target`
    /// as is.
    pub(super) fn convert_if_cast_required(
        &mut self,
        handle: Handle<Expression>,
        target: &TypeDenoter,
        match_size: bool,
    ) -> Result<Option<Handle<Expression>>, ConvertError> {
        let source = &self.expressions[handle].ty;
        let decision = must_cast(target, source, match_size)?;
        let ty = match decision {
            CastDecision::Keep => return Ok(None),
            CastDecision::Cast(ty) => {
                log::trace!("cast `{source}` to `{ty}`");
                ty
            }
            CastDecision::Broadcast(ty) => {
                log::trace!("broadcast `{source}` to `{ty}`");
                ty
            }
        };
        Ok(Some(self.append(ExpressionKind::Cast(handle), ty, handle)))
    }
}
