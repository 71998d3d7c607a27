//! Deciding whether a value needs an explicit conversion.
//!
//! The source language converts freely between numeric types, broadcasts
//! scalars into vectors and truncates vectors and matrices to smaller ones.
//! The target language only accepts these through explicit constructors, so
//! [`must_cast`] tells the conversion pass which constructor, if any, to wrap
//! a value in.

use crate::{TypeDenoter, VectorSize};

/// The shape of a type, as far as conversions are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeCategory {
    Void,
    Scalar,
    Vector(VectorSize),
    Matrix {
        columns: VectorSize,
        rows: VectorSize,
    },
    /// Images, samplers, arrays and structures. These only ever convert to
    /// themselves.
    Opaque,
}

impl TypeDenoter {
    pub const fn category(&self) -> TypeCategory {
        match *self {
            Self::Void => TypeCategory::Void,
            Self::Scalar(_) => TypeCategory::Scalar,
            Self::Vector { size, .. } => TypeCategory::Vector(size),
            Self::Matrix { columns, rows, .. } => TypeCategory::Matrix { columns, rows },
            Self::Image { .. }
            | Self::Sampler { .. }
            | Self::Array { .. }
            | Self::Struct { .. } => TypeCategory::Opaque,
        }
    }
}

/// What has to happen to a value before it can be used as another type.
#[derive(Clone, Debug, PartialEq)]
pub enum CastDecision {
    /// The value is used as is.
    Keep,
    /// Wrap the value in a conversion to the given type.
    Cast(TypeDenoter),
    /// Wrap a scalar in a conversion to the given vector type, replicating it
    /// into every component.
    Broadcast(TypeDenoter),
}

/// A value of type `from` can not be used where `to` is expected.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[error("no conversion from `{from}` to `{to}`")]
pub struct IncompatibleTypes {
    pub from: TypeDenoter,
    pub to: TypeDenoter,
}

/// Decide how a value of type `source` becomes a value of type `target`.
///
/// With `match_size` unset only the component type has to agree, and a cast
/// keeps the shape of `source`. This is how scalar operands of binary
/// expressions are treated.
pub fn must_cast(
    target: &TypeDenoter,
    source: &TypeDenoter,
    match_size: bool,
) -> Result<CastDecision, IncompatibleTypes> {
    use TypeCategory as Tc;

    if target == source {
        return Ok(CastDecision::Keep);
    }
    let incompatible = || IncompatibleTypes {
        from: source.clone(),
        to: target.clone(),
    };

    let (Some(target_scalar), Some(source_scalar)) =
        (target.scalar_component(), source.scalar_component())
    else {
        return Err(incompatible());
    };

    if !match_size {
        if target_scalar == source_scalar {
            return Ok(CastDecision::Keep);
        }
        return source
            .with_scalar(target_scalar)
            .map(CastDecision::Cast)
            .ok_or_else(incompatible);
    }

    // Identical types were handled above, so every numeric pair that reaches
    // this table needs a conversion of some kind.
    match (target.category(), source.category()) {
        (Tc::Scalar, Tc::Scalar) => Ok(CastDecision::Cast(target.clone())),
        (Tc::Vector(_), Tc::Scalar) => Ok(CastDecision::Broadcast(target.clone())),
        // Keeps the first component.
        (Tc::Scalar, Tc::Vector(_)) => Ok(CastDecision::Cast(target.clone())),
        (Tc::Vector(to), Tc::Vector(from)) if to <= from => Ok(CastDecision::Cast(target.clone())),
        (
            Tc::Matrix {
                columns: to_columns,
                rows: to_rows,
            },
            Tc::Matrix {
                columns: from_columns,
                rows: from_rows,
            },
        ) if to_columns <= from_columns && to_rows <= from_rows => {
            Ok(CastDecision::Cast(target.clone()))
        }
        // Widening vectors or matrices, and mixing vectors with matrices.
        _ => Err(incompatible()),
    }
}
