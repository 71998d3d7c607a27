/*!
[`TypeDenoter`] queries, operator metadata and other helpers shared by the
conversion rules and by compaction.
*/

mod conversion;
mod display;

pub use conversion::{must_cast, CastDecision, IncompatibleTypes, TypeCategory};
pub use display::{DisplayExpression, FunctionNames};

use crate::arena::{Arena, Handle};
use crate::{
    BinaryOperator, Builtin, Expression, ExpressionKind, ImageClass, ImageDimension,
    Scalar, ScalarKind, TypeDenoter, UnaryOperator, VarIdent, VectorSize,
};

impl Scalar {
    pub const BOOL: Self = Self {
        kind: ScalarKind::Bool,
        width: crate::BOOL_WIDTH,
    };
    pub const I32: Self = Self {
        kind: ScalarKind::Sint,
        width: 4,
    };
    pub const U32: Self = Self {
        kind: ScalarKind::Uint,
        width: 4,
    };
    pub const F16: Self = Self {
        kind: ScalarKind::Float,
        width: 2,
    };
    pub const F32: Self = Self {
        kind: ScalarKind::Float,
        width: 4,
    };
    pub const F64: Self = Self {
        kind: ScalarKind::Float,
        width: 8,
    };

    /// Pick the scalar both operands of an arithmetic expression are
    /// promoted to: `bool < int < uint < float`, wider before narrower.
    pub fn promote(self, other: Self) -> Self {
        // `Scalar` orders by kind first, then by width.
        self.max(other)
    }
}

impl VectorSize {
    pub const fn from_count(count: u8) -> Option<Self> {
        match count {
            2 => Some(Self::Bi),
            3 => Some(Self::Tri),
            4 => Some(Self::Quad),
            _ => None,
        }
    }

    pub const fn count(self) -> u8 {
        self as u8
    }
}

impl ImageDimension {
    /// Number of coordinates needed to address a texel.
    pub const fn coordinates(self) -> u8 {
        match self {
            Self::D1 => 1,
            Self::D2 => 2,
            Self::D3 | Self::Cube => 3,
        }
    }
}

impl TypeDenoter {
    pub const fn is_scalar(&self) -> bool {
        matches!(*self, Self::Scalar(_))
    }

    /// The width of a vector type, `None` for anything else.
    pub const fn vector_size(&self) -> Option<VectorSize> {
        match *self {
            Self::Vector { size, .. } => Some(size),
            _ => None,
        }
    }

    /// Whether this is an image resource that the target language only
    /// reaches through `imageLoad`/`imageStore`.
    pub const fn is_storage_image(&self) -> bool {
        matches!(
            *self,
            Self::Image {
                class: ImageClass::Storage,
                ..
            }
        )
    }

    /// The component type of a scalar, vector or matrix.
    pub const fn scalar_component(&self) -> Option<Scalar> {
        match *self {
            Self::Scalar(scalar) | Self::Vector { scalar, .. } | Self::Matrix { scalar, .. } => {
                Some(scalar)
            }
            _ => None,
        }
    }

    /// The same shape with a different component type.
    pub fn with_scalar(&self, scalar: Scalar) -> Option<Self> {
        match *self {
            Self::Scalar(_) => Some(Self::Scalar(scalar)),
            Self::Vector { size, .. } => Some(Self::Vector { size, scalar }),
            Self::Matrix { columns, rows, .. } => Some(Self::Matrix {
                columns,
                rows,
                scalar,
            }),
            _ => None,
        }
    }

    /// Scalar or vector with `count` components of `scalar`.
    pub fn scalar_or_vector(scalar: Scalar, count: u8) -> Option<Self> {
        if count == 1 {
            Some(Self::Scalar(scalar))
        } else {
            VectorSize::from_count(count).map(|size| Self::Vector { size, scalar })
        }
    }

    /// The type of a single texel of an image.
    pub fn texel(&self) -> Option<Self> {
        match *self {
            Self::Image {
                scalar, components, ..
            } => Some(match components {
                Some(size) => Self::Vector { size, scalar },
                None => Self::Scalar(scalar),
            }),
            _ => None,
        }
    }

    /// The four-component vector `imageLoad` returns and `imageStore` takes,
    /// whatever the number of channels of the image.
    pub fn image_value(&self) -> Option<Self> {
        match *self {
            Self::Image { scalar, .. } => Some(Self::Vector {
                size: VectorSize::Quad,
                scalar,
            }),
            _ => None,
        }
    }

    /// The signed integer coordinate type that addresses a texel of an image.
    pub fn image_coordinate(&self) -> Option<Self> {
        match *self {
            // Cube faces are addressed by a third coordinate, which arrayed
            // cube images share with the layer: `layer * 6 + face`.
            Self::Image {
                dim: ImageDimension::Cube,
                ..
            } => Self::scalar_or_vector(Scalar::I32, 3),
            Self::Image { dim, arrayed, .. } => {
                Self::scalar_or_vector(Scalar::I32, dim.coordinates() + arrayed as u8)
            }
            _ => None,
        }
    }

    /// The type of `value[index]` for a `value` of this type.
    ///
    /// Matrices are indexed by column.
    pub fn indexed(&self) -> Option<Self> {
        match *self {
            Self::Vector { scalar, .. } => Some(Self::Scalar(scalar)),
            Self::Matrix { rows, scalar, .. } => Some(Self::Vector { size: rows, scalar }),
            Self::Array { ref base, .. } => Some((**base).clone()),
            Self::Image { .. } => self.texel(),
            _ => None,
        }
    }

    /// The type both operands of an arithmetic or relational expression are
    /// brought to before the operation is applied.
    ///
    /// Mixing a scalar with a vector or matrix keeps the larger shape, and two
    /// vectors or matrices meet at the smaller size. Returns `None` if the
    /// operands cannot meet, as for a vector and a matrix.
    pub fn common_type(&self, other: &Self) -> Option<Self> {
        let scalar = self.scalar_component()?.promote(other.scalar_component()?);
        match (self, other) {
            (&Self::Scalar(_), &Self::Scalar(_)) => Some(Self::Scalar(scalar)),
            (&Self::Vector { size, .. }, &Self::Scalar(_))
            | (&Self::Scalar(_), &Self::Vector { size, .. }) => Some(Self::Vector { size, scalar }),
            (&Self::Vector { size: a, .. }, &Self::Vector { size: b, .. }) => Some(Self::Vector {
                size: a.min(b),
                scalar,
            }),
            (&Self::Matrix { columns, rows, .. }, &Self::Scalar(_))
            | (&Self::Scalar(_), &Self::Matrix { columns, rows, .. }) => Some(Self::Matrix {
                columns,
                rows,
                scalar,
            }),
            (
                &Self::Matrix {
                    columns: ac,
                    rows: ar,
                    ..
                },
                &Self::Matrix {
                    columns: bc,
                    rows: br,
                    ..
                },
            ) => Some(Self::Matrix {
                columns: ac.min(bc),
                rows: ar.min(br),
                scalar,
            }),
            _ => None,
        }
    }

    /// Whether a value of type `other` can be used where `self` is expected,
    /// with or without a cast.
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        must_cast(self, other, true).is_ok()
    }
}

impl VarIdent {
    /// The type of this link after its own indices are applied, ignoring
    /// any `next` link.
    pub fn indexed_type(&self) -> Option<TypeDenoter> {
        self.indices
            .iter()
            .try_fold(self.ty.clone(), |ty, _| ty.indexed())
    }

    /// All index expressions of the chain, in source order.
    pub fn indices(&self) -> Vec<Handle<Expression>> {
        let mut out = Vec::new();
        let mut link = Some(self);
        while let Some(ident) = link {
            out.extend_from_slice(&ident.indices);
            link = ident.next.as_deref();
        }
        out
    }

    /// Mutable access to all index expressions of the chain, in the same order
    /// as [`indices`](Self::indices).
    pub fn indices_mut(&mut self) -> Vec<&mut Handle<Expression>> {
        let mut out = Vec::new();
        let mut link = Some(self);
        while let Some(ident) = link {
            let VarIdent { indices, next, .. } = ident;
            out.extend(indices.iter_mut());
            link = next.as_deref_mut();
        }
        out
    }
}

impl ExpressionKind {
    /// The direct operands of this expression, in evaluation order.
    pub fn operands(&self) -> Vec<Handle<Expression>> {
        match *self {
            Self::Literal(_) => Vec::new(),
            Self::Variable(ref ident) => ident.indices(),
            Self::Index { base, index } => vec![base, index],
            Self::Call { ref arguments, .. }
            | Self::Compose {
                components: ref arguments,
            } => arguments.clone(),
            Self::Unary { expr, .. } | Self::Bracket(expr) | Self::Cast(expr) => vec![expr],
            Self::Member { base, .. } => vec![base],
            Self::Binary { left, right, .. } => vec![left, right],
            Self::Ternary {
                condition,
                accept,
                reject,
            } => vec![condition, accept, reject],
            Self::Assign { target, value, .. } => vec![target, value],
        }
    }

    /// Mutable access to the operand slots, in the same order as
    /// [`operands`](Self::operands).
    pub fn operands_mut(&mut self) -> Vec<&mut Handle<Expression>> {
        match *self {
            Self::Literal(_) => Vec::new(),
            Self::Variable(ref mut ident) => ident.indices_mut(),
            Self::Index {
                ref mut base,
                ref mut index,
            } => vec![base, index],
            Self::Call {
                ref mut arguments, ..
            }
            | Self::Compose {
                components: ref mut arguments,
            } => arguments.iter_mut().collect(),
            Self::Unary { ref mut expr, .. }
            | Self::Bracket(ref mut expr)
            | Self::Cast(ref mut expr) => vec![expr],
            Self::Member { ref mut base, .. } => vec![base],
            Self::Binary {
                ref mut left,
                ref mut right,
                ..
            } => vec![left, right],
            Self::Ternary {
                ref mut condition,
                ref mut accept,
                ref mut reject,
            } => vec![condition, accept, reject],
            Self::Assign {
                ref mut target,
                ref mut value,
                ..
            } => vec![target, value],
        }
    }
}

/// Append a deep copy of the tree rooted at `handle`, so that the copy shares
/// no node with the original.
pub fn duplicate_expression(
    expressions: &mut Arena<Expression>,
    handle: Handle<Expression>,
) -> Handle<Expression> {
    let mut copy = expressions[handle].clone();
    for operand in copy.kind.operands_mut() {
        *operand = duplicate_expression(expressions, *operand);
    }
    let span = expressions.get_span(handle);
    expressions.append(copy, span)
}

impl UnaryOperator {
    pub const fn token(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Negate => "-",
            Self::LogicalNot => "!",
            Self::BitwiseNot => "~",
            Self::PreIncrement | Self::PostIncrement => "++",
            Self::PreDecrement | Self::PostDecrement => "--",
        }
    }

    pub const fn is_postfix(self) -> bool {
        matches!(self, Self::PostIncrement | Self::PostDecrement)
    }

    /// Whether the operand is written to, and so must be an l-value.
    pub const fn writes_operand(self) -> bool {
        matches!(
            self,
            Self::PreIncrement | Self::PreDecrement | Self::PostIncrement | Self::PostDecrement
        )
    }
}

impl BinaryOperator {
    pub const fn token(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::And => "&",
            Self::ExclusiveOr => "^",
            Self::InclusiveOr => "|",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
        }
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr)
    }

    pub const fn is_shift(self) -> bool {
        matches!(self, Self::ShiftLeft | Self::ShiftRight)
    }
}

impl Builtin {
    /// The name of the builtin in the target language.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LessThan => "lessThan",
            Self::LessThanEqual => "lessThanEqual",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanEqual => "greaterThanEqual",
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::ImageLoad => "imageLoad",
            Self::ImageStore => "imageStore",
        }
    }

    /// The component-wise builtin implementing a comparison operator.
    pub const fn for_comparison(op: BinaryOperator) -> Option<Self> {
        Some(match op {
            BinaryOperator::Less => Self::LessThan,
            BinaryOperator::LessEqual => Self::LessThanEqual,
            BinaryOperator::Greater => Self::GreaterThan,
            BinaryOperator::GreaterEqual => Self::GreaterThanEqual,
            BinaryOperator::Equal => Self::Equal,
            BinaryOperator::NotEqual => Self::NotEqual,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Literal, Span};

    const VEC3: TypeDenoter = TypeDenoter::Vector {
        size: VectorSize::Tri,
        scalar: Scalar::F32,
    };

    #[test]
    fn promote_prefers_float() {
        assert_eq!(Scalar::I32.promote(Scalar::F32), Scalar::F32);
        assert_eq!(Scalar::U32.promote(Scalar::I32), Scalar::U32);
        assert_eq!(Scalar::F16.promote(Scalar::F64), Scalar::F64);
        assert_eq!(Scalar::BOOL.promote(Scalar::I32), Scalar::I32);
    }

    #[test]
    fn common_types() {
        let ivec4 = TypeDenoter::Vector {
            size: VectorSize::Quad,
            scalar: Scalar::I32,
        };
        assert_eq!(
            ivec4.common_type(&VEC3),
            Some(TypeDenoter::Vector {
                size: VectorSize::Tri,
                scalar: Scalar::F32,
            })
        );
        assert_eq!(
            TypeDenoter::Scalar(Scalar::I32).common_type(&VEC3),
            Some(VEC3)
        );
        let mat = TypeDenoter::Matrix {
            columns: VectorSize::Tri,
            rows: VectorSize::Tri,
            scalar: Scalar::F32,
        };
        assert_eq!(mat.common_type(&VEC3), None);
        assert_eq!(TypeDenoter::Void.common_type(&VEC3), None);
    }

    #[test]
    fn image_queries() {
        let image = TypeDenoter::Image {
            dim: ImageDimension::D2,
            arrayed: true,
            class: ImageClass::Storage,
            scalar: Scalar::F32,
            components: Some(VectorSize::Quad),
        };
        assert!(image.is_storage_image());
        assert_eq!(
            image.image_coordinate(),
            Some(TypeDenoter::Vector {
                size: VectorSize::Tri,
                scalar: Scalar::I32,
            })
        );
        assert_eq!(
            image.indexed(),
            Some(TypeDenoter::Vector {
                size: VectorSize::Quad,
                scalar: Scalar::F32,
            })
        );

        let texture = TypeDenoter::Image {
            dim: ImageDimension::D1,
            arrayed: false,
            class: ImageClass::Sampled { multi: false },
            scalar: Scalar::F32,
            components: None,
        };
        assert!(!texture.is_storage_image());
        assert_eq!(
            texture.image_coordinate(),
            Some(TypeDenoter::Scalar(Scalar::I32))
        );
        assert_eq!(
            texture.image_value(),
            Some(TypeDenoter::Vector {
                size: VectorSize::Quad,
                scalar: Scalar::F32,
            })
        );
    }

    #[test]
    fn cube_coordinates() {
        let ivec3 = Some(TypeDenoter::Vector {
            size: VectorSize::Tri,
            scalar: Scalar::I32,
        });
        for arrayed in [false, true] {
            let cube = TypeDenoter::Image {
                dim: ImageDimension::Cube,
                arrayed,
                class: ImageClass::Storage,
                scalar: Scalar::U32,
                components: None,
            };
            assert_eq!(cube.image_coordinate(), ivec3);
        }
    }

    #[test]
    fn compatibility() {
        let int = TypeDenoter::Scalar(Scalar::I32);
        assert!(VEC3.is_compatible_with(&int));
        assert!(int.is_compatible_with(&VEC3));
        assert!(!VEC3.is_compatible_with(&TypeDenoter::Sampler { comparison: false }));
    }

    #[test]
    fn var_ident_chain() {
        let mut expressions = Arena::new();
        let i = expressions.append(
            Expression {
                kind: ExpressionKind::Literal(Literal::Int(1)),
                ty: TypeDenoter::Scalar(Scalar::I32),
            },
            Span::default(),
        );
        let j = expressions.append(
            Expression {
                kind: ExpressionKind::Literal(Literal::Int(2)),
                ty: TypeDenoter::Scalar(Scalar::I32),
            },
            Span::default(),
        );
        let mut ident = VarIdent {
            name: "lights".into(),
            ty: TypeDenoter::Array {
                base: Box::new(TypeDenoter::Struct {
                    name: "Light".into(),
                }),
                size: Some(4),
            },
            indices: vec![i],
            next: Some(Box::new(VarIdent {
                name: "color".into(),
                ty: VEC3,
                indices: vec![j],
                next: None,
            })),
        };
        assert_eq!(
            ident.indexed_type(),
            Some(TypeDenoter::Struct {
                name: "Light".into()
            })
        );
        assert_eq!(ident.indices(), [i, j]);
        for index in ident.indices_mut() {
            *index = i;
        }
        assert_eq!(ident.indices(), [i, i]);
    }

    #[test]
    fn duplicate_shares_nothing() {
        let mut expressions = Arena::new();
        let a = expressions.append(
            Expression {
                kind: ExpressionKind::Literal(Literal::Float(1.0)),
                ty: TypeDenoter::Scalar(Scalar::F32),
            },
            Span::new(0, 3),
        );
        let neg = expressions.append(
            Expression {
                kind: ExpressionKind::Unary {
                    op: UnaryOperator::Negate,
                    expr: a,
                },
                ty: TypeDenoter::Scalar(Scalar::F32),
            },
            Span::new(0, 4),
        );
        let copy = duplicate_expression(&mut expressions, neg);
        assert_ne!(copy, neg);
        assert_eq!(expressions.len(), 4);
        match expressions[copy].kind {
            ExpressionKind::Unary { expr, .. } => {
                assert_ne!(expr, a);
                assert_eq!(expressions[expr], expressions[a]);
            }
            ref other => panic!("unexpected {other:?}"),
        }
        assert_eq!(expressions.get_span(copy), Span::new(0, 4));
    }
}
