//! Indexers on storage images.
//!
//! The source language reads and writes texels of a storage image with array
//! syntax, `img[coord]`. The target language only accepts `imageLoad` and
//! `imageStore` calls, so reads become loads and assignment statements
//! become stores:
//!
//! ```text
//! img[i]            imageLoad(img, i)
//! img[i].xy         imageLoad(img, i).xy
//! img[i] = v;       imageStore(img, i, v);
//! img[i] += v;      imageStore(img, i, imageLoad(img, i) + v);
//! ```
//!
//! A store has no value, so an assignment to an image texel is only accepted
//! as a statement of its own.

use super::{ConvertError, Converter, ExprContext};
use crate::arena::Handle;
use crate::proc::duplicate_expression;
use crate::{
    BinaryOperator, Builtin, Callee, Expression, ExpressionKind, Literal, Scalar, ScalarKind,
    TypeDenoter, VarIdent, VectorSize,
};

/// The image operand of an indexer.
enum ImageBase {
    /// An arbitrary expression that evaluates to the image.
    Expression(Handle<Expression>),
    /// A variable access path ending at the image. No expression exists for
    /// it yet, since the path was a prefix of a longer one.
    Variable(VarIdent),
}

/// An indexer on a storage image, taken apart.
struct ImageAccess {
    image: ImageBase,
    image_ty: TypeDenoter,
    coordinate: Handle<Expression>,
    /// Indexers applied to the texel, in source order.
    indices: Vec<Handle<Expression>>,
    /// Member accessors applied to the texel after `indices`.
    next: Option<Box<VarIdent>>,
}

impl ImageAccess {
    fn has_trailing_access(&self) -> bool {
        !self.indices.is_empty() || self.next.is_some()
    }
}

/// Find the first indexer of the chain that is applied to a storage image.
fn split_variable(ident: &VarIdent) -> Option<ImageAccess> {
    let mut ty = ident.ty.clone();
    for (position, &index) in ident.indices.iter().enumerate() {
        if ty.is_storage_image() {
            let image = VarIdent {
                name: ident.name.clone(),
                ty: ident.ty.clone(),
                indices: ident.indices[..position].to_vec(),
                next: None,
            };
            return Some(ImageAccess {
                image: ImageBase::Variable(image),
                image_ty: ty,
                coordinate: index,
                indices: ident.indices[position + 1..].to_vec(),
                next: ident.next.clone(),
            });
        }
        ty = ty.indexed()?;
    }

    let mut access = split_variable(ident.next.as_deref()?)?;
    if let ImageBase::Variable(inner) = access.image {
        access.image = ImageBase::Variable(VarIdent {
            name: ident.name.clone(),
            ty: ident.ty.clone(),
            indices: ident.indices.clone(),
            next: Some(Box::new(inner)),
        });
    }
    Some(access)
}

/// The swizzle that narrows the four components of a load to `texel`.
fn narrowing_swizzle(texel: &TypeDenoter) -> Option<&'static str> {
    match *texel {
        TypeDenoter::Scalar(_) => Some("x"),
        TypeDenoter::Vector { size, .. } => match size {
            VectorSize::Bi => Some("xy"),
            VectorSize::Tri => Some("xyz"),
            VectorSize::Quad => None,
        },
        _ => None,
    }
}

const fn zero(scalar: Scalar) -> Literal {
    match scalar.kind {
        ScalarKind::Bool => Literal::Bool(false),
        ScalarKind::Sint => Literal::Int(0),
        ScalarKind::Uint => Literal::Uint(0),
        ScalarKind::Float => Literal::Float(0.0),
    }
}

impl Converter<'_> {
    fn image_access(&self, handle: Handle<Expression>) -> Option<ImageAccess> {
        match self.expressions[handle].kind {
            ExpressionKind::Index { base, index } => {
                let image_ty = &self.expressions[base].ty;
                image_ty.is_storage_image().then(|| ImageAccess {
                    image: ImageBase::Expression(base),
                    image_ty: image_ty.clone(),
                    coordinate: index,
                    indices: Vec::new(),
                    next: None,
                })
            }
            ExpressionKind::Variable(ref ident) => split_variable(ident),
            _ => None,
        }
    }

    /// Turn the image operand into an expression of its own.
    fn image_expression(
        &mut self,
        access: &ImageAccess,
        origin: Handle<Expression>,
    ) -> Handle<Expression> {
        match access.image {
            ImageBase::Expression(image) => image,
            ImageBase::Variable(ref ident) => self.append(
                ExpressionKind::Variable(ident.clone()),
                access.image_ty.clone(),
                origin,
            ),
        }
    }

    fn texel_type(access: &ImageAccess) -> Result<TypeDenoter, ConvertError> {
        access
            .image_ty
            .texel()
            .ok_or(ConvertError::StructuralAssumption("image type without texel type"))
    }

    fn value_type(access: &ImageAccess) -> Result<TypeDenoter, ConvertError> {
        access
            .image_ty
            .image_value()
            .ok_or(ConvertError::StructuralAssumption("image type without texel type"))
    }

    pub(super) fn convert_image_access(
        &mut self,
        handle: Handle<Expression>,
        ctx: &ExprContext,
    ) -> Result<Option<Handle<Expression>>, ConvertError> {
        match self.expressions[handle].kind {
            ExpressionKind::Assign { op, target, value } => {
                let Some(access) = self.image_access(target) else {
                    return Ok(None);
                };
                if *ctx != ExprContext::Statement {
                    return Err(ConvertError::StructuralAssumption(
                        "image store used as a value",
                    ));
                }
                if access.has_trailing_access() {
                    return Err(ConvertError::StructuralAssumption(
                        "image store through a member or component accessor",
                    ));
                }
                self.store(handle, &access, op, value).map(Some)
            }
            ExpressionKind::Index { .. } | ExpressionKind::Variable(_) => {
                let Some(access) = self.image_access(handle) else {
                    return Ok(None);
                };
                if *ctx == ExprContext::WriteTarget {
                    return Err(ConvertError::StructuralAssumption(
                        "image texel modified outside of an assignment statement",
                    ));
                }
                self.load(handle, access).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// `imageLoad(image, coordinate)`, narrowed to the texel type.
    fn load_texel(
        &mut self,
        image: Handle<Expression>,
        coordinate: Handle<Expression>,
        access: &ImageAccess,
        origin: Handle<Expression>,
    ) -> Result<Handle<Expression>, ConvertError> {
        let texel = Self::texel_type(access)?;
        let load = self.append(
            ExpressionKind::Call {
                callee: Callee::Builtin(Builtin::ImageLoad),
                arguments: vec![image, coordinate],
            },
            Self::value_type(access)?,
            origin,
        );
        Ok(match narrowing_swizzle(&texel) {
            Some(swizzle) => self.append(
                ExpressionKind::Member {
                    base: load,
                    member: swizzle.to_string(),
                },
                texel,
                origin,
            ),
            None => load,
        })
    }

    fn store(
        &mut self,
        handle: Handle<Expression>,
        access: &ImageAccess,
        op: Option<BinaryOperator>,
        value: Handle<Expression>,
    ) -> Result<Handle<Expression>, ConvertError> {
        let texel = Self::texel_type(access)?;
        let image = self.image_expression(access, handle);

        // Compound stores read the texel first, through copies of the image
        // and coordinate expressions.
        let value = match op {
            None => value,
            Some(op) => {
                let image = duplicate_expression(&mut *self.expressions, image);
                let coordinate = duplicate_expression(&mut *self.expressions, access.coordinate);
                let load = self.load_texel(image, coordinate, access, handle)?;
                self.append(
                    ExpressionKind::Binary {
                        op,
                        left: load,
                        right: value,
                    },
                    texel,
                    handle,
                )
            }
        };

        // `imageStore` takes four components. Narrower vectors are padded
        // with zeros; scalars are replicated by the cast of the argument.
        let value_ty = Self::value_type(access)?;
        let width = self.expressions[value].ty.vector_size();
        let value = match (width, value_ty.scalar_component()) {
            (Some(size), Some(scalar)) if size < VectorSize::Quad => {
                let mut components = vec![value];
                for _ in size.count()..VectorSize::Quad.count() {
                    let zero = self.append(
                        ExpressionKind::Literal(zero(scalar)),
                        TypeDenoter::Scalar(scalar),
                        handle,
                    );
                    components.push(zero);
                }
                self.append(ExpressionKind::Compose { components }, value_ty, handle)
            }
            _ => value,
        };

        Ok(self.append(
            ExpressionKind::Call {
                callee: Callee::Builtin(Builtin::ImageStore),
                arguments: vec![image, access.coordinate, value],
            },
            TypeDenoter::Void,
            handle,
        ))
    }

    fn load(
        &mut self,
        handle: Handle<Expression>,
        access: ImageAccess,
    ) -> Result<Handle<Expression>, ConvertError> {
        let mut ty = Self::texel_type(&access)?;
        let image = self.image_expression(&access, handle);
        let mut result = self.load_texel(image, access.coordinate, &access, handle)?;

        // Rebuild whatever the source applied to the texel on top of the load.
        let mut indices = access.indices;
        let mut next = access.next;
        loop {
            for index in indices {
                ty = ty.indexed().ok_or(ConvertError::StructuralAssumption(
                    "indexer on a texel component",
                ))?;
                result = self.append(
                    ExpressionKind::Index {
                        base: result,
                        index,
                    },
                    ty.clone(),
                    handle,
                );
            }
            let Some(link) = next else {
                break;
            };
            let VarIdent {
                name,
                ty: member_ty,
                indices: member_indices,
                next: member_next,
            } = *link;
            result = self.append(
                ExpressionKind::Member {
                    base: result,
                    member: name,
                },
                member_ty.clone(),
                handle,
            );
            ty = member_ty;
            indices = member_indices;
            next = member_next;
        }
        Ok(result)
    }
}
