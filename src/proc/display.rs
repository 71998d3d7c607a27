//! GLSL-flavoured rendering of types and expressions, for logs and tests.

use std::fmt::{self, Display, Formatter};

use crate::arena::{Arena, Handle};
use crate::{
    Callee, Expression, ExpressionKind, GlobalDecl, ImageClass, ImageDimension, Literal, Program,
    Scalar, ScalarKind, TypeDenoter, VarIdent,
};

/// Resolves the names of user functions referenced by calls.
pub trait FunctionNames {
    fn function_name(&self, function: Handle<GlobalDecl>) -> Option<&str>;
}

impl FunctionNames for Arena<GlobalDecl> {
    fn function_name(&self, function: Handle<GlobalDecl>) -> Option<&str> {
        match *self.try_get(function).ok()? {
            GlobalDecl::Function(ref function) => Some(&function.name),
            GlobalDecl::Variable(_) => None,
        }
    }
}

/// Prefix of a vector or matrix type name for the given components.
const fn vector_prefix(scalar: Scalar) -> &'static str {
    match (scalar.kind, scalar.width) {
        (ScalarKind::Bool, _) => "b",
        (ScalarKind::Sint, 8) => "i64",
        (ScalarKind::Sint, _) => "i",
        (ScalarKind::Uint, 8) => "u64",
        (ScalarKind::Uint, _) => "u",
        (ScalarKind::Float, 2) => "f16",
        (ScalarKind::Float, 8) => "d",
        (ScalarKind::Float, _) => "",
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match (self.kind, self.width) {
            (ScalarKind::Bool, _) => "bool",
            (ScalarKind::Sint, 8) => "int64_t",
            (ScalarKind::Sint, _) => "int",
            (ScalarKind::Uint, 8) => "uint64_t",
            (ScalarKind::Uint, _) => "uint",
            (ScalarKind::Float, 2) => "float16_t",
            (ScalarKind::Float, 8) => "double",
            (ScalarKind::Float, _) => "float",
        })
    }
}

impl Display for TypeDenoter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Void => f.write_str("void"),
            Self::Scalar(scalar) => scalar.fmt(f),
            Self::Vector { size, scalar } => {
                write!(f, "{}vec{}", vector_prefix(scalar), size.count())
            }
            Self::Matrix {
                columns,
                rows,
                scalar,
            } => {
                let prefix = vector_prefix(scalar);
                if columns == rows {
                    write!(f, "{prefix}mat{}", columns.count())
                } else {
                    write!(f, "{prefix}mat{}x{}", columns.count(), rows.count())
                }
            }
            Self::Image {
                dim,
                arrayed,
                class,
                scalar,
                ..
            } => {
                let dim = match dim {
                    ImageDimension::D1 => "1D",
                    ImageDimension::D2 => "2D",
                    ImageDimension::D3 => "3D",
                    ImageDimension::Cube => "Cube",
                };
                let prefix = match scalar.kind {
                    ScalarKind::Sint => "i",
                    ScalarKind::Uint => "u",
                    ScalarKind::Bool | ScalarKind::Float => "",
                };
                let array = if arrayed { "Array" } else { "" };
                match class {
                    ImageClass::Storage => write!(f, "{prefix}image{dim}{array}"),
                    ImageClass::Sampled { multi } => {
                        let ms = if multi { "MS" } else { "" };
                        write!(f, "{prefix}sampler{dim}{ms}{array}")
                    }
                }
            }
            Self::Sampler { comparison: false } => f.write_str("sampler"),
            Self::Sampler { comparison: true } => f.write_str("samplerShadow"),
            Self::Array { ref base, size } => match size {
                Some(size) => write!(f, "{base}[{size}]"),
                None => write!(f, "{base}[]"),
            },
            Self::Struct { ref name } => f.write_str(name),
        }
    }
}

/// Renders an expression tree, see [`Program::display_expression`].
pub struct DisplayExpression<'a> {
    expressions: &'a Arena<Expression>,
    functions: &'a dyn FunctionNames,
    handle: Handle<Expression>,
}

impl<'a> DisplayExpression<'a> {
    pub fn new(
        expressions: &'a Arena<Expression>,
        functions: &'a dyn FunctionNames,
        handle: Handle<Expression>,
    ) -> Self {
        Self {
            expressions,
            functions,
            handle,
        }
    }

    fn write_list(&self, f: &mut Formatter<'_>, handles: &[Handle<Expression>]) -> fmt::Result {
        for (i, &handle) in handles.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            self.write(f, handle)?;
        }
        Ok(())
    }

    fn write_ident(&self, f: &mut Formatter<'_>, ident: &VarIdent) -> fmt::Result {
        f.write_str(&ident.name)?;
        for &index in ident.indices.iter() {
            f.write_str("[")?;
            self.write(f, index)?;
            f.write_str("]")?;
        }
        if let Some(ref next) = ident.next {
            f.write_str(".")?;
            self.write_ident(f, next)?;
        }
        Ok(())
    }

    fn write(&self, f: &mut Formatter<'_>, handle: Handle<Expression>) -> fmt::Result {
        let Ok(expr) = self.expressions.try_get(handle) else {
            return write!(f, "<invalid {handle:?}>");
        };
        match expr.kind {
            ExpressionKind::Literal(literal) => match literal {
                Literal::Bool(value) => write!(f, "{value}"),
                Literal::Int(value) => write!(f, "{value}"),
                Literal::Uint(value) => write!(f, "{value}u"),
                Literal::Float(value) => write!(f, "{value:?}"),
            },
            ExpressionKind::Variable(ref ident) => self.write_ident(f, ident),
            ExpressionKind::Index { base, index } => {
                self.write(f, base)?;
                f.write_str("[")?;
                self.write(f, index)?;
                f.write_str("]")
            }
            ExpressionKind::Call {
                ref callee,
                ref arguments,
            } => {
                match *callee {
                    Callee::Function(function) => match self.functions.function_name(function) {
                        Some(name) => f.write_str(name)?,
                        None => write!(f, "<function {function:?}>")?,
                    },
                    Callee::Builtin(builtin) => f.write_str(builtin.name())?,
                    Callee::Intrinsic(ref name) => f.write_str(name)?,
                }
                f.write_str("(")?;
                self.write_list(f, arguments)?;
                f.write_str(")")
            }
            ExpressionKind::Unary { op, expr } => {
                if op.is_postfix() {
                    self.write(f, expr)?;
                    f.write_str(op.token())
                } else {
                    f.write_str(op.token())?;
                    self.write(f, expr)
                }
            }
            ExpressionKind::Binary { op, left, right } => {
                self.write(f, left)?;
                write!(f, " {} ", op.token())?;
                self.write(f, right)
            }
            ExpressionKind::Ternary {
                condition,
                accept,
                reject,
            } => {
                self.write(f, condition)?;
                f.write_str(" ? ")?;
                self.write(f, accept)?;
                f.write_str(" : ")?;
                self.write(f, reject)
            }
            ExpressionKind::Bracket(inner) => {
                f.write_str("(")?;
                self.write(f, inner)?;
                f.write_str(")")
            }
            ExpressionKind::Cast(inner) => {
                write!(f, "{}(", expr.ty)?;
                self.write(f, inner)?;
                f.write_str(")")
            }
            ExpressionKind::Compose { ref components } => {
                write!(f, "{}(", expr.ty)?;
                self.write_list(f, components)?;
                f.write_str(")")
            }
            ExpressionKind::Member { base, ref member } => {
                self.write(f, base)?;
                write!(f, ".{member}")
            }
            ExpressionKind::Assign { op, target, value } => {
                self.write(f, target)?;
                match op {
                    Some(op) => write!(f, " {}= ", op.token())?,
                    None => f.write_str(" = ")?,
                }
                self.write(f, value)
            }
        }
    }
}

impl Display for DisplayExpression<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write(f, self.handle)
    }
}

impl Program {
    /// Render the expression tree rooted at `handle` in target-language
    /// syntax.
    ///
    /// Operators are printed without any parentheses but those recorded as
    /// [`ExpressionKind::Bracket`], which is what a code emitter that trusts
    /// the tree would produce.
    pub fn display_expression(&self, handle: Handle<Expression>) -> DisplayExpression<'_> {
        DisplayExpression::new(&self.expressions, &self.decls, handle)
    }
}
