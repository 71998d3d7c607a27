/*! Expression normalization for shading-language cross-compilation.

The central structure of the crate is [`Program`]: a parsed and
semantically analyzed translation unit whose expressions have all been
annotated with a resolved [`TypeDenoter`].

To improve performance and keep rewriting cheap, every expression is stored in
one [`Arena`] and referred to through a [`Handle`]. A compound expression owns
its operands through those handles, and so do statements and declarations. The
handle field a parent holds is the operand's *slot*: [`convert`] rewrites a
sub-tree by appending the replacement to the arena and storing the new handle
into the slot, which the traversal then descends into.

The [`convert`] pass prepares a tree written in a source shading language with
HLSL-like rules for re-emission in a GLSL-like target, by:
  1. dropping no-op component accessors on scalars (`f.x` becomes `f`),
  2. turning component-wise vector comparisons into builtin calls
     (`a < b` becomes `lessThan(a, b)`),
  3. making implicit conversions explicit casts,
  4. bracketing nested unary expressions (`- -a` becomes `-(-a)`),
  5. turning indexers on storage images into `imageLoad`/`imageStore` calls.

Which of these run is selected with [`ConversionFlags`].
*/

#![allow(
    clippy::new_without_default,
    clippy::match_like_matches_macro,
    clippy::large_enum_variant
)]
#![warn(
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_qualifications
)]
#![deny(clippy::panic)]

mod arena;
pub mod compact;
pub mod convert;
mod non_max_u32;
pub mod proc;
mod span;

pub use crate::arena::{Arena, BadHandle, Handle};
pub use crate::convert::{convert, ConversionFlags, ConvertError};
pub use crate::span::{Span, WithSpan};

#[cfg(feature = "deserialize")]
use serde::Deserialize;
#[cfg(feature = "serialize")]
use serde::Serialize;

/// Number of bytes per scalar.
pub type Bytes = u8;

/// Width of a boolean type, in bytes.
pub const BOOL_WIDTH: Bytes = 1;

/// Number of components in a vector.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum VectorSize {
    /// 2D vector
    Bi = 2,
    /// 3D vector
    Tri = 3,
    /// 4D vector
    Quad = 4,
}

/// Primitive type for a scalar.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum ScalarKind {
    /// Boolean type.
    Bool,
    /// Signed integer type.
    Sint,
    /// Unsigned integer type.
    Uint,
    /// Floating point type.
    Float,
}

/// Characteristics of a scalar type.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct Scalar {
    /// How the value's bits are to be interpreted.
    pub kind: ScalarKind,
    /// Size of the value in bytes.
    pub width: Bytes,
}

/// The number of dimensions an image has.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum ImageDimension {
    /// 1D image
    D1,
    /// 2D image
    D2,
    /// 3D image
    D3,
    /// Cube map
    Cube,
}

/// How an image resource may be accessed.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum ImageClass {
    /// Read-only texture, sampled or fetched.
    Sampled { multi: bool },
    /// Read-write image. Only reachable through `imageLoad`/`imageStore` in
    /// the target language.
    Storage,
}

/// The resolved type of an expression, as computed by semantic analysis.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum TypeDenoter {
    /// No value, as produced by a call to a function returning nothing.
    Void,
    /// Number, integer or boolean.
    Scalar(Scalar),
    /// Vector of numbers, integers or booleans.
    Vector { size: VectorSize, scalar: Scalar },
    /// Matrix of numbers.
    Matrix {
        columns: VectorSize,
        rows: VectorSize,
        scalar: Scalar,
    },
    /// Image or texture resource.
    ///
    /// `scalar` and `components` describe a single texel; `components` is
    /// `None` for single-channel texels.
    Image {
        dim: ImageDimension,
        arrayed: bool,
        class: ImageClass,
        scalar: Scalar,
        components: Option<VectorSize>,
    },
    /// Sampler state.
    Sampler { comparison: bool },
    /// Fixed or runtime sized array.
    Array {
        base: Box<TypeDenoter>,
        size: Option<u32>,
    },
    /// User-defined structure, referred to by name.
    Struct { name: String },
}

/// Constant value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
}

/// Operation that can be applied on a single value.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum UnaryOperator {
    /// `+a`
    Plus,
    /// `-a`
    Negate,
    /// `!a`
    LogicalNot,
    /// `~a`
    BitwiseNot,
    /// `++a`
    PreIncrement,
    /// `--a`
    PreDecrement,
    /// `a++`
    PostIncrement,
    /// `a--`
    PostDecrement,
}

/// Operation that can be applied on two values.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    ExclusiveOr,
    InclusiveOr,
    LogicalAnd,
    LogicalOr,
    ShiftLeft,
    ShiftRight,
}

/// Target-language intrinsic introduced by the conversion rules.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum Builtin {
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Equal,
    NotEqual,
    /// `imageLoad(image, coordinate)`
    ImageLoad,
    /// `imageStore(image, coordinate, value)`
    ImageStore,
}

/// The function a [`Call`] expression invokes.
///
/// [`Call`]: ExpressionKind::Call
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum Callee {
    /// A function declared in the program. Its parameter types drive the
    /// argument conversions.
    Function(Handle<GlobalDecl>),
    /// A builtin of the target language.
    Builtin(Builtin),
    /// Any other intrinsic, passed through by name.
    Intrinsic(String),
}

/// A chained variable access path, such as `light.color[i].x`.
///
/// Every link records the declared type of the identifier it names, before
/// its own `indices` are applied.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct VarIdent {
    pub name: String,
    pub ty: TypeDenoter,
    /// Array indexers applied to this link, outermost first.
    pub indices: Vec<Handle<Expression>>,
    /// Member or component accessor applied to the indexed value.
    pub next: Option<Box<VarIdent>>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum ExpressionKind {
    Literal(Literal),
    /// Named variable access, possibly through members and indexers.
    Variable(VarIdent),
    /// Array or component indexer applied to an arbitrary expression.
    Index {
        base: Handle<Expression>,
        index: Handle<Expression>,
    },
    Call {
        callee: Callee,
        arguments: Vec<Handle<Expression>>,
    },
    Unary {
        op: UnaryOperator,
        expr: Handle<Expression>,
    },
    Binary {
        op: BinaryOperator,
        left: Handle<Expression>,
        right: Handle<Expression>,
    },
    /// `condition ? accept : reject`
    Ternary {
        condition: Handle<Expression>,
        accept: Handle<Expression>,
        reject: Handle<Expression>,
    },
    /// Parenthesized sub-expression.
    Bracket(Handle<Expression>),
    /// Explicit conversion to the expression's own type.
    Cast(Handle<Expression>),
    /// Vector of the expression's own type built from the components of
    /// several values, in order.
    Compose { components: Vec<Handle<Expression>> },
    /// Member or swizzle suffix applied to an arbitrary expression.
    Member {
        base: Handle<Expression>,
        member: String,
    },
    /// `target = value`, or `target op= value` for compound assignments.
    Assign {
        op: Option<BinaryOperator>,
        target: Handle<Expression>,
        value: Handle<Expression>,
    },
}

/// An expression together with its resolved type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct Expression {
    pub kind: ExpressionKind,
    pub ty: TypeDenoter,
}

/// Variable declaration, global or local.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeDenoter,
    pub init: Option<Handle<Expression>>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDenoter,
    /// Default value, used when a call omits the argument.
    pub default: Option<Handle<Expression>>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub result: TypeDenoter,
    /// `None` for a forward declaration.
    pub body: Option<Block>,
}

/// A top-level declaration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum GlobalDecl {
    Function(Function),
    Variable(VarDecl),
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct Block {
    pub stmts: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum StatementKind {
    /// One or more local variables declared together.
    VarDecl(Vec<VarDecl>),
    Block(Block),
    /// An expression evaluated for its side effects.
    Expression(Handle<Expression>),
    If {
        condition: Handle<Expression>,
        accept: Block,
        reject: Block,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Handle<Expression>>,
        iteration: Option<Handle<Expression>>,
        body: Block,
    },
    While {
        condition: Handle<Expression>,
        body: Block,
    },
    DoWhile {
        body: Block,
        condition: Handle<Expression>,
    },
    Switch {
        selector: Handle<Expression>,
        cases: Vec<SwitchCase>,
    },
    Return {
        value: Option<Handle<Expression>>,
    },
    Break,
    Continue,
    Discard,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct SwitchCase {
    /// Case label, `None` for `default`.
    pub value: Option<Handle<Expression>>,
    pub body: Block,
}

/// A whole translation unit.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct Program {
    /// Top-level declarations, in source order.
    pub decls: Arena<GlobalDecl>,
    /// Every expression of the program, whatever declaration owns it.
    pub expressions: Arena<Expression>,
}
