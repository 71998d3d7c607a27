/*!
The expression conversion pass.

[`convert`] walks every declaration and statement of a [`Program`] and, at
each expression slot, applies the enabled rules in a fixed order:

1. [`VECTOR_SUBSCRIPTS`](ConversionFlags::VECTOR_SUBSCRIPTS)
2. [`VECTOR_COMPARE`](ConversionFlags::VECTOR_COMPARE)
3. [`IMPLICIT_CASTS`](ConversionFlags::IMPLICIT_CASTS)
4. [`WRAP_UNARY_EXPR`](ConversionFlags::WRAP_UNARY_EXPR)
5. [`IMAGE_ACCESS`](ConversionFlags::IMAGE_ACCESS)

Every rule looks at the expression currently in the slot and either leaves it
alone or returns a replacement, which the following rules then see. Once all
rules ran, the traversal descends into the operands of whatever ended up in
the slot, so a replacement's own sub-expressions are converted as well.

What an operand is used for decides some of the rewrites: an implicit cast is
only inserted where the surrounding code expects a particular type, and an
image indexer turns into a load or a store depending on whether it is read or
assigned to. The traversal therefore hands an [`ExprContext`] down to every
operand it visits.
*/

mod bracket;
mod cast;
mod compare;
mod image;
mod subscript;

use crate::arena::{Arena, Handle, HandleVec};
use crate::proc::{DisplayExpression, FunctionNames, IncompatibleTypes};
use crate::span::{AddSpan as _, WithSpan};
use crate::{
    Block, Builtin, Callee, Expression, ExpressionKind, Function, GlobalDecl,
    Program, Scalar, Statement, StatementKind, TypeDenoter, UnaryOperator, VarDecl,
};

bitflags::bitflags! {
    /// Selects the rewrites [`convert`] performs.
    ///
    /// Default is all rules enabled.
    #[cfg_attr(feature = "serialize", derive(serde::Serialize))]
    #[cfg_attr(feature = "deserialize", derive(serde::Deserialize))]
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct ConversionFlags: u32 {
        /// Drop single-component accessors applied to scalars: `f.x` becomes `f`.
        const VECTOR_SUBSCRIPTS = 1 << 0;
        /// Turn comparisons of vectors into component-wise builtin calls:
        /// `a < b` becomes `lessThan(a, b)`.
        const VECTOR_COMPARE = 1 << 1;
        /// Make implicit conversions explicit casts: `float f = i` becomes
        /// `float f = float(i)`.
        const IMPLICIT_CASTS = 1 << 2;
        /// Bracket unary operands that would otherwise merge with their
        /// operator: `- -a` becomes `-(-a)`.
        const WRAP_UNARY_EXPR = 1 << 3;
        /// Turn indexers on storage images into `imageLoad` and
        /// `imageStore` calls.
        const IMAGE_ACCESS = 1 << 4;
    }
}

impl Default for ConversionFlags {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum ConvertError {
    #[error("no conversion from `{from}` to `{to}`")]
    TypeIncompatibility { from: TypeDenoter, to: TypeDenoter },
    #[error("`{left}` and `{right}` can not be compared component-wise")]
    InvalidComparison {
        left: TypeDenoter,
        right: TypeDenoter,
    },
    #[error("unsupported expression structure: {0}")]
    StructuralAssumption(&'static str),
}

impl From<IncompatibleTypes> for ConvertError {
    fn from(err: IncompatibleTypes) -> Self {
        Self::TypeIncompatibility {
            from: err.from,
            to: err.to,
        }
    }
}

/// How the value of an expression is used by its parent.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ExprContext {
    /// Evaluated for side effects only, as an expression statement.
    Statement,
    /// Read, with no particular type expected.
    Read,
    /// Assigned to, or otherwise modified in place.
    WriteTarget,
    /// Read where a value of type `ty` is expected.
    ///
    /// If `match_size` is unset, only the component type has to match, as
    /// for the scalar operand of a binary expression.
    Converted {
        ty: TypeDenoter,
        match_size: bool,
        site: Site,
    },
}

/// Where an expected type comes from. Only used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Site {
    Initializer,
    DefaultValue,
    Argument,
    Return,
    Operand,
    Condition,
    Assignment,
    Coordinate,
    Texel,
}

impl ExprContext {
    fn converted(ty: TypeDenoter, site: Site) -> Self {
        Self::Converted {
            ty,
            match_size: true,
            site,
        }
    }

    /// Context of an operand whose storage is the parent's storage, like the
    /// base of a member access.
    fn place(&self) -> Self {
        match *self {
            Self::WriteTarget => Self::WriteTarget,
            _ => Self::Read,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    NotStarted,
    TraversingDeclarations,
    TraversingStatements,
    Done,
}

/// What a call to a user function needs to know about its callee.
#[derive(Debug)]
struct Signature {
    name: String,
    parameters: Vec<TypeDenoter>,
}

/// Signatures of all functions, indexed by declaration.
#[derive(Debug)]
struct Signatures(HandleVec<GlobalDecl, Option<Signature>>);

impl Signatures {
    fn new(decls: &Arena<GlobalDecl>) -> Self {
        let mut signatures = HandleVec::with_capacity(decls.len());
        for (handle, decl) in decls.iter() {
            let signature = match *decl {
                GlobalDecl::Function(ref function) => Some(Signature {
                    name: function.name.clone(),
                    parameters: function
                        .parameters
                        .iter()
                        .map(|param| param.ty.clone())
                        .collect(),
                }),
                GlobalDecl::Variable(_) => None,
            };
            signatures.insert(handle, signature);
        }
        Self(signatures)
    }

    fn parameter(&self, function: Handle<GlobalDecl>, index: usize) -> Option<&TypeDenoter> {
        self.0
            .get(function)?
            .as_ref()?
            .parameters
            .get(index)
    }
}

impl FunctionNames for Signatures {
    fn function_name(&self, function: Handle<GlobalDecl>) -> Option<&str> {
        self.0
            .get(function)?
            .as_ref()
            .map(|signature| signature.name.as_str())
    }
}

/// Run the conversions selected by `flags` over `program`.
///
/// On success, expressions orphaned by the rewrites have been removed from
/// [`Program::expressions`], so handles held outside of the program are no
/// longer valid.
///
/// On failure the program is left structurally valid but only partially
/// converted, and must not be emitted.
pub fn convert(
    program: &mut Program,
    flags: ConversionFlags,
) -> Result<(), WithSpan<ConvertError>> {
    if flags.is_empty() {
        log::debug!("no conversions enabled");
        return Ok(());
    }

    let signatures = Signatures::new(&program.decls);
    let Program {
        ref mut decls,
        ref mut expressions,
    } = *program;
    let mut converter = Converter::new(flags, expressions, signatures);
    converter.run(decls)?;

    let rewrites = converter.rewrites;
    if rewrites > 0 {
        log::debug!("{rewrites} expressions rewritten");
        crate::compact::compact(program);
    }
    Ok(())
}

pub(crate) struct Converter<'a> {
    flags: ConversionFlags,
    expressions: &'a mut Arena<Expression>,
    signatures: Signatures,
    /// Declared result of the function whose body is being visited.
    result: Option<TypeDenoter>,
    stage: Stage,
    rewrites: usize,
}

impl<'a> Converter<'a> {
    fn new(
        flags: ConversionFlags,
        expressions: &'a mut Arena<Expression>,
        signatures: Signatures,
    ) -> Self {
        Self {
            flags,
            expressions,
            signatures,
            result: None,
            stage: Stage::NotStarted,
            rewrites: 0,
        }
    }

    fn enter(&mut self, stage: Stage) {
        log::trace!("conversion stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    fn run(&mut self, decls: &mut Arena<GlobalDecl>) -> Result<(), WithSpan<ConvertError>> {
        self.enter(Stage::TraversingDeclarations);
        for (_, decl) in decls.iter_mut() {
            match *decl {
                GlobalDecl::Function(ref mut function) => {
                    for param in function.parameters.iter_mut() {
                        if let Some(ref mut default) = param.default {
                            let ctx = ExprContext::converted(param.ty.clone(), Site::DefaultValue);
                            self.visit_expression(default, &ctx)?;
                        }
                    }
                }
                GlobalDecl::Variable(ref mut var) => self.visit_var_decl(var)?,
            }
        }

        self.enter(Stage::TraversingStatements);
        for (_, decl) in decls.iter_mut() {
            if let GlobalDecl::Function(ref mut function) = *decl {
                self.visit_function_body(function)?;
            }
        }

        self.enter(Stage::Done);
        Ok(())
    }

    fn visit_function_body(
        &mut self,
        function: &mut Function,
    ) -> Result<(), WithSpan<ConvertError>> {
        let Some(ref mut body) = function.body else {
            return Ok(());
        };
        log::trace!("converting body of `{}`", function.name);
        self.result = match function.result {
            TypeDenoter::Void => None,
            ref ty => Some(ty.clone()),
        };
        let result = self.visit_block(body);
        self.result = None;
        result
    }

    fn visit_var_decl(&mut self, var: &mut VarDecl) -> Result<(), WithSpan<ConvertError>> {
        if let Some(ref mut init) = var.init {
            let ctx = ExprContext::converted(var.ty.clone(), Site::Initializer);
            self.visit_expression(init, &ctx)?;
        }
        Ok(())
    }

    fn visit_block(&mut self, block: &mut Block) -> Result<(), WithSpan<ConvertError>> {
        for stmt in block.stmts.iter_mut() {
            self.visit_statement(stmt)?;
        }
        Ok(())
    }

    fn visit_condition(
        &mut self,
        condition: &mut Handle<Expression>,
    ) -> Result<(), WithSpan<ConvertError>> {
        let ctx = self.condition_context(*condition);
        self.visit_expression(condition, &ctx)
    }

    fn visit_statement(&mut self, stmt: &mut Statement) -> Result<(), WithSpan<ConvertError>> {
        match stmt.kind {
            StatementKind::VarDecl(ref mut vars) => {
                for var in vars.iter_mut() {
                    self.visit_var_decl(var)?;
                }
            }
            StatementKind::Block(ref mut block) => self.visit_block(block)?,
            StatementKind::Expression(ref mut expr) => {
                self.visit_expression(expr, &ExprContext::Statement)?;
            }
            StatementKind::If {
                ref mut condition,
                ref mut accept,
                ref mut reject,
            } => {
                self.visit_condition(condition)?;
                self.visit_block(accept)?;
                self.visit_block(reject)?;
            }
            StatementKind::For {
                ref mut init,
                ref mut condition,
                ref mut iteration,
                ref mut body,
            } => {
                if let Some(ref mut init) = *init {
                    self.visit_statement(init)?;
                }
                if let Some(ref mut condition) = *condition {
                    self.visit_condition(condition)?;
                }
                if let Some(ref mut iteration) = *iteration {
                    self.visit_expression(iteration, &ExprContext::Statement)?;
                }
                self.visit_block(body)?;
            }
            StatementKind::While {
                ref mut condition,
                ref mut body,
            } => {
                self.visit_condition(condition)?;
                self.visit_block(body)?;
            }
            StatementKind::DoWhile {
                ref mut body,
                ref mut condition,
            } => {
                self.visit_block(body)?;
                self.visit_condition(condition)?;
            }
            StatementKind::Switch {
                ref mut selector,
                ref mut cases,
            } => {
                self.visit_expression(selector, &ExprContext::Read)?;
                for case in cases.iter_mut() {
                    if let Some(ref mut value) = case.value {
                        self.visit_expression(value, &ExprContext::Read)?;
                    }
                    self.visit_block(&mut case.body)?;
                }
            }
            StatementKind::Return { ref mut value } => {
                if let Some(ref mut value) = *value {
                    let ctx = match self.result {
                        Some(ref ty) => ExprContext::converted(ty.clone(), Site::Return),
                        None => ExprContext::Read,
                    };
                    self.visit_expression(value, &ctx)?;
                }
            }
            StatementKind::Break | StatementKind::Continue | StatementKind::Discard => {}
        }
        Ok(())
    }

    /// Apply the enabled rules to the expression in `slot`, then convert its
    /// operands.
    fn visit_expression(
        &mut self,
        slot: &mut Handle<Expression>,
        ctx: &ExprContext,
    ) -> Result<(), WithSpan<ConvertError>> {
        debug_assert!(matches!(
            self.stage,
            Stage::TraversingDeclarations | Stage::TraversingStatements
        ));
        let span = self.expressions.get_span(*slot);

        if self.flags.contains(ConversionFlags::VECTOR_SUBSCRIPTS) {
            while let Some(replacement) = self.convert_vector_subscript(*slot) {
                self.replace(slot, replacement, "vector subscript");
            }
        }
        if self.flags.contains(ConversionFlags::VECTOR_COMPARE) {
            if let Some(replacement) = self
                .convert_vector_compare(*slot)
                .map_err(|err| err.with_span(span))?
            {
                self.replace(slot, replacement, "vector comparison");
            }
        }
        if self.flags.contains(ConversionFlags::IMPLICIT_CASTS) {
            if let ExprContext::Converted {
                ref ty,
                match_size,
                site,
            } = *ctx
            {
                log::trace!("{site:?} expects `{ty}`");
                if let Some(replacement) = self
                    .convert_if_cast_required(*slot, ty, match_size)
                    .map_err(|err| err.with_span(span))?
                {
                    self.replace(slot, replacement, "implicit cast");
                }
            }
        }
        if self.flags.contains(ConversionFlags::WRAP_UNARY_EXPR) {
            if let Some(replacement) = self.convert_nested_unary(*slot) {
                self.replace(slot, replacement, "nested unary");
            }
        }
        if self.flags.contains(ConversionFlags::IMAGE_ACCESS) {
            if let Some(replacement) = self
                .convert_image_access(*slot, ctx)
                .map_err(|err| err.with_span(span))?
            {
                self.replace(slot, replacement, "image access");
            }
        }

        self.visit_operands(*slot, ctx)
    }

    fn replace(
        &mut self,
        slot: &mut Handle<Expression>,
        replacement: Handle<Expression>,
        rule: &str,
    ) {
        log::debug!(
            "{rule}: `{}` -> `{}`",
            self.display(*slot),
            self.display(replacement)
        );
        *slot = replacement;
        self.rewrites += 1;
    }

    fn display(&self, handle: Handle<Expression>) -> DisplayExpression<'_> {
        DisplayExpression::new(&*self.expressions, &self.signatures, handle)
    }

    fn visit_operands(
        &mut self,
        handle: Handle<Expression>,
        ctx: &ExprContext,
    ) -> Result<(), WithSpan<ConvertError>> {
        let mut operands = self.expressions[handle].kind.operands();
        if operands.is_empty() {
            return Ok(());
        }
        let contexts = self.operand_contexts(handle, ctx);
        debug_assert_eq!(operands.len(), contexts.len());

        let mut result = Ok(());
        for (operand, ctx) in operands.iter_mut().zip(contexts.iter()) {
            result = self.visit_expression(operand, ctx);
            if result.is_err() {
                break;
            }
        }

        // Visited operands may have been replaced; store them back, even
        // on failure, so the tree keeps every rewrite made so far.
        let slots = self.expressions[handle].kind.operands_mut();
        for (slot, operand) in slots.into_iter().zip(operands) {
            *slot = operand;
        }
        result
    }

    /// Context for a value used as a condition.
    fn condition_context(&self, condition: Handle<Expression>) -> ExprContext {
        if self.expressions[condition].ty.is_scalar() {
            ExprContext::converted(TypeDenoter::Scalar(Scalar::BOOL), Site::Condition)
        } else {
            ExprContext::Read
        }
    }

    /// Context for an operand that is brought to the common type of a binary
    /// expression.
    fn operand_context(&self, common: &TypeDenoter, operand: Handle<Expression>) -> ExprContext {
        ExprContext::Converted {
            ty: common.clone(),
            match_size: !self.expressions[operand].ty.is_scalar(),
            site: Site::Operand,
        }
    }

    /// Contexts of the operands of `handle`, in the order of
    /// [`ExpressionKind::operands`].
    fn operand_contexts(
        &self,
        handle: Handle<Expression>,
        ctx: &ExprContext,
    ) -> Vec<ExprContext> {
        let expr = &self.expressions[handle];
        match expr.kind {
            ExpressionKind::Literal(_) => Vec::new(),
            ExpressionKind::Variable(ref ident) => vec![ExprContext::Read; ident.indices().len()],
            ExpressionKind::Index { .. } => vec![ctx.place(), ExprContext::Read],
            ExpressionKind::Member { .. } | ExpressionKind::Bracket(_) => vec![ctx.place()],
            ExpressionKind::Cast(_) => vec![ExprContext::Read],
            // Each component keeps its own width.
            ExpressionKind::Compose { ref components } => vec![
                ExprContext::Converted {
                    ty: expr.ty.clone(),
                    match_size: false,
                    site: Site::Operand,
                };
                components.len()
            ],
            ExpressionKind::Call {
                ref callee,
                ref arguments,
            } => self.argument_contexts(callee, arguments),
            ExpressionKind::Unary { op, expr } => vec![match op {
                UnaryOperator::LogicalNot => self.condition_context(expr),
                _ if op.writes_operand() => ExprContext::WriteTarget,
                _ => ExprContext::Read,
            }],
            ExpressionKind::Binary { op, left, right } => {
                if op.is_logical() {
                    return vec![self.condition_context(left), self.condition_context(right)];
                }
                if op.is_shift() {
                    return vec![ExprContext::Read, ExprContext::Read];
                }
                let left_ty = &self.expressions[left].ty;
                let right_ty = &self.expressions[right].ty;
                match left_ty.common_type(right_ty) {
                    Some(common) => vec![
                        self.operand_context(&common, left),
                        self.operand_context(&common, right),
                    ],
                    None => vec![ExprContext::Read, ExprContext::Read],
                }
            }
            ExpressionKind::Ternary { condition, .. } => vec![
                self.condition_context(condition),
                ExprContext::converted(expr.ty.clone(), Site::Operand),
                ExprContext::converted(expr.ty.clone(), Site::Operand),
            ],
            ExpressionKind::Assign { op, target, value } => {
                let target_ty = self.expressions[target].ty.clone();
                let value_ctx = match op {
                    Some(op) if op.is_shift() => ExprContext::Read,
                    Some(_) => ExprContext::Converted {
                        ty: target_ty,
                        match_size: !self.expressions[value].ty.is_scalar(),
                        site: Site::Assignment,
                    },
                    None => ExprContext::converted(target_ty, Site::Assignment),
                };
                vec![ExprContext::WriteTarget, value_ctx]
            }
        }
    }

    fn argument_contexts(
        &self,
        callee: &Callee,
        arguments: &[Handle<Expression>],
    ) -> Vec<ExprContext> {
        match *callee {
            Callee::Function(function) => (0..arguments.len())
                .map(|index| match self.signatures.parameter(function, index) {
                    Some(ty) => ExprContext::converted(ty.clone(), Site::Argument),
                    None => ExprContext::Read,
                })
                .collect(),
            Callee::Builtin(Builtin::ImageLoad | Builtin::ImageStore) => {
                let image = arguments.first().map(|&image| &self.expressions[image].ty);
                let coordinate = image.and_then(TypeDenoter::image_coordinate);
                let texel = image.and_then(TypeDenoter::image_value);
                arguments
                    .iter()
                    .enumerate()
                    .map(|(index, _)| match (index, coordinate.as_ref(), texel.as_ref()) {
                        (1, Some(ty), _) => ExprContext::converted(ty.clone(), Site::Coordinate),
                        (2, _, Some(ty)) => ExprContext::converted(ty.clone(), Site::Texel),
                        _ => ExprContext::Read,
                    })
                    .collect()
            }
            Callee::Builtin(_) | Callee::Intrinsic(_) => vec![ExprContext::Read; arguments.len()],
        }
    }

    /// Append a new expression, with the span of the one it replaces.
    fn append(
        &mut self,
        kind: ExpressionKind,
        ty: TypeDenoter,
        origin: Handle<Expression>,
    ) -> Handle<Expression> {
        let span = self.expressions.get_span(origin);
        self.expressions.append(Expression { kind, ty }, span)
    }
}
