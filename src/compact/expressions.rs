use super::{HandleMap, HandleSet};
use crate::arena::{Arena, Handle};
use crate::Expression;

pub struct ExpressionTracer<'tracer> {
    pub expressions: &'tracer Arena<Expression>,

    /// Expressions known to be live.
    pub expressions_used: HandleSet<Expression>,

    /// Live expressions whose operands have not been marked yet.
    worklist: Vec<Handle<Expression>>,
}

impl<'tracer> ExpressionTracer<'tracer> {
    pub fn new(expressions: &'tracer Arena<Expression>) -> Self {
        Self {
            expressions,
            expressions_used: HandleSet::for_arena(expressions),
            worklist: Vec::new(),
        }
    }

    /// Mark `handle` as live.
    pub fn insert(&mut self, handle: Handle<Expression>) {
        if self.expressions_used.insert(handle) {
            self.worklist.push(handle);
        }
    }

    pub fn insert_option(&mut self, handle: Option<Handle<Expression>>) {
        if let Some(handle) = handle {
            self.insert(handle);
        }
    }

    /// Propagate usage from the expressions inserted so far to everything
    /// they refer to.
    ///
    /// Rewriting appends replacements at the end of the arena while the
    /// displaced parent keeps its place, so an expression may refer to
    /// operands that follow it. A single back-to-front sweep is not enough;
    /// follow operands through a work list instead.
    pub fn trace_expressions(&mut self) {
        log::trace!("tracing {} root expressions", self.worklist.len());
        while let Some(handle) = self.worklist.pop() {
            let expr = &self.expressions[handle];
            log::trace!("tracing new expression {:?}", expr.kind);
            for operand in expr.kind.operands() {
                self.insert(operand);
            }
        }
    }
}

impl HandleMap<Expression> {
    pub fn adjust_expression(&self, expr: &mut Expression) {
        for operand in expr.kind.operands_mut() {
            self.adjust(operand);
        }
    }
}
