/*!
Removal of expressions orphaned by rewriting.

The conversion rules never delete anything: a rewritten slot points at a
freshly appended expression and the displaced one stays in the arena,
unreachable. [`compact`] drops every expression that no declaration or
statement can reach anymore and renumbers the handles of those that remain.
*/

mod expressions;
mod handle_set_map;
mod statements;

use crate::arena::HandleSet;
use crate::{GlobalDecl, Program};

use handle_set_map::HandleMap;

/// Remove unreachable expressions from `program`.
///
/// The relative order of the remaining expressions is preserved, so an
/// expression created before another one still precedes it afterwards.
pub fn compact(program: &mut Program) {
    if program.expressions.is_empty() {
        return;
    }
    let mut tracer = expressions::ExpressionTracer::new(&program.expressions);

    log::trace!("tracing declarations");
    for (_, decl) in program.decls.iter() {
        match *decl {
            GlobalDecl::Function(ref function) => {
                for param in function.parameters.iter() {
                    tracer.insert_option(param.default);
                }
                if let Some(ref body) = function.body {
                    tracer.trace_block(body);
                }
            }
            GlobalDecl::Variable(ref var) => tracer.insert_option(var.init),
        }
    }
    tracer.trace_expressions();

    let used = tracer.expressions_used;
    log::debug!(
        "compacting expressions: {} of {} live",
        used.count(),
        program.expressions.len()
    );
    let map = HandleMap::from_set(used);

    program.expressions.retain_mut(|handle, expr| {
        if map.used(handle) {
            map.adjust_expression(expr);
            true
        } else {
            false
        }
    });

    for (_, decl) in program.decls.iter_mut() {
        match *decl {
            GlobalDecl::Function(ref mut function) => {
                for param in function.parameters.iter_mut() {
                    map.adjust_option(&mut param.default);
                }
                if let Some(ref mut body) = function.body {
                    map.adjust_block(body);
                }
            }
            GlobalDecl::Variable(ref mut var) => map.adjust_option(&mut var.init),
        }
    }
}
