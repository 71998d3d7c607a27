use super::expressions::ExpressionTracer;
use super::HandleMap;
use crate::{Block, Expression, Statement, StatementKind};

impl ExpressionTracer<'_> {
    pub fn trace_block(&mut self, block: &Block) {
        let mut worklist: Vec<&[Statement]> = vec![&block.stmts];
        while let Some(last) = worklist.pop() {
            for stmt in last {
                use StatementKind as St;
                match stmt.kind {
                    St::VarDecl(ref vars) => {
                        for var in vars {
                            self.insert_option(var.init);
                        }
                    }
                    St::Block(ref block) => worklist.push(&block.stmts),
                    St::Expression(expr) => self.insert(expr),
                    St::If {
                        condition,
                        ref accept,
                        ref reject,
                    } => {
                        self.insert(condition);
                        worklist.push(&accept.stmts);
                        worklist.push(&reject.stmts);
                    }
                    St::For {
                        ref init,
                        condition,
                        iteration,
                        ref body,
                    } => {
                        if let Some(ref init) = *init {
                            worklist.push(std::slice::from_ref(&**init));
                        }
                        self.insert_option(condition);
                        self.insert_option(iteration);
                        worklist.push(&body.stmts);
                    }
                    St::While {
                        condition,
                        ref body,
                    }
                    | St::DoWhile {
                        ref body,
                        condition,
                    } => {
                        self.insert(condition);
                        worklist.push(&body.stmts);
                    }
                    St::Switch {
                        selector,
                        ref cases,
                    } => {
                        self.insert(selector);
                        for case in cases {
                            self.insert_option(case.value);
                            worklist.push(&case.body.stmts);
                        }
                    }
                    St::Return { value } => self.insert_option(value),
                    St::Break | St::Continue | St::Discard => {}
                }
            }
        }
    }
}

impl HandleMap<Expression> {
    pub fn adjust_block(&self, block: &mut Block) {
        let mut worklist: Vec<&mut [Statement]> = vec![&mut block.stmts];
        while let Some(last) = worklist.pop() {
            for stmt in last {
                use StatementKind as St;
                match stmt.kind {
                    St::VarDecl(ref mut vars) => {
                        for var in vars {
                            self.adjust_option(&mut var.init);
                        }
                    }
                    St::Block(ref mut block) => worklist.push(&mut block.stmts),
                    St::Expression(ref mut expr) => self.adjust(expr),
                    St::If {
                        ref mut condition,
                        ref mut accept,
                        ref mut reject,
                    } => {
                        self.adjust(condition);
                        worklist.push(&mut accept.stmts);
                        worklist.push(&mut reject.stmts);
                    }
                    St::For {
                        ref mut init,
                        ref mut condition,
                        ref mut iteration,
                        ref mut body,
                    } => {
                        if let Some(ref mut init) = *init {
                            worklist.push(std::slice::from_mut(&mut **init));
                        }
                        self.adjust_option(condition);
                        self.adjust_option(iteration);
                        worklist.push(&mut body.stmts);
                    }
                    St::While {
                        ref mut condition,
                        ref mut body,
                    }
                    | St::DoWhile {
                        ref mut body,
                        ref mut condition,
                    } => {
                        self.adjust(condition);
                        worklist.push(&mut body.stmts);
                    }
                    St::Switch {
                        ref mut selector,
                        ref mut cases,
                    } => {
                        self.adjust(selector);
                        for case in cases {
                            self.adjust_option(&mut case.value);
                            worklist.push(&mut case.body.stmts);
                        }
                    }
                    St::Return { ref mut value } => self.adjust_option(value),
                    St::Break | St::Continue | St::Discard => {}
                }
            }
        }
    }
}
