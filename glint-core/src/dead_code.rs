//! Dead-code elimination.
//!
//! Drops the statements that follow a `return` in the same block. A nested
//! block is considered on its own: a `return` inside it does not end the
//! enclosing block.

use crate::ir::visitor::{self, Folder};
use crate::ir::{Block, Program, StmtKind};
use log::debug;

#[derive(Debug, Default)]
pub struct DeadCodeEliminator {
    removed: usize,
}

impl DeadCodeEliminator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of statements removed so far.
    pub fn removed(&self) -> usize {
        self.removed
    }
}

impl Folder for DeadCodeEliminator {
    fn fold_block(&mut self, b: Block) -> Block {
        let mut block = visitor::fold_block(self, b);
        if let Some(pos) = block.stmts.iter().position(|s| matches!(s.kind, StmtKind::Return(_))) {
            let dropped = block.stmts.len() - pos - 1;
            if dropped > 0 {
                debug!(
                    "removing {} unreachable statement(s) after return at line {}",
                    dropped, block.stmts[pos].span.line
                );
                block.stmts.truncate(pos + 1);
                self.removed += dropped;
            }
        }
        block
    }
}

pub fn eliminate_dead_code(program: Program) -> Program {
    let mut eliminator = DeadCodeEliminator::new();
    let program = eliminator.fold_program(program);
    debug!("dead-code elimination removed {} statement(s)", eliminator.removed());
    program
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::ir::Stmt;
    use crate::parser::parse;
    use crate::source::SourceFile;

    fn body(src: &str) -> Vec<Stmt> {
        let (program, _) = parse(&SourceFile::new("test.glint", src));
        let ir = eliminate_dead_code(analyze(&program).ir);
        ir.functions[0].body.stmts.clone()
    }

    #[test]
    fn test_statements_after_return_removed() {
        let stmts = body("fn f() -> f32 { return 1.0; let x = 2.0; }\n@compute fn main() { let y = f(); }");
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn test_nested_block_return_does_not_end_outer_block() {
        let stmts = body("@compute fn main() {\n  { return; let a = 1.0; }\n  let b = 2.0;\n}");
        assert_eq!(stmts.len(), 2);
        match &stmts[0].kind {
            StmtKind::Block(inner) => assert_eq!(inner.stmts.len(), 1),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_body_without_return_is_unchanged() {
        let stmts = body("@compute fn main() { var a = 1.0; a = a * 2.0; }");
        assert_eq!(stmts.len(), 2);
    }
}
