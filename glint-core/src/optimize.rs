//! Runs the enabled optimization passes over the IR.

use crate::constant_folding::fold_constants;
use crate::dead_code::eliminate_dead_code;
use crate::ir::Program;
use crate::options::OptimizationOptions;
use log::debug;

pub fn optimize(program: Program, options: &OptimizationOptions) -> Program {
    let mut program = program;
    if options.constant_folding {
        program = fold_constants(program);
    }
    if options.dead_code_elimination {
        program = eliminate_dead_code(program);
    }
    if options.inlining {
        debug!("inlining requested; not implemented, skipping");
    }
    program
}
