//! WGSL code generation backend.

pub mod lowering;
pub mod source_map;

pub use lowering::{lower, WgslOutput, DEFAULT_WORKGROUP_SIZE};
pub use source_map::{Mapping, SourceMap};
