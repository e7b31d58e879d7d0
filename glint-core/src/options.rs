//! Compiler configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub source_maps: bool,
    /// Promote every warning to an error.
    pub strict_mode: bool,
    pub optimizations: OptimizationOptions,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            source_maps: false,
            strict_mode: false,
            optimizations: OptimizationOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationOptions {
    pub constant_folding: bool,
    pub dead_code_elimination: bool,
    /// Accepted for compatibility; no inlining is performed.
    pub inlining: bool,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        OptimizationOptions {
            constant_folding: true,
            dead_code_elimination: true,
            inlining: false,
        }
    }
}

impl OptimizationOptions {
    pub fn none() -> Self {
        OptimizationOptions {
            constant_folding: false,
            dead_code_elimination: false,
            inlining: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert!(!options.source_maps && !options.strict_mode);
        assert!(options.optimizations.constant_folding);
        assert!(options.optimizations.dead_code_elimination);
        assert!(!options.optimizations.inlining);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let options: CompileOptions =
            serde_json::from_str(r#"{"strictMode": true, "optimizations": {"constantFolding": false}}"#)
                .expect("valid options");
        assert!(options.strict_mode);
        assert!(!options.source_maps);
        assert!(!options.optimizations.constant_folding);
        assert!(options.optimizations.dead_code_elimination);
    }
}
