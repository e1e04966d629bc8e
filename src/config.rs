use serde::{Deserialize, Serialize};

/// Resource limits of an [`EvaluationContext`](crate::EvaluationContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Number of cells the store hands out before evaluation fails.
    pub cell_capacity: usize,
    /// Maximum nesting of `eval` before evaluation fails.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { cell_capacity: 1 << 20, max_depth: 8192 }
    }
}

impl Config {
    pub fn from_json(source: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}
