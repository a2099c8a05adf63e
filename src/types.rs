//! Normalized counting results.

use serde::{Deserialize, Serialize};

/// Input-token cost estimate together with the catalog model it was priced as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// USD, input tokens only.
    pub estimated_cost: f64,
    pub matched_model: String,
}

/// Token count for one piece of text, with an optional cost estimate.
///
/// The cost and its matched model are held together, so either both are
/// present or both are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCountResult {
    pub tokens: u64,
    #[serde(flatten)]
    pub cost: Option<CostEstimate>,
}

impl TokenCountResult {
    pub fn new(tokens: u64) -> Self {
        Self { tokens, cost: None }
    }

    pub fn with_cost(tokens: u64, cost: Option<CostEstimate>) -> Self {
        Self { tokens, cost }
    }

    pub fn estimated_cost(&self) -> Option<f64> {
        self.cost.as_ref().map(|c| c.estimated_cost)
    }

    pub fn matched_model(&self) -> Option<&str> {
        self.cost.as_ref().map(|c| c.matched_model.as_str())
    }
}
