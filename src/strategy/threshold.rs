// 5.11 threshold.rs: price-limit option. two groups, one limit, one comparison.
// equality never triggers: a final price sitting exactly on the limit goes to group 1.

use serde::{Deserialize, Serialize};

use crate::types::{GroupIndex, Price};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    GroupZeroWinsIfAbove,
    GroupZeroWinsIfBelow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdCondition {
    pub limit: Price,
    pub mode: ComparisonMode,
}

impl ThresholdCondition {
    pub const GROUP_COUNT: usize = 2;

    pub fn new(limit: Price, mode: ComparisonMode) -> Self {
        Self { limit, mode }
    }

    pub fn above(limit: Price) -> Self {
        Self::new(limit, ComparisonMode::GroupZeroWinsIfAbove)
    }

    pub fn below(limit: Price) -> Self {
        Self::new(limit, ComparisonMode::GroupZeroWinsIfBelow)
    }

    // always produces a winner
    pub fn evaluate(&self, final_price: Price) -> GroupIndex {
        let triggered = match self.mode {
            ComparisonMode::GroupZeroWinsIfAbove => final_price > self.limit,
            ComparisonMode::GroupZeroWinsIfBelow => final_price < self.limit,
        };

        if triggered {
            GroupIndex(0)
        } else {
            GroupIndex(1)
        }
    }
}
