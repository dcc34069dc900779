// 5.1: win conditions. a closed set of variants that all answer one question:
// given the settlement price (and, for barriers, the construction price),
// which group won? None means nobody did.

mod barrier;
mod interval;
mod threshold;

pub use barrier::{Barrier, BarrierCondition, BarrierConflict, TouchDirection};
pub use interval::{IntervalCondition, PriceInterval};
pub use threshold::{ComparisonMode, ThresholdCondition};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;
use crate::types::{GroupIndex, Price};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WinCondition {
    Threshold(ThresholdCondition),
    Interval(IntervalCondition),
    Barrier(BarrierCondition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Threshold,
    Interval,
    Barrier,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::Threshold => write!(f, "threshold"),
            ConditionKind::Interval => write!(f, "interval"),
            ConditionKind::Barrier => write!(f, "barrier"),
        }
    }
}

impl WinCondition {
    pub fn kind(&self) -> ConditionKind {
        match self {
            WinCondition::Threshold(_) => ConditionKind::Threshold,
            WinCondition::Interval(_) => ConditionKind::Interval,
            WinCondition::Barrier(_) => ConditionKind::Barrier,
        }
    }

    // 5.1.1: structural checks against the group list. price-dependent checks
    // (barrier directions) happen at construction, once the oracle has been read.
    pub fn validate(&self, group_count: usize) -> Result<(), ConfigError> {
        let expected = match self {
            WinCondition::Threshold(_) => ThresholdCondition::GROUP_COUNT,
            WinCondition::Interval(c) => c.intervals.len(),
            WinCondition::Barrier(c) => c.barriers.len(),
        };
        if expected != group_count {
            return Err(ConfigError::ConditionArity {
                kind: self.kind(),
                expected,
                groups: group_count,
            });
        }

        match self {
            WinCondition::Threshold(_) => {}
            WinCondition::Interval(c) => {
                if let Some(i) = c.intervals.iter().position(PriceInterval::is_inverted) {
                    return Err(ConfigError::InvertedInterval { group: GroupIndex(i) });
                }
            }
            WinCondition::Barrier(c) => {
                let fallbacks = c.fallback_count();
                if fallbacks > 1 {
                    return Err(ConfigError::MultipleFallbackGroups { count: fallbacks });
                }
            }
        }

        Ok(())
    }

    /// Winning group for a settlement price. Barrier conditions need the price
    /// observed at construction; without it they have no winner.
    pub fn evaluate(&self, final_price: Price, initial_price: Option<Price>) -> Option<GroupIndex> {
        match self {
            WinCondition::Threshold(c) => Some(c.evaluate(final_price)),
            WinCondition::Interval(c) => c.evaluate(final_price),
            WinCondition::Barrier(c) => initial_price.and_then(|initial| c.evaluate(final_price, initial)),
        }
    }
}

impl From<ThresholdCondition> for WinCondition {
    fn from(c: ThresholdCondition) -> Self {
        WinCondition::Threshold(c)
    }
}

impl From<IntervalCondition> for WinCondition {
    fn from(c: IntervalCondition) -> Self {
        WinCondition::Interval(c)
    }
}

impl From<BarrierCondition> for WinCondition {
    fn from(c: BarrierCondition) -> Self {
        WinCondition::Barrier(c)
    }
}
