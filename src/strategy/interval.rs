// 5.12 interval.rs: range option. one closed price interval per group.
// overlap is not rejected; the first interval (declaration order) containing the price wins.

use serde::{Deserialize, Serialize};

use crate::types::{GroupIndex, Price};

/** closed on both ends: lower <= price <= upper */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInterval {
    pub lower: Price,
    pub upper: Price,
}

impl PriceInterval {
    pub fn new(lower: Price, upper: Price) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, price: Price) -> bool {
        self.lower <= price && price <= self.upper
    }

    pub fn is_inverted(&self) -> bool {
        self.lower > self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalCondition {
    pub intervals: Vec<PriceInterval>,
}

impl IntervalCondition {
    pub fn new(intervals: Vec<PriceInterval>) -> Self {
        Self { intervals }
    }

    pub fn evaluate(&self, final_price: Price) -> Option<GroupIndex> {
        self.intervals
            .iter()
            .position(|interval| interval.contains(final_price))
            .map(GroupIndex)
    }

    // first pair of groups whose intervals share at least one price
    pub fn first_overlap(&self) -> Option<(GroupIndex, GroupIndex)> {
        for (i, a) in self.intervals.iter().enumerate() {
            for (j, b) in self.intervals.iter().enumerate().skip(i + 1) {
                if a.lower <= b.upper && b.lower <= a.upper {
                    return Some((GroupIndex(i), GroupIndex(j)));
                }
            }
        }
        None
    }
}
