// 5.13 barrier.rs: touch option. each group either bets on the price touching a
// target level or is the single fallback group that wins when nothing touched.
//
// direction is never configured. it's inferred from the price at construction:
// a target above the initial price is an upward touch, below is downward.
// the oracle is only read twice (construction, resolution). a touch that
// happens in between and reverses is invisible: only the final sample counts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{GroupIndex, Price};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Barrier {
    // group wins if the final price reached or crossed `target`
    Touch { target: Price },
    // group wins if no touch group did
    Fallback,
}

impl Barrier {
    pub fn touch(target: Price) -> Self {
        Barrier::Touch { target }
    }

    pub fn requires_touch(&self) -> bool {
        matches!(self, Barrier::Touch { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchDirection {
    Up,
    Down,
}

impl TouchDirection {
    pub fn infer(target: Price, initial: Price) -> Option<Self> {
        if target > initial {
            Some(TouchDirection::Up)
        } else if target < initial {
            Some(TouchDirection::Down)
        } else {
            None
        }
    }

    pub fn is_touched(&self, target: Price, price: Price) -> bool {
        match self {
            TouchDirection::Up => price >= target,
            TouchDirection::Down => price <= target,
        }
    }
}

impl fmt::Display for TouchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchDirection::Up => write!(f, "upward"),
            TouchDirection::Down => write!(f, "downward"),
        }
    }
}

/// Why a barrier configuration can't describe a future crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarrierConflict {
    /// The target already equals the initial price.
    AlreadyTouched { group: GroupIndex, target: Price },
    /// Two groups wait on the same side. reaching the farther target crosses
    /// the nearer one first, so the nearer condition is already implied.
    SameDirection {
        group: GroupIndex,
        other: GroupIndex,
        direction: TouchDirection,
    },
}

impl fmt::Display for BarrierConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarrierConflict::AlreadyTouched { group, target } => {
                write!(f, "{} target {} is already touched", group, target)
            }
            BarrierConflict::SameDirection { group, other, direction } => {
                write!(f, "{} and {} both need a {} touch", other, group, direction)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierCondition {
    pub barriers: Vec<Barrier>,
}

impl BarrierCondition {
    pub fn new(barriers: Vec<Barrier>) -> Self {
        Self { barriers }
    }

    pub fn fallback_group(&self) -> Option<GroupIndex> {
        self.barriers
            .iter()
            .position(|b| !b.requires_touch())
            .map(GroupIndex)
    }

    pub fn fallback_count(&self) -> usize {
        self.barriers.iter().filter(|b| !b.requires_touch()).count()
    }

    /// Infer each touch group's direction against the initial price and
    /// reject configurations whose outcome is already decided or ambiguous.
    /// Fallback groups map to `None`.
    pub fn directions(&self, initial: Price) -> Result<Vec<Option<TouchDirection>>, BarrierConflict> {
        let mut directions = Vec::with_capacity(self.barriers.len());
        let mut up: Option<GroupIndex> = None;
        let mut down: Option<GroupIndex> = None;

        for (i, barrier) in self.barriers.iter().enumerate() {
            let group = GroupIndex(i);
            let Barrier::Touch { target } = *barrier else {
                directions.push(None);
                continue;
            };

            let direction = TouchDirection::infer(target, initial)
                .ok_or(BarrierConflict::AlreadyTouched { group, target })?;

            let slot = match direction {
                TouchDirection::Up => &mut up,
                TouchDirection::Down => &mut down,
            };
            if let Some(other) = *slot {
                return Err(BarrierConflict::SameDirection { group, other, direction });
            }
            *slot = Some(group);

            directions.push(Some(direction));
        }

        Ok(directions)
    }

    /// First touched group in declaration order, else the fallback group, else nobody.
    /// A configuration that conflicts with `initial` has no winner.
    ///
    /// `directions` allows at most one up and one down barrier, and a single
    /// final price can't touch both, so the declaration-order tie-break never
    /// actually picks between two touched groups.
    pub fn evaluate(&self, final_price: Price, initial: Price) -> Option<GroupIndex> {
        let directions = self.directions(initial).ok()?;

        let touched = self
            .barriers
            .iter()
            .zip(directions.iter())
            .position(|(barrier, direction)| match (barrier, direction) {
                (Barrier::Touch { target }, Some(dir)) => dir.is_touched(*target, final_price),
                _ => false,
            });

        touched.map(GroupIndex).or_else(|| self.fallback_group())
    }
}
