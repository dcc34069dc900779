// 5.0 config.rs: everything fixed when an option is created. expiration, who is in
// which group with what stake and prize, and the win condition.
// 5.0.1 validate() checks internal consistency before any money moves.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::strategy::{ConditionKind, WinCondition};
use crate::types::{AccountId, Amount, GroupIndex, Timestamp};

// One participant's bet. stake is escrowed at funding, prize is paid if the group wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantEntry {
    pub owner: AccountId,
    pub stake: Amount,
    pub prize: Amount,
}

impl ParticipantEntry {
    pub fn new(owner: AccountId, stake: Amount, prize: Amount) -> Self {
        Self { owner, stake, prize }
    }
}

// Participants sharing one outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub entries: Vec<ParticipantEntry>,
}

impl Group {
    pub fn new(entries: Vec<ParticipantEntry>) -> Self {
        Self { entries }
    }

    pub fn total_stake(&self) -> Amount {
        self.entries.iter().map(|e| e.stake).sum()
    }

    pub fn total_prize(&self) -> Amount {
        self.entries.iter().map(|e| e.prize).sum()
    }

    pub fn find(&self, owner: AccountId) -> Option<&ParticipantEntry> {
        self.entries.iter().find(|e| e.owner == owner)
    }
}

// A participant entry together with the group it sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub group: GroupIndex,
    pub entry: ParticipantEntry,
}

/** 5.2: what to do when the stakes can't cover the biggest possible payout */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollateralPolicy {
    // reject at construction
    #[default]
    RequireFullyCollateralized,
    // accept; a payout the escrow can't cover fails at claim time
    Unchecked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionConfig {
    // Resolution is allowed strictly after this instant
    pub expiration: Timestamp,
    // Ordered groups. a group's index is its position here
    pub groups: Vec<Group>,
    pub condition: WinCondition,
    #[serde(default)]
    pub collateral: CollateralPolicy,
}

impl OptionConfig {
    pub fn new(expiration: Timestamp, groups: Vec<Group>, condition: impl Into<WinCondition>) -> Self {
        Self {
            expiration,
            groups,
            condition: condition.into(),
            collateral: CollateralPolicy::default(),
        }
    }

    pub fn with_collateral_policy(mut self, policy: CollateralPolicy) -> Self {
        self.collateral = policy;
        self
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::NoGroups);
        }

        let mut seen = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.entries.is_empty() {
                return Err(ConfigError::EmptyGroup { group: GroupIndex(i) });
            }
            for entry in &group.entries {
                if entry.stake.is_negative() || entry.prize.is_negative() {
                    return Err(ConfigError::NegativeAmount { owner: entry.owner });
                }
                // every owner sits in exactly one group, exactly once
                if !seen.insert(entry.owner) {
                    return Err(ConfigError::DuplicateParticipant { owner: entry.owner });
                }
            }
        }

        self.condition.validate(self.groups.len())?;

        // once these fit, every other total over the config fits too
        let (available, required) = self.checked_totals()?;

        if self.collateral == CollateralPolicy::RequireFullyCollateralized && required > available {
            return Err(ConfigError::Undercollateralized { required, available });
        }

        Ok(())
    }

    // (total stake, largest group prize) without panicking on overflow
    fn checked_totals(&self) -> Result<(Amount, Amount), ConfigError> {
        let mut total_stake = Amount::zero();
        let mut max_prize = Amount::zero();

        for group in &self.groups {
            let mut group_prize = Amount::zero();
            for entry in &group.entries {
                total_stake = total_stake
                    .checked_add(entry.stake)
                    .ok_or(ConfigError::AmountOverflow)?;
                group_prize = group_prize
                    .checked_add(entry.prize)
                    .ok_or(ConfigError::AmountOverflow)?;
            }
            max_prize = max_prize.max(group_prize);
        }

        Ok((total_stake, max_prize))
    }

    // Participants in funding order: group order, then entry order
    pub fn participants(&self) -> impl Iterator<Item = Participant> + '_ {
        self.groups.iter().enumerate().flat_map(|(i, group)| {
            group.entries.iter().map(move |entry| Participant {
                group: GroupIndex(i),
                entry: *entry,
            })
        })
    }

    pub fn find_participant(&self, owner: AccountId) -> Option<Participant> {
        self.participants().find(|p| p.entry.owner == owner)
    }

    pub fn group(&self, index: GroupIndex) -> Option<&Group> {
        self.groups.get(index.as_usize())
    }

    pub fn stake_schedule(&self) -> Vec<(AccountId, Amount)> {
        self.participants().map(|p| (p.entry.owner, p.entry.stake)).collect()
    }

    pub fn total_stake(&self) -> Amount {
        self.groups.iter().map(Group::total_stake).sum()
    }

    // The most any single outcome can cost the escrow
    pub fn max_group_prize(&self) -> Amount {
        self.groups
            .iter()
            .map(Group::total_prize)
            .max()
            .unwrap_or_else(Amount::zero)
    }

    pub fn participant_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("option has no groups")]
    NoGroups,

    #[error("{group} has no participants")]
    EmptyGroup { group: GroupIndex },

    #[error("participant {owner} appears more than once")]
    DuplicateParticipant { owner: AccountId },

    #[error("participant {owner} has a negative stake or prize")]
    NegativeAmount { owner: AccountId },

    #[error("{kind} condition expects {expected} groups, found {groups}")]
    ConditionArity {
        kind: ConditionKind,
        expected: usize,
        groups: usize,
    },

    #[error("interval for {group} has lower bound above upper bound")]
    InvertedInterval { group: GroupIndex },

    #[error("barrier condition has {count} fallback groups, at most one allowed")]
    MultipleFallbackGroups { count: usize },

    #[error("stake or prize totals exceed the representable amount")]
    AmountOverflow,

    #[error("stakes total {available} cannot cover a group payout of {required}")]
    Undercollateralized { required: Amount, available: Amount },
}
