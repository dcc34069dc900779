// 7.0 engine/core.rs: the option contract. holds the immutable configuration, the
// injected ledger/oracle/clock, and all mutable lifecycle state behind one lock.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::results::SettlementError;
use crate::clock::Clock;
use crate::config::{OptionConfig, Participant};
use crate::events::{ContractCreatedEvent, Event, EventLog, EventPayload};
use crate::ledger::BalanceLedger;
use crate::oracle::{PriceOracle, PriceSample};
use crate::strategy::WinCondition;
use crate::types::{AccountId, Amount, GroupIndex, Price, Timestamp};

/** 7.1: lifecycle only moves forward: Configured -> Funded -> Resolved */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Configured,
    Funded,
    Resolved,
}

#[derive(Debug)]
pub(super) struct ContractState {
    pub(super) lifecycle: LifecycleState,
    pub(super) winning_group: Option<GroupIndex>,
    pub(super) settlement: Option<PriceSample>,
    pub(super) claimed: HashSet<AccountId>,
    pub(super) escrowed: Amount,
    pub(super) paid_out: Amount,
    pub(super) events: EventLog,
}

/// Point-in-time view of a contract, safe to hand to other systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSnapshot {
    pub lifecycle: LifecycleState,
    pub expiration: Timestamp,
    pub initial_price: Option<Price>,
    pub settlement_price: Option<Price>,
    pub winning_group: Option<GroupIndex>,
    pub escrowed: Amount,
    pub paid_out: Amount,
    pub claimed: Vec<AccountId>,
}

/// A binary option between groups of participants.
///
/// Every lifecycle operation takes `&self` and runs entirely under the
/// contract's lock, so an `Arc<OptionContract>` can be shared between callers
/// and each `fund`, `resolve` and `claim` is observed as one atomic step.
pub struct OptionContract {
    pub(super) config: OptionConfig,
    pub(super) engine_config: EngineConfig,
    pub(super) ledger: Arc<dyn BalanceLedger>,
    pub(super) oracle: Arc<dyn PriceOracle>,
    pub(super) clock: Arc<dyn Clock>,
    // price read at construction, barrier contracts only
    pub(super) initial_price: Option<Price>,
    pub(super) state: Mutex<ContractState>,
}

impl OptionContract {
    pub fn new(
        config: OptionConfig,
        ledger: Arc<dyn BalanceLedger>,
        oracle: Arc<dyn PriceOracle>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SettlementError> {
        Self::with_engine_config(config, ledger, oracle, clock, EngineConfig::default())
    }

    pub fn with_engine_config(
        config: OptionConfig,
        ledger: Arc<dyn BalanceLedger>,
        oracle: Arc<dyn PriceOracle>,
        clock: Arc<dyn Clock>,
        engine_config: EngineConfig,
    ) -> Result<Self, SettlementError> {
        config.validate()?;

        let initial_price = match &config.condition {
            WinCondition::Barrier(barrier) => {
                let sample = oracle.latest_sample()?;
                if let Err(conflict) = barrier.directions(sample.price) {
                    warn!(%conflict, initial_price = %sample.price, "Rejected barrier option");
                    return Err(SettlementError::ConflictingTouchConfiguration {
                        conflict,
                        initial_price: sample.price,
                    });
                }
                Some(sample.price)
            }
            WinCondition::Interval(interval) => {
                if let Some((a, b)) = interval.first_overlap() {
                    warn!(%a, %b, "Interval option has overlapping ranges, first declared wins");
                }
                None
            }
            WinCondition::Threshold(_) => None,
        };

        let contract = Self {
            state: Mutex::new(ContractState {
                lifecycle: LifecycleState::Configured,
                winning_group: None,
                settlement: None,
                claimed: HashSet::new(),
                escrowed: Amount::zero(),
                paid_out: Amount::zero(),
                events: EventLog::new(engine_config.max_events),
            }),
            config,
            engine_config,
            ledger,
            oracle,
            clock,
            initial_price,
        };

        {
            let mut state = contract.state.lock();
            let payload = EventPayload::ContractCreated(ContractCreatedEvent {
                condition: contract.config.condition.kind(),
                expiration: contract.config.expiration,
                groups: contract.config.groups.len(),
                participants: contract.config.participant_count(),
                initial_price,
            });
            contract.emit_event(&mut state, payload);
        }

        info!(
            condition = %contract.config.condition.kind(),
            expiration = %contract.config.expiration,
            groups = contract.config.groups.len(),
            participants = contract.config.participant_count(),
            "Option contract created"
        );

        Ok(contract)
    }

    pub fn config(&self) -> &OptionConfig {
        &self.config
    }

    pub fn expiration(&self) -> Timestamp {
        self.config.expiration
    }

    pub fn initial_price(&self) -> Option<Price> {
        self.initial_price
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.state.lock().lifecycle
    }

    pub fn winning_group(&self) -> Option<GroupIndex> {
        self.state.lock().winning_group
    }

    pub fn settlement_sample(&self) -> Option<PriceSample> {
        self.state.lock().settlement
    }

    pub fn settlement_price(&self) -> Option<Price> {
        self.settlement_sample().map(|s| s.price)
    }

    pub fn has_claimed(&self, owner: AccountId) -> bool {
        self.state.lock().claimed.contains(&owner)
    }

    pub fn participant(&self, owner: AccountId) -> Option<Participant> {
        self.config.find_participant(owner)
    }

    pub fn escrowed(&self) -> Amount {
        self.state.lock().escrowed
    }

    pub fn paid_out(&self) -> Amount {
        self.state.lock().paid_out
    }

    // Stakes left in escrow after payouts so far
    pub fn escrow_balance(&self) -> Amount {
        let state = self.state.lock();
        state.escrowed.sub(state.paid_out)
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.events().to_vec()
    }

    pub fn recent_events(&self, count: usize) -> Vec<Event> {
        self.state.lock().events.recent(count).to_vec()
    }

    pub fn snapshot(&self) -> ContractSnapshot {
        let state = self.state.lock();
        let mut claimed: Vec<AccountId> = state.claimed.iter().copied().collect();
        claimed.sort();

        ContractSnapshot {
            lifecycle: state.lifecycle,
            expiration: self.config.expiration,
            initial_price: self.initial_price,
            settlement_price: state.settlement.map(|s| s.price),
            winning_group: state.winning_group,
            escrowed: state.escrowed,
            paid_out: state.paid_out,
            claimed,
        }
    }

    pub(super) fn emit_event(&self, state: &mut ContractState, payload: EventPayload) {
        let timestamp = self.clock.now();

        if self.engine_config.verbose {
            debug!(?payload, %timestamp, "Contract event");
        }

        state.events.record(timestamp, payload);
    }
}

impl fmt::Debug for OptionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionContract")
            .field("config", &self.config)
            .field("initial_price", &self.initial_price)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
