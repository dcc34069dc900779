// 6.0: every state change produces an event. used for audit trails and for
// notifying external systems. the EventPayload enum lists all event types.

use crate::ledger::LedgerError;
use crate::oracle::SampleId;
use crate::strategy::ConditionKind;
use crate::types::{AccountId, Amount, GroupIndex, Price, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Lifecycle events
    ContractCreated(ContractCreatedEvent),
    Funded(FundedEvent),
    Resolved(ResolvedEvent),

    // Escrow events
    StakeEscrowed(StakeEscrowedEvent),
    FundingRejected(FundingRejectedEvent),

    // Claim events
    PrizeClaimed(PrizeClaimedEvent),
    ClaimRejected(ClaimRejectedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCreatedEvent {
    pub condition: ConditionKind,
    pub expiration: Timestamp,
    pub groups: usize,
    pub participants: usize,
    // barrier contracts only
    pub initial_price: Option<Price>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeEscrowedEvent {
    pub owner: AccountId,
    pub group: GroupIndex,
    pub stake: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundedEvent {
    pub total_escrowed: Amount,
    pub participants: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRejectedEvent {
    pub owner: AccountId,
    pub reason: LedgerError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub sample_id: SampleId,
    pub settlement_price: Price,
    pub sample_time: Timestamp,
    pub winning_group: Option<GroupIndex>,
    pub total_prize: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrizeClaimedEvent {
    pub owner: AccountId,
    pub group: GroupIndex,
    pub prize: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRejectedEvent {
    pub owner: AccountId,
}

// 6.1: bounded in-memory audit log. oldest events are dropped past `max_events`.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            max_events,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn record(&mut self, timestamp: Timestamp, payload: EventPayload) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.events.push(Event::new(id, timestamp, payload));

        if self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(0..drain_count);
        }

        id
    }
}
