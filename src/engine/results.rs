// 7.0.2: result types and errors for contract operations.

use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::oracle::{OracleError, PriceSample};
use crate::strategy::BarrierConflict;
use crate::types::{AccountId, Amount, GroupIndex, Price, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingResult {
    pub total_escrowed: Amount,
    pub participants: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub sample: PriceSample,
    pub winning_group: Option<GroupIndex>,
    // sum of prizes the winning group can claim
    pub total_prize: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    // construction failed, the contract never exists
    Configuration,
    // wrong point in the lifecycle, nothing changed
    Lifecycle,
    // the ledger refused to move funds
    Funds,
    Claim,
    // the oracle couldn't answer
    Oracle,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("There is conflict between the touch configurations: {conflict} (initial price {initial_price})")]
    ConflictingTouchConfiguration {
        conflict: BarrierConflict,
        initial_price: Price,
    },

    #[error("Invalid option configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Has already been created")]
    AlreadyFunded,

    #[error("Escrow of {owner}'s stake rejected: {source}")]
    InsufficientAllowance {
        owner: AccountId,
        #[source]
        source: LedgerError,
    },

    // resolving a contract that was never funded. a Configured contract has
    // nothing escrowed, so this is reported apart from AlreadyResolved
    #[error("Has not been funded")]
    NotFunded,

    #[error("Has already been resolved")]
    AlreadyResolved,

    #[error("It isn't expired: now {now}, expires {expiration}")]
    NotExpired { now: Timestamp, expiration: Timestamp },

    // deliberately the same for "lost", "already claimed" and "no winner"
    #[error("No prize available")]
    NoPrizeAvailable,

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Prize payout failed: {0}")]
    Payout(#[source] LedgerError),
}

impl SettlementError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SettlementError::ConflictingTouchConfiguration { .. } | SettlementError::InvalidConfig(_) => {
                ErrorCategory::Configuration
            }
            SettlementError::AlreadyFunded
            | SettlementError::NotFunded
            | SettlementError::AlreadyResolved
            | SettlementError::NotExpired { .. } => ErrorCategory::Lifecycle,
            SettlementError::InsufficientAllowance { .. } | SettlementError::Payout(_) => ErrorCategory::Funds,
            SettlementError::NoPrizeAvailable => ErrorCategory::Claim,
            SettlementError::Oracle(_) => ErrorCategory::Oracle,
        }
    }

    // Can the same call succeed later once the caller fixes the precondition?
    pub fn is_retryable(&self) -> bool {
        match self {
            SettlementError::NotFunded
            | SettlementError::NotExpired { .. }
            | SettlementError::InsufficientAllowance { .. }
            | SettlementError::Oracle(_)
            | SettlementError::Payout(_) => true,
            SettlementError::ConflictingTouchConfiguration { .. }
            | SettlementError::InvalidConfig(_)
            | SettlementError::AlreadyFunded
            | SettlementError::AlreadyResolved
            | SettlementError::NoPrizeAvailable => false,
        }
    }
}
