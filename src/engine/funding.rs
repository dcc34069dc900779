//! Escrow of every participant's stake.

use tracing::{info, warn};

use super::core::{LifecycleState, OptionContract};
use super::results::{FundingResult, SettlementError};
use crate::events::{EventPayload, FundedEvent, FundingRejectedEvent, StakeEscrowedEvent};

impl OptionContract {
    /// Escrow every stake, group order then entry order. All or nothing: if
    /// the ledger rejects any single transfer, no stake moves and the contract
    /// stays `Configured` so the caller can fix the allowance and retry.
    pub fn fund(&self) -> Result<FundingResult, SettlementError> {
        let mut state = self.state.lock();

        if state.lifecycle != LifecycleState::Configured {
            return Err(SettlementError::AlreadyFunded);
        }

        let schedule = self.config.stake_schedule();

        if let Err((owner, reason)) = self.ledger.escrow_all(&schedule) {
            warn!(%owner, error = %reason, "Funding rejected");
            self.emit_event(
                &mut state,
                EventPayload::FundingRejected(FundingRejectedEvent {
                    owner,
                    reason: reason.clone(),
                }),
            );
            return Err(SettlementError::InsufficientAllowance { owner, source: reason });
        }

        for participant in self.config.participants() {
            self.emit_event(
                &mut state,
                EventPayload::StakeEscrowed(StakeEscrowedEvent {
                    owner: participant.entry.owner,
                    group: participant.group,
                    stake: participant.entry.stake,
                }),
            );
        }

        let total_escrowed = self.config.total_stake();
        state.escrowed = total_escrowed;
        state.lifecycle = LifecycleState::Funded;

        self.emit_event(
            &mut state,
            EventPayload::Funded(FundedEvent {
                total_escrowed,
                participants: schedule.len(),
            }),
        );

        info!(%total_escrowed, participants = schedule.len(), "Option funded");

        Ok(FundingResult {
            total_escrowed,
            participants: schedule.len(),
        })
    }
}
