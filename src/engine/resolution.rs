//! Settlement against the oracle once the option has expired.

use tracing::info;

use super::core::{LifecycleState, OptionContract};
use super::results::{ResolutionResult, SettlementError};
use crate::config::Group;
use crate::events::{EventPayload, ResolvedEvent};
use crate::types::Amount;

impl OptionContract {
    /// Read the oracle once, run the win condition and fix the winning group.
    /// Allowed once, from `Funded`, strictly after expiration.
    pub fn resolve(&self) -> Result<ResolutionResult, SettlementError> {
        let mut state = self.state.lock();

        match state.lifecycle {
            LifecycleState::Resolved => return Err(SettlementError::AlreadyResolved),
            LifecycleState::Configured => return Err(SettlementError::NotFunded),
            LifecycleState::Funded => {}
        }

        let now = self.clock.now();
        if now <= self.config.expiration {
            return Err(SettlementError::NotExpired {
                now,
                expiration: self.config.expiration,
            });
        }

        let sample = self.oracle.latest_sample()?;
        let winning_group = self.config.condition.evaluate(sample.price, self.initial_price);
        let total_prize = winning_group
            .and_then(|g| self.config.group(g))
            .map(Group::total_prize)
            .unwrap_or_else(Amount::zero);

        // state and outcome change together, under the same lock
        state.winning_group = winning_group;
        state.settlement = Some(sample);
        state.lifecycle = LifecycleState::Resolved;

        self.emit_event(
            &mut state,
            EventPayload::Resolved(ResolvedEvent {
                sample_id: sample.sample_id,
                settlement_price: sample.price,
                sample_time: sample.sample_time,
                winning_group,
                total_prize,
            }),
        );

        info!(
            price = %sample.price,
            sample_id = sample.sample_id,
            winning_group = ?winning_group.map(|g| g.as_usize()),
            %total_prize,
            "Option resolved"
        );

        Ok(ResolutionResult {
            sample,
            winning_group,
            total_prize,
        })
    }
}
