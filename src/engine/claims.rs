//! Prize claims. at most one per owner, winners and losers alike.

use tracing::{debug, info};

use super::core::{LifecycleState, OptionContract};
use super::results::SettlementError;
use crate::events::{ClaimRejectedEvent, EventPayload, PrizeClaimedEvent};
use crate::ledger::LedgerError;
use crate::types::{AccountId, Amount};

impl OptionContract {
    /// Pay `owner` their prize if their group won and they haven't claimed yet.
    ///
    /// Every failure is `NoPrizeAvailable`, whether the owner lost, already
    /// claimed, or nobody won. Once the contract is resolved any attempt marks
    /// the owner as claimed. Before resolution nothing is marked.
    pub fn claim(&self, owner: AccountId) -> Result<Amount, SettlementError> {
        let mut state = self.state.lock();

        if state.lifecycle != LifecycleState::Resolved {
            debug!(%owner, "Claim before resolution");
            return Err(SettlementError::NoPrizeAvailable);
        }

        let payable = match state.winning_group {
            Some(group) if !state.claimed.contains(&owner) => self
                .config
                .group(group)
                .and_then(|g| g.find(owner))
                .map(|entry| (group, entry.prize)),
            _ => None,
        };

        let Some((group, prize)) = payable else {
            state.claimed.insert(owner);
            self.emit_event(&mut state, EventPayload::ClaimRejected(ClaimRejectedEvent { owner }));
            debug!(%owner, "No prize available");
            return Err(SettlementError::NoPrizeAvailable);
        };

        let paid_out = state
            .paid_out
            .checked_add(prize)
            .ok_or(SettlementError::Payout(LedgerError::Overflow { account: owner, amount: prize }))?;

        // a failed payout leaves the owner free to claim again
        self.ledger
            .transfer_to(owner, prize)
            .map_err(SettlementError::Payout)?;

        state.claimed.insert(owner);
        state.paid_out = paid_out;

        self.emit_event(
            &mut state,
            EventPayload::PrizeClaimed(PrizeClaimedEvent { owner, group, prize }),
        );

        info!(%owner, %group, %prize, "Prize claimed");

        Ok(prize)
    }
}
