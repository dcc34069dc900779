// 3.0 ledger.rs: the token ledger the contract escrows stakes into and pays prizes from.
// the engine only sees the BalanceLedger trait. InMemoryLedger is MOCKED: plain
// balance and allowance maps, no real token transfers.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{AccountId, Amount};

// Errors from ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient allowance: {spender} may move {allowed} of {owner}'s funds, requested {requested}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        allowed: Amount,
        requested: Amount,
    },

    #[error("insufficient balance on {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: Amount,
        requested: Amount,
    },

    #[error("invalid transfer amount {0}")]
    InvalidAmount(Amount),

    #[error("crediting {amount} to {account} overflows its balance")]
    Overflow { account: AccountId, amount: Amount },
}

// 3.1: what the settlement engine needs from a ledger. "from" and "to" are
// relative to the contract's own escrow account.
pub trait BalanceLedger: Send + Sync {
    // Pull `amount` from `owner` into escrow. needs prior authorization.
    fn transfer_from(&self, owner: AccountId, amount: Amount) -> Result<(), LedgerError>;

    // Pay `amount` out of escrow to `owner`.
    fn transfer_to(&self, owner: AccountId, amount: Amount) -> Result<(), LedgerError>;

    // Escrow every transfer or none of them. the default pulls one by one and
    // hands back what it already took when a pull is rejected. implementations
    // that can check everything up front should override it.
    fn escrow_all(&self, transfers: &[(AccountId, Amount)]) -> Result<(), (AccountId, LedgerError)> {
        for (i, (owner, amount)) in transfers.iter().enumerate() {
            if let Err(e) = self.transfer_from(*owner, *amount) {
                for (taken_from, taken) in transfers[..i].iter().rev() {
                    if let Err(refund_err) = self.transfer_to(*taken_from, *taken) {
                        tracing::error!(owner = %taken_from, amount = %taken, error = %refund_err, "Failed to return escrowed stake");
                    }
                }
                return Err((*owner, e));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, Amount>,
    // (owner, spender) -> remaining allowance
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
}

impl LedgerState {
    fn balance(&self, account: AccountId) -> Amount {
        self.balances.get(&account).copied().unwrap_or_else(Amount::zero)
    }

    fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.allowances.get(&(owner, spender)).copied().unwrap_or_else(Amount::zero)
    }

    fn check_transfer_from(
        &self,
        spender: AccountId,
        owner: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let allowed = self.allowance(owner, spender);
        if amount > allowed {
            return Err(LedgerError::InsufficientAllowance {
                owner,
                spender,
                allowed,
                requested: amount,
            });
        }

        let available = self.balance(owner);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                account: owner,
                available,
                requested: amount,
            });
        }

        Ok(())
    }

    fn move_funds(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let available = self.balance(from);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                available,
                requested: amount,
            });
        }

        self.balances.insert(from, available.sub(amount));
        // balances never exceed total supply, so this only trips on a corrupt state
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: to, amount });
        match credited {
            Ok(credited) => {
                self.balances.insert(to, credited);
                Ok(())
            }
            Err(e) => {
                // put the debit back, nothing moves
                self.balances.insert(from, available);
                Err(e)
            }
        }
    }

    fn spend_allowance(&mut self, owner: AccountId, spender: AccountId, amount: Amount) {
        let remaining = self.allowance(owner, spender).sub(amount);
        self.allowances.insert((owner, spender), remaining);
    }
}

// 3.2: ERC-20 style in-memory token. owners approve a spender, the spender pulls.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self, account: AccountId, amount: Amount) -> Result<(), LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut state = self.state.lock();
        let overflow = LedgerError::Overflow { account, amount };
        let credited = state.balance(account).checked_add(amount).ok_or(overflow.clone())?;
        let supply = state.total_supply.checked_add(amount).ok_or(overflow)?;

        state.balances.insert(account, credited);
        state.total_supply = supply;
        Ok(())
    }

    // Sets (does not add to) the spender's allowance over owner's funds.
    pub fn approve(&self, owner: AccountId, spender: AccountId, amount: Amount) {
        self.state.lock().allowances.insert((owner, spender), amount);
    }

    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.state.lock().balance(account)
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.state.lock().allowance(owner, spender)
    }

    pub fn total_supply(&self) -> Amount {
        self.state.lock().total_supply
    }

    pub fn transfer(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.state.lock().move_funds(from, to, amount)
    }

    pub fn transfer_from(
        &self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        state.check_transfer_from(spender, owner, amount)?;
        state.spend_allowance(owner, spender, amount);
        state.move_funds(owner, to, amount)
    }

    // A BalanceLedger view where `account` is the contract's escrow.
    pub fn escrow_account(self: &Arc<Self>, account: AccountId) -> EscrowAccount {
        EscrowAccount {
            ledger: Arc::clone(self),
            account,
        }
    }
}

// 3.3: binds an InMemoryLedger to one escrow account. this is what a contract holds.
#[derive(Debug, Clone)]
pub struct EscrowAccount {
    ledger: Arc<InMemoryLedger>,
    account: AccountId,
}

impl EscrowAccount {
    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn balance(&self) -> Amount {
        self.ledger.balance_of(self.account)
    }
}

impl BalanceLedger for EscrowAccount {
    fn transfer_from(&self, owner: AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.ledger.transfer_from(self.account, owner, self.account, amount)
    }

    fn transfer_to(&self, owner: AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.ledger.transfer(self.account, owner, amount)
    }

    // validates every pull under one lock before moving anything
    fn escrow_all(&self, transfers: &[(AccountId, Amount)]) -> Result<(), (AccountId, LedgerError)> {
        let mut state = self.ledger.state.lock();

        let mut pending: HashMap<AccountId, Amount> = HashMap::new();
        for (owner, amount) in transfers {
            let total = pending
                .get(owner)
                .copied()
                .unwrap_or_else(Amount::zero)
                .checked_add(*amount)
                .ok_or((*owner, LedgerError::Overflow { account: *owner, amount: *amount }))?;
            state
                .check_transfer_from(self.account, *owner, total)
                .map_err(|e| match e {
                    // report the single rejected request, not the running total
                    LedgerError::InsufficientAllowance { owner, spender, allowed, .. } => {
                        LedgerError::InsufficientAllowance { owner, spender, allowed, requested: *amount }
                    }
                    other => other,
                })
                .map_err(|e| (*owner, e))?;
            pending.insert(*owner, total);
        }

        for (owner, amount) in transfers {
            state.spend_allowance(*owner, self.account, *amount);
            state.move_funds(*owner, self.account, *amount).map_err(|e| (*owner, e))?;
        }
        Ok(())
    }
}
