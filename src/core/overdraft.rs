//! Overdraft policy
//!
//! A per-account state machine driven by the overdraft counter stored in the
//! ledger:
//!
//! ```text
//!            overdraw              overdraw (counter reaches threshold)
//!  Normal ───────────▶ Overdrawn(n) ───────────────────────────────▶ Locked
//!    ▲                     │                                          │
//!    └──── deposit brings balance to >= 0 ◀───────────────────────────┘
//! ```
//!
//! The first overdraft debits the full requested amount plus the fee. While
//! already overdrawn each further debit is capped at the withdrawal ceiling,
//! still plus the fee. Only a deposit that returns the balance to zero or
//! above clears the counter.

use crate::types::{Account, AccountId, BankError, TransactionKind, TransactionRecord};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Overdraft state derived from the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverdraftState {
    Normal,
    Overdrawn(u32),
    Locked,
}

/// Balance and counter of an account at some point in its history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceState {
    pub balance: Decimal,
    pub overdraft_count: u32,
}

impl BalanceState {
    pub fn of(account: &Account) -> Self {
        BalanceState {
            balance: account.balance,
            overdraft_count: account.overdraft_count,
        }
    }
}

/// Result of evaluating a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalOutcome {
    /// Balance after the withdrawal
    pub balance: Decimal,
    pub overdraft_count: u32,
    /// Amount taken from the balance, excluding the fee
    pub debited: Decimal,
    /// Overdraft fee charged, zero for an ordinary withdrawal
    pub fee: Decimal,
    /// State the account is left in
    pub state: OverdraftState,
}

/// Overdraft rule parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OverdraftPolicy {
    /// Charged on every overdrawing withdrawal
    pub fee: Decimal,

    /// Maximum debit per withdrawal once already overdrawn
    pub withdrawal_ceiling: Decimal,

    /// Counter value at which the account locks
    pub lock_threshold: u32,
}

impl Default for OverdraftPolicy {
    fn default() -> Self {
        OverdraftPolicy {
            fee: Decimal::from(35),
            withdrawal_ceiling: Decimal::from(100),
            lock_threshold: 2,
        }
    }
}

impl OverdraftPolicy {
    pub fn state(&self, overdraft_count: u32) -> OverdraftState {
        if overdraft_count >= self.lock_threshold {
            OverdraftState::Locked
        } else if overdraft_count > 0 {
            OverdraftState::Overdrawn(overdraft_count)
        } else {
            OverdraftState::Normal
        }
    }

    /// Evaluate a withdrawal of `requested` against the current balance
    ///
    /// # Errors
    ///
    /// - `BankError::OverdraftLocked` if the account is locked; nothing changes
    /// - `BankError::ArithmeticOverflow` if the new balance is not representable
    pub fn evaluate_withdrawal(
        &self,
        account_id: AccountId,
        current: BalanceState,
        requested: Decimal,
    ) -> Result<WithdrawalOutcome, BankError> {
        let overflow = || BankError::arithmetic_overflow("withdraw", account_id);

        let state = self.state(current.overdraft_count);
        if state == OverdraftState::Locked {
            return Err(BankError::overdraft_locked(
                account_id,
                current.overdraft_count,
            ));
        }

        if current.balance >= requested {
            let balance = current.balance.checked_sub(requested).ok_or_else(overflow)?;
            let overdraft_count = if balance >= Decimal::ZERO {
                0
            } else {
                current.overdraft_count
            };
            return Ok(WithdrawalOutcome {
                balance,
                overdraft_count,
                debited: requested,
                fee: Decimal::ZERO,
                state: self.state(overdraft_count),
            });
        }

        let debited = match state {
            OverdraftState::Normal => requested,
            _ => requested.min(self.withdrawal_ceiling),
        };
        let balance = current
            .balance
            .checked_sub(debited)
            .and_then(|b| b.checked_sub(self.fee))
            .ok_or_else(overflow)?;
        let overdraft_count = current.overdraft_count.checked_add(1).ok_or_else(overflow)?;

        Ok(WithdrawalOutcome {
            balance,
            overdraft_count,
            debited,
            fee: self.fee,
            state: self.state(overdraft_count),
        })
    }

    /// Credit a deposit; clears the counter once the balance is non-negative
    pub fn apply_deposit(
        &self,
        account_id: AccountId,
        current: BalanceState,
        amount: Decimal,
    ) -> Result<BalanceState, BankError> {
        let balance = current
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("deposit", account_id))?;
        let overdraft_count = if balance >= Decimal::ZERO {
            0
        } else {
            current.overdraft_count
        };
        Ok(BalanceState {
            balance,
            overdraft_count,
        })
    }

    /// Rebuild an account's balance and counter from its history
    ///
    /// Replay starts from a freshly opened account. Returns the final state
    /// and the number of withdrawals the policy would have refused, which is
    /// never non-zero for a history written by the engine.
    pub fn replay<I>(&self, account_id: AccountId, records: I) -> Result<(BalanceState, usize), BankError>
    where
        I: IntoIterator<Item = Result<TransactionRecord, BankError>>,
    {
        let mut current = BalanceState {
            balance: Decimal::ZERO,
            overdraft_count: 0,
        };
        let mut refused = 0;

        for result in records {
            let record = result?;
            match record.kind {
                TransactionKind::Deposit => {
                    current = self.apply_deposit(account_id, current, record.amount.abs())?;
                }
                TransactionKind::Withdraw => {
                    match self.evaluate_withdrawal(account_id, current, record.amount.abs()) {
                        Ok(outcome) => {
                            current = BalanceState {
                                balance: outcome.balance,
                                overdraft_count: outcome.overdraft_count,
                            }
                        }
                        Err(BankError::OverdraftLocked { .. }) => refused += 1,
                        Err(e) => return Err(e),
                    }
                }
                TransactionKind::Transfer => {
                    current.balance = current
                        .balance
                        .checked_add(record.amount)
                        .ok_or_else(|| BankError::arithmetic_overflow("transfer", account_id))?;
                }
            }
        }

        Ok((current, refused))
    }
}
