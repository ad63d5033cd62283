//! Account-related types for the bank engine
//!
//! This module defines the Account record and the closed set of account kinds
//! a customer may hold.

use super::card::CardTier;
use super::error::BankError;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Account identifier
///
/// Assigned sequentially from a fixed base offset (first account is 100001).
pub type AccountId = u32;

/// Customer identifier (the customer's CPR number)
pub type CustomerId = u32;

/// Debit card number
pub type CardId = u64;

/// Kind of bank account
///
/// A customer may hold at most one account of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Checking,
    Savings,
}

impl AccountKind {
    /// Every kind a customer can hold, in listing order
    pub const ALL: [AccountKind; 2] = [AccountKind::Checking, AccountKind::Savings];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "checking" | "c" => Ok(AccountKind::Checking),
            "savings" | "s" => Ok(AccountKind::Savings),
            other => Err(BankError::invalid_argument(format!(
                "account type must be either checking or savings, got '{}'",
                other
            ))),
        }
    }
}

/// Bank account record
///
/// A plain value: lookups return a fresh copy and mutations go through the
/// ledger store, never through a shared instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,

    /// Customer who owns the account
    pub owner: CustomerId,

    pub kind: AccountKind,

    /// Debit card associated with the account
    pub card_id: CardId,

    /// Tier of the associated card, selects the daily limits
    pub card_tier: CardTier,

    /// Current balance in USD (negative while overdrawn)
    pub balance: Decimal,

    /// Overdrafts since the balance was last non-negative
    pub overdraft_count: u32,
}

impl Account {
    /// Create a freshly opened account with a zero balance
    pub fn new(
        id: AccountId,
        owner: CustomerId,
        kind: AccountKind,
        card_id: CardId,
        card_tier: CardTier,
    ) -> Self {
        Account {
            id,
            owner,
            kind,
            card_id,
            card_tier,
            balance: Decimal::ZERO,
            overdraft_count: 0,
        }
    }

    /// Copy of this account carrying a new balance and overdraft counter
    pub fn with_balance(&self, balance: Decimal, overdraft_count: u32) -> Self {
        Account {
            balance,
            overdraft_count,
            ..self.clone()
        }
    }
}
