//! Debit card tiers and their daily limits
//!
//! The card policy table is compiled in: one row per tier, looked up by tag
//! instead of dispatching through per-card types.

use super::account::CardId;
use super::error::BankError;
use super::transaction::TransactionKind;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Debit card tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardTier {
    Standard,
    Titanium,
    Platinum,
}

/// Daily caps for one card tier, in USD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPolicy {
    pub tier: CardTier,
    pub deposit_daily: Decimal,
    pub withdraw_daily: Decimal,
    pub transfer_own_account_daily: Decimal,
    pub transfer_other_account_daily: Decimal,
}

const fn usd(amount: u32) -> Decimal {
    Decimal::from_parts(amount, 0, 0, false, 0)
}

const CARD_POLICIES: [CardPolicy; 3] = [
    CardPolicy {
        tier: CardTier::Standard,
        deposit_daily: usd(200_000),
        withdraw_daily: usd(5_000),
        transfer_own_account_daily: usd(20_000),
        transfer_other_account_daily: usd(10_000),
    },
    CardPolicy {
        tier: CardTier::Titanium,
        deposit_daily: usd(200_000),
        withdraw_daily: usd(10_000),
        transfer_own_account_daily: usd(40_000),
        transfer_other_account_daily: usd(20_000),
    },
    CardPolicy {
        tier: CardTier::Platinum,
        deposit_daily: usd(200_000),
        withdraw_daily: usd(20_000),
        transfer_own_account_daily: usd(80_000),
        transfer_other_account_daily: usd(40_000),
    },
];

/// Look up the daily limits of a card tier
pub fn resolve_card_limits(tier: CardTier) -> CardPolicy {
    CARD_POLICIES[tier.index()]
}

impl CardPolicy {
    /// Daily cap applying to a movement of the given kind
    ///
    /// `own_account` only matters for transfers.
    pub fn daily_cap(&self, kind: TransactionKind, own_account: bool) -> Decimal {
        match kind {
            TransactionKind::Deposit => self.deposit_daily,
            TransactionKind::Withdraw => self.withdraw_daily,
            TransactionKind::Transfer if own_account => self.transfer_own_account_daily,
            TransactionKind::Transfer => self.transfer_other_account_daily,
        }
    }
}

impl CardTier {
    pub const ALL: [CardTier; 3] = [CardTier::Standard, CardTier::Titanium, CardTier::Platinum];

    fn index(self) -> usize {
        match self {
            CardTier::Standard => 0,
            CardTier::Titanium => 1,
            CardTier::Platinum => 2,
        }
    }

    pub fn policy(self) -> CardPolicy {
        resolve_card_limits(self)
    }

    /// First card number of this tier's numbering range (exclusive)
    pub fn card_prefix(self) -> CardId {
        match self {
            CardTier::Standard => 510_000_000,
            CardTier::Titanium => 530_000_000,
            CardTier::Platinum => 550_000_000,
        }
    }

    /// Whether a card number falls in this tier's numbering range
    pub fn issued(self, card_id: CardId) -> bool {
        card_id / 10_000_000 == self.card_prefix() / 10_000_000
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardTier::Standard => "standard",
            CardTier::Titanium => "titanium",
            CardTier::Platinum => "platinum",
        }
    }
}

impl fmt::Display for CardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardTier {
    type Err = BankError;

    /// Accepts the tier names as well as the card product names used by
    /// older ledger files (`DebitMastercard`, `DebitMastercardTitanium`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "m" | "debitmastercard" => Ok(CardTier::Standard),
            "titanium" | "t" | "debitmastercardtitanium" => Ok(CardTier::Titanium),
            "platinum" | "p" | "debitmastercardplatinum" => Ok(CardTier::Platinum),
            other => Err(BankError::invalid_argument(format!(
                "card type must be standard, titanium or platinum, got '{}'",
                other
            ))),
        }
    }
}
