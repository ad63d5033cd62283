//! Transaction-related types for the bank engine
//!
//! This module defines the money-movement kinds and the immutable records the
//! transaction history stores.

use super::account::{AccountId, CustomerId};
use super::error::BankError;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Money movements supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Credit funds to an account
    Deposit,

    /// Debit funds from an account, possibly overdrawing it
    Withdraw,

    /// Move funds between two accounts, recorded once per leg
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" | "withdrawal" => Ok(TransactionKind::Withdraw),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(BankError::invalid_argument(format!(
                "transaction type must be deposit, withdraw or transfer, got '{}'",
                other
            ))),
        }
    }
}

/// History filter: a single kind, or every kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(TransactionKind),
}

impl KindFilter {
    pub fn matches(&self, kind: TransactionKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(wanted) => *wanted == kind,
        }
    }
}

impl From<TransactionKind> for KindFilter {
    fn from(kind: TransactionKind) -> Self {
        KindFilter::Only(kind)
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindFilter::All => f.write_str("all"),
            KindFilter::Only(kind) => fmt::Display::fmt(kind, f),
        }
    }
}

impl FromStr for KindFilter {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(KindFilter::All);
        }
        s.parse::<TransactionKind>()
            .map(KindFilter::Only)
            .map_err(|_| {
                BankError::invalid_argument(format!(
                    "please choose transaction type of deposit, withdraw, transfer, or all, got '{}'",
                    s.trim()
                ))
            })
    }
}

/// The other side of a transfer leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counterparty {
    pub account: AccountId,

    /// Whether both accounts belong to the same customer
    pub own_account: bool,
}

/// One money movement as recorded in the transaction history
///
/// The amount is signed: credits are positive, debits negative. Withdrawals
/// store the negated *requested* amount, so limit accounting sees what the
/// customer asked for rather than what an overdraft ceiling let through.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Customer who performed the movement (may be a banker)
    pub actor: CustomerId,

    pub account: AccountId,

    pub timestamp: NaiveDateTime,

    pub kind: TransactionKind,

    pub amount: Decimal,

    /// Set for transfer legs only
    pub counterparty: Option<Counterparty>,
}

impl TransactionRecord {
    pub fn deposit(
        actor: CustomerId,
        account: AccountId,
        timestamp: NaiveDateTime,
        amount: Decimal,
    ) -> Self {
        TransactionRecord {
            actor,
            account,
            timestamp,
            kind: TransactionKind::Deposit,
            amount: amount.abs(),
            counterparty: None,
        }
    }

    pub fn withdrawal(
        actor: CustomerId,
        account: AccountId,
        timestamp: NaiveDateTime,
        requested: Decimal,
    ) -> Self {
        TransactionRecord {
            actor,
            account,
            timestamp,
            kind: TransactionKind::Withdraw,
            amount: -requested.abs(),
            counterparty: None,
        }
    }

    /// The two legs of a transfer: (debit on `from`, credit on `to`)
    pub fn transfer_legs(
        actor: CustomerId,
        from: AccountId,
        to: AccountId,
        timestamp: NaiveDateTime,
        amount: Decimal,
        own_account: bool,
    ) -> (Self, Self) {
        let debit = TransactionRecord {
            actor,
            account: from,
            timestamp,
            kind: TransactionKind::Transfer,
            amount: -amount.abs(),
            counterparty: Some(Counterparty {
                account: to,
                own_account,
            }),
        };
        let credit = TransactionRecord {
            actor,
            account: to,
            timestamp,
            kind: TransactionKind::Transfer,
            amount: amount.abs(),
            counterparty: Some(Counterparty {
                account: from,
                own_account,
            }),
        };
        (debit, credit)
    }

    /// Calendar date of the record, ignoring the time of day
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn is_debit(&self) -> bool {
        self.amount.is_sign_negative()
    }

    pub fn is_own_account_transfer(&self) -> bool {
        self.counterparty.is_some_and(|c| c.own_account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[rstest]
    #[case("all", KindFilter::All)]
    #[case("ALL", KindFilter::All)]
    #[case("deposit", KindFilter::Only(TransactionKind::Deposit))]
    #[case("withdraw", KindFilter::Only(TransactionKind::Withdraw))]
    #[case(" transfer ", KindFilter::Only(TransactionKind::Transfer))]
    fn test_kind_filter_parsing(#[case] input: &str, #[case] expected: KindFilter) {
        assert_eq!(input.parse::<KindFilter>().unwrap(), expected);
    }

    #[test]
    fn test_kind_filter_rejects_unknown() {
        let err = "refund".parse::<KindFilter>().unwrap_err();
        assert!(err.to_string().contains("deposit, withdraw, transfer, or all"));
    }

    #[test]
    fn test_withdrawal_amount_is_negative() {
        let record = TransactionRecord::withdrawal(1, 100001, timestamp(), Decimal::from(150));
        assert_eq!(record.amount, Decimal::from(-150));
        assert!(record.is_debit());
        assert!(record.counterparty.is_none());
    }

    #[test]
    fn test_transfer_legs_reference_each_other() {
        let (debit, credit) =
            TransactionRecord::transfer_legs(7, 100001, 100002, timestamp(), Decimal::from(40), true);

        assert_eq!(debit.account, 100001);
        assert_eq!(debit.amount, Decimal::from(-40));
        assert_eq!(debit.counterparty.unwrap().account, 100002);
        assert_eq!(credit.account, 100002);
        assert_eq!(credit.amount, Decimal::from(40));
        assert_eq!(credit.counterparty.unwrap().account, 100001);
        assert!(debit.is_own_account_transfer());
        assert!(credit.is_own_account_transfer());
        assert_eq!(debit.amount + credit.amount, Decimal::ZERO);
    }
}
