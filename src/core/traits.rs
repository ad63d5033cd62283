//! Core traits for the ledger, the transaction history and the engine's collaborators
//!
//! This module defines the trait abstractions that allow file-backed and
//! in-memory implementations to be used interchangeably by the engine.

use crate::types::{
    Account, AccountId, Actor, BankError, CustomerId, KindFilter, TransactionKind,
    TransactionRecord,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Lazy, finite sequence of history records
///
/// Each query call starts a fresh pass over the history.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<TransactionRecord, BankError>> + 'a>;

/// Trait for the canonical store of account records
///
/// The ledger exclusively owns balances. Every lookup returns a fresh copy;
/// callers never hold on to an account across operations.
pub trait LedgerStore {
    /// Find an account by ID
    ///
    /// Returns `BankError::AccountNotFound` if no record matches.
    fn find_account(&self, account_id: AccountId) -> Result<Account, BankError>;

    /// Replace the balance and overdraft counter of one account
    ///
    /// All other fields, and all other records, are preserved.
    /// Returns `BankError::AccountNotFound` if no record matches.
    fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        overdraft_count: u32,
    ) -> Result<(), BankError>;

    /// Accounts held by a customer, at most one per kind
    fn list_accounts_for_customer(&self, customer: CustomerId) -> Result<Vec<Account>, BankError>;

    /// Add a newly opened account
    fn insert_account(&mut self, account: Account) -> Result<(), BankError>;

    /// Every account in the ledger
    fn accounts(&self) -> Result<Vec<Account>, BankError>;

    /// Highest account ID in use, if any
    fn last_account_id(&self) -> Result<Option<AccountId>, BankError> {
        Ok(self.accounts()?.iter().map(|a| a.id).max())
    }
}

/// Trait for the append-only transaction history
///
/// Implementors provide storage; filtering and limit accounting are shared.
pub trait HistoryStore {
    /// Append one record; the only mutation
    fn append(&mut self, record: &TransactionRecord) -> Result<(), BankError>;

    /// Every record in append order
    fn records(&self) -> Result<RecordIter<'_>, BankError>;

    /// Records of one account, optionally narrowed to a single kind
    fn query_by_account_and_type(
        &self,
        account_id: AccountId,
        filter: KindFilter,
    ) -> Result<RecordIter<'_>, BankError> {
        Ok(Box::new(self.records()?.filter(move |result| match result {
            Ok(record) => record.account == account_id && filter.matches(record.kind),
            Err(_) => true,
        })))
    }

    /// Records of one account and kind on a calendar date
    fn query_by_account_type_and_date(
        &self,
        account_id: AccountId,
        filter: KindFilter,
        date: NaiveDate,
    ) -> Result<RecordIter<'_>, BankError> {
        Ok(Box::new(
            self.query_by_account_and_type(account_id, filter)?
                .filter(move |result| match result {
                    Ok(record) => record.date() == date,
                    Err(_) => true,
                }),
        ))
    }

    /// Total absolute amount moved by an account on a date
    ///
    /// For transfers only the outgoing (debit) legs count, and `own_account`
    /// narrows the sum to same-customer or cross-customer transfers. The flag
    /// is ignored for other kinds.
    fn sum_amount_for_date(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        date: NaiveDate,
        own_account: Option<bool>,
    ) -> Result<Decimal, BankError> {
        let mut total = Decimal::ZERO;

        for result in self.query_by_account_type_and_date(account_id, kind.into(), date)? {
            let record = result?;

            if kind == TransactionKind::Transfer {
                if !record.is_debit() {
                    continue;
                }
                if own_account.is_some_and(|own| own != record.is_own_account_transfer()) {
                    continue;
                }
            }

            total = total
                .checked_add(record.amount.abs())
                .ok_or_else(|| BankError::arithmetic_overflow("daily total", account_id))?;
        }

        Ok(total)
    }
}

/// Trait for the source of user identities
pub trait IdentityProvider {
    /// Whether a customer with this ID is registered
    fn owner_exists(&self, customer: CustomerId) -> Result<bool, BankError>;

    /// The authenticated user performing operations
    fn current_actor(&self) -> Actor;
}

/// Trait for the engine's time source
pub trait Clock {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;
}
