//! Bank Engine Library
//! # Overview
//!
//! This library runs the accounts of a small branch bank: deposits,
//! withdrawals with an overdraft policy, and transfers between accounts,
//! kept in plain `;`-delimited data files.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, TransactionRecord, CardTier, etc.)
//! - [`cli`] - Argument parsing, one-shot commands and the interactive menu
//! - [`config`] - Layered configuration (defaults, TOML file, environment)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Authorization, daily limits and money movement
//!   - [`core::ledger_store`] - Account balances
//!   - [`core::history_store`] - Append-only transaction history
//!   - [`core::overdraft`] - Overdraft fees and withdrawal locking
//!   - [`core::journal`] - Crash detection for two-account transfers
//! - [`io`] - The data file format and streaming row reader
//!
//! # Operations
//!
//! - **Deposit**: Credit an account; may clear the overdraft counter
//! - **Withdraw**: Debit an account, charging a fee when it goes negative
//!   and locking withdrawals after repeated overdrafts
//! - **Transfer**: Move funds between two accounts without overdrawing the
//!   source; recorded as a debit leg and a credit leg
//! - **Open account**: Issue an account number and a debit card
//! - **Audit**: Replay an account's history and compare with the ledger
//!
//! # Daily limits
//!
//! Each card tier caps the daily total of deposits, withdrawals, transfers
//! to the customer's own accounts and transfers to other customers. The
//! totals are computed from the history for the current calendar day.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod types;

pub use crate::config::EngineConfig;
pub use crate::core::{FileEngine, TransactionEngine};
pub use types::{
    Account, AccountId, AccountKind, Actor, BankError, CardTier, CustomerId, KindFilter, Role,
    TransactionKind, TransactionRecord,
};
