//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account record and identifiers
//! - `actor`: The user acting on the engine and their role
//! - `card`: Card tiers and the compiled-in daily limit table
//! - `transaction`: Transaction kinds and history records
//! - `error`: Error types for the bank engine

pub mod account;
pub mod actor;
pub mod card;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountId, AccountKind, CardId, CustomerId};
pub use actor::{Actor, Role};
pub use card::{resolve_card_limits, CardPolicy, CardTier};
pub use error::BankError;
pub use transaction::{Counterparty, KindFilter, TransactionKind, TransactionRecord};
