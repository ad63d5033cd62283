//! Core business logic module
//!
//! This module contains the banking components:
//! - `traits` - Seams for storage, identity and time
//! - `engine` - Orchestration of deposits, withdrawals and transfers
//! - `ledger_store` / `history_store` - File-backed and in-memory stores
//! - `overdraft` - The overdraft state machine and history replay
//! - `journal` - Write-ahead journal for two-account transfers
//! - `identity` - The users directory
//! - `issuance` - Account and card number allocation
//! - `clock` - System and manual clocks

pub mod clock;
pub mod engine;
pub mod history_store;
pub mod identity;
pub mod issuance;
pub mod journal;
pub mod ledger_store;
pub mod overdraft;
pub mod traits;

pub use clock::{ManualClock, SystemClock};
pub use engine::{AuditReport, FileEngine, TransactionEngine, TransferReceipt, WithdrawalReceipt};
pub use history_store::{FileHistory, MemoryHistory};
pub use identity::UserDirectory;
pub use journal::{TransferIntent, TransferJournal};
pub use ledger_store::{FileLedger, MemoryLedger};
pub use overdraft::{OverdraftPolicy, OverdraftState};
pub use traits::{Clock, HistoryStore, IdentityProvider, LedgerStore};
