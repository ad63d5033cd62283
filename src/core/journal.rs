//! Transfer journal
//!
//! Write-ahead intent records for transfers. The engine writes a `begin` row
//! before touching either leg and a `commit` row once both legs and both
//! history records are written. A `begin` without its `commit` marks a
//! transfer that may be half-applied and needs an operator's attention.
//!
//! The journal does not make transfers atomic; it makes a crash between the
//! leg writes detectable on the next start.

use crate::io::delimited_reader::read_all;
use crate::io::record_format::{self, journal_fields, parse_journal_entry};
use crate::types::{AccountId, BankError};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalState {
    Begin,
    Commit,
}

/// A transfer the engine announced before applying it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    /// Position of the transfer in the journal, starting at 1
    pub sequence: u64,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Decimal,
    pub timestamp: NaiveDateTime,
}

/// One journal row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalEntry {
    pub state: JournalState,
    pub intent: TransferIntent,
}

/// Journal of transfer intents
///
/// Only uncommitted intents and the last sequence number are kept in
/// memory. When a path is set, every row is also appended to the file.
#[derive(Debug, Clone, Default)]
pub struct TransferJournal {
    path: Option<PathBuf>,
    pending: Vec<TransferIntent>,
    last_sequence: u64,
}

impl TransferJournal {
    /// Journal with no backing file
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or start) the journal file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BankError> {
        let path = path.into();
        let mut journal = Self::default();
        for entry in read_all(&path, parse_journal_entry)? {
            journal.apply(entry);
        }
        journal.path = Some(path);
        Ok(journal)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Sequence number of the most recent intent, 0 for an empty journal
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    fn apply(&mut self, entry: JournalEntry) {
        let sequence = entry.intent.sequence;
        self.last_sequence = self.last_sequence.max(sequence);
        match entry.state {
            JournalState::Begin => self.pending.push(entry.intent),
            JournalState::Commit => self.pending.retain(|intent| intent.sequence != sequence),
        }
    }

    fn write(&mut self, entry: JournalEntry) -> Result<(), BankError> {
        if let Some(path) = &self.path {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let mut writer = record_format::writer_from(file);
            writer.write_record(journal_fields(&entry))?;
            writer.flush()?;
        }
        self.apply(entry);
        Ok(())
    }

    /// Record the intent to move `amount` from `from` to `to`
    pub fn begin(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        timestamp: NaiveDateTime,
    ) -> Result<TransferIntent, BankError> {
        let intent = TransferIntent {
            sequence: self.last_sequence + 1,
            from,
            to,
            amount,
            timestamp,
        };
        self.write(JournalEntry {
            state: JournalState::Begin,
            intent,
        })?;
        Ok(intent)
    }

    /// Mark a transfer as fully applied
    pub fn commit(&mut self, intent: &TransferIntent) -> Result<(), BankError> {
        self.write(JournalEntry {
            state: JournalState::Commit,
            intent: *intent,
        })
    }

    /// Intents that were begun but never committed, in journal order
    pub fn pending(&self) -> Vec<TransferIntent> {
        self.pending.clone()
    }
}
