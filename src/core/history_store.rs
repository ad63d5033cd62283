//! Transaction history storage
//!
//! Append-only log of money movements. Filtering and daily-limit accounting
//! live in the [`HistoryStore`] default methods, so both backends replay the
//! same way.

use crate::core::traits::{HistoryStore, RecordIter};
use crate::io::delimited_reader::DelimitedReader;
use crate::io::record_format::{self, parse_transaction, transaction_fields};
use crate::types::{BankError, TransactionRecord};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// File-backed history, one `;`-delimited row per record
///
/// Queries stream the file lazily; each call starts a new pass.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
}

impl FileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileHistory { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for FileHistory {
    fn append(&mut self, record: &TransactionRecord) -> Result<(), BankError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = record_format::writer_from(file);
        writer.write_record(transaction_fields(record))?;
        writer.flush()?;
        Ok(())
    }

    fn records(&self) -> Result<RecordIter<'_>, BankError> {
        match DelimitedReader::open(&self.path, parse_transaction)? {
            Some(reader) => Ok(Box::new(reader)),
            None => Ok(Box::new(std::iter::empty::<Result<TransactionRecord, BankError>>())),
        }
    }
}

/// In-memory history
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    records: Vec<TransactionRecord>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, record: &TransactionRecord) -> Result<(), BankError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<RecordIter<'_>, BankError> {
        Ok(Box::new(self.records.iter().cloned().map(Ok::<_, BankError>)))
    }
}
