//! Streaming reader over `;`-delimited data files
//!
//! Provides a lazy iterator that turns each row of a data file into a domain
//! value. Row layouts are delegated to the record_format module; this reader
//! only owns the streaming and the line bookkeeping.
//!
//! # Design
//!
//! The DelimitedReader wraps a csv reader configured for the headerless `;`
//! dialect and a row parser function. It processes rows one at a time without
//! loading the file into memory, so replaying a long transaction history
//! costs O(1) memory.
//!
//! ```no_run
//! use bank_engine::io::delimited_reader::DelimitedReader;
//! use bank_engine::io::record_format::parse_transaction;
//! use std::path::Path;
//!
//! if let Some(reader) = DelimitedReader::open(Path::new("transaction_history.txt"), parse_transaction).unwrap() {
//!     for result in reader {
//!         match result {
//!             Ok(record) => println!("{:?}", record),
//!             Err(e) => eprintln!("Error: {}", e),
//!         }
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - A missing file is not an error: `open()` returns `Ok(None)`
//! - Other I/O errors opening the file are returned from `open()`
//! - Malformed rows are yielded as `Err(BankError::Parse)` carrying the line number

use super::record_format;
use crate::types::BankError;
use csv::StringRecord;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Parser turning one row into a value, given the row's line number
pub type RowParser<T> = fn(&StringRecord, Option<u64>) -> Result<T, BankError>;

/// Lazy iterator over the rows of a data file
pub struct DelimitedReader<R: Read, T> {
    records: csv::StringRecordsIntoIter<R>,
    parse: RowParser<T>,
}

impl<T> DelimitedReader<File, T> {
    /// Open a data file for streaming
    ///
    /// # Returns
    ///
    /// * `Ok(Some(reader))` if the file was opened
    /// * `Ok(None)` if the file does not exist yet (no rows written)
    /// * `Err(BankError::Storage)` for any other I/O failure
    pub fn open(path: &Path, parse: RowParser<T>) -> Result<Option<Self>, BankError> {
        match File::open(path) {
            Ok(file) => Ok(Some(Self::from_reader(file, parse))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BankError::storage(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

impl<R: Read, T> DelimitedReader<R, T> {
    pub fn from_reader(source: R, parse: RowParser<T>) -> Self {
        Self {
            records: record_format::reader_from(source).into_records(),
            parse,
        }
    }
}

impl<R: Read, T> Iterator for DelimitedReader<R, T> {
    type Item = Result<T, BankError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.next()? {
            Ok(record) => {
                let line = record.position().map(|pos| pos.line());
                Some((self.parse)(&record, line))
            }
            Err(e) => Some(Err(BankError::from(e))),
        }
    }
}

/// Read every row of a file, stopping at the first malformed one
///
/// A missing file reads as no rows.
pub fn read_all<T>(path: &Path, parse: RowParser<T>) -> Result<Vec<T>, BankError> {
    match DelimitedReader::open(path, parse)? {
        Some(reader) => reader.collect(),
        None => Ok(Vec::new()),
    }
}
