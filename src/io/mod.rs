//! I/O module
//!
//! Handles the `;`-delimited data files.
//!
//! # Components
//!
//! - `record_format` - Row layouts (parsing and rendering of ledger, history, journal and user rows)
//! - `delimited_reader` - Streaming reader with iterator interface

pub mod delimited_reader;
pub mod record_format;

pub use delimited_reader::{read_all, DelimitedReader, RowParser};
