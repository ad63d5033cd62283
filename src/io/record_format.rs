//! Delimited record format for the bank's data files
//!
//! This module centralizes all row format concerns, providing:
//! - Conversion from raw `;`-delimited rows to domain types
//! - Conversion from domain types back to row fields
//! - Shared reader/writer builders so every file uses the same dialect
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Row layouts
//!
//! | File                | Fields                                                                  |
//! |---------------------|-------------------------------------------------------------------------|
//! | ledger              | `accountId;customerId;accountType;cardId;cardType;balance;overdraftCount` |
//! | transaction history | `customerId;accountId;timestamp;kind;amount;counterparty;isOwnAccount`    |
//! | transfer journal    | `state;sequence;from;to;amount;timestamp`                                |
//! | users               | `customerId;firstName;lastName;role;...`                                  |

use crate::core::journal::{JournalEntry, JournalState, TransferIntent};
use crate::types::{
    Account, AccountId, AccountKind, BankError, CardTier, Counterparty, CustomerId, Role,
    TransactionKind, TransactionRecord,
};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use rust_decimal::Decimal;
use std::io::{Read, Write};
use std::str::FromStr;

/// Field delimiter shared by every data file
pub const DELIMITER: u8 = b';';

const DEBIT_LEG: &str = "debit";
const CREDIT_LEG: &str = "credit";

/// Timestamp layout written to the history and journal files
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Older rows omit the seconds when they are zero
const SHORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Reader configured for the headerless `;` dialect
///
/// Rows are flexible so legacy ledger rows with five fields still parse.
pub fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .buffer_capacity(8 * 1024);
    builder
}

/// Create a csv reader over any byte source using the data file dialect
pub fn reader_from<R: Read>(source: R) -> csv::Reader<R> {
    reader_builder().from_reader(source)
}

/// Create a csv writer over any byte sink using the data file dialect
pub fn writer_from<W: Write>(sink: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(sink)
}

fn field<'r>(record: &'r StringRecord, index: usize, name: &str, line: Option<u64>) -> Result<&'r str, BankError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| BankError::parse(line, format!("missing {} field", name)))
}

fn parse_number<T: FromStr>(value: &str, name: &str, line: Option<u64>) -> Result<T, BankError> {
    value
        .parse::<T>()
        .map_err(|_| BankError::parse(line, format!("invalid {} '{}'", name, value)))
}

/// Parse a monetary amount
///
/// Accepts plain decimals (`-85`, `100.0`) and the exponent notation found
/// in rows written by older tooling (`1.5E7`).
pub fn parse_decimal(value: &str) -> Result<Decimal, BankError> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|e| {
            if value.contains(['e', 'E']) {
                Decimal::from_scientific(value)
            } else {
                Err(e)
            }
        })
        .map_err(|_| BankError::invalid_argument(format!("invalid amount '{}'", value)))
}

/// Parse a local timestamp, with or without seconds
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, BankError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, SHORT_TIMESTAMP_FORMAT))
        .map_err(|_| BankError::invalid_argument(format!("invalid timestamp '{}'", value)))
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn with_line(error: BankError, line: Option<u64>) -> BankError {
    match error {
        BankError::InvalidArgument { message } => BankError::Parse { line, message },
        other => other,
    }
}

/// Convert a ledger row to an Account
///
/// Rows written before balances were persisted carry only five fields; they
/// read as a zero balance with no overdrafts.
pub fn parse_account(record: &StringRecord, line: Option<u64>) -> Result<Account, BankError> {
    let id: AccountId = parse_number(field(record, 0, "account ID", line)?, "account ID", line)?;
    let owner: CustomerId = parse_number(field(record, 1, "customer ID", line)?, "customer ID", line)?;
    let kind = AccountKind::from_str(field(record, 2, "account type", line)?)
        .map_err(|e| with_line(e, line))?;
    let card_id = parse_number(field(record, 3, "card ID", line)?, "card ID", line)?;
    let card_tier = CardTier::from_str(field(record, 4, "card type", line)?)
        .map_err(|e| with_line(e, line))?;

    let balance = match record.get(5).map(str::trim) {
        Some(value) if !value.is_empty() => parse_decimal(value).map_err(|e| with_line(e, line))?,
        _ => Decimal::ZERO,
    };
    let overdraft_count = match record.get(6).map(str::trim) {
        Some(value) if !value.is_empty() => parse_number(value, "overdraft count", line)?,
        _ => 0,
    };

    Ok(Account {
        id,
        owner,
        kind,
        card_id,
        card_tier,
        balance,
        overdraft_count,
    })
}

/// Ledger row fields for an Account
pub fn account_fields(account: &Account) -> [String; 7] {
    [
        account.id.to_string(),
        account.owner.to_string(),
        account.kind.to_string(),
        account.card_id.to_string(),
        account.card_tier.to_string(),
        account.balance.to_string(),
        account.overdraft_count.to_string(),
    ]
}

/// Account ID of a ledger row without parsing the rest of it
pub fn account_id_of(record: &StringRecord, line: Option<u64>) -> Result<AccountId, BankError> {
    parse_number(field(record, 0, "account ID", line)?, "account ID", line)
}

/// Convert a history row to a TransactionRecord
///
/// A counterparty of `0` marks a non-transfer row. Transfer rows carry an
/// eighth `debit` / `credit` leg column. Transfer rows without it come from
/// the older one-row layout, written on the source account only, and read as
/// the debit leg.
pub fn parse_transaction(record: &StringRecord, line: Option<u64>) -> Result<TransactionRecord, BankError> {
    let actor = parse_number(field(record, 0, "customer ID", line)?, "customer ID", line)?;
    let account = parse_number(field(record, 1, "account ID", line)?, "account ID", line)?;
    let timestamp = parse_timestamp(field(record, 2, "timestamp", line)?).map_err(|e| with_line(e, line))?;
    let kind = TransactionKind::from_str(field(record, 3, "transaction type", line)?)
        .map_err(|e| with_line(e, line))?;
    let amount = parse_decimal(field(record, 4, "amount", line)?).map_err(|e| with_line(e, line))?;

    let counterparty_id: AccountId = match record.get(5).map(str::trim) {
        Some(value) if !value.is_empty() => parse_number(value, "counterparty account ID", line)?,
        _ => 0,
    };
    let own_account = match record.get(6).map(str::trim) {
        Some(value) if !value.is_empty() => parse_number::<bool>(&value.to_lowercase(), "own account flag", line)?,
        _ => false,
    };

    let counterparty = (kind == TransactionKind::Transfer && counterparty_id != 0).then_some(Counterparty {
        account: counterparty_id,
        own_account,
    });

    let amount = if kind == TransactionKind::Transfer {
        match record.get(7).map(str::trim) {
            Some(DEBIT_LEG) | Some("") | None => -amount.abs(),
            Some(CREDIT_LEG) => amount.abs(),
            Some(other) => {
                return Err(BankError::parse(line, format!("invalid transfer leg '{}'", other)));
            }
        }
    } else {
        amount
    };

    Ok(TransactionRecord {
        actor,
        account,
        timestamp,
        kind,
        amount,
        counterparty,
    })
}

/// History row fields for a TransactionRecord
///
/// Transfer legs get the extra leg column; other rows keep seven fields.
pub fn transaction_fields(record: &TransactionRecord) -> Vec<String> {
    let (counterparty, own_account) = match record.counterparty {
        Some(c) => (c.account, c.own_account),
        None => (0, false),
    };
    let mut fields = vec![
        record.actor.to_string(),
        record.account.to_string(),
        format_timestamp(&record.timestamp),
        record.kind.to_string(),
        record.amount.to_string(),
        counterparty.to_string(),
        own_account.to_string(),
    ];
    if record.kind == TransactionKind::Transfer {
        let leg = if record.is_debit() { DEBIT_LEG } else { CREDIT_LEG };
        fields.push(leg.to_string());
    }
    fields
}

/// Convert a journal row to a JournalEntry
pub fn parse_journal_entry(record: &StringRecord, line: Option<u64>) -> Result<JournalEntry, BankError> {
    let state = match field(record, 0, "journal state", line)? {
        "begin" => JournalState::Begin,
        "commit" => JournalState::Commit,
        other => {
            return Err(BankError::parse(
                line,
                format!("journal state must be begin or commit, got '{}'", other),
            ))
        }
    };
    let sequence = parse_number(field(record, 1, "sequence", line)?, "sequence", line)?;
    let from = parse_number(field(record, 2, "source account ID", line)?, "source account ID", line)?;
    let to = parse_number(field(record, 3, "destination account ID", line)?, "destination account ID", line)?;
    let amount = parse_decimal(field(record, 4, "amount", line)?).map_err(|e| with_line(e, line))?;
    let timestamp = parse_timestamp(field(record, 5, "timestamp", line)?).map_err(|e| with_line(e, line))?;

    Ok(JournalEntry {
        state,
        intent: TransferIntent {
            sequence,
            from,
            to,
            amount,
            timestamp,
        },
    })
}

/// Journal row fields for a JournalEntry
pub fn journal_fields(entry: &JournalEntry) -> [String; 6] {
    let state = match entry.state {
        JournalState::Begin => "begin",
        JournalState::Commit => "commit",
    };
    [
        state.to_string(),
        entry.intent.sequence.to_string(),
        entry.intent.from.to_string(),
        entry.intent.to.to_string(),
        entry.intent.amount.to_string(),
        format_timestamp(&entry.intent.timestamp),
    ]
}

/// Customer ID and role of a users row; name and password fields are ignored
pub fn parse_user(record: &StringRecord, line: Option<u64>) -> Result<(CustomerId, Role), BankError> {
    let customer = parse_number(field(record, 0, "customer ID", line)?, "customer ID", line)?;
    let role = Role::from_str(field(record, 3, "role", line)?).map_err(|e| with_line(e, line))?;
    Ok((customer, role))
}
