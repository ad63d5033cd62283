//! Account ledger storage
//!
//! Two implementations of [`LedgerStore`]:
//! - [`FileLedger`]: the production store, one `;`-delimited row per account.
//!   Reads go to the file on every call so no stale balance is ever served;
//!   updates rewrite the whole file through a temporary file and a rename.
//! - [`MemoryLedger`]: key-indexed store for tests and embedding.

use crate::core::traits::LedgerStore;
use crate::io::delimited_reader::{read_all, DelimitedReader};
use crate::io::record_format::{self, account_fields, account_id_of, parse_account};
use crate::types::{Account, AccountId, AccountKind, BankError, CustomerId};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keep at most one account per kind, in encounter order
///
/// Returns true once every kind is present.
fn collect_by_kind(found: &mut Vec<Account>, account: Account) -> bool {
    if !found.iter().any(|a| a.kind == account.kind) {
        found.push(account);
    }
    found.len() == AccountKind::ALL.len()
}

/// File-backed ledger
#[derive(Debug, Clone)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Create a ledger over the given file
    ///
    /// The file does not need to exist; it is created on the first insert.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLedger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw rows of the ledger, untouched
    fn raw_rows(&self) -> Result<Vec<StringRecord>, BankError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        record_format::reader_from(file)
            .into_records()
            .map(|row| row.map_err(BankError::from))
            .collect()
    }

    /// Replace the ledger contents with `rows`
    fn rewrite(&self, rows: &[StringRecord]) -> Result<(), BankError> {
        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        let written = write_rows(&temp_path, rows).and_then(|()| {
            fs::rename(&temp_path, &self.path).map_err(BankError::from)
        });
        if written.is_err() {
            // the ledger file is untouched at this point
            let _ = fs::remove_file(&temp_path);
        }
        written
    }
}

fn write_rows(path: &Path, rows: &[StringRecord]) -> Result<(), BankError> {
    let mut writer = record_format::writer_from(File::create(path)?);
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

impl LedgerStore for FileLedger {
    fn find_account(&self, account_id: AccountId) -> Result<Account, BankError> {
        if let Some(reader) = DelimitedReader::open(&self.path, parse_account)? {
            for result in reader {
                let account = result?;
                if account.id == account_id {
                    return Ok(account);
                }
            }
        }
        Err(BankError::account_not_found(account_id))
    }

    fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        overdraft_count: u32,
    ) -> Result<(), BankError> {
        let mut rows = self.raw_rows()?;
        let mut updated = false;

        for row in rows.iter_mut() {
            let line = row.position().map(|pos| pos.line());
            if updated || account_id_of(row, line)? != account_id {
                continue;
            }
            let account = parse_account(row, line)?.with_balance(balance, overdraft_count);
            *row = StringRecord::from(account_fields(&account).to_vec());
            updated = true;
        }

        if !updated {
            return Err(BankError::account_not_found(account_id));
        }

        self.rewrite(&rows)?;
        debug!(account = account_id, %balance, overdraft_count, "ledger row rewritten");
        Ok(())
    }

    fn list_accounts_for_customer(&self, customer: CustomerId) -> Result<Vec<Account>, BankError> {
        let mut found = Vec::new();
        if let Some(reader) = DelimitedReader::open(&self.path, parse_account)? {
            for result in reader {
                let account = result?;
                if account.owner == customer && collect_by_kind(&mut found, account) {
                    break;
                }
            }
        }
        Ok(found)
    }

    fn insert_account(&mut self, account: Account) -> Result<(), BankError> {
        match self.find_account(account.id) {
            Ok(_) => {
                return Err(BankError::invalid_argument(format!(
                    "account ID {} is already in use",
                    account.id
                )))
            }
            Err(BankError::AccountNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = record_format::writer_from(file);
        writer.write_record(account_fields(&account))?;
        writer.flush()?;
        Ok(())
    }

    fn accounts(&self) -> Result<Vec<Account>, BankError> {
        read_all(&self.path, parse_account)
    }
}

/// In-memory ledger keyed by account ID
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    accounts: BTreeMap<AccountId, Account>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger preloaded with accounts
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        MemoryLedger {
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
        }
    }
}

impl LedgerStore for MemoryLedger {
    fn find_account(&self, account_id: AccountId) -> Result<Account, BankError> {
        self.accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| BankError::account_not_found(account_id))
    }

    fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        overdraft_count: u32,
    ) -> Result<(), BankError> {
        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| BankError::account_not_found(account_id))?;
        account.balance = balance;
        account.overdraft_count = overdraft_count;
        Ok(())
    }

    fn list_accounts_for_customer(&self, customer: CustomerId) -> Result<Vec<Account>, BankError> {
        let mut found = Vec::new();
        for account in self.accounts.values().filter(|a| a.owner == customer) {
            if collect_by_kind(&mut found, account.clone()) {
                break;
            }
        }
        Ok(found)
    }

    fn insert_account(&mut self, account: Account) -> Result<(), BankError> {
        if self.accounts.contains_key(&account.id) {
            return Err(BankError::invalid_argument(format!(
                "account ID {} is already in use",
                account.id
            )));
        }
        self.accounts.insert(account.id, account);
        Ok(())
    }

    fn accounts(&self) -> Result<Vec<Account>, BankError> {
        Ok(self.accounts.values().cloned().collect())
    }

    fn last_account_id(&self) -> Result<Option<AccountId>, BankError> {
        Ok(self.accounts.keys().next_back().copied())
    }
}
