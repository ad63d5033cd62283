//! Engine configuration
//!
//! Settings come from built-in defaults, overridden by an optional TOML file,
//! overridden again by `BANK__`-prefixed environment variables
//! (`BANK__DATA_DIR`, `BANK__OVERDRAFT__FEE`, ...).

use crate::core::overdraft::OverdraftPolicy;
use crate::types::{AccountId, BankError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the data files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File names inside `data_dir`
    #[serde(default)]
    pub files: DataFiles,

    #[serde(default)]
    pub overdraft: OverdraftPolicy,

    /// Offset account IDs are issued from; the first account is `base + 1`
    #[serde(default = "default_account_id_base")]
    pub account_id_base: AccountId,
}

/// Data file names
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub accounts: String,
    pub history: String,
    pub journal: String,
    pub users: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        DataFiles {
            accounts: "accounts.txt".to_string(),
            history: "transaction_history.txt".to_string(),
            journal: "transfer_journal.txt".to_string(),
            users: "users.txt".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_account_id_base() -> AccountId {
    100_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            data_dir: default_data_dir(),
            files: DataFiles::default(),
            overdraft: OverdraftPolicy::default(),
            account_id_base: default_account_id_base(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from an optional TOML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Config` if a source cannot be read or a value is
    /// out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, BankError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix("BANK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EngineConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, without consulting the environment
    pub fn from_toml(text: &str) -> Result<Self, BankError> {
        let config: EngineConfig = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BankError> {
        if self.overdraft.fee < Decimal::ZERO {
            return Err(BankError::config("overdraft.fee must not be negative"));
        }
        if self.overdraft.withdrawal_ceiling < Decimal::ZERO {
            return Err(BankError::config(
                "overdraft.withdrawal_ceiling must not be negative",
            ));
        }
        if self.overdraft.lock_threshold == 0 {
            return Err(BankError::config(
                "overdraft.lock_threshold must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.accounts)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.history)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.journal)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.overdraft.fee, Decimal::from(35));
        assert_eq!(config.overdraft.withdrawal_ceiling, Decimal::from(100));
        assert_eq!(config.overdraft.lock_threshold, 2);
        assert_eq!(config.accounts_path(), PathBuf::from("data/accounts.txt"));
    }

    #[test]
    fn test_partial_overrides_keep_other_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            data_dir = "/var/lib/bank"

            [overdraft]
            fee = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/bank"));
        assert_eq!(config.overdraft.fee, Decimal::from(50));
        assert_eq!(config.overdraft.withdrawal_ceiling, Decimal::from(100));
        assert_eq!(
            config.history_path(),
            PathBuf::from("/var/lib/bank/transaction_history.txt")
        );
    }

    #[rstest]
    #[case::negative_fee("[overdraft]\nfee = -1", "overdraft.fee")]
    #[case::negative_ceiling("[overdraft]\nwithdrawal_ceiling = -5", "withdrawal_ceiling")]
    #[case::zero_threshold("[overdraft]\nlock_threshold = 0", "lock_threshold")]
    fn test_validation_rejects(#[case] text: &str, #[case] expected: &str) {
        match EngineConfig::from_toml(text).unwrap_err() {
            BankError::Config { message } => assert!(message.contains(expected), "{}", message),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.toml");
        std::fs::write(&path, "account_id_base = 200000\n").unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.account_id_base, 200_000);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
