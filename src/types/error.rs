//! Error types for the bank engine
//!
//! This module defines all error types that can occur while operating on
//! accounts. Errors are designed to be descriptive and user-friendly for the
//! interactive menu, which prints them and prompts again.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: Account or customer not found
//! - **Authorization Errors**: Acting user has no rights over the account
//! - **Policy Errors**: Daily limit exceeded, insufficient funds, overdraft lock
//! - **Argument Errors**: Non-positive amounts, identical transfer accounts
//! - **Storage Errors**: Unreadable or unwritable data files, malformed rows

use super::account::{AccountId, CustomerId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the bank engine
///
/// Every variant except [`BankError::Storage`], [`BankError::Parse`] and
/// [`BankError::Config`] is recoverable at the interaction boundary: the
/// operation was rejected before any state changed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    /// No ledger record carries this account ID
    #[error("No bank account with account ID {account} was found")]
    AccountNotFound {
        /// The account that was looked up
        account: AccountId,
    },

    /// No registered user carries this customer ID
    #[error("User with CPR {customer} does not exist")]
    CustomerNotFound {
        /// The customer that was looked up
        customer: CustomerId,
    },

    /// The acting user has no rights over the target
    #[error("User {actor} is not authorized to {operation}")]
    Unauthorized {
        /// Acting user
        actor: CustomerId,
        /// What was attempted, e.g. "withdraw from account 100001"
        operation: String,
    },

    /// The movement would breach the card's daily cap
    #[error(
        "Daily {operation} limit of ${limit} exceeded for account {account}: ${used} used today, ${requested} requested"
    )]
    LimitExceeded {
        account: AccountId,
        /// Which cap, e.g. "deposit" or "transfer to other account"
        operation: String,
        limit: Decimal,
        /// Amount already moved today according to the history
        used: Decimal,
        requested: Decimal,
    },

    /// Transfer beyond the source balance (transfers never overdraw)
    #[error("Insufficient funds in account {account}: balance ${balance}, requested ${requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    /// Account reached the overdraft cap and no longer allows withdrawals
    #[error("Account {account} is locked after {overdraft_count} overdrafts. Deposit funds to unlock it")]
    OverdraftLocked {
        account: AccountId,
        overdraft_count: u32,
    },

    /// Malformed request (non-positive amount, same source and destination, ...)
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem
        message: String,
    },

    /// Arithmetic overflow would occur
    ///
    /// The operation is rejected to keep the balance representable.
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        operation: String,
        account: AccountId,
    },

    /// I/O error while reading or writing a data file
    ///
    /// Fatal for the current operation; surfaced to the operator.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the I/O error
        message: String,
    },

    /// A persisted row could not be parsed
    #[error("Record parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// Conversion from io::Error to BankError
impl From<std::io::Error> for BankError {
    fn from(error: std::io::Error) -> Self {
        BankError::Storage {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to BankError
impl From<csv::Error> for BankError {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            return BankError::Storage {
                message: error.to_string(),
            };
        }

        // Extract line number if available
        let line = error.position().map(|pos| pos.line());

        BankError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

impl From<config::ConfigError> for BankError {
    fn from(error: config::ConfigError) -> Self {
        BankError::Config {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl BankError {
    /// Whether the caller can simply re-prompt after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            BankError::Storage { .. } | BankError::Parse { .. } | BankError::Config { .. }
        )
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        BankError::AccountNotFound { account }
    }

    /// Create a CustomerNotFound error
    pub fn customer_not_found(customer: CustomerId) -> Self {
        BankError::CustomerNotFound { customer }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(actor: CustomerId, operation: impl Into<String>) -> Self {
        BankError::Unauthorized {
            actor,
            operation: operation.into(),
        }
    }

    /// Create a LimitExceeded error
    pub fn limit_exceeded(
        account: AccountId,
        operation: &str,
        limit: Decimal,
        used: Decimal,
        requested: Decimal,
    ) -> Self {
        BankError::LimitExceeded {
            account,
            operation: operation.to_string(),
            limit,
            used,
            requested,
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Decimal, requested: Decimal) -> Self {
        BankError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create an OverdraftLocked error
    pub fn overdraft_locked(account: AccountId, overdraft_count: u32) -> Self {
        BankError::OverdraftLocked {
            account,
            overdraft_count,
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        BankError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        BankError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a Parse error
    pub fn parse(line: Option<u64>, message: impl Into<String>) -> Self {
        BankError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        BankError::Storage {
            message: message.into(),
        }
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        BankError::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case::account_not_found(
        BankError::AccountNotFound { account: 100042 },
        "No bank account with account ID 100042 was found"
    )]
    #[case::customer_not_found(
        BankError::CustomerNotFound { customer: 12345678 },
        "User with CPR 12345678 does not exist"
    )]
    #[case::unauthorized(
        BankError::Unauthorized { actor: 11111111, operation: "withdraw from account 100001".to_string() },
        "User 11111111 is not authorized to withdraw from account 100001"
    )]
    #[case::limit_exceeded(
        BankError::LimitExceeded {
            account: 100001,
            operation: "deposit".to_string(),
            limit: Decimal::from(200_000),
            used: Decimal::from(150_000),
            requested: Decimal::from(150_000),
        },
        "Daily deposit limit of $200000 exceeded for account 100001: $150000 used today, $150000 requested"
    )]
    #[case::insufficient_funds(
        BankError::InsufficientFunds { account: 100001, balance: Decimal::new(5000, 2), requested: Decimal::new(10000, 2) },
        "Insufficient funds in account 100001: balance $50.00, requested $100.00"
    )]
    #[case::overdraft_locked(
        BankError::OverdraftLocked { account: 100003, overdraft_count: 2 },
        "Account 100003 is locked after 2 overdrafts. Deposit funds to unlock it"
    )]
    #[case::invalid_argument(
        BankError::InvalidArgument { message: "amount must be positive".to_string() },
        "Invalid argument: amount must be positive"
    )]
    #[case::storage(
        BankError::Storage { message: "Permission denied".to_string() },
        "Storage error: Permission denied"
    )]
    #[case::parse_with_line(
        BankError::Parse { line: Some(42), message: "invalid balance".to_string() },
        "Record parse error at line 42: invalid balance"
    )]
    #[case::parse_without_line(
        BankError::Parse { line: None, message: "invalid balance".to_string() },
        "Record parse error: invalid balance"
    )]
    fn test_error_display(#[case] error: BankError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::not_found(BankError::account_not_found(1), true)]
    #[case::unauthorized(BankError::unauthorized(1, "deposit into account 2"), true)]
    #[case::locked(BankError::overdraft_locked(1, 2), true)]
    #[case::invalid(BankError::invalid_argument("x"), true)]
    #[case::storage(BankError::storage("disk unavailable"), false)]
    #[case::parse(BankError::parse(Some(3), "bad row"), false)]
    #[case::config(BankError::config("bad fee"), false)]
    fn test_is_recoverable(#[case] error: BankError, #[case] expected: bool) {
        assert_eq!(error.is_recoverable(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let bank_error: BankError = io_error.into();

        match bank_error {
            BankError::Storage { message } => assert!(message.contains("Access denied")),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_errors_are_cloneable() {
        let error = BankError::insufficient_funds(100001, Decimal::ZERO, Decimal::ONE);
        assert_eq!(error.clone(), error);
    }
}
