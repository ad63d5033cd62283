use crate::types::{AccountId, AccountKind, Actor, CardTier, CustomerId, KindFilter, Role};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Operate branch bank accounts: deposits, withdrawals, transfers
#[derive(Parser, Debug)]
#[command(name = "bank-engine")]
#[command(about = "Operate branch bank accounts: deposits, withdrawals, transfers", long_about = None)]
pub struct CliArgs {
    /// Optional TOML configuration file
    #[arg(long = "config", value_name = "FILE", help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Directory holding the data files, overrides the configuration
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        help = "Directory holding accounts.txt, transaction_history.txt and users.txt"
    )]
    pub data_dir: Option<PathBuf>,

    /// Customer ID (CPR) of the acting user
    #[arg(long = "actor", value_name = "ID", help = "CPR number of the acting user")]
    pub actor: CustomerId,

    /// Role the acting user signs in with
    #[arg(
        long = "role",
        value_name = "ROLE",
        default_value = "customer",
        help = "Role of the acting user: 'customer' or 'banker'"
    )]
    pub role: Role,

    /// Command to run; the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One-shot commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Deposit into an account
    Deposit { account: AccountId, amount: Decimal },

    /// Withdraw from an account
    Withdraw { account: AccountId, amount: Decimal },

    /// Transfer between two accounts
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    },

    /// List accounts (all accounts for bankers unless --customer is given)
    Accounts {
        #[arg(long = "customer", value_name = "ID")]
        customer: Option<CustomerId>,
    },

    /// Show the transaction history of an account
    History {
        account: AccountId,
        #[arg(long = "kind", value_name = "KIND", default_value = "all")]
        kind: KindFilter,
    },

    /// Open a new account with a debit card
    Open {
        customer: CustomerId,
        kind: AccountKind,
        tier: CardTier,
    },

    /// Compare ledger balances with the transaction history
    Audit,

    /// Interactive menu
    Menu,
}

impl CliArgs {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.actor,
            role: self.role,
        }
    }

    /// The command to run, defaulting to the interactive menu
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Menu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use rstest::rstest;

    #[rstest]
    #[case::default_role(&["program", "--actor", "11111111"], Role::Customer)]
    #[case::banker(&["program", "--actor", "99999999", "--role", "banker"], Role::Banker)]
    fn test_actor_parsing(#[case] args: &[&str], #[case] expected: Role) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.actor().role, expected);
        assert_eq!(parsed.command(), Command::Menu);
    }

    #[rstest]
    #[case::deposit(
        &["program", "--actor", "1", "deposit", "100001", "100.50"],
        Command::Deposit { account: 100001, amount: Decimal::new(10050, 2) }
    )]
    #[case::withdraw(
        &["program", "--actor", "1", "withdraw", "100001", "150"],
        Command::Withdraw { account: 100001, amount: Decimal::from(150) }
    )]
    #[case::transfer(
        &["program", "--actor", "1", "transfer", "100001", "100002", "40"],
        Command::Transfer { from: 100001, to: 100002, amount: Decimal::from(40) }
    )]
    #[case::accounts(
        &["program", "--actor", "1", "accounts", "--customer", "22222222"],
        Command::Accounts { customer: Some(22222222) }
    )]
    #[case::history_default_kind(
        &["program", "--actor", "1", "history", "100001"],
        Command::History { account: 100001, kind: KindFilter::All }
    )]
    #[case::history_kind(
        &["program", "--actor", "1", "history", "100001", "--kind", "withdraw"],
        Command::History { account: 100001, kind: KindFilter::Only(TransactionKind::Withdraw) }
    )]
    #[case::open(
        &["program", "--actor", "1", "--role", "banker", "open", "22222222", "savings", "platinum"],
        Command::Open { customer: 22222222, kind: AccountKind::Savings, tier: CardTier::Platinum }
    )]
    #[case::audit(&["program", "--actor", "1", "audit"], Command::Audit)]
    fn test_command_parsing(#[case] args: &[&str], #[case] expected: Command) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.command(), expected);
    }

    #[test]
    fn test_global_options() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--config",
            "bank.toml",
            "--data-dir",
            "/tmp/bank",
            "--actor",
            "1",
            "audit",
        ])
        .unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("bank.toml")));
        assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/bank")));
    }

    // Error handling tests
    #[rstest]
    #[case::missing_actor(&["program"])]
    #[case::invalid_role(&["program", "--actor", "1", "--role", "teller"])]
    #[case::invalid_amount(&["program", "--actor", "1", "deposit", "100001", "lots"])]
    #[case::invalid_kind(&["program", "--actor", "1", "history", "100001", "--kind", "refund"])]
    #[case::invalid_tier(&["program", "--actor", "1", "open", "1", "checking", "gold"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
