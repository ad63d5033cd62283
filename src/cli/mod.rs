// CLI module
// Argument parsing, one-shot command dispatch and the interactive menu

mod args;
pub mod menu;
pub mod output;

pub use args::{CliArgs, Command};
pub use menu::Menu;

use crate::core::engine::TransactionEngine;
use crate::core::traits::{HistoryStore, LedgerStore};
use crate::types::{BankError, Role};
use clap::Parser;
use std::io::Write;

/// Parse command-line arguments using clap
///
/// If parsing fails (invalid arguments, missing `--actor`, or `--help`),
/// clap prints an error or the help text and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Run one non-interactive command, writing its result to `out`
///
/// Listings are written as CSV; single operations as one line of text.
/// `Command::Menu` is handled by the caller and is rejected here.
pub fn run_command<L: LedgerStore, H: HistoryStore>(
    engine: &mut TransactionEngine<L, H>,
    command: Command,
    out: &mut dyn Write,
) -> Result<(), BankError> {
    let actor = engine.actor();

    match command {
        Command::Deposit { account, amount } => {
            let account = engine.deposit(account, amount)?;
            writeln!(out, "{}", output::deposit_message(&account, amount))?;
        }
        Command::Withdraw { account, amount } => {
            let receipt = engine.withdraw(account, amount)?;
            writeln!(out, "{}", output::withdrawal_message(&receipt))?;
        }
        Command::Transfer { from, to, amount } => {
            let receipt = engine.transfer(from, to, amount)?;
            writeln!(out, "{}", output::transfer_message(&receipt, amount))?;
        }
        Command::Accounts { customer } => {
            let accounts = match (customer, actor.role) {
                (Some(customer), _) => engine.accounts_for(customer)?,
                (None, Role::Banker) => engine.all_accounts()?,
                (None, Role::Customer) => engine.accounts_for(actor.id)?,
            };
            output::write_accounts_csv(&accounts, out)?;
        }
        Command::History { account, kind } => {
            let records = engine.history(account, kind)?;
            output::write_history_csv(&records, out)?;
        }
        Command::Open {
            customer,
            kind,
            tier,
        } => {
            let account = engine.open_account(customer, kind, tier)?;
            writeln!(out, "{}", output::opened_message(&account))?;
        }
        Command::Audit => {
            let reports = match actor.role {
                Role::Banker => engine.audit_all()?,
                Role::Customer => engine
                    .accounts_for(actor.id)?
                    .iter()
                    .map(|account| engine.audit(account.id))
                    .collect::<Result<Vec<_>, _>>()?,
            };
            output::write_audit_csv(&reports, out)?;
        }
        Command::Menu => {
            return Err(BankError::invalid_argument(
                "the interactive menu cannot run as a one-shot command",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history_store::MemoryHistory;
    use crate::core::identity::UserDirectory;
    use crate::core::ledger_store::MemoryLedger;
    use crate::types::{Account, AccountKind, Actor, CardTier, KindFilter};
    use rust_decimal::Decimal;

    fn engine(actor: Actor) -> TransactionEngine<MemoryLedger, MemoryHistory> {
        let identity = UserDirectory::new(
            actor,
            [
                (11111111, Role::Customer),
                (22222222, Role::Customer),
                (99999999, Role::Banker),
            ],
        )
        .unwrap();
        let ledger = MemoryLedger::with_accounts([
            Account::new(100001, 11111111, AccountKind::Checking, 510000001, CardTier::Standard),
            Account::new(100002, 22222222, AccountKind::Checking, 510000002, CardTier::Standard),
        ]);
        TransactionEngine::new(ledger, MemoryHistory::new(), identity)
    }

    fn run(engine: &mut TransactionEngine<MemoryLedger, MemoryHistory>, command: Command) -> Result<String, BankError> {
        let mut out = Vec::new();
        run_command(engine, command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_customer_lists_own_accounts() {
        let mut engine = engine(Actor::customer(11111111));
        let text = run(&mut engine, Command::Accounts { customer: None }).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("100001,11111111,checking"));
    }

    #[test]
    fn test_banker_lists_all_accounts() {
        let mut engine = engine(Actor::banker(99999999));
        let text = run(&mut engine, Command::Accounts { customer: None }).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_deposit_then_history() {
        let mut engine = engine(Actor::customer(11111111));
        let text = run(
            &mut engine,
            Command::Deposit {
                account: 100001,
                amount: Decimal::from(40),
            },
        )
        .unwrap();
        assert!(text.contains("New balance: $40.00"));

        let history = run(
            &mut engine,
            Command::History {
                account: 100001,
                kind: KindFilter::All,
            },
        )
        .unwrap();
        let lines: Vec<_> = history.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(",100001,deposit,40.00,,11111111"));
    }

    #[test]
    fn test_customer_cannot_list_other_customer() {
        let mut engine = engine(Actor::customer(11111111));
        let err = run(
            &mut engine,
            Command::Accounts {
                customer: Some(22222222),
            },
        )
        .unwrap_err();
        assert!(matches!(err, BankError::Unauthorized { .. }));
    }

    #[test]
    fn test_customer_audit_covers_own_accounts() {
        let mut engine = engine(Actor::customer(11111111));
        let text = run(&mut engine, Command::Audit).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("100001,0.00,0.00,0,0,0,true"));
    }

    #[test]
    fn test_menu_is_not_a_one_shot_command() {
        let mut engine = engine(Actor::customer(11111111));
        assert!(run(&mut engine, Command::Menu).is_err());
    }
}
