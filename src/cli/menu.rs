//! Interactive menu
//!
//! A numbered menu over any line-oriented input and output, so the same loop
//! serves a terminal and tests. Each action prompts for its arguments and
//! runs one engine operation. A rejected operation prints the error and
//! prompts again; a blank answer cancels back to the menu. Storage failures
//! end the action but not the menu.

use crate::cli::output::{
    deposit_message, describe_account, describe_record, transfer_message, withdrawal_message,
};
use crate::core::engine::TransactionEngine;
use crate::core::traits::{HistoryStore, LedgerStore};
use crate::types::{AccountId, BankError, KindFilter, Role};
use rust_decimal::Decimal;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

const OPTIONS: [&str; 6] = [
    "Deposit",
    "Withdraw",
    "Transfer",
    "View accounts",
    "Transaction history",
    "Quit",
];

/// Menu loop state over an input and an output stream
pub struct Menu<R: BufRead, W: Write> {
    input: R,
    output: W,
    eof: bool,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Menu {
            input,
            output,
            eof: false,
        }
    }

    /// Give back the output stream, e.g. to inspect what was written
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user quits or the input ends
    pub fn run<L: LedgerStore, H: HistoryStore>(&mut self, engine: &mut TransactionEngine<L, H>) -> io::Result<()> {
        let actor = engine.actor();
        writeln!(self.output, "Welcome, {} {}", actor.role, actor.id)?;

        while !self.eof {
            self.print_options()?;
            let Some(choice) = self.read_line()? else {
                break;
            };

            match choice.as_str() {
                "1" => self.deposit(engine)?,
                "2" => self.withdraw(engine)?,
                "3" => self.transfer(engine)?,
                "4" => self.view_accounts(engine)?,
                "5" => self.history(engine)?,
                "6" | "q" | "quit" => break,
                "" => {}
                other => writeln!(self.output, "Unknown option '{}'", other)?,
            }
        }

        writeln!(self.output, "Goodbye")?;
        self.output.flush()
    }

    fn print_options(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        for (index, option) in OPTIONS.iter().enumerate() {
            writeln!(self.output, "{}) {}", index + 1, option)?;
        }
        write!(self.output, "Choose an option: ")?;
        self.output.flush()
    }

    /// Next trimmed input line, `None` once the input is exhausted
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.eof = true;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt until the answer parses; `None` if the user cancels
    fn ask<T>(&mut self, label: &str) -> io::Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        loop {
            write!(self.output, "{}: ", label)?;
            self.output.flush()?;

            let Some(answer) = self.read_line()? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "Invalid input: {}. Leave blank to cancel.", e)?,
            }
        }
    }

    /// Repeat an action while it fails with a recoverable error
    ///
    /// `step` returns `None` when the user cancelled.
    fn retry<F>(&mut self, mut step: F) -> io::Result<()>
    where
        F: FnMut(&mut Self) -> io::Result<Option<Result<String, BankError>>>,
    {
        loop {
            match step(self)? {
                None => return Ok(()),
                Some(Ok(message)) => {
                    writeln!(self.output, "{}", message)?;
                    return Ok(());
                }
                Some(Err(e)) => {
                    writeln!(self.output, "Error: {}", e)?;
                    if !e.is_recoverable() || self.eof {
                        return Ok(());
                    }
                    writeln!(self.output, "Please try again, or leave blank to cancel.")?;
                }
            }
        }
    }

    fn deposit<L: LedgerStore, H: HistoryStore>(&mut self, engine: &mut TransactionEngine<L, H>) -> io::Result<()> {
        self.retry(|menu| {
            let Some(account) = menu.ask::<AccountId>("Account ID")? else {
                return Ok(None);
            };
            let Some(amount) = menu.ask::<Decimal>("Amount to deposit")? else {
                return Ok(None);
            };
            Ok(Some(
                engine
                    .deposit(account, amount)
                    .map(|account| deposit_message(&account, amount)),
            ))
        })
    }

    fn withdraw<L: LedgerStore, H: HistoryStore>(&mut self, engine: &mut TransactionEngine<L, H>) -> io::Result<()> {
        self.retry(|menu| {
            let Some(account) = menu.ask::<AccountId>("Account ID")? else {
                return Ok(None);
            };
            let Some(amount) = menu.ask::<Decimal>("Amount to withdraw")? else {
                return Ok(None);
            };
            Ok(Some(
                engine
                    .withdraw(account, amount)
                    .map(|receipt| withdrawal_message(&receipt)),
            ))
        })
    }

    fn transfer<L: LedgerStore, H: HistoryStore>(&mut self, engine: &mut TransactionEngine<L, H>) -> io::Result<()> {
        self.retry(|menu| {
            let Some(from) = menu.ask::<AccountId>("From account ID")? else {
                return Ok(None);
            };
            let Some(to) = menu.ask::<AccountId>("To account ID")? else {
                return Ok(None);
            };
            let Some(amount) = menu.ask::<Decimal>("Amount to transfer")? else {
                return Ok(None);
            };
            Ok(Some(
                engine
                    .transfer(from, to, amount)
                    .map(|receipt| transfer_message(&receipt, amount)),
            ))
        })
    }

    fn view_accounts<L: LedgerStore, H: HistoryStore>(&mut self, engine: &TransactionEngine<L, H>) -> io::Result<()> {
        let actor = engine.actor();
        let accounts = match actor.role {
            Role::Banker => engine.all_accounts(),
            Role::Customer => engine.accounts_for(actor.id),
        };

        match accounts {
            Ok(accounts) if accounts.is_empty() => writeln!(self.output, "No accounts found"),
            Ok(accounts) => {
                for account in &accounts {
                    writeln!(self.output, "{}", describe_account(account))?;
                }
                Ok(())
            }
            Err(e) => writeln!(self.output, "Error: {}", e),
        }
    }

    fn history<L: LedgerStore, H: HistoryStore>(&mut self, engine: &TransactionEngine<L, H>) -> io::Result<()> {
        self.retry(|menu| {
            let Some(account) = menu.ask::<AccountId>("Account ID")? else {
                return Ok(None);
            };
            let Some(filter) =
                menu.ask::<KindFilter>("Transaction type (deposit, withdraw, transfer, all)")?
            else {
                return Ok(None);
            };

            Ok(Some(engine.history(account, filter).map(|records| {
                if records.is_empty() {
                    return format!("No {} transactions for account {}", filter, account);
                }
                records
                    .iter()
                    .map(describe_record)
                    .collect::<Vec<_>>()
                    .join("\n")
            })))
        })
    }
}
