//! Rendering of engine results for the terminal
//!
//! Listings are written as comma-separated tables with a header row, so
//! one-shot command output can be piped into other tools. Single results
//! render as one human-readable line.

use crate::core::engine::{AuditReport, TransferReceipt, WithdrawalReceipt};
use crate::core::overdraft::OverdraftState;
use crate::io::record_format::format_timestamp;
use crate::types::{Account, BankError, TransactionRecord};
use csv::Writer;
use rust_decimal::Decimal;
use std::io::Write;

/// Write accounts as CSV, sorted by account ID
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), BankError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "account",
        "customer",
        "type",
        "card",
        "card_type",
        "balance",
        "overdrafts",
    ])?;

    let mut sorted = accounts.to_vec();
    sorted.sort_by_key(|account| account.id);

    for account in sorted {
        writer.write_record(&[
            account.id.to_string(),
            account.owner.to_string(),
            account.kind.to_string(),
            account.card_id.to_string(),
            account.card_tier.to_string(),
            format!("{:.2}", account.balance),
            account.overdraft_count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write history records as CSV, in the order given
pub fn write_history_csv(records: &[TransactionRecord], output: &mut dyn Write) -> Result<(), BankError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["timestamp", "account", "type", "amount", "counterparty", "by"])?;

    for record in records {
        writer.write_record(&[
            format_timestamp(&record.timestamp),
            record.account.to_string(),
            record.kind.to_string(),
            format!("{:.2}", record.amount),
            record
                .counterparty
                .map(|c| c.account.to_string())
                .unwrap_or_default(),
            record.actor.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write audit reports as CSV
pub fn write_audit_csv(reports: &[AuditReport], output: &mut dyn Write) -> Result<(), BankError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "account",
        "ledger_balance",
        "replayed_balance",
        "ledger_overdrafts",
        "replayed_overdrafts",
        "records",
        "consistent",
    ])?;

    for report in reports {
        writer.write_record(&[
            report.account.to_string(),
            format!("{:.2}", report.ledger_balance),
            format!("{:.2}", report.replayed_balance),
            report.ledger_overdraft_count.to_string(),
            report.replayed_overdraft_count.to_string(),
            report.records.to_string(),
            report.is_consistent().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn describe_account(account: &Account) -> String {
    format!(
        "Account {} ({}, {} card {}): balance ${:.2}, overdrafts {}",
        account.id,
        account.kind,
        account.card_tier,
        account.card_id,
        account.balance,
        account.overdraft_count
    )
}

pub fn describe_record(record: &TransactionRecord) -> String {
    let mut line = format!(
        "{}  {:<8}  {:>12.2}",
        format_timestamp(&record.timestamp),
        record.kind.as_str(),
        record.amount
    );
    if let Some(counterparty) = record.counterparty {
        let direction = if record.is_debit() { "to" } else { "from" };
        line.push_str(&format!("  {} account {}", direction, counterparty.account));
    }
    line
}

pub fn deposit_message(account: &Account, amount: Decimal) -> String {
    format!(
        "Deposited ${:.2} into account {}. New balance: ${:.2}",
        amount, account.id, account.balance
    )
}

pub fn withdrawal_message(receipt: &WithdrawalReceipt) -> String {
    let mut message = format!(
        "Withdrew ${:.2} from account {}. New balance: ${:.2}",
        receipt.debited, receipt.account.id, receipt.account.balance
    );
    if receipt.fee > Decimal::ZERO {
        message.push_str(&format!(
            "\nAccount overdrawn: ${:.2} overdraft fee charged (overdraft {})",
            receipt.fee, receipt.account.overdraft_count
        ));
    }
    if receipt.state == OverdraftState::Locked {
        message.push_str(
            "\nWithdrawals are locked until a deposit brings the balance back to zero or above",
        );
    }
    message
}

pub fn transfer_message(receipt: &TransferReceipt, amount: Decimal) -> String {
    format!(
        "Transferred ${:.2} from account {} to account {}. New balance: ${:.2}",
        amount, receipt.source.id, receipt.destination.id, receipt.source.balance
    )
}

pub fn opened_message(account: &Account) -> String {
    format!(
        "Opened {} account {} for customer {} with {} card {}",
        account.kind, account.id, account.owner, account.card_tier, account.card_id
    )
}
