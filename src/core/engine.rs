//! Transaction engine
//!
//! This module provides the TransactionEngine that orchestrates money
//! movements by coordinating the LedgerStore, the HistoryStore and the
//! TransferJournal.
//!
//! Every movement follows the same shape: **authorize, limit-check,
//! balance-mutate, record**. Validation and authorization failures never
//! touch storage. The engine never caches a balance across operations; each
//! operation re-reads the account from the ledger before mutating it.
//!
//! The engine enforces business rules such as:
//! - Customers may only operate their own accounts (bankers are exempt)
//! - Per-card daily caps, computed by replaying today's history
//! - The overdraft policy on withdrawals
//! - Transfers never overdraw the source

use crate::config::EngineConfig;
use crate::core::clock::SystemClock;
use crate::core::history_store::FileHistory;
use crate::core::identity::UserDirectory;
use crate::core::issuance::{next_account_id, next_card_id};
use crate::core::journal::{TransferIntent, TransferJournal};
use crate::core::ledger_store::FileLedger;
use crate::core::overdraft::{BalanceState, OverdraftPolicy, OverdraftState};
use crate::core::traits::{Clock, HistoryStore, IdentityProvider, LedgerStore};
use crate::types::{
    Account, AccountId, AccountKind, Actor, BankError, CardTier, CustomerId, KindFilter, Role,
    TransactionKind, TransactionRecord,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use tracing::{debug, error, info, warn};

/// Outcome of a successful withdrawal
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalReceipt {
    /// Account after the withdrawal
    pub account: Account,
    pub requested: Decimal,
    /// Amount actually taken, excluding the fee (capped while overdrawn)
    pub debited: Decimal,
    pub fee: Decimal,
    pub state: OverdraftState,
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub source: Account,
    pub destination: Account,
    /// Whether both accounts belong to the same customer
    pub own_account: bool,
}

/// Ledger state of one account compared with the replay of its history
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub account: AccountId,
    pub ledger_balance: Decimal,
    pub replayed_balance: Decimal,
    pub ledger_overdraft_count: u32,
    pub replayed_overdraft_count: u32,
    /// History records replayed
    pub records: usize,
    /// Recorded withdrawals the overdraft policy would have refused
    pub refused_withdrawals: usize,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.ledger_balance == self.replayed_balance
            && self.ledger_overdraft_count == self.replayed_overdraft_count
            && self.refused_withdrawals == 0
    }
}

/// Log a rejected or failed operation
fn log_failure(operation: &str, account: AccountId, err: &BankError) {
    if err.is_recoverable() {
        warn!(operation, account, error = %err, "operation rejected");
    } else {
        error!(operation, account, error = %err, "operation failed");
    }
}

fn require_positive(amount: Decimal, operation: &str) -> Result<(), BankError> {
    if amount <= Decimal::ZERO {
        return Err(BankError::invalid_argument(format!(
            "{} amount must be positive, got {}",
            operation, amount
        )));
    }
    Ok(())
}

/// Transaction engine
///
/// Generic over its two stores so the same rules run against the data files
/// and against in-memory state.
pub struct TransactionEngine<L: LedgerStore, H: HistoryStore> {
    ledger: L,
    history: H,
    journal: TransferJournal,
    identity: Box<dyn IdentityProvider>,
    clock: Box<dyn Clock>,
    overdraft: OverdraftPolicy,
    account_id_base: AccountId,
}

/// Engine over the production data files
pub type FileEngine = TransactionEngine<FileLedger, FileHistory>;

impl FileEngine {
    /// Open the engine over the data files named by `config`, acting as `actor`
    ///
    /// Creates the data directory if needed. Uncommitted transfers left in
    /// the journal are logged as warnings.
    ///
    /// # Errors
    ///
    /// - `BankError::Storage` if the data directory or journal is unreadable
    /// - `BankError::CustomerNotFound` / `BankError::Unauthorized` if the
    ///   actor is not registered with the claimed role
    pub fn from_config(config: &EngineConfig, actor: Actor) -> Result<Self, BankError> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            BankError::storage(format!(
                "cannot use data directory '{}': {}",
                config.data_dir.display(),
                e
            ))
        })?;

        let identity = UserDirectory::load(&config.users_path(), actor)?;
        let journal = TransferJournal::open(config.journal_path())?;

        let engine = TransactionEngine::new(
            FileLedger::new(config.accounts_path()),
            FileHistory::new(config.history_path()),
            identity,
        )
        .with_journal(journal)
        .with_overdraft_policy(config.overdraft)
        .with_account_id_base(config.account_id_base);

        for intent in engine.pending_transfers() {
            warn!(
                sequence = intent.sequence,
                from = intent.from,
                to = intent.to,
                amount = %intent.amount,
                timestamp = %intent.timestamp,
                "transfer was started but never committed"
            );
        }

        info!(data_dir = %config.data_dir.display(), actor = actor.id, role = %actor.role, "engine opened");
        Ok(engine)
    }
}

impl<L: LedgerStore, H: HistoryStore> TransactionEngine<L, H> {
    /// Create an engine with the system clock, default overdraft policy and
    /// an in-memory transfer journal
    pub fn new(ledger: L, history: H, identity: impl IdentityProvider + 'static) -> Self {
        TransactionEngine {
            ledger,
            history,
            journal: TransferJournal::in_memory(),
            identity: Box::new(identity),
            clock: Box::new(SystemClock),
            overdraft: OverdraftPolicy::default(),
            account_id_base: 100_000,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_overdraft_policy(mut self, policy: OverdraftPolicy) -> Self {
        self.overdraft = policy;
        self
    }

    pub fn with_journal(mut self, journal: TransferJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_account_id_base(mut self, base: AccountId) -> Self {
        self.account_id_base = base;
        self
    }

    pub fn actor(&self) -> Actor {
        self.identity.current_actor()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn history_store(&self) -> &H {
        &self.history
    }

    pub fn overdraft_policy(&self) -> &OverdraftPolicy {
        &self.overdraft
    }

    fn authorize(&self, account: &Account, operation: impl FnOnce() -> String) -> Result<(), BankError> {
        let actor = self.actor();
        if actor.may_operate(account) {
            Ok(())
        } else {
            Err(BankError::unauthorized(actor.id, operation()))
        }
    }

    /// Reject a movement that would push today's total past the card's cap
    fn check_daily_limit(
        &self,
        account: &Account,
        kind: TransactionKind,
        own_account: bool,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<(), BankError> {
        let limit = account.card_tier.policy().daily_cap(kind, own_account);
        let own_filter = (kind == TransactionKind::Transfer).then_some(own_account);
        let used = self
            .history
            .sum_amount_for_date(account.id, kind, date, own_filter)?;

        debug!(
            account = account.id,
            kind = %kind,
            tier = %account.card_tier,
            %limit,
            %used,
            requested = %amount,
            "daily limit check"
        );

        let total = used
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("daily limit check", account.id))?;
        if total > limit {
            let operation = match kind {
                TransactionKind::Transfer if own_account => "transfer to own account",
                TransactionKind::Transfer => "transfer to other account",
                other => other.as_str(),
            };
            return Err(BankError::limit_exceeded(account.id, operation, limit, used, amount));
        }
        Ok(())
    }

    /// Deposit funds into an account
    ///
    /// Returns the account with its new balance. A deposit that brings the
    /// balance back to zero or above clears the overdraft counter.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the amount is not positive
    /// - `AccountNotFound` if the account does not exist
    /// - `Unauthorized` if a customer deposits into another customer's account
    /// - `LimitExceeded` if today's deposits would exceed the card's cap
    pub fn deposit(&mut self, account_id: AccountId, amount: Decimal) -> Result<Account, BankError> {
        self.apply_deposit(account_id, amount)
            .inspect_err(|e| log_failure("deposit", account_id, e))
    }

    fn apply_deposit(&mut self, account_id: AccountId, amount: Decimal) -> Result<Account, BankError> {
        require_positive(amount, "deposit")?;
        let account = self.ledger.find_account(account_id)?;
        self.authorize(&account, || format!("deposit into account {}", account_id))?;

        let now = self.clock.now();
        self.check_daily_limit(&account, TransactionKind::Deposit, false, amount, now.date())?;

        let next = self
            .overdraft
            .apply_deposit(account_id, BalanceState::of(&account), amount)?;
        self.ledger
            .update_balance(account_id, next.balance, next.overdraft_count)?;

        let record = TransactionRecord::deposit(self.actor().id, account_id, now, amount);
        self.record_after_update(account_id, &record)?;

        info!(account = account_id, %amount, balance = %next.balance, "deposit committed");
        Ok(account.with_balance(next.balance, next.overdraft_count))
    }

    /// Withdraw funds from an account, possibly overdrawing it
    ///
    /// The history records the requested amount; the receipt shows what the
    /// overdraft policy actually debited.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`, `AccountNotFound`, `Unauthorized` as for deposits
    /// - `LimitExceeded` if today's requested withdrawals would exceed the cap
    /// - `OverdraftLocked` if the account has reached the overdraft threshold
    pub fn withdraw(&mut self, account_id: AccountId, amount: Decimal) -> Result<WithdrawalReceipt, BankError> {
        self.apply_withdrawal(account_id, amount)
            .inspect_err(|e| log_failure("withdraw", account_id, e))
    }

    fn apply_withdrawal(&mut self, account_id: AccountId, amount: Decimal) -> Result<WithdrawalReceipt, BankError> {
        require_positive(amount, "withdraw")?;
        let account = self.ledger.find_account(account_id)?;
        self.authorize(&account, || format!("withdraw from account {}", account_id))?;

        let now = self.clock.now();
        self.check_daily_limit(&account, TransactionKind::Withdraw, false, amount, now.date())?;

        let outcome = self
            .overdraft
            .evaluate_withdrawal(account_id, BalanceState::of(&account), amount)?;
        self.ledger
            .update_balance(account_id, outcome.balance, outcome.overdraft_count)?;

        let record = TransactionRecord::withdrawal(self.actor().id, account_id, now, amount);
        self.record_after_update(account_id, &record)?;

        if outcome.fee > Decimal::ZERO {
            warn!(
                account = account_id,
                requested = %amount,
                debited = %outcome.debited,
                fee = %outcome.fee,
                balance = %outcome.balance,
                overdraft_count = outcome.overdraft_count,
                "account overdrawn"
            );
        }
        info!(account = account_id, %amount, balance = %outcome.balance, "withdrawal committed");

        Ok(WithdrawalReceipt {
            account: account.with_balance(outcome.balance, outcome.overdraft_count),
            requested: amount,
            debited: outcome.debited,
            fee: outcome.fee,
            state: outcome.state,
        })
    }

    /// Append a history record for a balance that is already written
    fn record_after_update(&mut self, account_id: AccountId, record: &TransactionRecord) -> Result<(), BankError> {
        self.history.append(record).inspect_err(|e| {
            error!(
                account = account_id,
                kind = %record.kind,
                amount = %record.amount,
                error = %e,
                "balance updated but history record was not written"
            );
        })
    }

    /// Move funds between two accounts
    ///
    /// Writes a journal intent, both ledger legs, both history legs and a
    /// journal commit, in that order. If a write fails after an earlier one
    /// succeeded the transfer is left half-applied: the failure is logged
    /// with the steps that were applied, the storage error is returned and
    /// the intent stays pending in the journal.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the accounts are the same or the amount is not positive
    /// - `AccountNotFound` if either account does not exist
    /// - `Unauthorized` if a customer transfers out of another customer's account
    /// - `InsufficientFunds` if the source balance is below the amount
    /// - `LimitExceeded` if today's outgoing transfers of the same kind would exceed the cap
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: Decimal) -> Result<TransferReceipt, BankError> {
        self.apply_transfer(from, to, amount)
            .inspect_err(|e| log_failure("transfer", from, e))
    }

    fn apply_transfer(&mut self, from: AccountId, to: AccountId, amount: Decimal) -> Result<TransferReceipt, BankError> {
        if from == to {
            return Err(BankError::invalid_argument(
                "cannot transfer to the same account",
            ));
        }
        require_positive(amount, "transfer")?;

        let source = self.ledger.find_account(from)?;
        let destination = self.ledger.find_account(to)?;
        self.authorize(&source, || format!("transfer from account {}", from))?;

        if source.balance < amount {
            return Err(BankError::insufficient_funds(from, source.balance, amount));
        }

        let own_account = source.owner == destination.owner;
        let now = self.clock.now();
        self.check_daily_limit(&source, TransactionKind::Transfer, own_account, amount, now.date())?;

        let source_balance = source
            .balance
            .checked_sub(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("transfer", from))?;
        let destination_balance = destination
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("transfer", to))?;
        let source = source.with_balance(source_balance, source.overdraft_count);
        let destination = destination.with_balance(destination_balance, destination.overdraft_count);

        let intent = self.journal.begin(from, to, amount, now)?;
        let mut applied = Vec::new();
        if let Err(e) = self.write_transfer(&intent, &source, &destination, own_account, &mut applied) {
            if !applied.is_empty() {
                error!(
                    sequence = intent.sequence,
                    from,
                    to,
                    %amount,
                    applied = ?applied,
                    error = %e,
                    "transfer half-applied, manual reconciliation required"
                );
            }
            return Err(e);
        }

        info!(from, to, %amount, own_account, sequence = intent.sequence, "transfer committed");
        Ok(TransferReceipt {
            source,
            destination,
            own_account,
        })
    }

    fn write_transfer(
        &mut self,
        intent: &TransferIntent,
        source: &Account,
        destination: &Account,
        own_account: bool,
        applied: &mut Vec<&'static str>,
    ) -> Result<(), BankError> {
        let (debit, credit) = TransactionRecord::transfer_legs(
            self.actor().id,
            source.id,
            destination.id,
            intent.timestamp,
            intent.amount,
            own_account,
        );

        self.ledger
            .update_balance(source.id, source.balance, source.overdraft_count)?;
        applied.push("source debit");
        self.ledger
            .update_balance(destination.id, destination.balance, destination.overdraft_count)?;
        applied.push("destination credit");
        self.history.append(&debit)?;
        applied.push("debit record");
        self.history.append(&credit)?;
        applied.push("credit record");
        self.journal.commit(intent)
    }

    /// Open a new account with a fresh debit card
    ///
    /// # Errors
    ///
    /// - `CustomerNotFound` if the owner is not a registered user
    /// - `Unauthorized` if a customer opens an account for someone else
    /// - `InvalidArgument` if the owner already holds an account of this kind
    pub fn open_account(&mut self, owner: CustomerId, kind: AccountKind, tier: CardTier) -> Result<Account, BankError> {
        self.apply_open_account(owner, kind, tier)
            .inspect_err(|e| log_failure("open account", 0, e))
    }

    fn apply_open_account(&mut self, owner: CustomerId, kind: AccountKind, tier: CardTier) -> Result<Account, BankError> {
        if !self.identity.owner_exists(owner)? {
            return Err(BankError::customer_not_found(owner));
        }
        let actor = self.actor();
        if !actor.may_act_for(owner) {
            return Err(BankError::unauthorized(
                actor.id,
                format!("open an account for customer {}", owner),
            ));
        }

        if self
            .ledger
            .list_accounts_for_customer(owner)?
            .iter()
            .any(|a| a.kind == kind)
        {
            return Err(BankError::invalid_argument(format!(
                "customer {} already holds a {} account",
                owner, kind
            )));
        }

        let card_id = next_card_id(tier, &self.ledger.accounts()?)?;
        let id = next_account_id(self.ledger.last_account_id()?, self.account_id_base)?;
        let account = Account::new(id, owner, kind, card_id, tier);
        self.ledger.insert_account(account.clone())?;

        info!(account = id, owner, kind = %kind, card = card_id, tier = %tier, "account opened");
        Ok(account)
    }

    /// Look up one account the actor may see
    pub fn account(&self, account_id: AccountId) -> Result<Account, BankError> {
        let account = self.ledger.find_account(account_id)?;
        self.authorize(&account, || format!("view account {}", account_id))?;
        Ok(account)
    }

    /// Accounts held by a customer
    pub fn accounts_for(&self, customer: CustomerId) -> Result<Vec<Account>, BankError> {
        let actor = self.actor();
        if !actor.may_act_for(customer) {
            return Err(BankError::unauthorized(
                actor.id,
                format!("view accounts of customer {}", customer),
            ));
        }
        self.ledger.list_accounts_for_customer(customer)
    }

    /// Every account in the ledger (bankers only)
    pub fn all_accounts(&self) -> Result<Vec<Account>, BankError> {
        self.require_banker("list all accounts")?;
        self.ledger.accounts()
    }

    fn require_banker(&self, operation: &str) -> Result<(), BankError> {
        let actor = self.actor();
        if actor.role == Role::Banker {
            Ok(())
        } else {
            Err(BankError::unauthorized(actor.id, operation))
        }
    }

    /// Transaction history of an account, optionally narrowed to one kind
    pub fn history(&self, account_id: AccountId, filter: KindFilter) -> Result<Vec<TransactionRecord>, BankError> {
        let account = self.ledger.find_account(account_id)?;
        self.authorize(&account, || format!("view the history of account {}", account_id))?;
        self.history
            .query_by_account_and_type(account_id, filter)?
            .collect()
    }

    /// Compare an account's ledger state with the replay of its history
    ///
    /// Mismatches are logged and reported, never corrected.
    pub fn audit(&self, account_id: AccountId) -> Result<AuditReport, BankError> {
        let account = self.ledger.find_account(account_id)?;
        self.authorize(&account, || format!("audit account {}", account_id))?;
        self.audit_account(&account)
    }

    fn audit_account(&self, account: &Account) -> Result<AuditReport, BankError> {
        let records: Vec<_> = self
            .history
            .query_by_account_and_type(account.id, KindFilter::All)?
            .collect::<Result<_, _>>()?;
        let count = records.len();
        let (replayed, refused_withdrawals) = self
            .overdraft
            .replay(account.id, records.into_iter().map(Ok))?;

        let report = AuditReport {
            account: account.id,
            ledger_balance: account.balance,
            replayed_balance: replayed.balance,
            ledger_overdraft_count: account.overdraft_count,
            replayed_overdraft_count: replayed.overdraft_count,
            records: count,
            refused_withdrawals,
        };

        if !report.is_consistent() {
            warn!(
                account = account.id,
                ledger_balance = %report.ledger_balance,
                replayed_balance = %report.replayed_balance,
                ledger_overdraft_count = report.ledger_overdraft_count,
                replayed_overdraft_count = report.replayed_overdraft_count,
                refused_withdrawals,
                "ledger diverges from transaction history"
            );
        }
        Ok(report)
    }

    /// Audit every account (bankers only)
    pub fn audit_all(&self) -> Result<Vec<AuditReport>, BankError> {
        self.require_banker("audit all accounts")?;
        self.ledger
            .accounts()?
            .iter()
            .map(|account| self.audit_account(account))
            .collect()
    }

    /// Transfers begun but never committed
    pub fn pending_transfers(&self) -> Vec<TransferIntent> {
        self.journal.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::history_store::MemoryHistory;
    use crate::core::ledger_store::MemoryLedger;
    use chrono::{Duration, NaiveDateTime};
    use rstest::rstest;

    const ALICE: CustomerId = 11111111;
    const BOB: CustomerId = 22222222;
    const BANKER: CustomerId = 99999999;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn users() -> Vec<(CustomerId, Role)> {
        vec![
            (ALICE, Role::Customer),
            (BOB, Role::Customer),
            (BANKER, Role::Banker),
        ]
    }

    /// Alice: checking 100001 (standard), savings 100003 (platinum); Bob: checking 100002
    fn accounts() -> Vec<Account> {
        vec![
            Account::new(100001, ALICE, AccountKind::Checking, 510000001, CardTier::Standard),
            Account::new(100002, BOB, AccountKind::Checking, 510000002, CardTier::Standard),
            Account::new(100003, ALICE, AccountKind::Savings, 550000001, CardTier::Platinum),
        ]
    }

    fn engine_as(actor: Actor, clock: &ManualClock) -> TransactionEngine<MemoryLedger, MemoryHistory> {
        let identity = UserDirectory::new(actor, users()).unwrap();
        TransactionEngine::new(MemoryLedger::with_accounts(accounts()), MemoryHistory::new(), identity)
            .with_clock(clock.clone())
    }

    fn usd(amount: i64) -> Decimal {
        Decimal::from(amount)
    }

    #[test]
    fn test_deposit_credits_and_records() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);

        let account = engine.deposit(100001, usd(100)).unwrap();
        assert_eq!(account.balance, usd(100));
        assert_eq!(engine.ledger().find_account(100001).unwrap().balance, usd(100));

        let history = engine.history(100001, KindFilter::All).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actor, ALICE);
        assert_eq!(history[0].amount, usd(100));
        assert_eq!(history[0].timestamp, start());
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-5)]
    fn test_non_positive_amounts_rejected(#[case] amount: i64) {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);

        assert!(matches!(
            engine.deposit(100001, usd(amount)),
            Err(BankError::InvalidArgument { .. })
        ));
        assert!(matches!(
            engine.withdraw(100001, usd(amount)),
            Err(BankError::InvalidArgument { .. })
        ));
        assert!(matches!(
            engine.transfer(100001, 100003, usd(amount)),
            Err(BankError::InvalidArgument { .. })
        ));
        assert!(engine.history_store().is_empty());
    }

    #[test]
    fn test_unknown_account() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::banker(BANKER), &clock);
        assert_eq!(
            engine.deposit(424242, usd(1)).unwrap_err(),
            BankError::account_not_found(424242)
        );
    }

    #[test]
    fn test_overdraft_scenario() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);

        engine.deposit(100001, usd(100)).unwrap();
        let receipt = engine.withdraw(100001, usd(150)).unwrap();
        assert_eq!(receipt.account.balance, usd(-85));
        assert_eq!(receipt.account.overdraft_count, 1);
        assert_eq!(receipt.fee, usd(35));
        assert_eq!(receipt.state, OverdraftState::Overdrawn(1));

        let account = engine.deposit(100001, usd(100)).unwrap();
        assert_eq!(account.balance, usd(15));
        assert_eq!(account.overdraft_count, 0);

        // History keeps the requested amount
        let withdrawals = engine
            .history(100001, TransactionKind::Withdraw.into())
            .unwrap();
        assert_eq!(withdrawals[0].amount, usd(-150));
        assert!(engine.audit(100001).unwrap().is_consistent());
    }

    #[test]
    fn test_locked_account_stops_mutating() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);

        engine.withdraw(100001, usd(10)).unwrap();
        let receipt = engine.withdraw(100001, usd(500)).unwrap();
        assert_eq!(receipt.debited, usd(100));
        assert_eq!(receipt.state, OverdraftState::Locked);
        let locked_balance = receipt.account.balance;

        assert_eq!(
            engine.withdraw(100001, usd(1)).unwrap_err(),
            BankError::overdraft_locked(100001, 2)
        );
        assert_eq!(engine.ledger().find_account(100001).unwrap().balance, locked_balance);
        assert_eq!(engine.history(100001, KindFilter::All).unwrap().len(), 2);
    }

    #[test]
    fn test_daily_deposit_limit_resets_next_day() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);

        engine.deposit(100001, usd(150_000)).unwrap();
        let err = engine.deposit(100001, usd(150_000)).unwrap_err();
        assert!(matches!(err, BankError::LimitExceeded { .. }));
        assert_eq!(engine.ledger().find_account(100001).unwrap().balance, usd(150_000));

        clock.advance(Duration::days(1));
        let account = engine.deposit(100001, usd(150_000)).unwrap();
        assert_eq!(account.balance, usd(300_000));
    }

    #[test]
    fn test_withdraw_limit_counts_requested_amounts() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);
        engine.deposit(100001, usd(4_000)).unwrap();

        engine.withdraw(100001, usd(4_900)).unwrap();
        // The cap is checked before the overdraft policy runs
        match engine.withdraw(100001, usd(200)).unwrap_err() {
            BankError::LimitExceeded { limit, used, .. } => {
                assert_eq!(limit, usd(5_000));
                assert_eq!(used, usd(4_900));
            }
            other => panic!("Expected LimitExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_customer_cannot_touch_foreign_account() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(BOB), &clock);

        let err = engine.withdraw(100001, usd(10)).unwrap_err();
        assert_eq!(
            err,
            BankError::unauthorized(BOB, "withdraw from account 100001")
        );
        assert!(engine.history_store().is_empty());
        assert!(engine.account(100001).is_err());
        assert!(engine.accounts_for(ALICE).is_err());
    }

    #[test]
    fn test_banker_may_operate_any_account() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::banker(BANKER), &clock);

        engine.deposit(100001, usd(50)).unwrap();
        engine.withdraw(100001, usd(20)).unwrap();
        engine.transfer(100001, 100002, usd(10)).unwrap();

        let history = engine.history(100002, KindFilter::All).unwrap();
        assert_eq!(history[0].actor, BANKER);
        assert_eq!(engine.all_accounts().unwrap().len(), 3);
    }

    #[test]
    fn test_transfer_conserves_funds() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);
        engine.deposit(100001, usd(500)).unwrap();

        let receipt = engine.transfer(100001, 100002, usd(120)).unwrap();
        assert!(!receipt.own_account);
        assert_eq!(receipt.source.balance, usd(380));
        assert_eq!(receipt.destination.balance, usd(120));

        let source = engine.ledger().find_account(100001).unwrap();
        let destination = engine.ledger().find_account(100002).unwrap();
        assert_eq!(source.balance + destination.balance, usd(500));
        assert!(engine.pending_transfers().is_empty());

        let legs = engine.history(100001, TransactionKind::Transfer.into()).unwrap();
        assert_eq!(legs[0].amount, usd(-120));
        assert_eq!(legs[0].counterparty.unwrap().account, 100002);
    }

    #[test]
    fn test_transfer_rejections() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);
        engine.deposit(100001, usd(50)).unwrap();

        assert!(matches!(
            engine.transfer(100001, 100001, usd(5)),
            Err(BankError::InvalidArgument { .. })
        ));
        assert_eq!(
            engine.transfer(100001, 100002, usd(51)).unwrap_err(),
            BankError::insufficient_funds(100001, usd(50), usd(51))
        );
        assert_eq!(
            engine.transfer(100002, 100001, usd(1)).unwrap_err(),
            BankError::unauthorized(ALICE, "transfer from account 100002")
        );
        assert_eq!(
            engine.transfer(100001, 777777, usd(1)).unwrap_err(),
            BankError::account_not_found(777777)
        );
        assert_eq!(engine.ledger().find_account(100001).unwrap().balance, usd(50));
    }

    #[test]
    fn test_transfer_limits_are_split_by_ownership() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(ALICE), &clock);
        engine.deposit(100001, usd(100_000)).unwrap();

        // Standard card: 10_000 to others, 20_000 to own accounts
        engine.transfer(100001, 100002, usd(10_000)).unwrap();
        assert!(matches!(
            engine.transfer(100001, 100002, usd(1)),
            Err(BankError::LimitExceeded { .. })
        ));
        engine.transfer(100001, 100003, usd(20_000)).unwrap();
        assert!(matches!(
            engine.transfer(100001, 100003, usd(1)),
            Err(BankError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_incoming_transfers_do_not_consume_allowance() {
        let clock = ManualClock::new(start());
        let mut banker = engine_as(Actor::banker(BANKER), &clock);
        banker.deposit(100002, usd(20_000)).unwrap();
        banker.deposit(100001, usd(20_000)).unwrap();

        banker.transfer(100002, 100001, usd(9_000)).unwrap();
        banker.transfer(100001, 100002, usd(10_000)).unwrap();
    }

    #[test]
    fn test_open_account_assigns_sequential_numbers() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::customer(BOB), &clock);

        let account = engine
            .open_account(BOB, AccountKind::Savings, CardTier::Standard)
            .unwrap();
        assert_eq!(account.id, 100004);
        assert_eq!(account.card_id, 510000003);
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(engine.accounts_for(BOB).unwrap().len(), 2);
    }

    #[rstest]
    #[case::duplicate_kind(Actor::customer(BOB), BOB, AccountKind::Checking, "InvalidArgument")]
    #[case::for_someone_else(Actor::customer(BOB), ALICE, AccountKind::Savings, "Unauthorized")]
    #[case::unknown_owner(Actor::banker(BANKER), 12345678, AccountKind::Savings, "CustomerNotFound")]
    fn test_open_account_rejections(
        #[case] actor: Actor,
        #[case] owner: CustomerId,
        #[case] kind: AccountKind,
        #[case] expected: &str,
    ) {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(actor, &clock);
        let err = engine.open_account(owner, kind, CardTier::Titanium).unwrap_err();
        assert!(format!("{:?}", err).starts_with(expected), "{:?}", err);
        assert_eq!(engine.ledger().accounts().unwrap().len(), 3);
    }

    #[test]
    fn test_banker_opens_accounts_for_customers() {
        let clock = ManualClock::new(start());
        let mut engine = engine_as(Actor::banker(BANKER), &clock);
        let account = engine
            .open_account(BOB, AccountKind::Savings, CardTier::Titanium)
            .unwrap();
        assert_eq!(account.owner, BOB);
        assert_eq!(account.card_id, 530000001);
    }

    #[test]
    fn test_audit_detects_divergence() {
        let clock = ManualClock::new(start());
        let identity = UserDirectory::new(Actor::banker(BANKER), users()).unwrap();
        let drifted = accounts()
            .into_iter()
            .map(|a| if a.id == 100002 { a.with_balance(usd(7), 0) } else { a });
        let engine = TransactionEngine::new(
            MemoryLedger::with_accounts(drifted),
            MemoryHistory::new(),
            identity,
        )
        .with_clock(clock.clone());

        let reports = engine.audit_all().unwrap();
        let inconsistent: Vec<_> = reports.iter().filter(|r| !r.is_consistent()).collect();
        assert_eq!(inconsistent.len(), 1);
        assert_eq!(inconsistent[0].account, 100002);
        assert_eq!(inconsistent[0].replayed_balance, Decimal::ZERO);
    }

    #[test]
    fn test_audit_all_requires_banker() {
        let clock = ManualClock::new(start());
        let engine = engine_as(Actor::customer(ALICE), &clock);
        assert!(matches!(
            engine.audit_all(),
            Err(BankError::Unauthorized { .. })
        ));
    }

    /// Ledger whose nth balance update fails
    struct FailingLedger {
        inner: MemoryLedger,
        fail_on: usize,
        updates: usize,
    }

    impl LedgerStore for FailingLedger {
        fn find_account(&self, account_id: AccountId) -> Result<Account, BankError> {
            self.inner.find_account(account_id)
        }

        fn update_balance(
            &mut self,
            account_id: AccountId,
            balance: Decimal,
            overdraft_count: u32,
        ) -> Result<(), BankError> {
            self.updates += 1;
            if self.updates == self.fail_on {
                return Err(BankError::storage("disk unavailable"));
            }
            self.inner.update_balance(account_id, balance, overdraft_count)
        }

        fn list_accounts_for_customer(&self, customer: CustomerId) -> Result<Vec<Account>, BankError> {
            self.inner.list_accounts_for_customer(customer)
        }

        fn insert_account(&mut self, account: Account) -> Result<(), BankError> {
            self.inner.insert_account(account)
        }

        fn accounts(&self) -> Result<Vec<Account>, BankError> {
            self.inner.accounts()
        }
    }

    #[test]
    fn test_transfer_credit_failure_stays_pending() {
        let clock = ManualClock::new(start());
        let identity = UserDirectory::new(Actor::customer(ALICE), users()).unwrap();
        let funded = accounts()
            .into_iter()
            .map(|a| if a.id == 100001 { a.with_balance(usd(100), 0) } else { a });
        let ledger = FailingLedger {
            inner: MemoryLedger::with_accounts(funded),
            fail_on: 2,
            updates: 0,
        };
        let mut engine =
            TransactionEngine::new(ledger, MemoryHistory::new(), identity).with_clock(clock.clone());

        let result = engine.transfer(100001, 100002, usd(40));
        assert!(matches!(result, Err(BankError::Storage { .. })));

        // debit landed, credit did not
        assert_eq!(engine.ledger().find_account(100001).unwrap().balance, usd(60));
        assert_eq!(engine.ledger().find_account(100002).unwrap().balance, Decimal::ZERO);
        assert!(engine.history_store().is_empty());

        let pending = engine.pending_transfers();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].from, 100001);
        assert_eq!(pending[0].to, 100002);
        assert_eq!(pending[0].amount, usd(40));
    }
}
