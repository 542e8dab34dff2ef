//! Ledger host
//!
//! Puts a [`Ledger`] behind a single lock, dispatches typed calls against it
//! and journals the events that successful calls produce. Every call holds the
//! lock from validation to commit, so concurrent callers observe a serial
//! order of operations and never a half-applied one.

use crate::token::address::Address;
use crate::token::event::LedgerEvent;
use crate::token::ledger::{Ledger, LedgerError};
use crate::token::units::{amount_string, Amount};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Number of events kept in the journal by default
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A mutating call, executed on behalf of an explicit caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Call {
    /// Caller sends `amount` to `to`
    Transfer {
        to: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    /// Caller lets `spender` move up to `amount` of its tokens
    Approve {
        spender: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    /// Caller moves `amount` from `owner` to `to` using its allowance
    TransferFrom {
        owner: Address,
        to: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
}

impl Call {
    /// Operation name as exposed to callers
    pub fn name(&self) -> &'static str {
        match self {
            Call::Transfer { .. } => "transfer",
            Call::Approve { .. } => "approve",
            Call::TransferFrom { .. } => "transferFrom",
        }
    }
}

/// A journaled event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the overall event stream (starts at 0, never reused)
    pub sequence: u64,
    pub event: LedgerEvent,
    pub recorded_at: DateTime<Utc>,
}

/// Reported when a stored journal cannot continue its sequence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("Journal holds {len} records, limit is {limit}")]
    OverLimit { len: usize, limit: usize },
    #[error("Record #{sequence} is out of order")]
    OutOfOrder { sequence: u64 },
    #[error("Next sequence {next} does not follow record #{last}")]
    SequenceBehind { next: u64, last: u64 },
}

/// Bounded log of emitted events
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventJournal {
    records: VecDeque<EventRecord>,
    next_sequence: u64,
    limit: usize,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl EventJournal {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            next_sequence: 0,
            limit,
        }
    }

    /// Append an event, evicting the oldest record past the limit
    pub fn record(&mut self, event: LedgerEvent) -> EventRecord {
        let record = EventRecord {
            sequence: self.next_sequence,
            event,
            recorded_at: Utc::now(),
        };
        self.next_sequence += 1;

        if self.limit > 0 {
            self.records.push_back(record.clone());
            while self.records.len() > self.limit {
                self.records.pop_front();
            }
        }

        record
    }

    /// Up to `count` records, most recent first
    pub fn recent(&self, count: usize) -> Vec<EventRecord> {
        self.records.iter().rev().take(count).cloned().collect()
    }

    /// Sequence number the next event will get
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check that recording can resume without reusing a sequence number
    pub fn check(&self) -> Result<(), JournalError> {
        if self.records.len() > self.limit {
            return Err(JournalError::OverLimit {
                len: self.records.len(),
                limit: self.limit,
            });
        }

        for (prev, next) in self.records.iter().zip(self.records.iter().skip(1)) {
            if next.sequence <= prev.sequence {
                return Err(JournalError::OutOfOrder {
                    sequence: next.sequence,
                });
            }
        }

        if let Some(last) = self.records.back() {
            if self.next_sequence <= last.sequence {
                return Err(JournalError::SequenceBehind {
                    next: self.next_sequence,
                    last: last.sequence,
                });
            }
        }

        Ok(())
    }
}

/// Serializable host state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub ledger: Ledger,
    #[serde(default)]
    pub journal: EventJournal,
}

struct HostState {
    ledger: Ledger,
    journal: EventJournal,
}

/// Thread-safe owner of one ledger
pub struct LedgerHost {
    state: Mutex<HostState>,
}

impl LedgerHost {
    /// Host a ledger with the default journal size
    pub fn new(ledger: Ledger) -> Self {
        Self::with_history_limit(ledger, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(ledger: Ledger, limit: usize) -> Self {
        Self::from_snapshot(HostSnapshot {
            ledger,
            journal: EventJournal::new(limit),
        })
    }

    pub fn from_snapshot(snapshot: HostSnapshot) -> Self {
        Self {
            state: Mutex::new(HostState {
                ledger: snapshot.ledger,
                journal: snapshot.journal,
            }),
        }
    }

    /// Copy of the current state, taken under the lock
    pub fn snapshot(&self) -> HostSnapshot {
        let state = self.state.lock();
        HostSnapshot {
            ledger: state.ledger.clone(),
            journal: state.journal.clone(),
        }
    }

    /// Run one call to completion
    ///
    /// On success the event is journaled and returned. On failure the error
    /// is returned as-is and neither the ledger nor the journal changes.
    pub fn execute(&self, caller: Address, call: Call) -> Result<EventRecord, LedgerError> {
        let mut guard = self.state.lock();
        let HostState { ledger, journal } = &mut *guard;

        let result = match call {
            Call::Transfer { to, amount } => ledger.transfer(caller, to, amount),
            Call::Approve { spender, amount } => ledger.approve(caller, spender, amount),
            Call::TransferFrom { owner, to, amount } => {
                ledger.transfer_from(caller, owner, to, amount)
            }
        };

        match result {
            Ok(event) => {
                let record = journal.record(event);
                log::info!(
                    "{} committed by {} (#{}): {}",
                    call.name(),
                    caller,
                    record.sequence,
                    record.event
                );
                Ok(record)
            }
            Err(e) => {
                log::warn!("{} rejected for {}: {}", call.name(), caller, e);
                Err(e)
            }
        }
    }

    pub fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<EventRecord, LedgerError> {
        self.execute(from, Call::Transfer { to, amount })
    }

    pub fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<EventRecord, LedgerError> {
        self.execute(owner, Call::Approve { spender, amount })
    }

    pub fn transfer_from(
        &self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: Amount,
    ) -> Result<EventRecord, LedgerError> {
        self.execute(spender, Call::TransferFrom { owner, to, amount })
    }

    /// Run a read-only closure against the ledger
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.state.lock().ledger)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.read(|ledger| ledger.balance_of(account))
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.read(|ledger| ledger.allowance(owner, spender))
    }

    pub fn total_supply(&self) -> Amount {
        self.read(|ledger| ledger.total_supply())
    }

    /// Up to `count` journaled events, most recent first
    pub fn history(&self, count: usize) -> Vec<EventRecord> {
        let state = self.state.lock();
        log::debug!(
            "Reading {} of {} journaled events",
            count.min(state.journal.len()),
            state.journal.len()
        );
        state.journal.recent(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::event::TransferEvent;
    use crate::token::units::scale;
    use std::sync::Arc;
    use std::thread;

    fn tokens(n: u128) -> Amount {
        scale(n, 18).unwrap()
    }

    fn create_test_host() -> (LedgerHost, Address) {
        let deployer = Address::derive("deployer");
        let ledger = Ledger::with_defaults("SYZYGY", "CZG", 1_000_000, deployer).unwrap();
        (LedgerHost::new(ledger), deployer)
    }

    #[test]
    fn test_execute_journals_success() {
        let (host, deployer) = create_test_host();
        let receiver = Address::derive("receiver");

        let record = host.transfer(deployer, receiver, tokens(100)).unwrap();

        assert_eq!(record.sequence, 0);
        assert_eq!(
            record.event,
            LedgerEvent::Transfer(TransferEvent {
                from: deployer,
                to: receiver,
                value: tokens(100),
            })
        );
        assert_eq!(host.balance_of(&receiver), tokens(100));
        assert_eq!(host.history(10), vec![record]);
    }

    #[test]
    fn test_rejected_call_changes_nothing() {
        let (host, deployer) = create_test_host();
        let before = host.snapshot();

        let result = host.transfer(deployer, Address::NULL, tokens(1));
        assert_eq!(result, Err(LedgerError::InvalidRecipient));

        let result = host.approve(deployer, Address::NULL, tokens(1));
        assert_eq!(result, Err(LedgerError::InvalidSpender));

        let exchange = Address::derive("exchange");
        let result = host.transfer_from(exchange, deployer, Address::derive("receiver"), 1);
        assert_eq!(
            result,
            Err(LedgerError::AllowanceExceeded { have: 0, need: 1 })
        );

        assert_eq!(host.snapshot(), before);
        assert!(host.history(10).is_empty());
    }

    #[test]
    fn test_delegated_flow() {
        let (host, deployer) = create_test_host();
        let exchange = Address::derive("exchange");
        let receiver = Address::derive("receiver");

        host.approve(deployer, exchange, tokens(100)).unwrap();
        host.transfer_from(exchange, deployer, receiver, tokens(100))
            .unwrap();

        assert_eq!(host.allowance(&deployer, &exchange), 0);
        assert_eq!(host.balance_of(&deployer), tokens(999_900));
        assert_eq!(host.total_supply(), tokens(1_000_000));

        let history = host.history(10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].event.name(), "Transfer");
        assert_eq!(history[1].event.name(), "Approval");
    }

    #[test]
    fn test_journal_is_bounded() {
        let deployer = Address::derive("deployer");
        let receiver = Address::derive("receiver");
        let ledger = Ledger::with_defaults("SYZYGY", "CZG", 1_000, deployer).unwrap();
        let host = LedgerHost::with_history_limit(ledger, 3);

        for _ in 0..5 {
            host.transfer(deployer, receiver, 1).unwrap();
        }

        let history = host.history(10);
        let sequences: Vec<u64> = history.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![4, 3, 2]);
        assert_eq!(host.snapshot().journal.next_sequence(), 5);
    }

    #[test]
    fn test_zero_limit_journal_still_numbers_events() {
        let mut journal = EventJournal::new(0);
        let event: LedgerEvent = TransferEvent {
            from: Address::derive("a"),
            to: Address::derive("b"),
            value: 1,
        }
        .into();

        assert_eq!(journal.record(event.clone()).sequence, 0);
        assert_eq!(journal.record(event).sequence, 1);
        assert!(journal.is_empty());
    }

    #[test]
    fn test_journal_check() {
        let event: LedgerEvent = TransferEvent {
            from: Address::derive("a"),
            to: Address::derive("b"),
            value: 1,
        }
        .into();
        let mut journal = EventJournal::new(3);
        for _ in 0..5 {
            journal.record(event.clone());
        }
        assert_eq!(journal.check(), Ok(()));
        assert_eq!(EventJournal::default().check(), Ok(()));

        let mut behind = journal.clone();
        behind.next_sequence = 2;
        assert_eq!(
            behind.check(),
            Err(JournalError::SequenceBehind { next: 2, last: 4 })
        );

        let mut over = journal.clone();
        over.limit = 2;
        assert_eq!(
            over.check(),
            Err(JournalError::OverLimit { len: 3, limit: 2 })
        );

        let mut shuffled = journal.clone();
        shuffled.records.swap(0, 1);
        assert_eq!(
            shuffled.check(),
            Err(JournalError::OutOfOrder { sequence: 2 })
        );
    }

    #[test]
    fn test_call_json_format() {
        let call = Call::TransferFrom {
            owner: Address::derive("deployer"),
            to: Address::derive("receiver"),
            amount: tokens(100),
        };

        let json: serde_json::Value = serde_json::to_value(&call).unwrap();
        assert_eq!(json["op"], "transferFrom");
        assert_eq!(json["amount"], "100000000000000000000");

        let back: Call = serde_json::from_value(json).unwrap();
        assert_eq!(back, call);
        assert_eq!(back.name(), "transferFrom");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (host, deployer) = create_test_host();
        host.transfer(deployer, Address::derive("receiver"), tokens(7))
            .unwrap();

        let json = serde_json::to_string(&host.snapshot()).unwrap();
        let restored = LedgerHost::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.snapshot(), host.snapshot());
    }

    #[test]
    fn test_concurrent_callers_conserve_supply() {
        let (host, deployer) = create_test_host();
        let host = Arc::new(host);
        let workers: Vec<Address> = (0..4)
            .map(|i| Address::derive(&format!("worker-{}", i)))
            .collect();

        for worker in &workers {
            host.transfer(deployer, *worker, 1_000).unwrap();
        }

        // Each worker passes 500 single units to the next one in a ring
        let handles: Vec<_> = (0..workers.len())
            .map(|i| {
                let host = Arc::clone(&host);
                let from = workers[i];
                let to = workers[(i + 1) % workers.len()];
                thread::spawn(move || {
                    for _ in 0..500 {
                        host.transfer(from, to, 1).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for worker in &workers {
            assert_eq!(host.balance_of(worker), 1_000);
        }
        host.read(|ledger| assert!(ledger.check_invariants().is_ok()));
        assert_eq!(host.snapshot().journal.next_sequence(), 4 + 4 * 500);
    }
}
