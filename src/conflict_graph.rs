//! The transaction-level conflict graph.
//!
//! The DAG engine treats this as an external contract: `add`, `issued`, `record_poll`,
//! `preferences`, `virtuous`, `is_virtuous`, `quiesce`, `finalized`. This module defines that
//! trait and ships one concrete implementation, [SnowballConflictGraph]: a conflict set tracks a
//! preferred member, the last member that won a poll, and a confidence counter.
//!
//! Conflict-set membership comes from the transaction itself via [Conflicting], so the engine's
//! `add` stays a single-argument call.

use crate::bag::Bag;
use crate::id::{Id, IdSet};
use crate::params::Parameters;
use crate::vertex::{Status, Transaction};

use std::collections::{HashMap, HashSet};

/// The contract the DAG engine requires of a transaction-level consensus.
pub trait ConflictGraph<Tx: Transaction> {
    /// Registers a previously unknown transaction. No-op if `tx` is already known.
    fn add(&mut self, tx: &Tx);

    /// Whether `tx_id` has been registered (decided or not).
    fn issued(&self, tx_id: Id) -> bool;

    /// Folds a poll's vote counts into every active conflict set, advancing confidences and
    /// deciding transactions that have crossed a beta threshold.
    fn record_poll(&mut self, votes: &Bag);

    /// The currently preferred transaction of every active conflict set.
    fn preferences(&self) -> IdSet;

    /// Every transaction that is currently the sole member of its conflict set.
    fn virtuous(&self) -> IdSet;

    fn is_virtuous(&self, tx_id: Id) -> bool;

    /// True when no conflict set has more than one live member: nothing is being actively
    /// arbitrated and further polling of pending conflicts is unnecessary.
    fn quiesce(&self) -> bool;

    /// True once every registered transaction has been decided.
    fn finalized(&self) -> bool;

    /// The decided status of `tx_id` as this conflict graph sees it, or `None` if unknown.
    fn status(&self, tx_id: Id) -> Option<Status>;
}

/// Gives a transaction enough self-knowledge for [SnowballConflictGraph] to group mutually
/// exclusive transactions without the engine itself reasoning about spend graphs.
///
/// Transactions that return the same `Some(key)` are mutually exclusive; `None` declares a
/// transaction virtuous (conflict-free) at registration time.
pub trait Conflicting: Transaction {
    fn conflict_key(&self) -> Option<Id>;
}

impl Conflicting for crate::vertex::harness::MemTx {
    fn conflict_key(&self) -> Option<Id> {
        crate::vertex::harness::MemTx::conflict_key(self)
    }
}

/// A conflict set: a group of mutually exclusive transactions plus the Snowball counters used
/// to decide which of them (if any) gets accepted.
///
/// Grounded directly on `sleet::conflict_set::ConflictSet`: `members` is `conflicts`, `pref` and
/// `last` keep their names, `confidence` is `cnt`.
#[derive(Debug, Clone)]
struct ConflictSet {
    members: HashSet<Id>,
    pref: Id,
    last: Id,
    confidence: u8,
}

impl ConflictSet {
    fn singleton(tx_id: Id) -> Self {
        let mut members = HashSet::new();
        members.insert(tx_id);
        ConflictSet { members, pref: tx_id, last: tx_id, confidence: 0 }
    }

    fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// A Snowball-style [ConflictGraph]: one [ConflictSet] per group of mutually conflicting
/// transactions, updated from the vote bag each poll per `beta_virtuous`/`beta_rogue`.
pub struct SnowballConflictGraph {
    params: Parameters,
    /// tx id -> the conflict-set key it currently belongs to (absent once decided).
    group_of: HashMap<Id, Id>,
    /// conflict key -> the conflict set (only holds sets with undecided members).
    groups: HashMap<Id, ConflictSet>,
    /// Every transaction ever registered, decided or not.
    status: HashMap<Id, Status>,
}

impl SnowballConflictGraph {
    pub fn initialize(params: Parameters) -> Self {
        SnowballConflictGraph { params, group_of: HashMap::new(), groups: HashMap::new(), status: HashMap::new() }
    }
}

impl<Tx: Conflicting> ConflictGraph<Tx> for SnowballConflictGraph {
    fn add(&mut self, tx: &Tx) {
        let tx_id = tx.id();
        if self.status.contains_key(&tx_id) {
            return;
        }
        self.status.insert(tx_id, Status::Processing);

        let key = tx.conflict_key().unwrap_or(tx_id);
        self.group_of.insert(tx_id, key);
        self.groups.entry(key).or_insert_with(|| ConflictSet::singleton(tx_id)).members.insert(tx_id);
    }

    fn issued(&self, tx_id: Id) -> bool {
        self.status.contains_key(&tx_id)
    }

    fn record_poll(&mut self, votes: &Bag) {
        let keys: Vec<Id> = self.groups.keys().cloned().collect();
        for key in keys {
            let cs = match self.groups.get_mut(&key) {
                Some(cs) => cs,
                None => continue,
            };

            // The member with the most votes this poll, if any.
            let mut best: Option<(Id, usize)> = None;
            for m in cs.members.iter() {
                let c = votes.count(m);
                if c == 0 {
                    continue;
                }
                if best.map_or(true, |(_, bc)| c > bc) {
                    best = Some((*m, c));
                }
            }

            match best {
                Some((candidate, count)) if count >= votes.threshold() => {
                    if count > votes.count(&cs.pref) {
                        cs.pref = candidate;
                    }
                    if candidate == cs.last {
                        cs.confidence = cs.confidence.saturating_add(1);
                    } else {
                        cs.last = candidate;
                        cs.confidence = 1;
                    }
                }
                Some(_) => {
                    // Something was voted for but nothing met the threshold: an inconclusive
                    // round resets confidence.
                    cs.confidence = 0;
                }
                None => {
                    // No member was voted for at all this poll: leave the conflict set as-is.
                }
            }

            let singleton = cs.is_singleton();
            let decide = if singleton {
                cs.confidence >= self.params.beta_virtuous
            } else {
                cs.confidence >= self.params.beta_rogue
            };

            if decide {
                let winner = cs.pref;
                let losers: Vec<Id> = cs.members.iter().cloned().filter(|m| *m != winner).collect();
                self.status.insert(winner, Status::Accepted);
                self.group_of.remove(&winner);
                for loser in losers {
                    self.status.insert(loser, Status::Rejected);
                    self.group_of.remove(&loser);
                }
                self.groups.remove(&key);
            }
        }
    }

    fn preferences(&self) -> IdSet {
        self.groups.values().map(|cs| cs.pref).collect()
    }

    fn virtuous(&self) -> IdSet {
        self.groups.values().filter(|cs| cs.is_singleton()).flat_map(|cs| cs.members.iter().cloned()).collect()
    }

    fn is_virtuous(&self, tx_id: Id) -> bool {
        match self.group_of.get(&tx_id) {
            Some(key) => self.groups.get(key).map_or(false, ConflictSet::is_singleton),
            None => false,
        }
    }

    fn quiesce(&self) -> bool {
        self.groups.values().all(ConflictSet::is_singleton)
    }

    fn finalized(&self) -> bool {
        self.groups.is_empty()
    }

    fn status(&self, tx_id: Id) -> Option<Status> {
        self.status.get(&tx_id).cloned()
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    UnknownTransaction(Id),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
