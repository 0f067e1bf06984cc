//! The DAG consensus engine.
//!
//! This is the heart of the crate: it owns the live vertex graph, drives per-poll topological
//! vote aggregation, delegates transaction-level arbitration to an embedded [ConflictGraph], and
//! maintains the `preferred`/`virtuous`/`orphans` frontiers. There is no actor runtime here: the
//! engine is a plain struct and its public methods (`add`, `record_poll`) are the entry points.

use crate::bag::UniqueBag;
use crate::conflict_graph::ConflictGraph;
use crate::dispatcher::{Dispatcher, Metrics};
use crate::id::{Id, IdSet};
use crate::params::Parameters;
use crate::vertex::{Status, Transaction, Vertex};

use colored::Colorize;
use std::collections::HashMap;

/// Per-vertex bookkeeping used only during a single `record_poll`'s topological pass.
struct KahnEntry {
    in_degree: usize,
    votes: crate::bag::VoterBitSet,
}

/// The DAG consensus engine, generic over a caller-supplied vertex type and conflict graph.
pub struct Engine<V: Vertex, CG: ConflictGraph<V::Tx>> {
    chain_id: Id,
    params: Parameters,
    cg: CG,
    dispatcher: Box<dyn Dispatcher>,
    metrics: Box<dyn Metrics>,

    /// Every tracked, undecided vertex.
    nodes: HashMap<Id, V>,
    /// Tracked vertices with no tracked descendant.
    frontier: HashMap<Id, V>,

    preferred: IdSet,
    virtuous: IdSet,
    orphans: IdSet,

    /// Valid only within a single `update_frontiers` pass.
    preference_cache: HashMap<Id, bool>,
    virtuous_cache: HashMap<Id, bool>,
}

impl<V: Vertex, CG: ConflictGraph<V::Tx>> Engine<V, CG> {
    /// Validates `params`, seeds `frontier` with already-accepted vertices, and runs an initial
    /// (necessarily empty) frontier recompute. Idempotent: constructing twice with the same
    /// inputs produces equivalent engines.
    pub fn initialize(
        chain_id: Id,
        params: Parameters,
        frontier: Vec<V>,
        cg: CG,
        dispatcher: Box<dyn Dispatcher>,
        metrics: Box<dyn Metrics>,
    ) -> crate::Result<Self> {
        params.validate().map_err(Error::InvalidParameters)?;

        let mut engine = Engine {
            chain_id,
            params,
            cg,
            dispatcher,
            metrics,
            nodes: HashMap::new(),
            frontier: frontier.into_iter().map(|v| (v.id(), v)).collect(),
            preferred: IdSet::new(),
            virtuous: IdSet::new(),
            orphans: IdSet::new(),
            preference_cache: HashMap::new(),
            virtuous_cache: HashMap::new(),
        };
        engine.update_frontiers();
        Ok(engine)
    }

    pub fn parameters(&self) -> Parameters {
        self.params
    }

    /// No-op if `vertex` is already decided or already tracked. Otherwise registers it and its
    /// undecided transactions, then runs a single `update` pass rooted at it.
    pub fn add(&mut self, vertex: V) {
        let vid = vertex.id();
        if vertex.status().is_decided() || self.nodes.contains_key(&vid) {
            return;
        }

        tracing::debug!("{} adding vertex {}", "[engine]".cyan(), vid);
        self.dispatcher.issue(self.chain_id, vid, &vertex.bytes());
        self.metrics.issued(vid);

        for tx in vertex.txs() {
            if !self.cg.issued(tx.id()) {
                self.cg.add(&tx);
            }
        }

        self.nodes.insert(vid, vertex.clone());
        self.update(vertex);
    }

    pub fn vertex_issued(&self, v: &V) -> bool {
        v.status().is_decided() || self.nodes.contains_key(&v.id())
    }

    pub fn tx_issued(&self, tx: &V::Tx) -> bool {
        self.cg.issued(tx.id())
    }

    pub fn preferences(&self) -> IdSet {
        self.preferred.clone()
    }

    pub fn virtuous(&self) -> IdSet {
        self.virtuous.clone()
    }

    pub fn orphans(&self) -> IdSet {
        self.orphans.clone()
    }

    pub fn is_virtuous(&self, tx: &V::Tx) -> bool {
        self.cg.is_virtuous(tx.id())
    }

    pub fn quiesce(&self) -> bool {
        self.cg.quiesce()
    }

    pub fn finalized(&self) -> bool {
        self.cg.finalized()
    }

    /// The core per-poll algorithm: a two-phase topological traversal collapses the per-voter
    /// vertex vote map into per-transaction vote counts, the conflict graph consumes those
    /// counts, and the three frontiers are recomputed from the result.
    pub fn record_poll(&mut self, responses: UniqueBag) {
        let votes = self.push_votes(responses);
        self.cg.record_poll(&votes);
        self.update_frontiers();
    }

    /// Phases 1–2: calculateInDegree + pushVotes. Collapses a per-voter vertex vote map into a
    /// per-transaction vote bag by walking the undecided sub-DAG reachable from the votes.
    fn push_votes(&self, responses: UniqueBag) -> crate::bag::Bag {
        let mut kahn: HashMap<Id, KahnEntry> = HashMap::new();
        let mut leaves: Vec<Id> = Vec::new();

        // Phase 1: calculate in-degree.
        for vid in responses.list() {
            if !self.nodes.contains_key(&vid) {
                continue; // vote for a decided or unknown vertex: dropped.
            }
            let bits = responses.get_set(&vid);
            let newly_seen = !kahn.contains_key(&vid);
            kahn.entry(vid).or_insert_with(|| KahnEntry { in_degree: 0, votes: crate::bag::VoterBitSet::empty() }).votes.union(&bits);
            if newly_seen {
                leaves.push(vid);
                self.mark_ancestor_in_degrees(vid, &mut kahn, &mut leaves);
            }
        }

        // Phase 2: push votes, Kahn's topological processing starting from `leaves`.
        let mut votes = UniqueBag::new();
        while let Some(l) = leaves.pop() {
            let l_votes = match kahn.get(&l) {
                Some(entry) => entry.votes,
                None => continue,
            };
            if let Some(vertex) = self.nodes.get(&l) {
                for tx in vertex.txs() {
                    votes.union_into(tx.id(), &l_votes);
                }
                for parent in vertex.parents() {
                    let pid = parent.id();
                    if parent.status().is_decided() {
                        continue;
                    }
                    if let Some(p_entry) = kahn.get_mut(&pid) {
                        p_entry.votes.union(&l_votes);
                        if p_entry.in_degree > 0 {
                            p_entry.in_degree -= 1;
                        }
                        if p_entry.in_degree == 0 {
                            leaves.push(pid);
                        }
                    }
                }
            }
        }

        votes.into_bag(self.params.alpha)
    }

    /// Iterative DFS over undecided parents, populating `in_degree` for every ancestor reachable
    /// from `start` and removing an ancestor from `leaves` the moment it gains its first
    /// in-edge within this sub-DAG.
    fn mark_ancestor_in_degrees(&self, start: Id, kahn: &mut HashMap<Id, KahnEntry>, leaves: &mut Vec<Id>) {
        let mut stack = match self.nodes.get(&start) {
            Some(v) => v.parents().into_iter().filter(|p| !p.status().is_decided()).collect::<Vec<_>>(),
            None => return,
        };

        while let Some(ancestor) = stack.pop() {
            let aid = ancestor.id();
            let first_seen = !kahn.contains_key(&aid);
            let entry = kahn.entry(aid).or_insert_with(|| KahnEntry { in_degree: 0, votes: crate::bag::VoterBitSet::empty() });
            entry.in_degree += 1;
            if entry.in_degree == 1 {
                leaves.retain(|id| *id != aid);
            }
            if first_seen {
                if let Some(node) = self.nodes.get(&aid) {
                    stack.extend(node.parents().into_iter().filter(|p| !p.status().is_decided()));
                }
            }
        }
    }

    /// Snapshots the current frontier, resets the three sets and both caches, seeds `orphans`
    /// with every CG-virtuous transaction, then re-derives everything by visiting the snapshot.
    fn update_frontiers(&mut self) {
        let prev: Vec<V> = self.frontier.values().cloned().collect();

        self.preferred.clear();
        self.virtuous.clear();
        self.orphans = self.cg.virtuous();
        self.frontier.clear();
        self.preference_cache.clear();
        self.virtuous_cache.clear();

        for v in prev {
            self.update(v);
        }
    }

    /// A memoized post-order pass over v's ancestry. Decides acceptance/rejection where parents
    /// permit it, and computes the `preferred`/`virtuous` booleans that populate the caches and
    /// frontier sets.
    ///
    /// Walked with an explicit work-stack rather than recursion: each vertex is pushed once
    /// unvisited, then re-pushed with its parents marked done once every parent is cached. This
    /// keeps stack depth at O(1) regardless of ancestry depth.
    fn update(&mut self, root: V) {
        let mut stack: Vec<(V, bool)> = vec![(root, false)];

        while let Some((v, parents_done)) = stack.pop() {
            let vid = v.id();
            if self.preference_cache.contains_key(&vid) {
                continue;
            }

            if !parents_done {
                match v.status() {
                    Status::Accepted => {
                        self.preferred.insert(vid);
                        self.virtuous.insert(vid);
                        self.frontier.insert(vid, v);
                        self.preference_cache.insert(vid, true);
                        self.virtuous_cache.insert(vid, true);
                        continue;
                    }
                    Status::Rejected => {
                        self.preference_cache.insert(vid, false);
                        self.virtuous_cache.insert(vid, false);
                        continue;
                    }
                    Status::Processing => {}
                }

                stack.push((v.clone(), true));
                for parent in v.parents() {
                    if !self.preference_cache.contains_key(&parent.id()) {
                        stack.push((parent, false));
                    }
                }
                continue;
            }

            let txs = v.txs();
            let mut acceptable = true;
            let mut rejectable = false;
            let mut preferred_local = true;
            let mut virtuous_local = true;
            for tx in txs.iter() {
                let tx_status = self.cg.status(tx.id()).unwrap_or(Status::Processing);
                if tx_status != Status::Accepted {
                    acceptable = false;
                }
                if tx_status == Status::Rejected {
                    rejectable = true;
                    preferred_local = false;
                    virtuous_local = false;
                } else if tx_status != Status::Accepted {
                    if !self.cg.preferences().contains(&tx.id()) {
                        preferred_local = false;
                    }
                    if !self.cg.is_virtuous(tx.id()) {
                        virtuous_local = false;
                    }
                }
            }

            let parents = v.parents();
            for parent in parents.iter() {
                let pid = parent.id();
                preferred_local = preferred_local && self.preference_cache.get(&pid).copied().unwrap_or(false);
                virtuous_local = virtuous_local && self.virtuous_cache.get(&pid).copied().unwrap_or(false);
            }

            let mut rejected_by_parent = false;
            for parent in parents.iter() {
                if parent.status() == Status::Rejected {
                    rejected_by_parent = true;
                    break;
                }
                if parent.status() != Status::Accepted {
                    acceptable = false;
                }
            }
            if rejected_by_parent {
                v.reject();
                self.nodes.remove(&vid);
                self.dispatcher.reject(self.chain_id, vid, &v.bytes());
                self.metrics.rejected(vid);
                self.preference_cache.insert(vid, false);
                self.virtuous_cache.insert(vid, false);
                continue;
            }

            for parent in parents.iter() {
                self.frontier.remove(&parent.id());
            }
            self.frontier.insert(vid, v.clone());
            self.preference_cache.insert(vid, preferred_local);
            self.virtuous_cache.insert(vid, virtuous_local);

            if preferred_local {
                self.preferred.insert(vid);
                for parent in parents.iter() {
                    self.preferred.remove(&parent.id());
                }
                for tx in txs.iter() {
                    if self.cg.status(tx.id()) != Some(Status::Accepted) {
                        self.orphans.remove(&tx.id());
                    }
                }
            }

            if virtuous_local {
                self.virtuous.insert(vid);
                for parent in parents.iter() {
                    self.virtuous.remove(&parent.id());
                }
            }

            if acceptable {
                self.dispatcher.accept(self.chain_id, vid, &v.bytes());
                v.accept();
                self.nodes.remove(&vid);
                self.metrics.accepted(vid);
            } else if rejectable {
                v.reject();
                self.dispatcher.reject(self.chain_id, vid, &v.bytes());
                self.nodes.remove(&vid);
                self.metrics.rejected(vid);
            }
        }
    }
}

#[derive(Debug)]
pub enum Error {
    InvalidParameters(crate::params::Error),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
