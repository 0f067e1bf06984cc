//! Multisets of identifiers used to aggregate poll votes.
//!
//! [UniqueBag] records, per identifier, which voters (by slot index within a single poll) voted
//! for it. [Bag] is the simpler post-aggregation multiset: an identifier's vote count together
//! with the threshold the conflict graph should use to interpret it.

use crate::id::Id;

use std::collections::hash_map::{Entry, Iter};
use std::collections::HashMap;

/// Maximum number of distinct voters a single poll can track.
///
/// A poll samples `k` validators; `k` is expected to stay well within a machine word, so a
/// single `u128` is used as the bitset rather than pulling in a general-purpose bitvec crate.
pub const MAX_VOTERS: usize = 128;

/// A `{0, 1}` vote per voter slot, packed into a single machine word.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct VoterBitSet(u128);

impl VoterBitSet {
    pub fn empty() -> Self {
        VoterBitSet(0)
    }

    /// Sets the bit for voter `slot`. `slot` must be `< MAX_VOTERS`.
    pub fn set(&mut self, slot: usize) {
        debug_assert!(slot < MAX_VOTERS, "voter slot out of range");
        self.0 |= 1u128 << slot;
    }

    pub fn contains(&self, slot: usize) -> bool {
        (self.0 >> slot) & 1 == 1
    }

    /// Merges `other`'s voters into `self`.
    pub fn union(&mut self, other: &VoterBitSet) {
        self.0 |= other.0;
    }

    /// Number of voters set (the vote count for whatever this bitset is keyed by).
    pub fn popcount(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<&[usize]> for VoterBitSet {
    fn from(slots: &[usize]) -> Self {
        let mut bs = VoterBitSet::empty();
        for s in slots {
            bs.set(*s);
        }
        bs
    }
}

/// A mapping from identifier to the set of voters (within a single poll) that named it.
///
/// This is the raw input to [`Engine::record_poll`][crate::engine::Engine::record_poll]: one
/// entry per vertex a voter responded with.
#[derive(Debug, Clone, Default)]
pub struct UniqueBag {
    votes: HashMap<Id, VoterBitSet>,
}

impl UniqueBag {
    pub fn new() -> Self {
        UniqueBag { votes: HashMap::new() }
    }

    /// Records that `voter` voted for `id`.
    pub fn add_vote(&mut self, id: Id, voter: usize) {
        self.votes.entry(id).or_insert_with(VoterBitSet::empty).set(voter);
    }

    /// Merges `bits` into the voter set recorded for `id`.
    pub fn union_into(&mut self, id: Id, bits: &VoterBitSet) {
        self.votes.entry(id).or_insert_with(VoterBitSet::empty).union(bits);
    }

    /// All identifiers with at least one vote.
    pub fn list(&self) -> Vec<Id> {
        self.votes.keys().cloned().collect()
    }

    /// The voter bitset recorded for `id`, or an empty one if `id` was never voted for.
    pub fn get_set(&self, id: &Id) -> VoterBitSet {
        self.votes.get(id).cloned().unwrap_or_else(VoterBitSet::empty)
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn iter(&self) -> Iter<'_, Id, VoterBitSet> {
        self.votes.iter()
    }

    /// Collapses voter bitsets into plain vote counts, producing the [Bag] the conflict graph
    /// consumes, tagged with `threshold` (normally `Parameters::alpha`).
    pub fn into_bag(self, threshold: usize) -> Bag {
        let counts = self.votes.into_iter().map(|(id, bits)| (id, bits.popcount() as usize)).collect();
        Bag { threshold, counts }
    }
}

/// A multiset of identifiers with vote counts and the threshold the conflict graph should use
/// when deciding whether a count counts as "supported this poll".
#[derive(Debug, Clone, Default)]
pub struct Bag {
    threshold: usize,
    counts: HashMap<Id, usize>,
}

impl Bag {
    pub fn new(threshold: usize) -> Self {
        Bag { threshold, counts: HashMap::new() }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Adds `n` votes for `id`.
    pub fn add(&mut self, id: Id, n: usize) {
        match self.counts.entry(id) {
            Entry::Occupied(mut o) => *o.get_mut() += n,
            Entry::Vacant(v) => {
                v.insert(n);
            }
        }
    }

    /// The vote count recorded for `id` (0 if absent).
    pub fn count(&self, id: &Id) -> usize {
        self.counts.get(id).cloned().unwrap_or(0)
    }

    /// Whether `id` met the bag's threshold this poll.
    pub fn met_threshold(&self, id: &Id) -> bool {
        self.count(id) >= self.threshold
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Id, usize> {
        self.counts.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bitset_union_and_popcount() {
        let mut a = VoterBitSet::empty();
        a.set(0);
        a.set(3);
        let mut b = VoterBitSet::empty();
        b.set(3);
        b.set(5);
        a.union(&b);
        assert_eq!(a.popcount(), 3);
        assert!(a.contains(0));
        assert!(a.contains(5));
        assert!(!a.contains(1));
    }

    #[test]
    fn unique_bag_collects_votes_per_id() {
        let mut ub = UniqueBag::new();
        let t1 = Id::new(b"t1");
        let t2 = Id::new(b"t2");
        ub.add_vote(t1, 0);
        ub.add_vote(t1, 1);
        ub.add_vote(t2, 0);
        assert_eq!(ub.get_set(&t1).popcount(), 2);
        assert_eq!(ub.get_set(&t2).popcount(), 1);
        assert_eq!(ub.get_set(&Id::new(b"unknown")).popcount(), 0);
    }

    #[test]
    fn into_bag_collapses_to_counts() {
        let mut ub = UniqueBag::new();
        let t1 = Id::new(b"t1");
        ub.add_vote(t1, 0);
        ub.add_vote(t1, 1);
        ub.add_vote(t1, 2);
        let bag = ub.into_bag(2);
        assert_eq!(bag.count(&t1), 3);
        assert!(bag.met_threshold(&t1));
        assert!(!bag.met_threshold(&Id::new(b"other")));
    }
}
