//! Capability traits for the vertices and transactions the engine consumes.
//!
//! The engine never owns a vertex exclusively (the same vertex may be referenced by storage, by
//! the network layer, and by the engine at once), so `accept`/`reject` take `&self` and are
//! expected to mutate through interior mutability. Implementations are handed to the engine as
//! cheaply-clonable handles (an `Rc`, an `Arc`, or a `Copy` index into an arena).

use crate::id::Id;

use std::fmt;

/// The three terminal (or non-terminal) states a vertex or transaction can be in.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Status {
    Processing,
    Accepted,
    Rejected,
}

impl Status {
    pub fn is_decided(&self) -> bool {
        !matches!(self, Status::Processing)
    }
}

/// A transaction: an atomic unit of state change tracked by the conflict graph.
pub trait Transaction: Clone + fmt::Debug {
    fn id(&self) -> Id;
    fn status(&self) -> Status;
}

/// A vertex in the DAG: a node carrying transactions and parent links.
pub trait Vertex: Clone + fmt::Debug {
    type Tx: Transaction;

    fn id(&self) -> Id;
    fn bytes(&self) -> Vec<u8>;
    fn status(&self) -> Status;
    /// The vertex's parents, in the order they were recorded at issuance.
    fn parents(&self) -> Vec<Self>;
    /// The vertex's embedded transactions, in the order they were recorded at issuance.
    fn txs(&self) -> Vec<Self::Tx>;
    /// Transitions the vertex to [Status::Accepted]. Idempotent once decided.
    fn accept(&self);
    /// Transitions the vertex to [Status::Rejected]. Idempotent once decided.
    fn reject(&self);
}

/// Reference vertex/transaction implementations for tests and benchmarks.
///
/// These are not meant to be the "real" vertex/transaction types of any particular caller
/// (byte encoding, signatures, and persistence are external collaborators), but they satisfy
/// [Vertex] and [Transaction] with the minimum plumbing needed to exercise the engine end to end.
pub mod harness {
    use super::*;
    use std::cell::Cell as StdCell;
    use std::rc::Rc;

    #[derive(Debug, Clone)]
    pub struct MemTx {
        inner: Rc<MemTxInner>,
    }

    #[derive(Debug)]
    struct MemTxInner {
        id: Id,
        status: StdCell<Status>,
        /// Shared key grouping this transaction with every other conflicting one; `None` means
        /// virtuous at construction. Exposed via [MemTx::conflict_key] for [super::super::conflict_graph::Conflicting].
        conflict_key: Option<Id>,
    }

    impl MemTx {
        pub fn new(id: Id) -> Self {
            MemTx { inner: Rc::new(MemTxInner { id, status: StdCell::new(Status::Processing), conflict_key: None }) }
        }

        /// A transaction that conflicts with every other `MemTx` sharing the same `group`.
        pub fn conflicting(id: Id, group: Id) -> Self {
            MemTx {
                inner: Rc::new(MemTxInner { id, status: StdCell::new(Status::Processing), conflict_key: Some(group) }),
            }
        }

        pub fn set_status(&self, status: Status) {
            self.inner.status.set(status);
        }

        pub fn conflict_key(&self) -> Option<Id> {
            self.inner.conflict_key
        }
    }

    impl Transaction for MemTx {
        fn id(&self) -> Id {
            self.inner.id
        }

        fn status(&self) -> Status {
            self.inner.status.get()
        }
    }

    #[derive(Debug, Clone)]
    pub struct MemVertex {
        inner: Rc<MemVertexInner>,
    }

    #[derive(Debug)]
    struct MemVertexInner {
        id: Id,
        status: StdCell<Status>,
        parents: Vec<MemVertex>,
        txs: Vec<MemTx>,
    }

    impl MemVertex {
        pub fn new(id: Id, parents: Vec<MemVertex>, txs: Vec<MemTx>) -> Self {
            MemVertex {
                inner: Rc::new(MemVertexInner {
                    id,
                    status: StdCell::new(Status::Processing),
                    parents,
                    txs,
                }),
            }
        }

        /// A vertex that starts life already [Status::Accepted] (e.g. a genesis / bootstrap
        /// frontier member).
        pub fn accepted(id: Id) -> Self {
            let v = MemVertex::new(id, vec![], vec![]);
            v.accept();
            v
        }
    }

    impl Vertex for MemVertex {
        type Tx = MemTx;

        fn id(&self) -> Id {
            self.inner.id
        }

        fn bytes(&self) -> Vec<u8> {
            self.inner.id.as_bytes().to_vec()
        }

        fn status(&self) -> Status {
            self.inner.status.get()
        }

        fn parents(&self) -> Vec<Self> {
            self.inner.parents.clone()
        }

        fn txs(&self) -> Vec<Self::Tx> {
            self.inner.txs.clone()
        }

        fn accept(&self) {
            if !self.status().is_decided() {
                self.inner.status.set(Status::Accepted);
            }
        }

        fn reject(&self) {
            if !self.status().is_decided() {
                self.inner.status.set(Status::Rejected);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::harness::*;
    use super::*;
    use crate::id::Id;

    #[test]
    fn accept_is_idempotent() {
        let v = MemVertex::new(Id::new(b"v"), vec![], vec![]);
        v.accept();
        v.reject();
        assert_eq!(v.status(), Status::Accepted);
    }

    #[test]
    fn genesis_starts_accepted() {
        let g = MemVertex::accepted(Id::new(b"g"));
        assert_eq!(g.status(), Status::Accepted);
    }
}
