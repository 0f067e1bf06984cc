//! End-to-end scenarios driven entirely through the public [Engine] contract, matching the
//! concrete walkthroughs worked through by hand alongside the engine's design.

use glacier::aliaser::Aliaser;
use glacier::bag::UniqueBag;
use glacier::conflict_graph::SnowballConflictGraph;
use glacier::dispatcher::{NoopDispatcher, NoopMetrics};
use glacier::engine::Engine;
use glacier::id::{Id, IdSet};
use glacier::params::Parameters;
use glacier::vertex::harness::{MemTx, MemVertex};
use glacier::vertex::{Status, Vertex};

type TestEngine = Engine<MemVertex, SnowballConflictGraph>;

/// `try_init` rather than `init` since every test in this binary calls it and a second
/// subscriber install would panic.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_level(false)
        .with_target(false)
        .without_time()
        .compact()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn engine(params: Parameters, frontier: Vec<MemVertex>) -> TestEngine {
    Engine::initialize(
        Id::new(b"chain"),
        params,
        frontier,
        SnowballConflictGraph::initialize(params),
        Box::new(NoopDispatcher),
        Box::new(NoopMetrics),
    )
    .unwrap()
}

fn votes_for(id: Id, voters: std::ops::Range<usize>) -> UniqueBag {
    let mut bag = UniqueBag::new();
    for voter in voters {
        bag.add_vote(id, voter);
    }
    bag
}

#[test]
fn linear_chain_unanimous_acceptance() {
    init_tracing();
    let genesis = MemVertex::accepted(Id::new(b"genesis"));
    let params = Parameters::new(5, 3, 2, 20);
    let mut eng = engine(params, vec![genesis.clone()]);

    let v1 = MemVertex::new(Id::new(b"v1"), vec![genesis], vec![MemTx::new(Id::new(b"t1"))]);
    eng.add(v1.clone());
    let v2 = MemVertex::new(Id::new(b"v2"), vec![v1.clone()], vec![MemTx::new(Id::new(b"t2"))]);
    eng.add(v2.clone());

    for _ in 0..3 {
        eng.record_poll(votes_for(v2.id(), 0..5));
    }

    assert_eq!(v1.status(), Status::Accepted);
    assert_eq!(v2.status(), Status::Accepted);
    assert_eq!(eng.preferences(), IdSet::from([v2.id()]));
    assert_eq!(eng.virtuous(), IdSet::from([v2.id()]));
}

#[test]
fn conflicting_transactions_split_vote() {
    init_tracing();
    let genesis = MemVertex::accepted(Id::new(b"genesis"));
    let params = Parameters::new(5, 3, 11, 20);
    let mut eng = engine(params, vec![genesis.clone()]);

    let group = Id::new(b"group");
    let v1 = MemVertex::new(Id::new(b"v1"), vec![genesis.clone()], vec![MemTx::conflicting(Id::new(b"t1"), group)]);
    let v2 = MemVertex::new(Id::new(b"v2"), vec![genesis], vec![MemTx::conflicting(Id::new(b"t2"), group)]);
    eng.add(v1.clone());
    eng.add(v2.clone());

    let mut responses = UniqueBag::new();
    responses.add_vote(v1.id(), 0);
    responses.add_vote(v1.id(), 1);
    responses.add_vote(v2.id(), 2);
    responses.add_vote(v2.id(), 3);
    eng.record_poll(responses);

    assert!(eng.virtuous().is_empty());
    assert_eq!(v1.status(), Status::Processing);
    assert_eq!(v2.status(), Status::Processing);
    assert!(eng.orphans().is_empty());
}

#[test]
fn rejection_propagation() {
    init_tracing();
    let genesis = MemVertex::accepted(Id::new(b"genesis"));
    let params = Parameters::new(5, 3, 2, 2);
    let mut eng = engine(params, vec![genesis.clone()]);

    let group = Id::new(b"group");
    let v1 = MemVertex::new(Id::new(b"v1"), vec![genesis.clone()], vec![MemTx::conflicting(Id::new(b"t1"), group)]);
    let v1b =
        MemVertex::new(Id::new(b"v1b"), vec![genesis], vec![MemTx::conflicting(Id::new(b"t1b"), group)]);
    eng.add(v1.clone());
    eng.add(v1b.clone());

    let v2 = MemVertex::new(Id::new(b"v2"), vec![v1.clone()], vec![MemTx::new(Id::new(b"t2"))]);
    eng.add(v2.clone());

    let votes = votes_for(v1b.id(), 0..5);
    eng.record_poll(votes.clone());
    eng.record_poll(votes);

    assert_eq!(v1.status(), Status::Rejected);
    assert_eq!(v2.status(), Status::Rejected);
}

#[test]
fn frontier_antichain_maintenance() {
    init_tracing();
    let genesis = MemVertex::accepted(Id::new(b"genesis"));
    let params = Parameters::new(5, 3, 11, 20);
    let mut eng = engine(params, vec![genesis.clone()]);

    let v1 = MemVertex::new(Id::new(b"v1"), vec![genesis], vec![MemTx::new(Id::new(b"t1"))]);
    eng.add(v1.clone());
    let v2 = MemVertex::new(Id::new(b"v2"), vec![v1.clone()], vec![MemTx::new(Id::new(b"t2"))]);
    eng.add(v2.clone());
    let v3 = MemVertex::new(Id::new(b"v3"), vec![v1.clone()], vec![MemTx::new(Id::new(b"t3"))]);
    eng.add(v3.clone());

    assert_eq!(eng.preferences(), IdSet::from([v2.id(), v3.id()]));

    let v4 = MemVertex::new(Id::new(b"v4"), vec![v2, v3], vec![MemTx::new(Id::new(b"t4"))]);
    eng.add(v4.clone());

    assert_eq!(eng.preferences(), IdSet::from([v4.id()]));
}

/// A vertex behind a non-preferred sibling is itself non-preferred, so its virtuous
/// transactions report as orphaned until the sibling is rejected and it becomes preferred.
#[test]
fn orphan_reporting() {
    init_tracing();
    let genesis = MemVertex::accepted(Id::new(b"genesis"));
    let params = Parameters::new(5, 3, 2, 2);
    let mut eng = engine(params, vec![genesis.clone()]);

    let group = Id::new(b"group");
    let contested = MemVertex::new(
        Id::new(b"contested"),
        vec![genesis.clone()],
        vec![MemTx::conflicting(Id::new(b"c1"), group)],
    );
    let rival = MemVertex::new(Id::new(b"rival"), vec![genesis.clone()], vec![MemTx::conflicting(Id::new(b"c2"), group)]);
    // `rival` is registered first so its transaction starts as the conflict set's preference,
    // leaving `contested` (and therefore `child`) non-preferred until a poll overturns it.
    eng.add(rival.clone());
    eng.add(contested.clone());

    let t1 = MemTx::new(Id::new(b"t1"));
    let t2 = MemTx::new(Id::new(b"t2"));
    let child = MemVertex::new(Id::new(b"child"), vec![contested.clone()], vec![t1.clone(), t2.clone()]);
    eng.add(child.clone());

    assert!(eng.orphans().contains(&t1.id()));
    assert!(eng.orphans().contains(&t2.id()));

    // Drive `rival`'s conflicting transaction to rejection so `contested` (and thus `child`)
    // becomes preferred.
    let votes = votes_for(contested.id(), 0..5);
    eng.record_poll(votes.clone());
    eng.record_poll(votes);

    assert_eq!(contested.status(), Status::Accepted);
    assert!(!eng.orphans().contains(&t1.id()));
    assert!(!eng.orphans().contains(&t2.id()));
}

#[test]
fn aliaser_round_trip() {
    init_tracing();
    let id_a = Id::new(b"a");
    let id_b = Id::new(b"b");
    let mut aliaser = Aliaser::new();

    aliaser.alias(id_a, "x").unwrap();
    assert!(aliaser.alias(id_b, "x").is_err());
    assert_eq!(aliaser.lookup("x").unwrap(), id_a);
    assert_eq!(aliaser.aliases(id_a), vec!["x".to_owned()]);

    aliaser.alias(id_a, "y").unwrap();
    assert_eq!(aliaser.primary_alias(id_a).unwrap(), "x");
    assert_eq!(aliaser.aliases(id_a), vec!["x".to_owned(), "y".to_owned()]);
}
