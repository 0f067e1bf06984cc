#![doc(html_logo_url = "/logo.png")]

//! # Glacier
//!
//! Glacier is a DAG consensus core for the `Snow*` family of Avalanche algorithms: it converges a
//! set of transaction-bearing vertices, linked by parent references, to Accepted/Rejected status
//! through repeated network polling.
//!
//! ## Engine
//!
//! [engine] holds the central [engine::Engine]: the generic, single-threaded DAG walker that
//! decides vertices and maintains the preferred/virtuous frontier.
//!
//! ## Conflict graph
//!
//! [conflict_graph] is the transaction-level Snowball consensus the engine delegates
//! accept/reject decisions to.
//!
//! ## Vertex
//!
//! [vertex] defines the `Vertex`/`Transaction` capability traits the engine consumes, plus an
//! in-memory reference implementation used by tests and benchmarks.

#[macro_use]
extern crate serde_derive;
extern crate colored;

pub mod aliaser;
pub mod bag;
pub mod conflict_graph;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod id;
pub mod params;
pub mod vertex;

pub use error::{Error, Result};
