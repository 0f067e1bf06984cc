//! Crate-wide error type.
//!
//! Each module that owns fallible state defines its own `Error` enum; this type aggregates them
//! the same way `zfx_subzero::Error` aggregates `graph::Error`, `sleet::Error` and friends.

use crate::{aliaser, conflict_graph, engine, id, params};

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    Id(id::Error),
    Params(params::Error),
    ConflictGraph(conflict_graph::Error),
    Engine(engine::Error),
    Aliaser(aliaser::Error),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<id::Error> for Error {
    fn from(e: id::Error) -> Self {
        Error::Id(e)
    }
}

impl From<params::Error> for Error {
    fn from(e: params::Error) -> Self {
        Error::Params(e)
    }
}

impl From<conflict_graph::Error> for Error {
    fn from(e: conflict_graph::Error) -> Self {
        Error::ConflictGraph(e)
    }
}

impl From<engine::Error> for Error {
    fn from(e: engine::Error) -> Self {
        Error::Engine(e)
    }
}

impl From<aliaser::Error> for Error {
    fn from(e: aliaser::Error) -> Self {
        Error::Aliaser(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
