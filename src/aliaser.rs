//! A small two-way mapping between string aliases and [Id]s.
//!
//! Peripheral to the consensus core, kept as its own small focused utility module living
//! alongside the consensus modules rather than in a separate crate.

use crate::id::Id;

use std::collections::HashMap;

/// Maps aliases to [Id]s and back. An identifier may have many aliases; the first one assigned
/// is its primary alias. Two identifiers may never share an alias.
#[derive(Debug, Default)]
pub struct Aliaser {
    by_alias: HashMap<String, Id>,
    by_id: HashMap<Id, Vec<String>>,
}

impl Aliaser {
    pub fn new() -> Self {
        Aliaser { by_alias: HashMap::new(), by_id: HashMap::new() }
    }

    /// Assigns `alias` to `id`. Fails if `alias` is already assigned to a different id.
    pub fn alias(&mut self, id: Id, alias: impl Into<String>) -> Result<(), Error> {
        let alias = alias.into();
        if let Some(existing) = self.by_alias.get(&alias) {
            if *existing != id {
                return Err(Error::AlreadyUsed(alias));
            }
            return Ok(());
        }
        self.by_alias.insert(alias.clone(), id);
        self.by_id.entry(id).or_insert_with(Vec::new).push(alias);
        Ok(())
    }

    /// Looks up the [Id] registered for `alias`.
    pub fn lookup(&self, alias: &str) -> Result<Id, Error> {
        self.by_alias.get(alias).cloned().ok_or_else(|| Error::NoSuchAlias(alias.to_owned()))
    }

    /// All aliases registered for `id`, in assignment order (possibly empty).
    pub fn aliases(&self, id: Id) -> Vec<String> {
        self.by_id.get(&id).cloned().unwrap_or_default()
    }

    /// The first alias ever assigned to `id`.
    pub fn primary_alias(&self, id: Id) -> Result<String, Error> {
        self.by_id
            .get(&id)
            .and_then(|aliases| aliases.first().cloned())
            .ok_or(Error::NoAlias)
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    NoSuchAlias(String),
    AlreadyUsed(String),
    NoAlias,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
