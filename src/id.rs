//! Fixed-width identifiers used throughout the consensus core.
//!
//! See the documentation of [Id] for details.

use std::collections::HashSet;
use std::convert::TryInto;
use std::fmt;
use std::str::FromStr;

use base58check::{FromBase58Check, ToBase58Check};
use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use rand::{self, Rng};

/// A 32-byte identifier for vertices, transactions and voters.
///
/// `Id` is displayed using the Base58check format, the same convention used for peer and cell
/// identifiers elsewhere in the codebase.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize, Default)]
pub struct Id([u8; 32]);

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_base58check(0))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_base58check(0))
    }
}

impl FromStr for Id {
    type Err = crate::Error;

    fn from_str(id_str: &str) -> Result<Self, crate::Error> {
        let (vsn, bytes) =
            id_str.from_base58check().map_err(|_| crate::Error::Id(Error::Malformed))?;
        if vsn != 0 {
            return Err(crate::Error::Id(Error::Malformed));
        }
        let bytes: [u8; 32] =
            bytes.as_slice().try_into().map_err(|_| crate::Error::Id(Error::Malformed))?;
        Ok(Id(bytes))
    }
}

impl Id {
    /// Derives an `Id` by hashing an arbitrary byte slice.
    pub fn new(bytes: &[u8]) -> Id {
        Id(hash(bytes))
    }

    /// Wraps a 32-byte array directly, without hashing.
    pub fn from_bytes(bytes: [u8; 32]) -> Id {
        Id(bytes)
    }

    /// Generates a random `Id` (test / bootstrap use).
    pub fn generate() -> Id {
        let mut rng = rand::thread_rng();
        let v: [u8; 32] = rng.gen();
        Id(v)
    }

    /// The all-zero `Id`, conventionally used for the genesis vertex.
    pub fn zero() -> Id {
        Id([0u8; 32])
    }

    /// The all-`0xFF` `Id` (for testing).
    pub fn max() -> Id {
        Id([255u8; 32])
    }

    /// Returns the wrapped byte array.
    pub fn bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Returns a slice view of the contained byte array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Index<usize> for Id {
    type Output = u8;

    fn index(&self, i: usize) -> &u8 {
        &self.0[i]
    }
}

fn hash(input: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2bVar::new(32).unwrap();
    hasher.update(input);
    let mut buf = [0u8; 32];
    hasher.finalize_variable(&mut buf).unwrap();
    buf
}

/// An unordered set of [Id]s.
pub type IdSet = HashSet<Id>;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The string was not a validly formed base58check-encoded `Id`.
    Malformed,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrips_through_display() {
        let id = Id::generate();
        let s = format!("{}", id);
        let parsed: Id = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn zero_and_max_differ() {
        assert_ne!(Id::zero(), Id::max());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        a[0] = 1;
        b[0] = 2;
        assert!(Id::from_bytes(a) < Id::from_bytes(b));
    }

    #[test]
    fn new_is_deterministic() {
        assert_eq!(Id::new(b"hello"), Id::new(b"hello"));
        assert_ne!(Id::new(b"hello"), Id::new(b"world"));
    }
}
