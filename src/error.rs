use std::fmt;

use thiserror::Error;

/// Which index of a [`BidiMap`](crate::BidiMap) an error refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    /// The index keyed by the first member of each pair.
    First,
    /// The index keyed by the second member of each pair.
    Second,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First  => f.write_str("first"),
            Side::Second => f.write_str("second"),
        }
    }
}

/// Enum listing possible errors from convenience.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum Error {
    /// A required argument was absent. Holds the argument name.
    #[error("argument `{0}` must not be null")]
    NullArgument(&'static str),
    /// The key is already present in the given index.
    #[error("duplicate {0} key")]
    DuplicateKey(Side),
    /// The key is not present in the given index.
    #[error("{0} key not found")]
    KeyNotFound(Side),
    /// The arguments are malformed as a whole.
    #[error("{0}")]
    Argument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Error::NullArgument("factory").to_string(), "argument `factory` must not be null");
        assert_eq!(Error::DuplicateKey(Side::First).to_string(),  "duplicate first key");
        assert_eq!(Error::DuplicateKey(Side::Second).to_string(), "duplicate second key");
        assert_eq!(Error::KeyNotFound(Side::Second).to_string(),  "second key not found");
        assert_eq!(Error::Argument("test".into()).to_string(),    "test");
    }

    #[test]
    fn compare() {
        assert_eq!(Error::KeyNotFound(Side::First), Error::KeyNotFound(Side::First));
        assert_ne!(Error::KeyNotFound(Side::First), Error::KeyNotFound(Side::Second));
        assert_ne!(Error::KeyNotFound(Side::First), Error::DuplicateKey(Side::First));
    }
}
