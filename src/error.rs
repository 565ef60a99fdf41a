//! Errors reported by [`ChainedHashMap`](crate::ChainedHashMap).

use std::fmt;

/// Errors that can be reported when configuring a [`ChainedHashMap`](crate::ChainedHashMap).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The requested number of buckets cannot back a table.
    ///
    /// A table needs at least one bucket, and its bucket array must fit in `isize::MAX` bytes.
    InvalidConfiguration {
        /// The rejected number of buckets.
        num_buckets: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration { num_buckets: 0 } => {
                write!(f, "Invalid configuration: a table needs at least one bucket")
            }
            Error::InvalidConfiguration { num_buckets } => {
                write!(
                    f,
                    "Invalid configuration: {} buckets exceed the maximum table size",
                    num_buckets
                )
            }
        }
    }
}

impl std::error::Error for Error {}
