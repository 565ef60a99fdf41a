//! Chained concurrent hash map.
//!
//! # chmap::ChainedHashMap
//! A hash map with a fixed number of chained buckets, shared by reader and writer threads behind
//! a single reader-writer lock. Keys are reduced to buckets by `|key mod num_buckets|`, and the
//! number of buckets only changes through an explicit, atomic resize.

mod bucket_key;
pub use bucket_key::BucketKey;

mod chained_hash_map;
pub use chained_hash_map::{ChainedHashMap, Entry, OccupiedEntry, VacantEntry};

mod equivalent;
pub use equivalent::Equivalent;

mod error;
pub use error::Error;

mod lock;

mod table;
pub use table::{DEFAULT_NUM_BUCKETS, MAX_NUM_BUCKETS};

#[cfg(feature = "serde")]
mod serde;
