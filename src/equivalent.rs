//! Key equivalence for lookups by a borrowed form of the key.
//!
//! Follows the [`equivalent`](https://crates.io/crates/equivalent) crate, vendored in order to
//! avoid any conflicts.

use std::borrow::Borrow;

/// Key equivalence trait.
///
/// A type implementing both [`Equivalent<K>`] and [`BucketKey`](crate::BucketKey) can be used
/// to look up entries keyed by `K`; it must reduce to the same bucket as every `K` it is
/// equivalent to.
pub trait Equivalent<K: ?Sized> {
    /// Compares `self` to `key` and returns `true` if they are equal.
    fn equivalent(&self, key: &K) -> bool;
}

impl<Q: ?Sized, K: ?Sized> Equivalent<K> for Q
where
    Q: Eq,
    K: Borrow<Q>,
{
    #[inline]
    fn equivalent(&self, key: &K) -> bool {
        PartialEq::eq(self, key.borrow())
    }
}
