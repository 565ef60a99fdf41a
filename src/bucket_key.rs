//! Reduction of keys to bucket indexes.

use std::num::NonZeroUsize;

/// Keys that can be reduced to a bucket index.
///
/// The reduction is the table's only hash function: a key lands in the bucket at
/// `|key mod num_buckets|`. It is implemented for every primitive integer type, and user types
/// can implement it by reducing an integer view of themselves.
///
/// Two keys that compare equal must be reduced to the same bucket for every `num_buckets`. An
/// index that is not smaller than `num_buckets` is reduced modulo `num_buckets` by the table.
///
/// # Examples
///
/// ```
/// use chmap::BucketKey;
/// use std::num::NonZeroUsize;
///
/// let ten = NonZeroUsize::new(10).unwrap();
/// assert_eq!(23_u32.bucket(ten), 3);
/// assert_eq!((-3_i64).bucket(ten), 3);
///
/// #[derive(PartialEq, Eq)]
/// struct UserId(u64);
///
/// impl BucketKey for UserId {
///     fn bucket(&self, num_buckets: NonZeroUsize) -> usize {
///         self.0.bucket(num_buckets)
///     }
/// }
///
/// assert_eq!(UserId(17).bucket(ten), 7);
/// ```
pub trait BucketKey {
    /// Returns the index of the bucket `self` belongs to in a table of `num_buckets` buckets.
    fn bucket(&self, num_buckets: NonZeroUsize) -> usize;
}

impl<T: BucketKey + ?Sized> BucketKey for &T {
    #[inline]
    fn bucket(&self, num_buckets: NonZeroUsize) -> usize {
        (**self).bucket(num_buckets)
    }
}

macro_rules! unsigned_bucket_key {
    ($($t:ty),*) => {
        $(
            impl BucketKey for $t {
                #[inline]
                #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
                fn bucket(&self, num_buckets: NonZeroUsize) -> usize {
                    // The remainder is smaller than `num_buckets`, so it fits in `usize`.
                    (*self as u128 % num_buckets.get() as u128) as usize
                }
            }
        )*
    };
}

macro_rules! signed_bucket_key {
    ($($t:ty),*) => {
        $(
            impl BucketKey for $t {
                #[inline]
                #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
                fn bucket(&self, num_buckets: NonZeroUsize) -> usize {
                    // `num_buckets` never exceeds `isize::MAX`, so it is a valid `i128` divisor.
                    (*self as i128 % num_buckets.get() as i128).unsigned_abs() as usize
                }
            }
        )*
    };
}

unsigned_bucket_key!(u8, u16, u32, u64, u128, usize);
signed_bucket_key!(i8, i16, i32, i64, i128, isize);
