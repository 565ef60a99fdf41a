//! [`ChainedHashMap`] is a concurrent hash map with a fixed number of chained buckets.

use std::fmt::{self, Debug, Display};
use std::mem::replace;
use std::ptr;

use crate::lock::{self, RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::table::{self, Node, Table, DEFAULT_BUCKETS, DEFAULT_NUM_BUCKETS, MAX_NUM_BUCKETS};
use crate::{BucketKey, Equivalent, Error};

/// Concurrent chained hash map.
///
/// [`ChainedHashMap`] is a hash map shared by reader and writer threads. Its table is a
/// fixed-length array of buckets, each bucket being the head of a singly-linked chain of
/// entries; a key belongs to the bucket at `|key mod num_buckets|` (see [`BucketKey`]).
///
/// ## Locking behavior
///
/// ### Table access
///
/// The whole table is protected by a single reader-writer lock. Lookups and scans acquire a
/// shared lock, therefore any number of readers may overlap; every modification acquires an
/// exclusive lock, and writers are serialized with respect to each other and to readers.
///
/// ### Entry access
///
/// [`Entry`], [`OccupiedEntry`] and [`VacantEntry`] keep the exclusive lock until they are
/// dropped. Calling any method of the same [`ChainedHashMap`] while holding one of them on the
/// same thread leads to a deadlock.
///
/// ### Resize
///
/// The number of buckets only changes through [`resize`](Self::resize). Every entry is
/// relocated into a new bucket array within a single exclusive critical section; other threads
/// either see the old table with all its entries or the new table with all its entries.
///
/// ## Unwind safety
///
/// [`ChainedHashMap`] stays structurally valid if user code panics while the lock is held, and
/// a poisoned lock is recovered. A panic in [`BucketKey::bucket`] during
/// [`resize`](Self::resize) leaves the previous table in place, and a bucket index that is out
/// of range is folded back into the table.
pub struct ChainedHashMap<K, V> {
    table: RwLock<Table<K, V>>,
}

/// [`Entry`] represents a single entry in a [`ChainedHashMap`].
pub enum Entry<'h, K, V> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'h, K, V>),

    /// A vacant entry.
    Vacant(VacantEntry<'h, K, V>),
}

/// [`OccupiedEntry`] is a view into an occupied entry in a [`ChainedHashMap`].
///
/// The exclusive lock on the [`ChainedHashMap`] is held until the view is dropped.
pub struct OccupiedEntry<'h, K, V> {
    table: RwLockWriteGuard<'h, Table<K, V>>,
    bucket: usize,
    depth: usize,
}

/// [`VacantEntry`] is a view into a vacant entry in a [`ChainedHashMap`].
///
/// The exclusive lock on the [`ChainedHashMap`] is held until the view is dropped.
pub struct VacantEntry<'h, K, V> {
    table: RwLockWriteGuard<'h, Table<K, V>>,
    key: K,
    bucket: usize,
}

impl<K, V> ChainedHashMap<K, V> {
    /// Creates an empty [`ChainedHashMap`] with the specified number of buckets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `num_buckets` is zero or larger than
    /// [`MAX_NUM_BUCKETS`](crate::MAX_NUM_BUCKETS).
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, Error};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::new(10).unwrap();
    /// assert_eq!(hashmap.num_buckets(), 10);
    ///
    /// let result = ChainedHashMap::<u64, u32>::new(0);
    /// assert_eq!(result.err(), Some(Error::InvalidConfiguration { num_buckets: 0 }));
    /// ```
    #[inline]
    pub fn new(num_buckets: usize) -> Result<Self, Error> {
        let num_buckets = table::validate(num_buckets).map_err(|e| {
            log::debug!("rejected table configuration: {e}");
            e
        })?;
        Ok(Self::from_table(Table::new(num_buckets)))
    }

    /// Returns the number of entries in the [`ChainedHashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert!(hashmap.insert(1, 0).is_none());
    /// assert_eq!(hashmap.len(), 1);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.read_table().len()
    }

    /// Returns `true` if the [`ChainedHashMap`] is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert!(hashmap.is_empty());
    /// assert!(hashmap.insert(1, 0).is_none());
    /// assert!(!hashmap.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of buckets.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::new(7).unwrap();
    /// assert_eq!(hashmap.num_buckets(), 7);
    /// ```
    #[inline]
    pub fn num_buckets(&self) -> usize {
        self.read_table().num_buckets().get()
    }

    /// Clears the [`ChainedHashMap`] by removing all key-value pairs.
    ///
    /// The number of buckets is retained. The removed entries are dropped after the lock is
    /// released.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::new(4).unwrap();
    ///
    /// assert!(hashmap.insert(1, 0).is_none());
    /// hashmap.clear();
    ///
    /// assert!(!hashmap.contains(&1));
    /// assert_eq!(hashmap.num_buckets(), 4);
    /// ```
    #[inline]
    pub fn clear(&self) {
        let removed = self.write_table().take();
        log::trace!("cleared {} entries", removed.len());
        drop(removed);
    }

    /// Moves all the entries into a new [`ChainedHashMap`].
    ///
    /// `self` is left empty with its number of buckets retained, and the returned
    /// [`ChainedHashMap`] adopts the table of `self` as is.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::new(4).unwrap();
    /// assert!(hashmap.insert(1, 0).is_none());
    ///
    /// let taken = hashmap.take();
    /// assert!(hashmap.is_empty());
    /// assert_eq!(taken.read(&1, |_, v| *v), Some(0));
    /// ```
    #[inline]
    #[must_use]
    pub fn take(&self) -> Self {
        Self::from_table(self.write_table().take())
    }

    /// Moves all the entries of `source` into `self`, replacing the contents of `self`.
    ///
    /// `self` adopts the table and the number of buckets of `source` without copying, while
    /// `source` is left empty with its number of buckets retained. The previous entries of `self`
    /// are dropped after the locks are released. Moving a [`ChainedHashMap`] into itself has no
    /// effect.
    ///
    /// ## Locking behavior
    ///
    /// Exclusive locks on both instances are acquired in a fixed global order, therefore two
    /// threads moving entries between the same two instances in opposite directions do not
    /// deadlock.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let source: ChainedHashMap<u64, u32> = ChainedHashMap::new(3).unwrap();
    /// let target: ChainedHashMap<u64, u32> = ChainedHashMap::new(8).unwrap();
    /// assert!(source.insert(1, 10).is_none());
    /// assert!(target.insert(2, 20).is_none());
    ///
    /// target.move_from(&source);
    ///
    /// assert!(source.is_empty());
    /// assert_eq!(target.num_buckets(), 3);
    /// assert_eq!(target.read(&1, |_, v| *v), Some(10));
    /// assert!(!target.contains(&2));
    /// ```
    pub fn move_from(&self, source: &Self) {
        if ptr::eq(self, source) {
            return;
        }
        let (mut target_table, mut source_table) = if self.precedes(source) {
            let target_table = self.write_table();
            (target_table, source.write_table())
        } else {
            let source_table = source.write_table();
            (self.write_table(), source_table)
        };
        let previous = replace(&mut *target_table, source_table.take());
        log::debug!(
            "moved {} entries in {} buckets",
            target_table.len(),
            target_table.num_buckets()
        );
        drop(source_table);
        drop(target_table);
        drop(previous);
    }

    /// Iterates over all the entries under a shared lock.
    ///
    /// Entries are visited bucket by bucket, each chain from head to tail.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<usize, usize> = ChainedHashMap::default();
    ///
    /// assert!(hashmap.insert(1, 0).is_none());
    /// assert!(hashmap.insert(2, 1).is_none());
    ///
    /// let mut sum = 0;
    /// hashmap.scan(|k, v| { sum += *k + *v; });
    /// assert_eq!(sum, 4);
    /// ```
    #[inline]
    pub fn scan<F: FnMut(&K, &V)>(&self, mut scanner: F) {
        for node in self.read_table().iter() {
            scanner(&node.key, &node.val);
        }
    }

    /// Returns a copy of every non-empty chain, tagged with its bucket index.
    ///
    /// Buckets appear in ascending order and each chain in head to tail order; empty buckets are
    /// omitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<i32, char> = ChainedHashMap::new(10).unwrap();
    ///
    /// assert!(hashmap.insert(3, 'k').is_none());
    /// assert!(hashmap.insert(13, 't').is_none());
    /// assert!(hashmap.insert(4, 'q').is_none());
    ///
    /// assert_eq!(
    ///     hashmap.snapshot(),
    ///     vec![(3, vec![(3, 'k'), (13, 't')]), (4, vec![(4, 'q')])]
    /// );
    /// ```
    pub fn snapshot(&self) -> Vec<(usize, Vec<(K, V)>)>
    where
        K: Clone,
        V: Clone,
    {
        let table = self.read_table();
        (0..table.num_buckets().get())
            .filter_map(|bucket| {
                let chain: Vec<(K, V)> = table
                    .chain(bucket)
                    .map(|node| (node.key.clone(), node.val.clone()))
                    .collect();
                (!chain.is_empty()).then_some((bucket, chain))
            })
            .collect()
    }

    /// Copies all the entries of `source` into `self`, replacing the contents of `self`.
    ///
    /// `self` gets new entries mirroring every key-value pair, every chain and the number of
    /// buckets of `source`; no storage is shared between the two afterwards. The previous
    /// entries of `self` are dropped after the locks are released. Copying a
    /// [`ChainedHashMap`] into itself has no effect.
    ///
    /// ## Locking behavior
    ///
    /// A shared lock on `source` and an exclusive lock on `self` are acquired in a fixed global
    /// order, therefore two threads copying the same two instances into each other do not
    /// deadlock.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let source: ChainedHashMap<u64, u32> = ChainedHashMap::new(3).unwrap();
    /// let target: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    /// assert!(source.insert(1, 10).is_none());
    ///
    /// target.clone_from_map(&source);
    /// assert!(target.insert(1, 11).is_some());
    ///
    /// assert_eq!(source.read(&1, |_, v| *v), Some(10));
    /// assert_eq!(target.read(&1, |_, v| *v), Some(11));
    /// assert_eq!(target.num_buckets(), 3);
    /// ```
    pub fn clone_from_map(&self, source: &Self)
    where
        K: Clone,
        V: Clone,
    {
        if ptr::eq(self, source) {
            return;
        }
        let (mut target_table, source_table) = if self.precedes(source) {
            let target_table = self.write_table();
            (target_table, source.read_table())
        } else {
            let source_table = source.read_table();
            (self.write_table(), source_table)
        };
        let previous = replace(&mut *target_table, Table::clone(&source_table));
        log::debug!(
            "copied {} entries in {} buckets",
            target_table.len(),
            target_table.num_buckets()
        );
        drop(source_table);
        drop(target_table);
        drop(previous);
    }

    pub(crate) fn from_table(table: Table<K, V>) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Two-instance operations lock the instance at the lower address first.
    #[inline]
    fn precedes(&self, other: &Self) -> bool {
        (self as *const Self) < (other as *const Self)
    }

    #[inline]
    pub(crate) fn read_table(&self) -> RwLockReadGuard<'_, Table<K, V>> {
        lock::read(&self.table)
    }

    #[inline]
    fn write_table(&self) -> RwLockWriteGuard<'_, Table<K, V>> {
        lock::write(&self.table)
    }
}

impl<K, V> ChainedHashMap<K, V>
where
    K: BucketKey + Eq,
{
    /// Gets the entry associated with the given key in the map for in-place manipulation.
    ///
    /// The exclusive lock is held until the returned [`Entry`] is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u8, u32> = ChainedHashMap::default();
    ///
    /// for byte in "a short treatise on fungi".bytes() {
    ///     hashmap.entry(byte).and_modify(|counter| *counter += 1).or_insert(1);
    /// }
    ///
    /// assert_eq!(hashmap.read(&b's', |_, v| *v), Some(2));
    /// assert_eq!(hashmap.read(&b't', |_, v| *v), Some(3));
    /// assert!(hashmap.read(&b'y', |_, v| *v).is_none());
    /// ```
    #[inline]
    pub fn entry(&self, key: K) -> Entry<'_, K, V> {
        let table = self.write_table();
        let bucket = table.bucket_of(&key);
        match table.search(bucket, &key) {
            Ok(depth) => Entry::Occupied(OccupiedEntry {
                table,
                bucket,
                depth,
            }),
            Err(_) => Entry::Vacant(VacantEntry { table, key, bucket }),
        }
    }

    /// Inserts a key-value pair into the [`ChainedHashMap`].
    ///
    /// If the key exists, its value is overwritten in place and the old value is returned;
    /// otherwise a new entry is appended to the tail of the chain and `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert!(hashmap.insert(1, 0).is_none());
    /// assert_eq!(hashmap.insert(1, 1), Some(0));
    /// assert_eq!(hashmap.read(&1, |_, v| *v), Some(1));
    /// ```
    #[inline]
    pub fn insert(&self, key: K, val: V) -> Option<V> {
        self.write_table().insert(key, val)
    }

    /// Returns a copy of the value associated with the key, inserting `V::default()` first if
    /// the key does not exist.
    ///
    /// The key is first looked up under a shared lock. If it is not found, the shared lock is
    /// released and the key is looked up again under an exclusive lock before the default value
    /// is inserted, therefore a concurrent insertion of the same key is never overwritten.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert_eq!(hashmap.get_or_insert_default(1), 0);
    /// assert!(hashmap.insert(1, 7).is_some());
    /// assert_eq!(hashmap.get_or_insert_default(1), 7);
    /// ```
    #[inline]
    pub fn get_or_insert_default(&self, key: K) -> V
    where
        V: Clone + Default,
    {
        if let Some(val) = self.get(&key) {
            return val;
        }
        self.entry(key).or_default().get().clone()
    }

    /// Removes a key-value pair if the key exists.
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert!(hashmap.remove(&1).is_none());
    /// assert!(hashmap.insert(1, 0).is_none());
    /// assert_eq!(hashmap.remove(&1).unwrap(), (1, 0));
    /// assert!(hashmap.remove(&1).is_none());
    /// ```
    #[inline]
    pub fn remove<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        Q: BucketKey + Equivalent<K> + ?Sized,
    {
        self.write_table().remove(key)
    }

    /// Reads a key-value pair under a shared lock.
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert!(hashmap.read(&1, |_, v| *v).is_none());
    /// assert!(hashmap.insert(1, 10).is_none());
    /// assert_eq!(hashmap.read(&1, |_, v| *v).unwrap(), 10);
    /// ```
    #[inline]
    pub fn read<Q, R, F: FnOnce(&K, &V) -> R>(&self, key: &Q, reader: F) -> Option<R>
    where
        Q: BucketKey + Equivalent<K> + ?Sized,
    {
        self.read_table()
            .get(key)
            .map(|node| reader(&node.key, &node.val))
    }

    /// Returns a copy of the value associated with the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, String> = ChainedHashMap::default();
    ///
    /// assert!(hashmap.get(&1).is_none());
    /// assert!(hashmap.insert(1, "one".to_string()).is_none());
    /// assert_eq!(hashmap.get(&1).as_deref(), Some("one"));
    /// ```
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: BucketKey + Equivalent<K> + ?Sized,
        V: Clone,
    {
        self.read(key, |_, v| v.clone())
    }

    /// Returns `true` if the [`ChainedHashMap`] contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert!(!hashmap.contains(&1));
    /// assert!(hashmap.insert(1, 0).is_none());
    /// assert!(hashmap.contains(&1));
    /// ```
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        Q: BucketKey + Equivalent<K> + ?Sized,
    {
        self.read(key, |_, _| ()).is_some()
    }

    /// Returns the index of the bucket that the key belongs to.
    ///
    /// The index is only meaningful until the [`ChainedHashMap`] is resized.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<i64, u32> = ChainedHashMap::new(10).unwrap();
    ///
    /// assert_eq!(hashmap.bucket_index(&23), 3);
    /// assert_eq!(hashmap.bucket_index(&-23), 3);
    /// ```
    #[inline]
    pub fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: BucketKey + ?Sized,
    {
        self.read_table().bucket_of(key)
    }

    /// Changes the number of buckets, relocating every entry.
    ///
    /// Every key is reduced against the new number of buckets; entries that end up in the same
    /// bucket keep their relative chain order. The whole relocation happens within one exclusive
    /// critical section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] and leaves the [`ChainedHashMap`] untouched if
    /// `num_buckets` is zero or larger than [`MAX_NUM_BUCKETS`](crate::MAX_NUM_BUCKETS).
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<i32, char> = ChainedHashMap::new(10).unwrap();
    ///
    /// assert!(hashmap.insert(3, 'k').is_none());
    /// assert!(hashmap.insert(13, 't').is_none());
    /// assert!(hashmap.insert(23, 'h').is_none());
    ///
    /// assert!(hashmap.resize(6).is_ok());
    /// assert!(hashmap.resize(0).is_err());
    ///
    /// assert_eq!(hashmap.num_buckets(), 6);
    /// assert_eq!(hashmap.read(&13, |_, v| *v), Some('t'));
    /// assert_eq!(hashmap.bucket_index(&13), 1);
    /// ```
    pub fn resize(&self, num_buckets: usize) -> Result<(), Error> {
        let num_buckets = table::validate(num_buckets).map_err(|e| {
            log::debug!("rejected resize: {e}");
            e
        })?;
        let mut table = self.write_table();
        let previous = table.num_buckets();
        if previous != num_buckets {
            table.rehash(num_buckets);
            log::debug!(
                "resized from {previous} to {num_buckets} buckets, relocating {} entries",
                table.len()
            );
        }
        Ok(())
    }
}

impl<K: Clone, V: Clone> Clone for ChainedHashMap<K, V> {
    /// Deep-copies the [`ChainedHashMap`] under a shared lock.
    #[inline]
    fn clone(&self) -> Self {
        Self::from_table(Table::clone(&self.read_table()))
    }
}

impl<K: Debug, V: Debug> Debug for ChainedHashMap<K, V> {
    /// Iterates over all the entries in the [`ChainedHashMap`] to print them.
    ///
    /// ## Locking behavior
    ///
    /// A shared lock is acquired, therefore any [`Entry`], [`OccupiedEntry`] or [`VacantEntry`]
    /// owned by the current thread will lead to a deadlock.
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_map();
        self.scan(|k, v| {
            d.entry(k, v);
        });
        d.finish()
    }
}

impl<K: Display, V: Display> Display for ChainedHashMap<K, V> {
    /// Prints every bucket on its own line as a chain of `(key,value)` pairs terminated by `0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<i32, char> = ChainedHashMap::new(3).unwrap();
    /// assert!(hashmap.insert(1, 'a').is_none());
    /// assert!(hashmap.insert(4, 'b').is_none());
    ///
    /// assert_eq!(hashmap.to_string(), "0\n(1,a)->(4,b)->0\n0\n");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.read_table();
        for bucket in 0..table.num_buckets().get() {
            for node in table.chain(bucket) {
                write!(f, "({},{})->", node.key, node.val)?;
            }
            writeln!(f, "0")?;
        }
        Ok(())
    }
}

impl<K, V> Default for ChainedHashMap<K, V> {
    /// Creates an empty [`ChainedHashMap`] with [`DEFAULT_NUM_BUCKETS`](crate::DEFAULT_NUM_BUCKETS)
    /// buckets.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, DEFAULT_NUM_BUCKETS};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert_eq!(hashmap.num_buckets(), DEFAULT_NUM_BUCKETS);
    /// ```
    #[inline]
    fn default() -> Self {
        Self::from_table(Table::new(DEFAULT_BUCKETS))
    }
}

impl<K: BucketKey + Eq, V> Extend<(K, V)> for ChainedHashMap<K, V> {
    #[inline]
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let mut table = self.write_table();
        for (k, v) in iter {
            table.insert(k, v);
        }
    }
}

impl<K: BucketKey + Eq, V> FromIterator<(K, V)> for ChainedHashMap<K, V> {
    /// Collects key-value pairs into a [`ChainedHashMap`] with one bucket per expected entry, but
    /// no fewer than [`DEFAULT_NUM_BUCKETS`](crate::DEFAULT_NUM_BUCKETS).
    #[inline]
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let into_iter = iter.into_iter();
        let mut hashmap = Self::with_size_hint(into_iter.size_hint().0);
        hashmap.extend(into_iter);
        hashmap
    }
}

impl<K, V> ChainedHashMap<K, V> {
    fn with_size_hint(size_hint: usize) -> Self {
        let num_buckets = size_hint.clamp(DEFAULT_NUM_BUCKETS, MAX_NUM_BUCKETS);
        table::validate(num_buckets)
            .map_or_else(|_| Self::default(), |n| Self::from_table(Table::new(n)))
    }
}

impl<K, V> PartialEq for ChainedHashMap<K, V>
where
    K: BucketKey + Eq,
    V: PartialEq,
{
    /// Compares the key-value pairs of two [`ChainedHashMap`] instances, regardless of their
    /// bucket layout.
    ///
    /// ## Locking behavior
    ///
    /// Shared locks on both instances are acquired in a fixed global order.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if ptr::eq(self, other) {
            return true;
        }
        let (lhs, rhs) = if self.precedes(other) {
            let lhs = self.read_table();
            (lhs, other.read_table())
        } else {
            let rhs = other.read_table();
            (self.read_table(), rhs)
        };
        lhs.len() == rhs.len()
            && lhs
                .iter()
                .all(|node| rhs.get(&node.key).map_or(false, |n| n.val == node.val))
    }
}

impl<'h, K, V> Entry<'h, K, V>
where
    K: BucketKey + Eq,
{
    /// Ensures a value is in the entry by inserting the supplied instance if empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// hashmap.entry(3).or_insert(7);
    /// assert_eq!(hashmap.read(&3, |_, v| *v), Some(7));
    /// ```
    #[inline]
    pub fn or_insert(self, val: V) -> OccupiedEntry<'h, K, V> {
        self.or_insert_with(|| val)
    }

    /// Ensures a value is in the entry by inserting the result of the supplied closure if empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// hashmap.entry(19).or_insert_with(|| 5);
    /// assert_eq!(hashmap.read(&19, |_, v| *v), Some(5));
    /// ```
    #[inline]
    pub fn or_insert_with<F: FnOnce() -> V>(self, constructor: F) -> OccupiedEntry<'h, K, V> {
        self.or_insert_with_key(|_| constructor())
    }

    /// Ensures a value is in the entry by inserting the result of the supplied closure if empty.
    ///
    /// The reference to the moved key is provided, therefore cloning or copying the key is
    /// unnecessary.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u64> = ChainedHashMap::default();
    ///
    /// hashmap.entry(11).or_insert_with_key(|k| if *k == 11 { 7 } else { 3 });
    /// assert_eq!(hashmap.read(&11, |_, v| *v), Some(7));
    /// ```
    #[inline]
    pub fn or_insert_with_key<F: FnOnce(&K) -> V>(
        self,
        constructor: F,
    ) -> OccupiedEntry<'h, K, V> {
        match self {
            Self::Occupied(o) => o,
            Self::Vacant(v) => {
                let val = constructor(v.key());
                v.insert_entry(val)
            }
        }
    }

    /// Returns a reference to the key of this entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    /// assert_eq!(hashmap.entry(31).key(), &31);
    /// ```
    #[inline]
    pub fn key(&self) -> &K {
        match self {
            Self::Occupied(o) => o.key(),
            Self::Vacant(v) => v.key(),
        }
    }

    /// Provides in-place mutable access to an occupied entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// hashmap.entry(37).and_modify(|v| { *v += 1 }).or_insert(47);
    /// assert_eq!(hashmap.read(&37, |_, v| *v), Some(47));
    ///
    /// hashmap.entry(37).and_modify(|v| { *v += 1 }).or_insert(3);
    /// assert_eq!(hashmap.read(&37, |_, v| *v), Some(48));
    /// ```
    #[inline]
    #[must_use]
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Self::Occupied(mut o) => {
                f(o.get_mut());
                Self::Occupied(o)
            }
            Self::Vacant(_) => self,
        }
    }

    /// Sets the value of the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    /// let entry = hashmap.entry(11).insert_entry(17);
    /// assert_eq!(entry.key(), &11);
    /// assert_eq!(entry.get(), &17);
    /// ```
    #[inline]
    pub fn insert_entry(self, val: V) -> OccupiedEntry<'h, K, V> {
        match self {
            Self::Occupied(mut o) => {
                o.insert(val);
                o
            }
            Self::Vacant(v) => v.insert_entry(val),
        }
    }
}

impl<'h, K, V> Entry<'h, K, V>
where
    K: BucketKey + Eq,
    V: Default,
{
    /// Ensures a value is in the entry by inserting the default value if empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    /// hashmap.entry(11).or_default();
    /// assert_eq!(hashmap.read(&11, |_, v| *v), Some(0));
    /// ```
    #[inline]
    pub fn or_default(self) -> OccupiedEntry<'h, K, V> {
        match self {
            Self::Occupied(o) => o,
            Self::Vacant(v) => v.insert_entry(Default::default()),
        }
    }
}

impl<K: Debug, V: Debug> Debug for Entry<'_, K, V> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vacant(v) => f.debug_tuple("Entry").field(v).finish(),
            Self::Occupied(o) => f.debug_tuple("Entry").field(o).finish(),
        }
    }
}

impl<K, V> OccupiedEntry<'_, K, V> {
    /// Gets a reference to the key in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// assert_eq!(hashmap.entry(29).or_default().key(), &29);
    /// ```
    #[inline]
    #[must_use]
    pub fn key(&self) -> &K {
        &self.node().key
    }

    /// Gets a reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, Entry};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// hashmap.entry(19).or_insert(11);
    ///
    /// if let Entry::Occupied(o) = hashmap.entry(19) {
    ///     assert_eq!(o.get(), &11);
    /// };
    /// ```
    #[inline]
    #[must_use]
    pub fn get(&self) -> &V {
        &self.node().val
    }

    /// Gets a mutable reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, Entry};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// hashmap.entry(37).or_insert(11);
    ///
    /// if let Entry::Occupied(mut o) = hashmap.entry(37) {
    ///     *o.get_mut() += 18;
    ///     assert_eq!(*o.get(), 29);
    /// }
    ///
    /// assert_eq!(hashmap.read(&37, |_, v| *v), Some(29));
    /// ```
    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.node_mut().val
    }

    /// Sets the value of the entry, and returns the old value.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, Entry};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// hashmap.entry(37).or_insert(11);
    ///
    /// if let Entry::Occupied(mut o) = hashmap.entry(37) {
    ///     assert_eq!(o.insert(17), 11);
    /// }
    ///
    /// assert_eq!(hashmap.read(&37, |_, v| *v), Some(17));
    /// ```
    #[inline]
    pub fn insert(&mut self, val: V) -> V {
        replace(self.get_mut(), val)
    }

    /// Takes the value out of the entry, and returns it.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, Entry};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// hashmap.entry(11).or_insert(17);
    ///
    /// if let Entry::Occupied(o) = hashmap.entry(11) {
    ///     assert_eq!(o.remove(), 17);
    /// };
    /// assert!(!hashmap.contains(&11));
    /// ```
    #[inline]
    #[must_use]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Takes ownership of the key and value from the [`ChainedHashMap`], unlinking the entry from
    /// its chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, Entry};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// hashmap.entry(11).or_insert(17);
    ///
    /// if let Entry::Occupied(o) = hashmap.entry(11) {
    ///     assert_eq!(o.remove_entry(), (11, 17));
    /// };
    /// ```
    #[inline]
    #[must_use]
    pub fn remove_entry(mut self) -> (K, V) {
        match self.table.remove_at(self.bucket, self.depth) {
            Some(entry) => entry,
            None => unreachable!("an occupied entry lost its node"),
        }
    }

    fn node(&self) -> &Node<K, V> {
        match self.table.node(self.bucket, self.depth) {
            Some(node) => node,
            None => unreachable!("an occupied entry lost its node"),
        }
    }

    fn node_mut(&mut self) -> &mut Node<K, V> {
        match self.table.node_mut(self.bucket, self.depth) {
            Some(node) => node,
            None => unreachable!("an occupied entry lost its node"),
        }
    }
}

impl<K: Debug, V: Debug> Debug for OccupiedEntry<'_, K, V> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .finish_non_exhaustive()
    }
}

impl<'h, K, V> VacantEntry<'h, K, V> {
    /// Gets a reference to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::ChainedHashMap;
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    /// assert_eq!(hashmap.entry(11).key(), &11);
    /// ```
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, Entry};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// if let Entry::Vacant(v) = hashmap.entry(17) {
    ///     assert_eq!(v.into_key(), 17);
    /// };
    /// ```
    #[inline]
    pub fn into_key(self) -> K {
        self.key
    }

    /// Sets the value of the entry with its key, appending it to the tail of its chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use chmap::{ChainedHashMap, Entry};
    ///
    /// let hashmap: ChainedHashMap<u64, u32> = ChainedHashMap::default();
    ///
    /// if let Entry::Vacant(o) = hashmap.entry(19) {
    ///     o.insert_entry(29);
    /// }
    ///
    /// assert_eq!(hashmap.read(&19, |_, v| *v), Some(29));
    /// ```
    #[inline]
    pub fn insert_entry(self, val: V) -> OccupiedEntry<'h, K, V> {
        let Self {
            mut table,
            key,
            bucket,
        } = self;
        let depth = table.push_back(bucket, key, val);
        OccupiedEntry {
            table,
            bucket,
            depth,
        }
    }
}

impl<K: Debug, V> Debug for VacantEntry<'_, K, V> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(self.key()).finish()
    }
}
