//! [`Table`] is the bucket array of a [`ChainedHashMap`](crate::ChainedHashMap).

use std::mem::{replace, size_of};
use std::num::NonZeroUsize;

use crate::{BucketKey, Equivalent, Error};

/// The default number of buckets.
pub const DEFAULT_NUM_BUCKETS: usize = 16;

/// The largest number of buckets a table can be configured with.
pub const MAX_NUM_BUCKETS: usize = isize::MAX as usize / size_of::<Link<(), ()>>();

pub(crate) const DEFAULT_BUCKETS: NonZeroUsize = match NonZeroUsize::new(DEFAULT_NUM_BUCKETS) {
    Some(num_buckets) => num_buckets,
    None => panic!("the default number of buckets is zero"),
};

/// An owning link to the next [`Node`] of a chain.
pub(crate) type Link<K, V> = Option<Box<Node<K, V>>>;

/// A key-value pair linked into a chain.
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) val: V,
    next: Link<K, V>,
}

/// [`Table`] is a fixed-length array of singly-linked chains.
///
/// The chain a key belongs to is determined by [`BucketKey::bucket`] against the current number
/// of buckets; every key appears in at most one node.
pub(crate) struct Table<K, V> {
    buckets: Box<[Link<K, V>]>,
    num_buckets: NonZeroUsize,
    len: usize,
}

/// Iterates over the nodes of a single chain from head to tail.
pub(crate) struct Chain<'t, K, V> {
    next: Option<&'t Node<K, V>>,
}

impl<K, V> Node<K, V> {
    #[inline]
    fn new(key: K, val: V) -> Box<Self> {
        Box::new(Self {
            key,
            val,
            next: None,
        })
    }
}

impl<K, V> Table<K, V> {
    /// Creates an empty [`Table`] with `num_buckets` empty chains.
    pub(crate) fn new(num_buckets: NonZeroUsize) -> Self {
        Self {
            buckets: empty_buckets(num_buckets),
            num_buckets,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn num_buckets(&self) -> NonZeroUsize {
        self.num_buckets
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns the nodes in the chain of the specified bucket.
    #[inline]
    pub(crate) fn chain(&self, bucket: usize) -> Chain<'_, K, V> {
        Chain {
            next: self.buckets.get(bucket).and_then(Option::as_deref),
        }
    }

    /// Returns every node, bucket by bucket, in chain order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Node<K, V>> {
        (0..self.buckets.len()).flat_map(move |bucket| self.chain(bucket))
    }

    /// Returns the node at `depth` in the chain of `bucket`.
    pub(crate) fn node(&self, bucket: usize, depth: usize) -> Option<&Node<K, V>> {
        self.chain(bucket).nth(depth)
    }

    /// Returns the node at `depth` in the chain of `bucket` for modification.
    pub(crate) fn node_mut(&mut self, bucket: usize, depth: usize) -> Option<&mut Node<K, V>> {
        let mut node = self.buckets.get_mut(bucket)?.as_deref_mut()?;
        for _ in 0..depth {
            node = node.next.as_deref_mut()?;
        }
        Some(node)
    }

    /// Unlinks the node at `depth` in the chain of `bucket`.
    pub(crate) fn remove_at(&mut self, bucket: usize, depth: usize) -> Option<(K, V)> {
        let mut link = self.buckets.get_mut(bucket)?;
        for _ in 0..depth {
            link = &mut link.as_mut()?.next;
        }
        let mut node = link.take()?;
        *link = node.next.take();
        self.len -= 1;
        let Node { key, val, .. } = *node;
        Some((key, val))
    }

    /// Appends a new node at the tail of the chain of `bucket`, and returns its depth.
    ///
    /// The caller must ensure that the key is not in the chain.
    pub(crate) fn push_back(&mut self, bucket: usize, key: K, val: V) -> usize {
        let mut depth = 0;
        let mut link = &mut self.buckets[bucket];
        while let Some(node) = link {
            link = &mut node.next;
            depth += 1;
        }
        *link = Some(Node::new(key, val));
        self.len += 1;
        depth
    }

    /// Drops every node, retaining the number of buckets.
    pub(crate) fn clear(&mut self) {
        for link in self.buckets.iter_mut() {
            drop_chain(link.take());
        }
        self.len = 0;
    }

    /// Moves out every node, leaving an empty [`Table`] with the same number of buckets behind.
    pub(crate) fn take(&mut self) -> Self {
        let num_buckets = self.num_buckets;
        replace(self, Self::new(num_buckets))
    }
}

impl<K: BucketKey, V> Table<K, V> {
    /// Returns the bucket the key belongs to.
    #[inline]
    pub(crate) fn bucket_of<Q>(&self, key: &Q) -> usize
    where
        Q: BucketKey + ?Sized,
    {
        reduce(key, self.num_buckets)
    }

    /// Searches the chain of `bucket` for the key.
    ///
    /// Returns the depth of the matching node, or the length of the chain if not found.
    pub(crate) fn search<Q>(&self, bucket: usize, key: &Q) -> Result<usize, usize>
    where
        Q: Equivalent<K> + ?Sized,
    {
        let mut depth = 0;
        for node in self.chain(bucket) {
            if key.equivalent(&node.key) {
                return Ok(depth);
            }
            depth += 1;
        }
        Err(depth)
    }

    /// Finds the node associated with the key.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        Q: BucketKey + Equivalent<K> + ?Sized,
    {
        self.chain(self.bucket_of(key))
            .find(|node| key.equivalent(&node.key))
    }

    /// Inserts a key-value pair, overwriting the value in place if the key exists.
    ///
    /// Returns the previous value if the key was present.
    pub(crate) fn insert(&mut self, key: K, val: V) -> Option<V>
    where
        K: Eq,
    {
        let bucket = self.bucket_of(&key);
        let mut link = &mut self.buckets[bucket];
        while let Some(node) = link {
            if node.key == key {
                return Some(replace(&mut node.val, val));
            }
            link = &mut node.next;
        }
        *link = Some(Node::new(key, val));
        self.len += 1;
        None
    }

    /// Removes the node associated with the key.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: BucketKey + Equivalent<K> + ?Sized,
    {
        let bucket = self.bucket_of(key);
        let depth = self.search(bucket, key).ok()?;
        self.remove_at(bucket, depth)
    }

    /// Redistributes every node over `num_buckets` chains.
    ///
    /// Nodes are relinked, not reallocated, and nodes that end up in the same chain keep the
    /// order in which they are visited: bucket by bucket, each chain from head to tail. The work
    /// is proportional to the number of buckets and nodes.
    ///
    /// Every target bucket is computed before the first node is unlinked, so a panic in
    /// [`BucketKey::bucket`] leaves the table untouched.
    pub(crate) fn rehash(&mut self, num_buckets: NonZeroUsize) {
        let targets: Vec<usize> = self
            .iter()
            .map(|node| reduce(&node.key, num_buckets))
            .collect();
        let mut targets = targets.into_iter();
        let mut buckets = empty_buckets(num_buckets);
        for link in self.buckets.iter_mut() {
            let mut rest = link.take();
            while let Some(mut node) = rest {
                rest = node.next.take();
                let bucket = targets.next().unwrap_or_default();
                node.next = buckets[bucket].take();
                buckets[bucket] = Some(node);
            }
        }
        // Each chain was built by pushing to the front.
        for link in buckets.iter_mut() {
            reverse_chain(link);
        }
        self.buckets = buckets;
        self.num_buckets = num_buckets;
    }
}

impl<K: Clone, V: Clone> Clone for Table<K, V> {
    fn clone(&self) -> Self {
        let mut buckets = empty_buckets(self.num_buckets);
        for (bucket, target) in buckets.iter_mut().enumerate() {
            let mut tail = target;
            for node in self.chain(bucket) {
                tail = &mut tail
                    .insert(Node::new(node.key.clone(), node.val.clone()))
                    .next;
            }
        }
        Self {
            buckets,
            num_buckets: self.num_buckets,
            len: self.len,
        }
    }
}

impl<K, V> Drop for Table<K, V> {
    #[inline]
    fn drop(&mut self) {
        self.clear();
    }
}

impl<'t, K, V> Iterator for Chain<'t, K, V> {
    type Item = &'t Node<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(node)
    }
}

/// Checks whether `num_buckets` can back a [`Table`].
pub(crate) fn validate(num_buckets: usize) -> Result<NonZeroUsize, Error> {
    match NonZeroUsize::new(num_buckets) {
        Some(valid) if valid.get() <= MAX_NUM_BUCKETS => Ok(valid),
        _ => Err(Error::InvalidConfiguration { num_buckets }),
    }
}

/// Reduces the key to a bucket index, folding an out-of-range index back into the table.
#[inline]
fn reduce<Q: BucketKey + ?Sized>(key: &Q, num_buckets: NonZeroUsize) -> usize {
    let bucket = key.bucket(num_buckets);
    if bucket < num_buckets.get() {
        bucket
    } else {
        bucket % num_buckets
    }
}

fn empty_buckets<K, V>(num_buckets: NonZeroUsize) -> Box<[Link<K, V>]> {
    (0..num_buckets.get()).map(|_| None).collect()
}

/// Drops a chain node by node instead of recursing through nested boxes.
fn drop_chain<K, V>(mut link: Link<K, V>) {
    while let Some(mut node) = link {
        link = node.next.take();
    }
}

fn reverse_chain<K, V>(link: &mut Link<K, V>) {
    let mut rest = link.take();
    while let Some(mut node) = rest {
        rest = node.next.take();
        node.next = link.take();
        *link = Some(node);
    }
}
