//! `Serialize` and `Deserialize` for [`ChainedHashMap`] as a plain map.
//!
//! Entries are written bucket by bucket in chain order. A deserialized map starts with
//! [`DEFAULT_NUM_BUCKETS`](crate::DEFAULT_NUM_BUCKETS) buckets and doubles its bucket count
//! whenever chains grow longer than two entries on average; the length announced by the input is
//! never used for allocation.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::table::{self, Table, DEFAULT_BUCKETS};
use crate::{BucketKey, ChainedHashMap};

/// The average chain length that triggers growth while deserializing.
const MAX_LOAD: usize = 2;

struct MapVisitor<K, V>(PhantomData<fn() -> (K, V)>);

impl<'de, K, V> Visitor<'de> for MapVisitor<K, V>
where
    K: Deserialize<'de> + BucketKey + Eq,
    V: Deserialize<'de>,
{
    type Value = ChainedHashMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of keys to values")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut table = Table::new(DEFAULT_BUCKETS);
        while let Some((key, val)) = access.next_entry()? {
            table.insert(key, val);
            let num_buckets = table.num_buckets().get();
            if table.len() > num_buckets.saturating_mul(MAX_LOAD) {
                if let Ok(grown) = table::validate(num_buckets.saturating_mul(2)) {
                    table.rehash(grown);
                }
            }
        }
        log::trace!(
            "deserialized {} entries into {} buckets",
            table.len(),
            table.num_buckets()
        );
        Ok(ChainedHashMap::from_table(table))
    }
}

impl<'de, K, V> Deserialize<'de> for ChainedHashMap<K, V>
where
    K: Deserialize<'de> + BucketKey + Eq,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MapVisitor(PhantomData))
    }
}

impl<K: Serialize, V: Serialize> Serialize for ChainedHashMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.read_table();
        let mut map = serializer.serialize_map(Some(table.len()))?;
        for node in table.iter() {
            map.serialize_entry(&node.key, &node.val)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod serde_test {
    use crate::ChainedHashMap;

    use serde::de::value::{Error, MapDeserializer};
    use serde::Deserialize;
    use serde_test::{assert_de_tokens, assert_tokens, Token};

    #[test]
    fn serde_chained_hash_map() {
        let map: ChainedHashMap<u64, i16> = ChainedHashMap::new(4).unwrap();
        assert!(map.insert(2, -6).is_none());
        assert_tokens(
            &map,
            &[
                Token::Map { len: Some(1) },
                Token::U64(2),
                Token::I16(-6),
                Token::MapEnd,
            ],
        );
    }

    #[test]
    fn serde_bucket_order() {
        let map: ChainedHashMap<i32, char> = ChainedHashMap::new(4).unwrap();
        assert!(map.insert(5, 'b').is_none());
        assert!(map.insert(1, 'a').is_none());
        assert!(map.insert(2, 'c').is_none());
        assert_tokens(
            &map,
            &[
                Token::Map { len: Some(3) },
                Token::I32(5),
                Token::Char('b'),
                Token::I32(1),
                Token::Char('a'),
                Token::I32(2),
                Token::Char('c'),
                Token::MapEnd,
            ],
        );
    }

    #[test]
    fn serde_announced_length_ignored() {
        let map: ChainedHashMap<u64, i16> = ChainedHashMap::new(4).unwrap();
        assert!(map.insert(2, -6).is_none());
        assert_de_tokens(
            &map,
            &[
                Token::Map {
                    len: Some(1_usize << 40),
                },
                Token::U64(2),
                Token::I16(-6),
                Token::MapEnd,
            ],
        );
        assert_de_tokens(
            &map,
            &[
                Token::Map {
                    len: Some(usize::MAX),
                },
                Token::U64(2),
                Token::I16(-6),
                Token::MapEnd,
            ],
        );
    }

    #[test]
    fn serde_growth() {
        let small = ChainedHashMap::<u64, i16>::deserialize(MapDeserializer::<_, Error>::new(
            (0..32_u64).map(|k| (k, -1_i16)),
        ))
        .unwrap();
        assert_eq!(small.len(), 32);
        assert_eq!(small.num_buckets(), crate::DEFAULT_NUM_BUCKETS);

        let large = ChainedHashMap::<u64, i16>::deserialize(MapDeserializer::<_, Error>::new(
            (0..100_u64).map(|k| (k, i16::try_from(k).unwrap())),
        ))
        .unwrap();
        assert_eq!(large.len(), 100);
        assert_eq!(large.num_buckets(), 64);
        for k in 0..100_u64 {
            assert_eq!(large.get(&k), i16::try_from(k).ok());
            assert_eq!(large.bucket_index(&k), usize::try_from(k % 64).unwrap());
        }
    }
}
