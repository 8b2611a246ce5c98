//! Conversion between a trie and a plain `HashMap`, used for interchange.
//!
//! No structural information crosses this boundary: loading the same map
//! always rebuilds the same set of entries, whatever trie it came from.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::ops::ControlFlow;

use tracing::debug;

use crate::{Edit, Editor, IntTrie};

impl<V: Clone> IntTrie<V> {
    /// Copies every entry into a `HashMap`.
    pub fn to_plain_map(&self) -> HashMap<i32, V> {
        let mut map = HashMap::with_capacity(self.len());
        let _: ControlFlow<()> = self.reduce(|key, value| {
            map.insert(key, value.clone());
            ControlFlow::Continue(())
        });
        map
    }

    /// Builds a trie from a plain map as one batch under a single editor.
    pub fn from_plain_map<S: BuildHasher>(map: HashMap<i32, V, S>) -> Self {
        let mut trie = Self::new();
        let editor = Editor::new();
        for (key, value) in map {
            trie.apply(editor.id(), key, |_| Edit::Set(value));
        }
        debug!(entries = trie.len(), "loaded trie from plain map");
        trie
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use std::collections::HashMap;
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::IntTrie;

    impl<V: Serialize> Serialize for IntTrie<V> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self {
                map.serialize_entry(&key, value)?;
            }
            map.end()
        }
    }

    struct IntTrieVisitor<V> {
        marker: PhantomData<V>,
    }

    impl<'de, V> Visitor<'de> for IntTrieVisitor<V>
    where
        V: Deserialize<'de> + Clone,
    {
        type Value = IntTrie<V>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map with i32 keys")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = HashMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<i32, V>()? {
                map.insert(key, value);
            }
            Ok(IntTrie::from_plain_map(map))
        }
    }

    impl<'de, V> Deserialize<'de> for IntTrie<V>
    where
        V: Deserialize<'de> + Clone,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_map(IntTrieVisitor { marker: PhantomData })
        }
    }
}
