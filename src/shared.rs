//! A shared, publishable trie root.
//!
//! [`IntTrie`] itself has no notion of "the current version". `SharedTrie`
//! holds one behind a lock so that readers take cheap snapshots while
//! writers either run a batch under a single [`Editor`] or publish a trie
//! they built elsewhere with [`SharedTrie::compare_and_set`].

use std::mem;

use parking_lot::RwLock;
use tracing::debug;

use crate::{Edit, Editor, IntTrie};

pub struct SharedTrie<V> {
    current: RwLock<IntTrie<V>>,
}

impl<V> SharedTrie<V> {
    pub fn new(trie: IntTrie<V>) -> Self {
        Self {
            current: RwLock::new(trie),
        }
    }

    /// The currently published trie. Later writes never affect it.
    pub fn snapshot(&self) -> IntTrie<V> {
        self.current.read().clone()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Publishes `new` if the current trie is still `expected`.
    ///
    /// On a conflict `new` is handed back so the caller can rebase and retry.
    pub fn compare_and_set(&self, expected: &IntTrie<V>, new: IntTrie<V>) -> Result<(), IntTrie<V>> {
        let mut current = self.current.write();
        if !current.ptr_eq(expected) {
            debug!("trie changed since snapshot, rejecting publish");
            return Err(new);
        }
        *current = new;
        Ok(())
    }

    /// Replaces the current trie and returns the previous one.
    pub fn replace(&self, trie: IntTrie<V>) -> IntTrie<V> {
        mem::replace(&mut *self.current.write(), trie)
    }
}

impl<V: Clone> SharedTrie<V> {
    /// Runs `f` against the current trie with one editor for all of its
    /// updates, then publishes the result.
    ///
    /// Writers are serialized. The batch starts from a clone of the current
    /// trie, so every node it touches is copied once and then edited in place
    /// under the batch editor. Nothing is published if `f` panics.
    pub fn batch<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Batch<V>) -> R,
    {
        let mut current = self.current.write();
        let mut batch = Batch {
            trie: current.clone(),
            editor: Editor::new(),
        };
        let result = f(&mut batch);
        debug!(entries = batch.trie.len(), "publishing batch");
        *current = batch.trie;
        result
    }
}

impl<V> Default for SharedTrie<V> {
    fn default() -> Self {
        Self::new(IntTrie::new())
    }
}

/// Transient view of a trie inside [`SharedTrie::batch`].
pub struct Batch<V> {
    trie: IntTrie<V>,
    editor: Editor,
}

impl<V> Batch<V> {
    pub fn get(&self, key: i32) -> Option<&V> {
        self.trie.get(key)
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.trie.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }
}

impl<V: Clone> Batch<V> {
    pub fn put(&mut self, key: i32, value: V) {
        self.trie.apply(self.editor.id(), key, |_| Edit::Set(value));
    }

    pub fn remove(&mut self, key: i32) {
        self.trie.apply(self.editor.id(), key, |_| Edit::Remove);
    }

    pub fn update<F>(&mut self, key: i32, f: F)
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        self.trie.apply(self.editor.id(), key, |current| match f(current) {
            Some(value) => Edit::Set(value),
            None => Edit::Remove,
        });
    }

    pub fn update_with<F>(&mut self, key: i32, f: F)
    where
        F: FnOnce(Option<&V>) -> Edit<V>,
    {
        self.trie.apply(self.editor.id(), key, f);
    }
}
