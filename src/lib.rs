//! # persistent-int-trie
//!
//! A persistent map from `i32` keys to values, stored as a 32-way radix trie
//! over 5-bit slices of the key, least significant slice first.
//!
//! Every update returns a new [`IntTrie`] that shares all untouched nodes with
//! the old one; cloning a trie is a single reference-count bump. Updates that
//! belong to one batch can pass the same [`Editor`]: nodes created under that
//! editor and not visible from any other trie are then modified in place
//! instead of being copied again.
//!
//! ## Example
//!
//! ```rust
//! use persistent_int_trie::{Editor, IntTrie};
//!
//! let editor = Editor::new();
//! let trie = IntTrie::new()
//!     .put(Some(&editor), 5, "five")
//!     .put(Some(&editor), 37, "thirty-seven");
//!
//! let snapshot = trie.clone();
//! let trie = trie.remove(None, 37);
//!
//! assert_eq!(trie.get(5), Some(&"five"));
//! assert_eq!(trie.get(37), None);
//! assert_eq!(snapshot.get(37), Some(&"thirty-seven"));
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod bits;
mod editor;
mod error;
mod node;
mod plain;
pub mod shared;

pub use editor::Editor;
pub use error::InvariantError;
pub use node::Edit;
pub use shared::{Batch, SharedTrie};

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use crate::editor::EditorId;
use crate::node::{Effect, Node};

/// Shape and memory summary of a trie, see [`IntTrie::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieStats {
    /// Number of nodes, including the root.
    pub nodes: usize,
    /// Entries stored inline across all nodes.
    pub entries: usize,
    /// Child links created by slice collisions.
    pub collision_children: usize,
    /// Deepest level reached, the root being 0. Always below [`bits::MAX_DEPTH`].
    pub max_depth: usize,
    /// Approximate heap bytes held by the nodes.
    pub heap_bytes: usize,
}

/// Persistent radix trie keyed by `i32`.
///
/// An empty trie holds no root node at all; a trie whose last entry is
/// removed returns to that state.
pub struct IntTrie<V> {
    root: Option<Arc<Node<V>>>,
    len: usize,
}

impl<V> IntTrie<V> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Same as [`IntTrie::new`].
    pub fn empty() -> Self {
        Self::new()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: i32) -> Option<&V> {
        self.root.as_ref()?.get(key)
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.get(key).is_some()
    }

    /// Walks every entry until `visitor` breaks.
    ///
    /// Entries come slice by slice, not in key order: at each node the inline
    /// entries first, then each child subtree. A `Break` ends the whole walk
    /// and is returned as is.
    pub fn reduce<B, F>(&self, mut visitor: F) -> ControlFlow<B>
    where
        F: FnMut(i32, &V) -> ControlFlow<B>,
    {
        match &self.root {
            Some(root) => root.reduce(&mut visitor),
            None => ControlFlow::Continue(()),
        }
    }

    pub fn for_each<F>(&self, mut action: F)
    where
        F: FnMut(i32, &V),
    {
        let _: ControlFlow<()> = self.reduce(|key, value| {
            action(key, value);
            ControlFlow::Continue(())
        });
    }

    /// Iterates in the same order as [`IntTrie::reduce`].
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            stack: Vec::new(),
            current: self.root.as_deref(),
            pos: 0,
            remaining: self.len,
        }
    }

    /// Whether both tries share the same root allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn stats(&self) -> TrieStats {
        let mut stats = TrieStats::default();
        if let Some(root) = &self.root {
            root.collect_stats(0, &mut stats);
        }
        stats
    }

    /// Walks the whole node graph and reports the first structural defect.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let actual = match &self.root {
            Some(root) => root.check(0, 0, true)?,
            None => 0,
        };
        if actual != self.len {
            return Err(InvariantError::LengthMismatch {
                expected: self.len,
                actual,
            });
        }
        Ok(())
    }
}

impl<V: Clone> IntTrie<V> {
    /// Inserts or overwrites `key`.
    ///
    /// `None` uses a single-use editor, so nothing reachable from another
    /// trie is modified.
    pub fn put(mut self, editor: Option<&Editor>, key: i32, value: V) -> Self {
        self.apply(Editor::resolve(editor), key, |_| Edit::Set(value));
        self
    }

    pub fn remove(mut self, editor: Option<&Editor>, key: i32) -> Self {
        self.apply(Editor::resolve(editor), key, |_| Edit::Remove);
        self
    }

    /// Replaces the entry for `key` with `f(current)`.
    ///
    /// Returning `None` removes the entry; `None` for an absent key leaves
    /// the trie unchanged.
    pub fn update<F>(mut self, editor: Option<&Editor>, key: i32, f: F) -> Self
    where
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        self.apply(Editor::resolve(editor), key, |current| match f(current) {
            Some(value) => Edit::Set(value),
            None => Edit::Remove,
        });
        self
    }

    /// Like [`IntTrie::update`], but `f` can answer [`Edit::Keep`] to leave the
    /// entry alone without copying any node.
    pub fn update_with<F>(mut self, editor: Option<&Editor>, key: i32, f: F) -> Self
    where
        F: FnOnce(Option<&V>) -> Edit<V>,
    {
        self.apply(Editor::resolve(editor), key, f);
        self
    }

    pub(crate) fn apply<F>(&mut self, editor: EditorId, key: i32, f: F) -> Effect
    where
        F: FnOnce(Option<&V>) -> Edit<V>,
    {
        let mut root = self.root.take().unwrap_or_else(|| Arc::new(Node::empty()));
        let effect = Node::update(&mut root, editor, key, 0, f);
        match effect {
            Effect::Inserted => self.len += 1,
            Effect::Removed => self.len -= 1,
            Effect::Unchanged | Effect::Replaced => {}
        }
        self.root = if root.is_empty() { None } else { Some(root) };
        effect
    }
}

impl<V> Default for IntTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for IntTrie<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            len: self.len,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for IntTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: PartialEq> PartialEq for IntTrie<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<V: Eq> Eq for IntTrie<V> {}

/// Loads all pairs under one editor; later duplicates win.
impl<V: Clone> FromIterator<(i32, V)> for IntTrie<V> {
    fn from_iter<I: IntoIterator<Item = (i32, V)>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}

impl<V: Clone> Extend<(i32, V)> for IntTrie<V> {
    fn extend<I: IntoIterator<Item = (i32, V)>>(&mut self, iter: I) {
        let editor = Editor::new();
        for (key, value) in iter {
            self.apply(editor.id(), key, |_| Edit::Set(value));
        }
    }
}

impl<'a, V> IntoIterator for &'a IntTrie<V> {
    type Item = (i32, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, V> {
    stack: Vec<&'a Node<V>>,
    current: Option<&'a Node<V>>,
    /// Next inline entry of `current`.
    pos: usize,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (i32, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.current {
                if self.pos < node.keys.len() {
                    let i = self.pos;
                    self.pos += 1;
                    self.remaining -= 1;
                    return Some((node.keys[i], &node.values[i]));
                }
                self.stack.extend(node.children.iter().rev().map(|child| &**child));
                self.current = None;
            }
            self.current = Some(self.stack.pop()?);
            self.pos = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

#[cfg(test)]
impl<V> IntTrie<V> {
    fn root_slice_kind(&self, slice: u32) -> Option<node::SliceKind> {
        self.root.as_ref().map(|root| root.classify(slice))
    }

    fn root_addr(&self) -> Option<*const Node<V>> {
        self.root.as_ref().map(Arc::as_ptr)
    }
}


#[cfg(test)]
mod proptests;
