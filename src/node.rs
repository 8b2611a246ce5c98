//! Trie nodes.
//!
//! Each node covers one 5-bit slice of the key. A slice is either absent,
//! stored inline as a key/value pair, or delegated to a child node when two or
//! more keys share it. Nodes carry the [`EditorId`] of the batch that created
//! them; only a node stamped with the caller's editor and not shared with
//! another root is modified in place.

use std::mem;
use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::trace;

use crate::bits::{bits_before, get_bit, set_bit, slice_at, unset_bit, BITS_PER_LEVEL, MAX_SHIFT};
use crate::editor::EditorId;
use crate::error::InvariantError;
use crate::TrieStats;

/// Outcome of an update closure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit<V> {
    /// Leave the entry as it is. No node is copied.
    Keep,
    /// Delete the entry. A no-op when the key is absent.
    Remove,
    /// Insert or overwrite the entry.
    Set(V),
}

/// Effect of an update on the number of entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Effect {
    Unchanged,
    Inserted,
    Replaced,
    Removed,
}

/// What a node holds for one slice, with the packed position where relevant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SliceKind {
    Absent,
    Data(usize),
    Collision(usize),
}

#[derive(Clone)]
pub(crate) struct Node<V> {
    pub(crate) data_map: u32,
    pub(crate) collisions_map: u32,
    /// Inline keys in ascending slice order.
    pub(crate) keys: Vec<i32>,
    /// Values parallel to `keys`.
    pub(crate) values: Vec<V>,
    /// Collision children in ascending slice order.
    pub(crate) children: Vec<Arc<Node<V>>>,
    editor: EditorId,
}

impl<V> Node<V> {
    pub(crate) fn empty() -> Self {
        Self {
            data_map: 0,
            collisions_map: 0,
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
            editor: EditorId::NONE,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.data_map == 0 && self.collisions_map == 0
    }

    #[inline]
    fn is_singleton(&self) -> bool {
        self.collisions_map == 0 && self.keys.len() == 1
    }

    #[inline]
    pub(crate) fn classify(&self, slice: u32) -> SliceKind {
        match (get_bit(self.data_map, slice), get_bit(self.collisions_map, slice)) {
            (false, false) => SliceKind::Absent,
            (true, false) => SliceKind::Data(bits_before(self.data_map, slice)),
            (false, true) => SliceKind::Collision(bits_before(self.collisions_map, slice)),
            (true, true) => unreachable!("slice {slice} is marked as both data and collision"),
        }
    }

    pub(crate) fn get(&self, key: i32) -> Option<&V> {
        let mut node = self;
        let mut shift = 0;
        loop {
            match node.classify(slice_at(key, shift)) {
                SliceKind::Absent => return None,
                SliceKind::Data(idx) => {
                    // A data slot for this slice may still hold a different key.
                    return if node.keys[idx] == key {
                        Some(&node.values[idx])
                    } else {
                        None
                    };
                }
                SliceKind::Collision(cidx) => {
                    node = &*node.children[cidx];
                    shift += BITS_PER_LEVEL;
                }
            }
        }
    }

    /// Visits inline entries first, then each child in slice order. A `Break`
    /// from the visitor stops the whole traversal.
    pub(crate) fn reduce<B, F>(&self, visitor: &mut F) -> ControlFlow<B>
    where
        F: FnMut(i32, &V) -> ControlFlow<B>,
    {
        for (&key, value) in self.keys.iter().zip(&self.values) {
            visitor(key, value)?;
        }
        for child in &self.children {
            child.reduce(visitor)?;
        }
        ControlFlow::Continue(())
    }

    fn insert_data(&mut self, slice: u32, key: i32, value: V) {
        let idx = bits_before(self.data_map, slice);
        self.data_map = set_bit(self.data_map, slice);
        self.keys.insert(idx, key);
        self.values.insert(idx, value);
    }

    fn remove_data(&mut self, slice: u32, idx: usize) -> (i32, V) {
        self.data_map = unset_bit(self.data_map, slice);
        (self.keys.remove(idx), self.values.remove(idx))
    }

    fn insert_child(&mut self, slice: u32, child: Arc<Self>) {
        let cidx = bits_before(self.collisions_map, slice);
        self.collisions_map = set_bit(self.collisions_map, slice);
        self.children.insert(cidx, child);
    }

    pub(crate) fn collect_stats(&self, depth: usize, stats: &mut TrieStats) {
        stats.nodes += 1;
        stats.entries += self.keys.len();
        stats.collision_children += self.children.len();
        stats.max_depth = stats.max_depth.max(depth);
        // Arc header: strong and weak counts.
        stats.heap_bytes += 2 * mem::size_of::<usize>()
            + mem::size_of::<Self>()
            + self.keys.capacity() * mem::size_of::<i32>()
            + self.values.capacity() * mem::size_of::<V>()
            + self.children.capacity() * mem::size_of::<Arc<Self>>();
        for child in &self.children {
            child.collect_stats(depth + 1, stats);
        }
    }

    /// Validates this subtree and returns the number of entries in it.
    ///
    /// `prefix` holds the slices of the path from the root, i.e. the low
    /// `shift` bits every key below this node must carry.
    pub(crate) fn check(&self, shift: u32, prefix: u32, is_root: bool) -> Result<usize, InvariantError> {
        if shift > MAX_SHIFT {
            return Err(InvariantError::TooDeep { shift });
        }
        let overlap = self.data_map & self.collisions_map;
        if overlap != 0 {
            return Err(InvariantError::OverlappingMaps {
                shift,
                slice: overlap.trailing_zeros(),
            });
        }
        let data_bits = self.data_map.count_ones();
        if self.keys.len() != data_bits as usize || self.values.len() != data_bits as usize {
            return Err(InvariantError::DataArity {
                shift,
                bits: data_bits,
                keys: self.keys.len(),
                values: self.values.len(),
            });
        }
        let collision_bits = self.collisions_map.count_ones();
        if self.children.len() != collision_bits as usize {
            return Err(InvariantError::ChildArity {
                shift,
                bits: collision_bits,
                children: self.children.len(),
            });
        }
        if !is_root && self.is_empty() {
            return Err(InvariantError::EmptyChild { shift });
        }

        let low_mask = (1u32 << shift) - 1;
        for (slice, &key) in set_bits(self.data_map).zip(&self.keys) {
            if slice_at(key, shift) != slice || (key as u32) & low_mask != prefix {
                return Err(InvariantError::MisplacedKey { key, shift, slice });
            }
        }

        let mut count = self.keys.len();
        for (slice, child) in set_bits(self.collisions_map).zip(&self.children) {
            if child.is_singleton() {
                return Err(InvariantError::UncollapsedChild { shift, slice });
            }
            count += child.check(shift + BITS_PER_LEVEL, prefix | (slice << shift), false)?;
        }
        Ok(count)
    }
}

impl<V: Clone> Node<V> {
    /// Returns a node that may be modified for `editor`: `this` itself when it
    /// is stamped with `editor` and not shared, otherwise a fresh copy.
    fn editable(this: &mut Arc<Self>, editor: EditorId) -> &mut Self {
        if this.editor != editor {
            let mut copy = Node::clone(&**this);
            copy.editor = editor;
            *this = Arc::new(copy);
        }
        Arc::make_mut(this)
    }

    /// Applies `f` to the entry for `key` in the subtree rooted at `this`.
    ///
    /// `this` is left untouched when the result is [`Effect::Unchanged`].
    pub(crate) fn update<F>(this: &mut Arc<Self>, editor: EditorId, key: i32, shift: u32, f: F) -> Effect
    where
        F: FnOnce(Option<&V>) -> Edit<V>,
    {
        let slice = slice_at(key, shift);
        match this.classify(slice) {
            SliceKind::Absent => match f(None) {
                Edit::Set(value) => {
                    Self::editable(this, editor).insert_data(slice, key, value);
                    Effect::Inserted
                }
                Edit::Keep | Edit::Remove => Effect::Unchanged,
            },
            SliceKind::Data(idx) if this.keys[idx] == key => match f(Some(&this.values[idx])) {
                Edit::Keep => Effect::Unchanged,
                Edit::Remove => {
                    Self::editable(this, editor).remove_data(slice, idx);
                    Effect::Removed
                }
                Edit::Set(value) => {
                    Self::editable(this, editor).values[idx] = value;
                    Effect::Replaced
                }
            },
            SliceKind::Data(idx) => match f(None) {
                Edit::Set(value) => {
                    let node = Self::editable(this, editor);
                    let (existing_key, existing_value) = node.remove_data(slice, idx);
                    trace!(
                        key = key,
                        existing_key = existing_key,
                        shift = shift,
                        "slice collision, pushing both keys down"
                    );
                    let child = Self::make_collision(
                        key,
                        value,
                        existing_key,
                        existing_value,
                        shift + BITS_PER_LEVEL,
                        editor,
                    );
                    node.insert_child(slice, Arc::new(child));
                    Effect::Inserted
                }
                Edit::Keep | Edit::Remove => Effect::Unchanged,
            },
            SliceKind::Collision(cidx) => Self::update_child(this, editor, key, shift, slice, cidx, f),
        }
    }

    fn update_child<F>(
        this: &mut Arc<Self>,
        editor: EditorId,
        key: i32,
        shift: u32,
        slice: u32,
        cidx: usize,
        f: F,
    ) -> Effect
    where
        F: FnOnce(Option<&V>) -> Edit<V>,
    {
        let child_shift = shift + BITS_PER_LEVEL;

        // Owned parent: edit the child slot directly so owned children are
        // not copied either.
        if this.editor == editor {
            if let Some(node) = Arc::get_mut(this) {
                let effect = Self::update(&mut node.children[cidx], editor, key, child_shift, f);
                if effect != Effect::Unchanged {
                    node.collapse_child(slice, cidx, shift);
                }
                return effect;
            }
        }

        let mut child = Arc::clone(&this.children[cidx]);
        let effect = Self::update(&mut child, editor, key, child_shift, f);
        if effect == Effect::Unchanged {
            return effect;
        }
        let node = Self::editable(this, editor);
        node.children[cidx] = child;
        node.collapse_child(slice, cidx, shift);
        effect
    }

    /// Pulls the child at `cidx` back into an inline entry if it has shrunk to
    /// a single entry.
    fn collapse_child(&mut self, slice: u32, cidx: usize, shift: u32) {
        let child = &self.children[cidx];
        if child.collisions_map != 0 || child.keys.len() > 1 {
            return;
        }
        let child = self.children.remove(cidx);
        self.collisions_map = unset_bit(self.collisions_map, slice);
        if let Some((key, value)) = Self::into_sole_entry(child) {
            trace!(key = key, shift = shift, "collapsing single-entry child");
            self.insert_data(slice, key, value);
        }
    }

    fn into_sole_entry(this: Arc<Self>) -> Option<(i32, V)> {
        match Arc::try_unwrap(this) {
            Ok(mut node) => Some((node.keys.pop()?, node.values.pop()?)),
            Err(shared) => Some((*shared.keys.first()?, shared.values.first()?.clone())),
        }
    }

    /// Builds the smallest subtree separating two distinct keys that share
    /// every slice below `shift`.
    fn make_collision(k1: i32, v1: V, k2: i32, v2: V, shift: u32, editor: EditorId) -> Self {
        assert!(
            shift <= MAX_SHIFT,
            "keys {k1} and {k2} cannot be separated below shift {shift}"
        );
        let s1 = slice_at(k1, shift);
        let s2 = slice_at(k2, shift);
        if s1 == s2 {
            let child = Self::make_collision(k1, v1, k2, v2, shift + BITS_PER_LEVEL, editor);
            return Self {
                data_map: 0,
                collisions_map: set_bit(0, s1),
                keys: Vec::new(),
                values: Vec::new(),
                children: vec![Arc::new(child)],
                editor,
            };
        }

        let ((lo_key, lo_value), (hi_key, hi_value)) = if s1 < s2 {
            ((k1, v1), (k2, v2))
        } else {
            ((k2, v2), (k1, v1))
        };
        Self {
            data_map: set_bit(set_bit(0, s1), s2),
            collisions_map: 0,
            keys: vec![lo_key, hi_key],
            values: vec![lo_value, hi_value],
            children: Vec::new(),
            editor,
        }
    }
}

fn set_bits(map: u32) -> impl Iterator<Item = u32> {
    (0..32).filter(move |&i| get_bit(map, i))
}
