//! Editor tokens for transient batches.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EDITOR: AtomicU64 = AtomicU64::new(1);

/// Owner stamp carried by every node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct EditorId(u64);

impl EditorId {
    /// Stamp of the canonical empty node; never handed out to an [`Editor`].
    pub(crate) const NONE: Self = Self(0);
}

/// Identity token scoping one batch of mutations.
///
/// Nodes created or copied while applying an update under an editor are
/// stamped with it, and later updates under the same editor may modify those
/// nodes in place instead of copying them again. Every `Editor::new()` is
/// distinct from every other, so a fresh editor per call gives fully
/// persistent updates.
///
/// The type is deliberately not `Clone`: two handles never share an identity.
#[derive(Debug)]
pub struct Editor {
    id: EditorId,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            id: EditorId(NEXT_EDITOR.fetch_add(1, Ordering::Relaxed)),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> EditorId {
        self.id
    }

    /// Resolves an optional caller token, drawing a single-use one if absent.
    #[inline]
    pub(crate) fn resolve(editor: Option<&Editor>) -> EditorId {
        match editor {
            Some(editor) => editor.id(),
            None => Editor::new().id(),
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
