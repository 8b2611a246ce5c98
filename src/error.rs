use thiserror::Error;

/// Structural defect found by [`IntTrie::check_invariants`](crate::IntTrie::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("slice {slice} at shift {shift} is marked as both data and collision")]
    OverlappingMaps { shift: u32, slice: u32 },
    #[error("node at shift {shift} holds {keys} keys and {values} values for {bits} data bits")]
    DataArity {
        shift: u32,
        bits: u32,
        keys: usize,
        values: usize,
    },
    #[error("node at shift {shift} holds {children} children for {bits} collision bits")]
    ChildArity {
        shift: u32,
        bits: u32,
        children: usize,
    },
    #[error("key {key} is stored under slice {slice} at shift {shift} but does not belong there")]
    MisplacedKey { key: i32, shift: u32, slice: u32 },
    #[error("collision child for slice {slice} at shift {shift} holds a single entry")]
    UncollapsedChild { shift: u32, slice: u32 },
    #[error("empty node below the root at shift {shift}")]
    EmptyChild { shift: u32 },
    #[error("collision child below the last level at shift {shift}")]
    TooDeep { shift: u32 },
    #[error("trie reports {expected} entries but holds {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}
