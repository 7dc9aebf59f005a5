//! Self-balancing binary search tree that uses a color bit to ensure that the tree remains
//! approximately balanced during insertions and deletions.
//!
//! Nodes live in a `TypedArena` and link to their parent and children by `Handle`, so the tree
//! can walk upwards without reference cycles. `RedBlackTree` exposes the node-level operations;
//! `RedBlackSet` builds a deduplicating set with a resumable cursor on top of it.

mod node;
mod set;
mod tree;

pub use self::node::Color;
pub use self::set::{RedBlackSet, RedBlackSetIntoIter, RedBlackSetIter};
pub use self::tree::{Insertion, RedBlackTree, RedBlackTreeIter, NODE_CHUNK_SIZE};
pub use crate::arena::Handle;
