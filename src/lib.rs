//! An arena-backed red black tree and the deduplicating ordered set built on it.
//!
//! Keys are handled through a `KeyStrategy`, which tells the tree how to copy, compare and
//! release them. Types that are `Ord + Clone` can use the `Natural` strategy.

pub mod arena;
pub mod error;
pub mod key;
pub mod red_black_tree;

pub use crate::error::{Error, Result};
