//! Slab storage for tree nodes.

use crate::error::Result;
use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A stable reference to a value stored in a `TypedArena<T>`.
///
/// Handles stay valid until the value they refer to is freed. Once freed, the slot may be
/// handed out again by a later allocation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle {
    chunk_index: usize,
    block_index: usize,
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<Handle>),
}

/// An allocator for a single type of object, backed by fixed-size chunks of `Vec`s.
///
/// Chunks are never reallocated once created, so growing the arena never moves existing
/// objects. Freed slots are threaded onto a free list and reused before a new chunk is
/// requested. Every value still stored is dropped when the arena is dropped.
///
/// # Examples
///
/// ```
/// use redblack_set::arena::TypedArena;
///
/// let mut arena = TypedArena::new(64);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena.free(x), 2);
/// assert!(arena.is_empty());
/// ```
pub struct TypedArena<T> {
    head: Option<Handle>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    size: usize,
    capacity: usize,
}

impl<T> TypedArena<T> {
    fn is_valid_handle(&self, handle: Handle) -> bool {
        handle.chunk_index < self.chunks.len()
            && handle.block_index < self.chunks[handle.chunk_index].len()
    }

    /// Constructs a new, empty `TypedArena<T>` holding `chunk_size` objects per chunk.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::arena::TypedArena;
    ///
    /// let arena: TypedArena<u32> = TypedArena::new(1024);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Error: chunk size must be positive.");
        TypedArena {
            head: None,
            chunks: Vec::new(),
            chunk_size,
            size: 0,
            capacity: 0,
        }
    }

    /// Makes sure the next call to `allocate` will not need to request memory. Returns an error
    /// and leaves the arena untouched if the allocator refuses the request.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// arena.try_reserve_one().unwrap();
    /// let x = arena.allocate("a");
    /// assert_eq!(arena.get(x), Some(&"a"));
    /// ```
    pub fn try_reserve_one(&mut self) -> Result<()> {
        if self.head.is_some() || self.size < self.capacity {
            return Ok(());
        }
        self.chunks.try_reserve(1)?;
        let mut chunk = Vec::new();
        chunk.try_reserve_exact(self.chunk_size)?;
        self.chunks.push(chunk);
        self.capacity += self.chunk_size;
        Ok(())
    }

    /// Stores `value` and returns its handle, or an error if a new chunk could not be
    /// allocated. On error the value is dropped and the arena is unchanged.
    pub fn try_allocate(&mut self, value: T) -> Result<Handle> {
        self.try_reserve_one()?;
        Ok(self.allocate(value))
    }

    /// Stores `value` in the arena and returns a handle that can later be used to access or
    /// free it.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.len(), 1);
    /// ```
    pub fn allocate(&mut self, value: T) -> Handle {
        self.size += 1;

        match self.head.take() {
            Some(handle) => {
                let vacant_block = mem::replace(
                    &mut self.chunks[handle.chunk_index][handle.block_index],
                    Block::Occupied(value),
                );
                match vacant_block {
                    Block::Vacant(next) => self.head = next,
                    Block::Occupied(_) => unreachable!(),
                }
                handle
            },
            None => {
                if self.size > self.capacity {
                    self.chunks.push(Vec::with_capacity(self.chunk_size));
                    self.capacity += self.chunk_size;
                }
                let chunk_index = self.chunks.len() - 1;
                let chunk = &mut self.chunks[chunk_index];
                chunk.push(Block::Occupied(value));
                Handle {
                    chunk_index,
                    block_index: chunk.len() - 1,
                }
            },
        }
    }

    /// Removes the value referred to by `handle` from the arena and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is out of range or refers to a slot that was already freed.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(16);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.free(x), 0);
    /// ```
    pub fn free(&mut self, handle: Handle) -> T {
        if !self.is_valid_handle(handle) {
            panic!("Error: attempting to free invalid block.");
        }
        let slot = &mut self.chunks[handle.chunk_index][handle.block_index];
        if let Block::Vacant(_) = slot {
            panic!("Error: attempting to free vacant block.");
        }
        match mem::replace(slot, Block::Vacant(self.head.take())) {
            Block::Occupied(value) => {
                self.size -= 1;
                self.head = Some(handle);
                value
            },
            Block::Vacant(_) => unreachable!(),
        }
    }

    /// Returns a reference to the value behind `handle`, or `None` if the handle is out of
    /// range or has been freed.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        if !self.is_valid_handle(handle) {
            return None;
        }
        match self.chunks[handle.chunk_index][handle.block_index] {
            Block::Occupied(ref value) => Some(value),
            Block::Vacant(_) => None,
        }
    }

    /// Returns a mutable reference to the value behind `handle`, or `None` if the handle is out
    /// of range or has been freed.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if !self.is_valid_handle(handle) {
            return None;
        }
        match self.chunks[handle.chunk_index][handle.block_index] {
            Block::Occupied(ref mut value) => Some(value),
            Block::Vacant(_) => None,
        }
    }

    /// Returns the number of values each chunk holds.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the number of live values in the arena.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the arena holds no live values.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl<T> Index<Handle> for TypedArena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &Self::Output {
        self.get(handle).expect("Error: handle does not refer to a live value.")
    }
}

impl<T> IndexMut<Handle> for TypedArena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        self.get_mut(handle)
            .expect("Error: handle does not refer to a live value.")
    }
}

#[cfg(test)]
mod tests {
    use super::{Handle, TypedArena};

    #[test]
    #[should_panic]
    fn test_free_invalid_block() {
        let mut arena: TypedArena<u32> = TypedArena::new(4);
        arena.free(Handle {
            chunk_index: 0,
            block_index: 0,
        });
    }

    #[test]
    #[should_panic]
    fn test_free_twice() {
        let mut arena = TypedArena::new(4);
        let x = arena.allocate(0);
        arena.free(x);
        arena.free(x);
    }

    #[test]
    fn test_allocate_spans_chunks() {
        let mut arena = TypedArena::new(2);
        let handles: Vec<Handle> = (0..5).map(|i| arena.allocate(i)).collect();
        assert_eq!(handles[1], Handle { chunk_index: 0, block_index: 1 });
        assert_eq!(handles[2], Handle { chunk_index: 1, block_index: 0 });
        assert_eq!(handles[4], Handle { chunk_index: 2, block_index: 0 });
        assert_eq!(arena.len(), 5);
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(arena[handle], i);
        }
    }

    #[test]
    fn test_free_list_reuse() {
        let mut arena = TypedArena::new(4);
        let a = arena.allocate('a');
        let b = arena.allocate('b');
        arena.free(a);
        arena.free(b);
        assert!(arena.is_empty());
        assert_eq!(arena.allocate('c'), b);
        assert_eq!(arena.allocate('d'), a);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_get_vacant_block() {
        let mut arena = TypedArena::new(4);
        let x = arena.allocate(7);
        assert_eq!(arena.get(x), Some(&7));
        arena.free(x);
        assert_eq!(arena.get(x), None);
        assert_eq!(arena.get_mut(x), None);
    }

    #[test]
    fn test_try_allocate() {
        let mut arena = TypedArena::new(1);
        let x = arena.try_allocate(1).unwrap();
        let y = arena.try_allocate(2).unwrap();
        *arena.get_mut(x).unwrap() += 10;
        assert_eq!(arena[x], 11);
        assert_eq!(arena[y], 2);
    }
}
