use crate::arena::Handle;
use crate::key::{KeyStrategy, Natural};
use crate::red_black_tree::tree::{Insertion, RedBlackTree, RedBlackTreeIter};
use log::{debug, trace};
use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::result;

/// An ordered set implemented using a red black tree.
///
/// Keys are copied into the set and handed back as copies, as dictated by the set's
/// `KeyStrategy`. Besides the usual membership operations the set keeps an internal cursor
/// that `iterate` walks in key order; the cursor survives insertions and deletions of other
/// keys and is moved forward when the key it points at is removed. `pop` always removes the key
/// currently at the root of the tree, so keys are drained in no particular order.
///
/// # Examples
///
/// ```
/// use redblack_set::red_black_tree::RedBlackSet;
///
/// let mut set = RedBlackSet::new();
/// assert!(set.insert(&3));
/// assert!(set.insert(&1));
/// assert!(set.insert(&3));
///
/// assert_eq!(set.len(), 2);
/// assert!(set.contains(&1));
///
/// set.reset_iterator();
/// assert_eq!(set.iterate(), Some(1));
/// assert_eq!(set.iterate(), Some(3));
/// assert_eq!(set.iterate(), None);
///
/// assert!(set.delete(&1));
/// assert_eq!(set.pop(), Some(3));
/// assert!(set.is_empty());
/// ```
pub struct RedBlackSet<T, S = Natural>
where
    S: KeyStrategy<T>,
{
    tree: RedBlackTree<T, S>,
    len: usize,
    cursor: Option<Handle>,
}

impl<T> RedBlackSet<T>
where
    T: Ord + Clone,
{
    /// Constructs a new, empty `RedBlackSet<T>` ordered by `T`'s natural ordering.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::red_black_tree::RedBlackSet;
    ///
    /// let set: RedBlackSet<u32> = RedBlackSet::new();
    /// ```
    pub fn new() -> Self {
        Self::with_strategy(Natural)
    }
}

impl<T, S> RedBlackSet<T, S>
where
    S: KeyStrategy<T>,
{
    /// Constructs a new, empty set that copies, compares and destroys keys with `strategy`.
    pub fn with_strategy(strategy: S) -> Self {
        Self::from_tree(RedBlackTree::new(strategy))
    }

    /// Constructs a new, empty set whose tree allocates nodes `chunk_size` at a time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::key::Natural;
    /// use redblack_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set: RedBlackSet<u32> = RedBlackSet::with_chunk_size(Natural, 8);
    /// assert!(set.insert(&1));
    /// ```
    pub fn with_chunk_size(strategy: S, chunk_size: usize) -> Self {
        Self::from_tree(RedBlackTree::with_chunk_size(strategy, chunk_size))
    }

    fn from_tree(tree: RedBlackTree<T, S>) -> Self {
        RedBlackSet {
            tree,
            len: 0,
            cursor: None,
        }
    }

    /// Adds a copy of `key` to the set. Returns `true` if the key is in the set afterwards,
    /// whether or not it was already present, and `false` if storage for it could not be
    /// allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// assert!(set.insert(&1));
    /// assert!(set.insert(&1));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, key: &T) -> bool {
        match self.tree.insert(key, true) {
            Ok(Insertion::Inserted(_)) => {
                self.len += 1;
                true
            },
            Ok(Insertion::Found(_)) => true,
            Err(err) => {
                debug!("rejecting set insertion: {}", err);
                false
            },
        }
    }

    /// Removes `key` from the set. Returns `false` if the key was not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(&1);
    /// assert!(set.delete(&1));
    /// assert!(!set.delete(&1));
    /// ```
    pub fn delete(&mut self, key: &T) -> bool {
        match self.tree.search(key) {
            Some(node) => {
                self.remove_node(node);
                true
            },
            None => false,
        }
    }

    fn remove_node(&mut self, node: Handle) {
        if self.cursor == Some(node) {
            self.cursor = self.tree.successor(node);
        }
        self.tree.delete_node(node);
        self.len -= 1;
    }

    /// Returns a copy of the key under the cursor and moves the cursor to the next key in order.
    /// Returns `None` once the cursor has run off the end; call `reset_iterator` to start over.
    ///
    /// Keys inserted behind the cursor after a reset are not visited.
    pub fn iterate(&mut self) -> Option<T> {
        let node = self.cursor?;
        let key = self.tree.strategy().copy(self.tree.key(node));
        self.cursor = self.tree.successor(node);
        Some(key)
    }

    /// Moves the cursor to the smallest key in the set.
    pub fn reset_iterator(&mut self) {
        self.cursor = self.tree.min();
    }

    /// Removes the key stored at the root of the tree and returns a copy of it. Returns `None` if
    /// the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(&1);
    /// set.insert(&2);
    ///
    /// let mut drained = vec![set.pop().unwrap(), set.pop().unwrap()];
    /// drained.sort();
    /// assert_eq!(drained, vec![1, 2]);
    /// assert_eq!(set.pop(), None);
    /// ```
    pub fn pop(&mut self) -> Option<T> {
        let root = self.tree.root()?;
        let key = self.tree.strategy().copy(self.tree.key(root));
        self.remove_node(root);
        Some(key)
    }

    /// Checks if a key exists in the set.
    pub fn contains(&self, key: &T) -> bool {
        self.tree.search(key).is_some()
    }

    /// Returns the number of distinct keys in the set.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the minimum key of the set. Returns `None` if the set is empty.
    pub fn min(&self) -> Option<&T> {
        self.tree.min().map(|node| self.tree.key(node))
    }

    /// Returns the maximum key of the set. Returns `None` if the set is empty.
    pub fn max(&self) -> Option<&T> {
        self.tree.max().map(|node| self.tree.key(node))
    }

    /// Returns the tree backing the set.
    pub fn tree(&self) -> &RedBlackTree<T, S> {
        &self.tree
    }

    /// Returns an iterator over the set. The iterator yields keys using in-order traversal and
    /// does not touch the cursor used by `iterate`.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(&3);
    /// set.insert(&1);
    ///
    /// let mut iterator = set.iter();
    /// assert_eq!(iterator.next(), Some(&1));
    /// assert_eq!(iterator.next(), Some(&3));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> RedBlackSetIter<'_, T, S> {
        RedBlackSetIter {
            tree_iter: self.tree.iter(),
        }
    }
}

impl<T, S> RedBlackSet<T, S>
where
    S: KeyStrategy<T> + Clone,
{
    /// Removes every key, replacing the tree with a fresh one that shares the same strategy and
    /// chunk size. The cursor is left exhausted.
    ///
    /// Unlike `insert`, this cannot fail: an empty tree allocates no node storage until its first
    /// insertion, so there is no failure to report and nothing is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use redblack_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(&1);
    /// set.insert(&2);
    /// set.clear();
    /// assert!(set.is_empty());
    /// assert_eq!(set.iterate(), None);
    /// ```
    pub fn clear(&mut self) {
        trace!("clearing set of {} keys", self.len);
        let strategy = self.tree.strategy().clone();
        self.tree = RedBlackTree::with_chunk_size(strategy, self.tree.chunk_size());
        self.len = 0;
        self.cursor = None;
    }
}

impl<T, S> Default for RedBlackSet<T, S>
where
    S: KeyStrategy<T> + Default,
{
    fn default() -> Self {
        Self::with_strategy(S::default())
    }
}

impl<T, S> fmt::Debug for RedBlackSet<T, S>
where
    T: fmt::Debug,
    S: KeyStrategy<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> PartialEq for RedBlackSet<T, S>
where
    S: KeyStrategy<T>,
{
    fn eq(&self, other: &Self) -> bool {
        let strategy = self.tree.strategy();
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| strategy.equal(a, b))
    }
}

/// Inserts keys until one cannot be stored. `Extend` has no way to report the failure, so the
/// remaining keys are skipped; callers that need to know should compare `len` or use `insert`.
impl<T, S> Extend<T> for RedBlackSet<T, S>
where
    S: KeyStrategy<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for key in iter {
            if !self.insert(&key) {
                debug!("abandoning extend after a failed insertion");
                break;
            }
        }
    }
}

impl<T, S> FromIterator<T> for RedBlackSet<T, S>
where
    S: KeyStrategy<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, S> IntoIterator for RedBlackSet<T, S>
where
    S: KeyStrategy<T>,
{
    type IntoIter = RedBlackSetIntoIter<T, S>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter { set: self }
    }
}

impl<'a, T, S> IntoIterator for &'a RedBlackSet<T, S>
where
    T: 'a,
    S: KeyStrategy<T>,
{
    type IntoIter = RedBlackSetIter<'a, T, S>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `RedBlackSet<T, S>`.
///
/// This iterator removes the keys of the set in-order and yields them.
pub struct RedBlackSetIntoIter<T, S>
where
    S: KeyStrategy<T>,
{
    set: RedBlackSet<T, S>,
}

impl<T, S> Iterator for RedBlackSetIntoIter<T, S>
where
    S: KeyStrategy<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = &self.set.tree;
        let node = tree.min()?;
        let key = tree.strategy().copy(tree.key(node));
        self.set.remove_node(node);
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len, Some(self.set.len))
    }
}

/// An iterator for `RedBlackSet<T, S>`.
///
/// This iterator traverses the elements of the set in-order and yields immutable references.
pub struct RedBlackSetIter<'a, T, S>
where
    T: 'a,
    S: KeyStrategy<T>,
{
    tree_iter: RedBlackTreeIter<'a, T, S>,
}

impl<'a, T, S> Iterator for RedBlackSetIter<'a, T, S>
where
    T: 'a,
    S: KeyStrategy<T>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.tree_iter.next()
    }
}

impl<T, S> Serialize for RedBlackSet<T, S>
where
    T: Serialize,
    S: KeyStrategy<T>,
{
    fn serialize<V>(&self, serializer: V) -> result::Result<V::Ok, V::Error>
    where
        V: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len))?;
        for key in self.iter() {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

struct RedBlackSetVisitor<T, S> {
    marker: PhantomData<fn() -> (T, S)>,
}

impl<'de, T, S> Visitor<'de> for RedBlackSetVisitor<T, S>
where
    T: Deserialize<'de>,
    S: KeyStrategy<T> + Default,
{
    type Value = RedBlackSet<T, S>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence of set keys")
    }

    fn visit_seq<A>(self, mut seq: A) -> result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut set = RedBlackSet::default();
        while let Some(key) = seq.next_element()? {
            if !set.insert(&key) {
                return Err(de::Error::custom("failed to allocate a set node"));
            }
        }
        Ok(set)
    }
}

impl<'de, T, S> Deserialize<'de> for RedBlackSet<T, S>
where
    T: Deserialize<'de>,
    S: KeyStrategy<T> + Default,
{
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(RedBlackSetVisitor {
            marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RedBlackSet;
    use crate::key::tests::CountingStrategy;
    use crate::key::Natural;
    use crate::red_black_tree::tree::tests::shape;
    use serde_test::{assert_tokens, Token};

    #[test]
    fn test_len_empty() {
        let set: RedBlackSet<u32> = RedBlackSet::new();
        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_min_max_empty() {
        let set: RedBlackSet<u32> = RedBlackSet::new();
        assert_eq!(set.min(), None);
        assert_eq!(set.max(), None);
    }

    #[test]
    fn test_insert() {
        let mut set = RedBlackSet::new();
        assert!(set.insert(&1));
        assert!(set.contains(&1));
        assert!(!set.contains(&2));
    }

    #[test]
    fn test_insert_duplicate_counts_once() {
        let mut set = RedBlackSet::new();
        for key in &[4, 2, 6] {
            set.insert(key);
        }
        let root = set.tree().root();
        let before = shape(set.tree());

        assert!(set.insert(&2));
        assert_eq!(set.len(), 3);
        assert_eq!(set.tree().root(), root);
        assert_eq!(shape(set.tree()), before);
        assert_eq!(set.tree().len(), 3);
        assert!(set.contains(&4) && set.contains(&6));
    }

    #[test]
    fn test_insert_allocation_failure() {
        let mut set: RedBlackSet<u32> = RedBlackSet::with_chunk_size(Natural, usize::MAX / 2);
        assert!(!set.insert(&1));
        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
        assert!(!set.contains(&1));
        assert_eq!(set.pop(), None);

        set.clear();
        assert_eq!(set.tree().chunk_size(), usize::MAX / 2);
        assert!(!set.insert(&1));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_extend_stops_at_allocation_failure() {
        let mut set: RedBlackSet<u32> = RedBlackSet::with_chunk_size(Natural, usize::MAX / 2);
        set.extend(vec![1, 2, 3]);
        assert!(set.is_empty());

        let mut set: RedBlackSet<u32> = RedBlackSet::with_chunk_size(Natural, 2);
        set.extend(vec![3, 1, 2, 1]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_delete() {
        let mut set = RedBlackSet::new();
        set.insert(&1);
        assert!(set.delete(&1));
        assert!(!set.contains(&1));
        assert!(!set.delete(&1));
        assert!(set.is_empty());
    }

    #[test]
    fn test_min_max() {
        let mut set = RedBlackSet::new();
        set.insert(&3);
        set.insert(&1);
        set.insert(&5);

        assert_eq!(set.min(), Some(&1));
        assert_eq!(set.max(), Some(&5));
    }

    #[test]
    fn test_iterate_without_reset() {
        let mut set = RedBlackSet::new();
        set.insert(&1);
        assert_eq!(set.iterate(), None);
    }

    #[test]
    fn test_iterate_survives_delete_of_cursor() {
        let mut set = RedBlackSet::new();
        for key in 1..=5 {
            set.insert(&key);
        }
        set.reset_iterator();
        assert_eq!(set.iterate(), Some(1));

        assert!(set.delete(&2));
        assert_eq!(set.iterate(), Some(3));

        assert!(set.delete(&1));
        assert!(set.insert(&6));
        assert_eq!(set.iterate(), Some(4));
        assert_eq!(set.iterate(), Some(5));
        assert_eq!(set.iterate(), Some(6));
        assert_eq!(set.iterate(), None);
    }

    #[test]
    fn test_iterate_survives_pop_of_cursor() {
        let mut set = RedBlackSet::new();
        for key in 1..=7 {
            set.insert(&key);
        }
        let root = *set.tree().key(set.tree().root().unwrap());

        set.reset_iterator();
        while set.iterate() != Some(root - 1) {}

        assert_eq!(set.pop(), Some(root));
        let rest: Vec<u32> = std::iter::from_fn(|| set.iterate()).collect();
        assert_eq!(rest, ((root + 1)..=7).collect::<Vec<u32>>());
    }

    #[test]
    fn test_pop_exhaustive() {
        let mut set = RedBlackSet::new();
        for key in 0..100u32 {
            set.insert(&((key * 7) % 100));
        }

        let mut popped = Vec::new();
        while let Some(key) = set.pop() {
            assert!(!set.contains(&key));
            popped.push(key);
        }
        popped.sort();

        assert_eq!(popped, (0..100).collect::<Vec<u32>>());
        assert!(set.is_empty());
        assert_eq!(set.tree().len(), 0);
    }

    #[test]
    fn test_clear() {
        let mut set = RedBlackSet::new();
        set.insert(&1);
        set.insert(&2);
        set.reset_iterator();
        set.clear();

        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
        assert_eq!(set.iterate(), None);

        set.insert(&3);
        set.reset_iterator();
        assert_eq!(set.iterate(), Some(3));
    }

    #[test]
    fn test_clear_destroys_keys() {
        let strategy = CountingStrategy::default();
        let live = strategy.live.clone();
        let mut set: RedBlackSet<u32, _> = RedBlackSet::with_strategy(strategy);
        for key in 0..20 {
            set.insert(&key);
        }
        assert_eq!(live.get(), 20);

        set.clear();
        assert_eq!(live.get(), 0);

        set.insert(&1);
        assert_eq!(set.pop(), Some(1));
        // the popped copy belongs to the caller
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn test_into_iter() {
        let mut set = RedBlackSet::new();
        set.insert(&1);
        set.insert(&5);
        set.insert(&3);

        assert_eq!(set.into_iter().collect::<Vec<u32>>(), vec![1, 3, 5]);
    }

    #[test]
    fn test_iter() {
        let mut set = RedBlackSet::new();
        set.insert(&1);
        set.insert(&5);
        set.insert(&3);

        assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&1, &3, &5]);
    }

    #[test]
    fn test_from_iter_and_debug() {
        let set: RedBlackSet<u32> = vec![3, 1, 2, 3].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert_eq!(format!("{:?}", set), "{1, 2, 3}");
    }

    #[test]
    fn test_ser_de() {
        let set: RedBlackSet<u32> = vec![2, 1, 3].into_iter().collect();
        assert_tokens(
            &set,
            &[
                Token::Seq { len: Some(3) },
                Token::U32(1),
                Token::U32(2),
                Token::U32(3),
                Token::SeqEnd,
            ],
        );
    }
}
