use crate::arena::{Handle, TypedArena};
use crate::error::Result;
use crate::key::KeyStrategy;
use crate::red_black_tree::node::{Color, Direction, Link, Node};

/// Number of nodes stored per arena chunk unless a tree is built with
/// `RedBlackTree::with_chunk_size`.
pub const NODE_CHUNK_SIZE: usize = 64;

/// The outcome of `RedBlackTree::insert`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Insertion {
    /// A new node holding a copy of the key was added.
    Inserted(Handle),
    /// Duplicates were refused and an equal key was already stored in this node.
    Found(Handle),
}

impl Insertion {
    /// Returns the node that holds the key.
    pub fn node(self) -> Handle {
        match self {
            Insertion::Inserted(node) | Insertion::Found(node) => node,
        }
    }

    /// Returns `true` if the insertion created a new node.
    pub fn is_inserted(self) -> bool {
        match self {
            Insertion::Inserted(_) => true,
            Insertion::Found(_) => false,
        }
    }
}

/// A red black tree whose nodes live in an arena and whose keys are handled by a
/// `KeyStrategy`.
///
/// Nodes are addressed by `Handle`s. A handle returned by the tree stays valid until its node is
/// deleted; passing a deleted or foreign handle back to the tree is a caller bug and may panic.
///
/// # Examples
///
/// ```
/// use redblack_set::key::Natural;
/// use redblack_set::red_black_tree::RedBlackTree;
///
/// let mut tree = RedBlackTree::new(Natural);
/// for key in &[5, 3, 8] {
///     tree.insert(key, true).unwrap();
/// }
///
/// let min = tree.min().unwrap();
/// assert_eq!(tree.key(min), &3);
/// let next = tree.successor(min).unwrap();
/// assert_eq!(tree.key(next), &5);
///
/// tree.delete_node(next);
/// assert!(tree.search(&5).is_none());
/// assert_eq!(tree.len(), 2);
/// ```
pub struct RedBlackTree<T, S>
where
    S: KeyStrategy<T>,
{
    arena: TypedArena<Node<T>>,
    root: Link,
    strategy: S,
}

impl<T, S> RedBlackTree<T, S>
where
    S: KeyStrategy<T>,
{
    /// Constructs a new, empty tree that handles keys with `strategy`.
    pub fn new(strategy: S) -> Self {
        Self::with_chunk_size(strategy, NODE_CHUNK_SIZE)
    }

    /// Constructs a new, empty tree that allocates nodes `chunk_size` at a time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn with_chunk_size(strategy: S, chunk_size: usize) -> Self {
        RedBlackTree {
            arena: TypedArena::new(chunk_size),
            root: None,
            strategy,
        }
    }

    /// Returns the strategy used to copy, compare and destroy keys.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Returns the number of nodes allocated at a time when the tree grows.
    pub fn chunk_size(&self) -> usize {
        self.arena.chunk_size()
    }

    /// Returns the root node, or `None` if the tree is empty.
    pub fn root(&self) -> Option<Handle> {
        self.root
    }

    /// Returns the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns `true` if `node` is the end-of-tree marker.
    pub fn is_nil(&self, node: Option<Handle>) -> bool {
        node.is_none()
    }

    /// Returns the key stored in `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a live node of this tree.
    pub fn key(&self, node: Handle) -> &T {
        &self.arena[node].key
    }

    /// Returns the key stored in `node`, or `None` if the handle is stale.
    pub fn get(&self, node: Handle) -> Option<&T> {
        self.arena.get(node).map(|node| &node.key)
    }

    /// Returns the color of `node`.
    pub fn color(&self, node: Handle) -> Color {
        self.arena[node].color
    }

    fn color_of(&self, link: Link) -> Color {
        match link {
            Some(node) => self.arena[node].color,
            None => Color::Black,
        }
    }

    // precondition: node has a parent
    fn child_direction(&self, node: Handle) -> Direction {
        let parent = self.arena[node]
            .parent
            .expect("Expected node to have a parent.");
        if self.arena[parent].left() == Some(node) {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    /// Rotates the subtree rooted at `node` in direction `dir`. The child of `node` on the
    /// opposite side becomes the new subtree root.
    fn rotate(&mut self, node: Handle, dir: Direction) {
        let opp = dir.opposite();
        let pivot = self.arena[node]
            .child(opp)
            .expect("Expected pivot of rotation to be `Some`.");
        let parent = self.arena[node].parent;

        match parent {
            None => self.root = Some(pivot),
            Some(parent) => {
                let node_dir = self.child_direction(node);
                self.arena[parent].set_child(node_dir, Some(pivot));
            },
        }
        self.arena[pivot].parent = parent;

        let inner = self.arena[pivot].child(dir);
        self.arena[node].set_child(opp, inner);
        if let Some(inner) = inner {
            self.arena[inner].parent = Some(node);
        }

        self.arena[pivot].set_child(dir, Some(node));
        self.arena[node].parent = Some(pivot);
    }

    fn minimum(&self, mut node: Handle) -> Handle {
        while let Some(left) = self.arena[node].left() {
            node = left;
        }
        node
    }

    fn maximum(&self, mut node: Handle) -> Handle {
        while let Some(right) = self.arena[node].right() {
            node = right;
        }
        node
    }

    /// Returns the node with the smallest key, or `None` if the tree is empty.
    pub fn min(&self) -> Option<Handle> {
        self.root.map(|root| self.minimum(root))
    }

    /// Returns the node with the largest key, or `None` if the tree is empty.
    pub fn max(&self) -> Option<Handle> {
        self.root.map(|root| self.maximum(root))
    }

    /// Returns the node that follows `node` in key order, or `None` if `node` holds the largest
    /// key.
    pub fn successor(&self, node: Handle) -> Option<Handle> {
        self.step(node, Direction::Right)
    }

    /// Returns the node that precedes `node` in key order, or `None` if `node` holds the
    /// smallest key.
    pub fn predecessor(&self, node: Handle) -> Option<Handle> {
        self.step(node, Direction::Left)
    }

    fn step(&self, node: Handle, dir: Direction) -> Option<Handle> {
        if let Some(child) = self.arena[node].child(dir) {
            return Some(match dir {
                Direction::Right => self.minimum(child),
                Direction::Left => self.maximum(child),
            });
        }

        let mut curr = node;
        let mut parent = self.arena[node].parent;
        while let Some(ancestor) = parent {
            if self.arena[ancestor].child(dir) != Some(curr) {
                break;
            }
            curr = ancestor;
            parent = self.arena[ancestor].parent;
        }
        parent
    }

    /// Returns the node holding a key equal to `key`, or `None` if there is none.
    pub fn search(&self, key: &T) -> Option<Handle> {
        let mut curr = self.root;
        while let Some(node) = curr {
            let node_key = &self.arena[node].key;
            if self.strategy.equal(key, node_key) {
                return Some(node);
            }
            curr = if self.strategy.less(key, node_key) {
                self.arena[node].left()
            } else {
                self.arena[node].right()
            };
        }
        None
    }

    /// Inserts a copy of `key`. If `no_duplicates` is set and an equal key is already stored,
    /// the tree is left untouched and the existing node is returned as `Insertion::Found`.
    ///
    /// Returns an error, leaving the tree unchanged, if storage for the node could not be
    /// allocated.
    pub fn insert(&mut self, key: &T, no_duplicates: bool) -> Result<Insertion> {
        let mut parent = None;
        let mut dir = Direction::Left;
        let mut curr = self.root;
        while let Some(node) = curr {
            let node_key = &self.arena[node].key;
            if no_duplicates && self.strategy.equal(key, node_key) {
                return Ok(Insertion::Found(node));
            }
            dir = if self.strategy.less(key, node_key) {
                Direction::Left
            } else {
                Direction::Right
            };
            parent = Some(node);
            curr = self.arena[node].child(dir);
        }

        self.arena.try_reserve_one()?;
        let node = self.arena.allocate(Node::new(self.strategy.copy(key), parent));
        match parent {
            None => self.root = Some(node),
            Some(parent) => self.arena[parent].set_child(dir, Some(node)),
        }

        self.insert_fixup(node);
        Ok(Insertion::Inserted(node))
    }

    fn insert_fixup(&mut self, mut node: Handle) {
        while let Some(parent) = self.arena[node].parent {
            if self.arena[parent].color == Color::Black {
                break;
            }
            let grandparent = self.arena[parent]
                .parent
                .expect("Expected a red node to have a parent.");
            let parent_dir = self.child_direction(parent);
            let uncle = self.arena[grandparent].child(parent_dir.opposite());

            match uncle {
                Some(uncle) if self.arena[uncle].color == Color::Red => {
                    self.arena[uncle].color = Color::Black;
                    self.arena[parent].color = Color::Black;
                    self.arena[grandparent].color = Color::Red;
                    node = grandparent;
                },
                _ => {
                    let mut parent = parent;
                    if self.child_direction(node) != parent_dir {
                        self.rotate(parent, parent_dir);
                        node = parent;
                        parent = self.arena[node]
                            .parent
                            .expect("Expected rotated node to have a parent.");
                    }
                    self.arena[parent].color = Color::Black;
                    self.arena[grandparent].color = Color::Red;
                    self.rotate(grandparent, parent_dir.opposite());
                },
            }
        }

        if let Some(root) = self.root {
            self.arena[root].color = Color::Black;
        }
    }

    /// Replaces the subtree rooted at `old` with the subtree rooted at `new` in `old`'s parent.
    fn transplant(&mut self, old: Handle, new: Link) {
        let parent = self.arena[old].parent;
        match parent {
            None => self.root = new,
            Some(parent) => {
                let dir = self.child_direction(old);
                self.arena[parent].set_child(dir, new);
            },
        }
        if let Some(new) = new {
            self.arena[new].parent = parent;
        }
    }

    /// Removes `node` from the tree and destroys its key.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a live node of this tree.
    pub fn delete_node(&mut self, node: Handle) {
        let Node {
            color,
            parent,
            children: [left, right],
            ..
        } = self.arena[node];
        let mut removed_color = color;
        let replacement;
        let replacement_parent;

        match (left, right) {
            (None, _) => {
                replacement = right;
                replacement_parent = parent;
                self.transplant(node, right);
            },
            (_, None) => {
                replacement = left;
                replacement_parent = parent;
                self.transplant(node, left);
            },
            (Some(left), Some(right)) => {
                let successor = self.minimum(right);
                removed_color = self.arena[successor].color;
                replacement = self.arena[successor].right();

                if successor == right {
                    replacement_parent = Some(successor);
                } else {
                    replacement_parent = self.arena[successor].parent;
                    self.transplant(successor, replacement);
                    self.arena[successor].set_child(Direction::Right, Some(right));
                    self.arena[right].parent = Some(successor);
                }

                self.transplant(node, Some(successor));
                self.arena[successor].set_child(Direction::Left, Some(left));
                self.arena[left].parent = Some(successor);
                self.arena[successor].color = color;
            },
        }

        if removed_color == Color::Black {
            self.delete_fixup(replacement, replacement_parent);
        }

        let Node { key, .. } = self.arena.free(node);
        self.strategy.destroy(key);
    }

    /// Restores the black-height after a black node was spliced out above `node`. `node` may be
    /// `None`, so its parent is tracked separately.
    fn delete_fixup(&mut self, mut node: Link, mut parent: Link) {
        while node != self.root && self.color_of(node) == Color::Black {
            let curr_parent = match parent {
                Some(parent) => parent,
                None => break,
            };
            let dir = if self.arena[curr_parent].left() == node {
                Direction::Left
            } else {
                Direction::Right
            };
            let opp = dir.opposite();

            let mut sibling = self.arena[curr_parent]
                .child(opp)
                .expect("Expected a doubly black node to have a sibling.");
            if self.arena[sibling].color == Color::Red {
                self.arena[sibling].color = Color::Black;
                self.arena[curr_parent].color = Color::Red;
                self.rotate(curr_parent, dir);
                sibling = self.arena[curr_parent]
                    .child(opp)
                    .expect("Expected a doubly black node to have a sibling.");
            }

            let near = self.arena[sibling].child(dir);
            let far = self.arena[sibling].child(opp);
            if self.color_of(near) == Color::Black && self.color_of(far) == Color::Black {
                self.arena[sibling].color = Color::Red;
                node = parent;
                parent = self.arena[curr_parent].parent;
                continue;
            }

            if self.color_of(far) == Color::Black {
                if let Some(near) = near {
                    self.arena[near].color = Color::Black;
                }
                self.arena[sibling].color = Color::Red;
                self.rotate(sibling, opp);
                sibling = self.arena[curr_parent]
                    .child(opp)
                    .expect("Expected a doubly black node to have a sibling.");
            }

            self.arena[sibling].color = self.arena[curr_parent].color;
            self.arena[curr_parent].color = Color::Black;
            if let Some(far) = self.arena[sibling].child(opp) {
                self.arena[far].color = Color::Black;
            }
            self.rotate(curr_parent, dir);
            node = self.root;
            parent = None;
        }

        if let Some(node) = node {
            self.arena[node].color = Color::Black;
        }
    }

    /// Frees every node with an iterative post-order walk, destroying each key.
    fn destroy_all(&mut self) {
        let mut stack = Vec::new();
        let mut last_freed: Link = None;
        let mut curr = self.root.take();

        while curr.is_some() || !stack.is_empty() {
            if let Some(node) = curr {
                stack.push(node);
                curr = self.arena[node].left();
                continue;
            }

            let top = match stack.last() {
                Some(&top) => top,
                None => break,
            };
            let right = self.arena[top].right();
            if right.is_some() && right != last_freed {
                curr = right;
            } else {
                stack.pop();
                let Node { key, .. } = self.arena.free(top);
                self.strategy.destroy(key);
                last_freed = Some(top);
            }
        }
    }

    /// Returns an iterator over the keys of the tree in order.
    pub fn iter(&self) -> RedBlackTreeIter<'_, T, S> {
        RedBlackTreeIter {
            tree: self,
            next: self.min(),
        }
    }

    /// Checks every red black property and the ordering of keys. Returns the number of black
    /// nodes on each path from the root to a leaf, or `None` if any property is violated.
    pub fn black_height(&self) -> Option<usize> {
        if self.color_of(self.root) != Color::Black {
            return None;
        }
        let (height, count) = self.validate(self.root, None, None, None)?;
        if count != self.arena.len() {
            return None;
        }
        Some(height)
    }

    fn validate(
        &self,
        link: Link,
        parent: Link,
        lower: Option<&T>,
        upper: Option<&T>,
    ) -> Option<(usize, usize)> {
        let handle = match link {
            Some(handle) => handle,
            None => return Some((0, 0)),
        };
        let node = self.arena.get(handle)?;

        if node.parent != parent {
            return None;
        }
        if lower.map_or(false, |lower| self.strategy.less(&node.key, lower)) {
            return None;
        }
        if upper.map_or(false, |upper| self.strategy.less(upper, &node.key)) {
            return None;
        }
        if node.color == Color::Red
            && (self.color_of(node.left()) == Color::Red
                || self.color_of(node.right()) == Color::Red)
        {
            return None;
        }

        let (left_height, left_count) = self.validate(node.left(), link, lower, Some(&node.key))?;
        let (right_height, right_count) =
            self.validate(node.right(), link, Some(&node.key), upper)?;
        if left_height != right_height {
            return None;
        }

        let own = if node.color == Color::Black { 1 } else { 0 };
        Some((left_height + own, left_count + right_count + 1))
    }
}

impl<T, S> Drop for RedBlackTree<T, S>
where
    S: KeyStrategy<T>,
{
    fn drop(&mut self) {
        self.destroy_all();
    }
}

impl<'a, T, S> IntoIterator for &'a RedBlackTree<T, S>
where
    T: 'a,
    S: KeyStrategy<T>,
{
    type IntoIter = RedBlackTreeIter<'a, T, S>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator for `RedBlackTree<T, S>`.
///
/// This iterator traverses the keys of the tree in-order and yields immutable references.
pub struct RedBlackTreeIter<'a, T, S>
where
    T: 'a,
    S: KeyStrategy<T>,
{
    tree: &'a RedBlackTree<T, S>,
    next: Link,
}

impl<'a, T, S> Iterator for RedBlackTreeIter<'a, T, S>
where
    T: 'a,
    S: KeyStrategy<T>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = self.tree.successor(node);
        Some(self.tree.key(node))
    }
}
