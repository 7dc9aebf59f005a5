use crate::arena::Handle;

/// The color of a node in a red black tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// The side of its parent a child hangs from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Left = 0,
    Right = 1,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// A link to another node. `None` stands for both an external leaf and a missing parent, and
/// counts as black.
pub type Link = Option<Handle>;

/// An internal node of a red black tree, stored in the tree's arena.
pub struct Node<T> {
    pub key: T,
    pub color: Color,
    pub parent: Link,
    pub children: [Link; 2],
}

impl<T> Node<T> {
    pub fn new(key: T, parent: Link) -> Self {
        Node {
            key,
            color: Color::Red,
            parent,
            children: [None, None],
        }
    }

    pub fn child(&self, dir: Direction) -> Link {
        self.children[dir as usize]
    }

    pub fn set_child(&mut self, dir: Direction, link: Link) {
        self.children[dir as usize] = link;
    }

    pub fn left(&self) -> Link {
        self.child(Direction::Left)
    }

    pub fn right(&self) -> Link {
        self.child(Direction::Right)
    }
}
