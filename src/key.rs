//! Key handling strategies used by `RedBlackTree` and `RedBlackSet`.

/// Operations a tree needs to own, order and release keys of type `T`.
///
/// `less` must be a strict weak order and `equal` must agree with it: two keys are equal exactly
/// when neither is less than the other. A strategy that breaks this contract silently corrupts
/// the ordering of the tree.
///
/// # Examples
///
/// ```
/// use redblack_set::key::KeyStrategy;
/// use redblack_set::red_black_tree::RedBlackSet;
///
/// #[derive(Clone)]
/// struct CaseInsensitive;
///
/// impl KeyStrategy<String> for CaseInsensitive {
///     fn copy(&self, key: &String) -> String {
///         key.clone()
///     }
///
///     fn equal(&self, a: &String, b: &String) -> bool {
///         a.to_lowercase() == b.to_lowercase()
///     }
///
///     fn less(&self, a: &String, b: &String) -> bool {
///         a.to_lowercase() < b.to_lowercase()
///     }
/// }
///
/// let mut set = RedBlackSet::with_strategy(CaseInsensitive);
/// set.insert(&String::from("Foo"));
/// assert!(set.contains(&String::from("FOO")));
/// ```
pub trait KeyStrategy<T> {
    /// Returns an independent copy of `key`. Called whenever a key enters the tree or is handed
    /// back to a caller.
    fn copy(&self, key: &T) -> T;

    /// Releases a key that is no longer owned by any node.
    fn destroy(&self, key: T) {
        drop(key);
    }

    /// Returns `true` if `a` and `b` are the same key.
    fn equal(&self, a: &T, b: &T) -> bool;

    /// Returns `true` if `a` is ordered strictly before `b`.
    fn less(&self, a: &T, b: &T) -> bool;
}

/// The strategy for keys that are `Ord + Clone`: keys are cloned in, dropped out, and compared
/// with their natural ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Natural;

impl<T> KeyStrategy<T> for Natural
where
    T: Ord + Clone,
{
    fn copy(&self, key: &T) -> T {
        key.clone()
    }

    fn equal(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}
