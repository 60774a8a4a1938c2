// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt::{self, Debug};
use std::iter;

use compare::{Compare, Natural};

use crate::arena::{NodeArena, SlabArena};
use crate::error::Result;
use crate::map::{self, TreeMap};

/// An ordered set backed by a [`TreeMap`] with `()` values.
///
/// # Examples
///
/// ```rust
/// use arena_rbtree::TreeSet;
///
/// let mut set = TreeSet::new();
///
/// set.insert(3).unwrap();
/// set.insert(1).unwrap();
/// set.insert(2).unwrap();
///
/// // Prints 1, 2, 3
/// for x in set.iter() {
///     println!("{}", x);
/// }
///
/// assert!(set.contains(&2));
/// set.remove(&2).unwrap();
/// assert!(!set.contains(&2));
/// ```
pub struct TreeSet<T, C: Compare<T> = Natural<T>, A: NodeArena<T, ()> = SlabArena<T, ()>> {
    map: TreeMap<T, (), C, A>,
}

impl<T, C, A> Clone for TreeSet<T, C, A>
where
    C: Compare<T> + Clone,
    A: NodeArena<T, ()> + Clone,
{
    fn clone(&self) -> TreeSet<T, C, A> {
        TreeSet {
            map: self.map.clone(),
        }
    }
}

impl<T: PartialEq + Ord> PartialEq for TreeSet<T> {
    #[inline]
    fn eq(&self, other: &TreeSet<T>) -> bool {
        self.map == other.map
    }
}

impl<T: Eq + Ord> Eq for TreeSet<T> {}

impl<T: Debug, C, A> Debug for TreeSet<T, C, A>
where
    C: Compare<T>,
    A: NodeArena<T, ()>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;

        for (i, x) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", *x)?;
        }

        write!(f, "}}")
    }
}

impl<T, C, A> Default for TreeSet<T, C, A>
where
    C: Compare<T> + Default,
    A: NodeArena<T, ()> + Default,
{
    #[inline]
    fn default() -> TreeSet<T, C, A> {
        TreeSet {
            map: Default::default(),
        }
    }
}

impl<T: Ord> TreeSet<T> {
    /// Creates an empty `TreeSet` ordered according to the natural order
    /// of its values.
    pub fn new() -> TreeSet<T> {
        TreeSet {
            map: TreeMap::new(),
        }
    }
}

impl<T, C> TreeSet<T, C>
where
    C: Compare<T>,
{
    /// Creates an empty `TreeSet` ordered according to the given
    /// comparator.
    pub fn with_comparator(cmp: C) -> TreeSet<T, C> {
        TreeSet {
            map: TreeMap::with_comparator(cmp),
        }
    }
}

impl<T, C, A> TreeSet<T, C, A>
where
    C: Compare<T>,
    A: NodeArena<T, ()>,
{
    /// Creates an empty `TreeSet` with the given comparator and node
    /// arena. The arena must be freshly constructed, with no live nodes.
    pub fn with_arena(cmp: C, arena: A) -> TreeSet<T, C, A> {
        TreeSet {
            map: TreeMap::with_arena(cmp, arena),
        }
    }

    /// Returns the comparator according to which the `TreeSet` is ordered.
    pub fn comparator(&self) -> &C {
        self.map.comparator()
    }

    /// Return the number of elements in the set.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Return true if the set contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clears the set, removing all values.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Returns true if the set contains the value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeSet;
    ///
    /// let set: TreeSet<i32> = [1, 2, 3].iter().copied().collect();
    /// assert_eq!(set.contains(&1), true);
    /// assert_eq!(set.contains(&4), false);
    /// ```
    #[inline]
    pub fn contains<Q: ?Sized>(&self, value: &Q) -> bool
    where
        C: Compare<Q, T>,
    {
        self.map.contains_key(value)
    }

    /// Adds a value to the set. Returns `Ok(true)` if the value was not
    /// already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeSet;
    ///
    /// let mut set = TreeSet::new();
    /// assert_eq!(set.insert(2).unwrap(), true);
    /// assert_eq!(set.insert(2).unwrap(), false);
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> Result<bool> {
        Ok(self.map.insert(value, ())?.is_none())
    }

    /// Removes a value from the set. Reports
    /// [`Error::NotFound`](crate::Error::NotFound) if the value was not
    /// present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::{Error, TreeSet};
    ///
    /// let mut set = TreeSet::new();
    /// set.insert(2).unwrap();
    /// assert_eq!(set.remove(&2), Ok(()));
    /// assert_eq!(set.remove(&2), Err(Error::NotFound));
    /// ```
    pub fn remove<Q: ?Sized>(&mut self, value: &Q) -> Result<()>
    where
        C: Compare<Q, T>,
    {
        self.map.remove(value)
    }

    /// Returns the minimum value, or `None` on an empty set.
    pub fn first(&self) -> Option<&T> {
        self.map.first().map(|(k, _)| k)
    }

    /// Returns the maximum value, or `None` on an empty set.
    pub fn last(&self) -> Option<&T> {
        self.map.last().map(|(k, _)| k)
    }

    /// Gets a lazy iterator over the values in the set, in ascending
    /// order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeSet;
    ///
    /// let set: TreeSet<i32> = [3, 1, 2].iter().copied().collect();
    /// let v: Vec<i32> = set.iter().copied().collect();
    /// assert_eq!(v, vec![1, 2, 3]);
    /// ```
    pub fn iter(&self) -> SetIter<'_, T, A> {
        SetIter(self.map.keys())
    }
}

/// Lazy double-ended iterator over a set.
pub struct SetIter<'a, T, A: NodeArena<T, ()>>(map::Keys<'a, T, (), A>);

impl<'a, T, A: NodeArena<T, ()>> Iterator for SetIter<'a, T, A> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.0.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, T, A: NodeArena<T, ()>> DoubleEndedIterator for SetIter<'a, T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        self.0.next_back()
    }
}

impl<'a, T, A: NodeArena<T, ()>> ExactSizeIterator for SetIter<'a, T, A> {}

/// Lazy forward iterator that consumes the set.
pub struct SetIntoIter<T, A: NodeArena<T, ()>>(map::IntoIter<T, (), A>);

impl<T, A: NodeArena<T, ()>> Iterator for SetIntoIter<T, A> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<T> {
        self.0.next().map(|(k, _)| k)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T, A: NodeArena<T, ()>> ExactSizeIterator for SetIntoIter<T, A> {}

impl<T, C, A> iter::FromIterator<T> for TreeSet<T, C, A>
where
    C: Compare<T> + Default,
    A: NodeArena<T, ()> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> TreeSet<T, C, A> {
        let mut set: TreeSet<T, C, A> = Default::default();
        set.extend(iter);
        set
    }
}

impl<T, C, A> Extend<T> for TreeSet<T, C, A>
where
    C: Compare<T>,
    A: NodeArena<T, ()>,
{
    #[inline]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.map.extend(iter.into_iter().map(|x| (x, ())));
    }
}

impl<'a, T, C, A> IntoIterator for &'a TreeSet<T, C, A>
where
    C: Compare<T>,
    A: NodeArena<T, ()>,
{
    type Item = &'a T;
    type IntoIter = SetIter<'a, T, A>;
    fn into_iter(self) -> SetIter<'a, T, A> {
        self.iter()
    }
}

impl<T, C, A> IntoIterator for TreeSet<T, C, A>
where
    C: Compare<T>,
    A: NodeArena<T, ()>,
{
    type Item = T;
    type IntoIter = SetIntoIter<T, A>;
    fn into_iter(self) -> SetIntoIter<T, A> {
        SetIntoIter(self.map.into_iter())
    }
}

#[cfg(feature = "ordered_iter")]
impl<'a, T, A: NodeArena<T, ()>> ::ordered_iter::OrderedSetIterator for SetIter<'a, T, A> {}

#[cfg(test)]
mod test_treeset {
    use super::TreeSet;
    use crate::error::Error;

    #[test]
    fn test_insert_contains() {
        let mut s = TreeSet::new();
        assert!(s.insert(5).unwrap());
        assert!(s.insert(2).unwrap());
        assert!(!s.insert(2).unwrap());
        assert!(s.contains(&2));
        assert!(!s.contains(&3));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut s = TreeSet::new();
        s.insert(1).unwrap();
        assert_eq!(s.remove(&1), Ok(()));
        assert_eq!(s.remove(&1), Err(Error::NotFound));
        assert!(s.is_empty());
    }

    #[test]
    fn test_iterator() {
        let s: TreeSet<i32> = [9, 1, 5, 3, 7].iter().copied().collect();
        let v: Vec<i32> = s.iter().copied().collect();
        assert_eq!(v, vec![1, 3, 5, 7, 9]);
        let r: Vec<i32> = s.iter().rev().copied().collect();
        assert_eq!(r, vec![9, 7, 5, 3, 1]);
    }

    #[test]
    fn test_into_iter() {
        let s: TreeSet<i32> = [2, 1, 3].iter().copied().collect();
        let v: Vec<i32> = s.into_iter().collect();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn test_first_last() {
        let mut s = TreeSet::new();
        assert_eq!(s.first(), None);
        assert_eq!(s.last(), None);
        s.extend([4, 8, 2]);
        assert_eq!(s.first(), Some(&2));
        assert_eq!(s.last(), Some(&8));
    }

    #[test]
    fn test_eq_debug() {
        let a: TreeSet<i32> = [1, 2].iter().copied().collect();
        let b: TreeSet<i32> = [2, 1].iter().copied().collect();
        assert!(a == b);
        assert_eq!(format!("{:?}", a), "{1, 2}");
    }

    #[test]
    fn test_comparator() {
        use compare::{natural, Compare};

        let mut s = TreeSet::with_comparator(natural().rev());
        s.insert(1).unwrap();
        s.insert(3).unwrap();
        s.insert(2).unwrap();
        let v: Vec<i32> = s.iter().copied().collect();
        assert_eq!(v, vec![3, 2, 1]);
    }
}
