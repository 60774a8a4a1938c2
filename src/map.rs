// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp::Ordering::{self, Equal, Greater, Less};
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::iter;
use std::marker::PhantomData;
use std::mem::replace;
use std::ops;

use compare::{natural, Compare, Natural};

use crate::arena::{Color, NodeArena, NodeId, SlabArena};
use crate::error::{Error, Result};

/// This is implemented as a red-black tree over an index arena: nodes are
/// addressed by [`NodeId`] handles, every leaf link points at the reserved
/// black sentinel slot, and insert/erase restore the balancing invariants
/// with at most O(log n) recolorings and a constant number of rotations.
/// The arena is the sole owner of the nodes, so the parent back-references
/// the balancing code and the cursors rely on cannot dangle.
///
/// # Examples
///
/// ```rust
/// use arena_rbtree::TreeMap;
///
/// let mut map = TreeMap::new();
///
/// map.insert(2, "bar").unwrap();
/// map.insert(1, "foo").unwrap();
/// map.insert(3, "quux").unwrap();
///
/// // In ascending order by keys
/// for (key, value) in map.iter() {
///     println!("{}: {}", key, value);
/// }
///
/// // Prints 1, 2, 3
/// for key in map.keys() {
///     println!("{}", key);
/// }
///
/// map.remove(&1).unwrap();
/// assert_eq!(map.len(), 2);
///
/// if !map.contains_key(&1) {
///     println!("1 is no more");
/// }
///
/// map.clear();
/// assert!(map.is_empty());
/// ```
///
/// A `TreeMap` can also be used with a custom ordering:
///
/// ```rust
/// use arena_rbtree::TreeMap;
///
/// struct Troll<'a> {
///     name: &'a str,
///     level: u32,
/// }
///
/// // Use a map to store trolls, sorted by level, and track a list of
/// // heroes slain.
/// let mut trolls = TreeMap::with_comparator(|l: &Troll, r: &Troll| l.level.cmp(&r.level));
///
/// trolls.insert(Troll { name: "Orgarr", level: 2 },
///               vec!["King Karl"]).unwrap();
/// trolls.insert(Troll { name: "Blargarr", level: 3 },
///               vec!["Odd"]).unwrap();
/// trolls.insert(Troll { name: "Wartilda", level: 1 },
///               vec![]).unwrap();
///
/// println!("You are facing {} trolls!", trolls.len());
///
/// // Print the trolls, ordered by level with smallest level first
/// for (troll, heroes) in trolls.iter() {
///     println!("level {}: '{}' has slain {}",
///              troll.level, troll.name, heroes.len());
/// }
/// ```
pub struct TreeMap<K, V, C: Compare<K> = Natural<K>, A: NodeArena<K, V> = SlabArena<K, V>> {
    arena: A,
    root: NodeId,
    length: usize,
    cmp: C,
    marker: PhantomData<(K, V)>,
}

impl<K, V, C, A> Clone for TreeMap<K, V, C, A>
where
    C: Compare<K> + Clone,
    A: NodeArena<K, V> + Clone,
{
    fn clone(&self) -> TreeMap<K, V, C, A> {
        TreeMap {
            arena: self.arena.clone(),
            root: self.root,
            length: self.length,
            cmp: self.cmp.clone(),
            marker: PhantomData,
        }
    }
}

// FIXME: determine what `PartialEq` means for comparator-based `TreeMap`s
impl<K: PartialEq + Ord, V: PartialEq> PartialEq for TreeMap<K, V> {
    #[inline]
    fn eq(&self, other: &TreeMap<K, V>) -> bool {
        self.iter().eq(other)
    }
}

impl<K: Eq + Ord, V: Eq> Eq for TreeMap<K, V> {}

impl<K: Ord, V: PartialOrd> PartialOrd for TreeMap<K, V> {
    #[inline]
    fn partial_cmp(&self, other: &TreeMap<K, V>) -> Option<Ordering> {
        self.iter().partial_cmp(other)
    }
}

impl<K: Ord, V: Ord> Ord for TreeMap<K, V> {
    #[inline]
    fn cmp(&self, other: &TreeMap<K, V>) -> Ordering {
        self.iter().cmp(other)
    }
}

impl<K: Debug, V: Debug, C, A> Debug for TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;

        for (i, (k, v)) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {:?}", *k, *v)?;
        }

        write!(f, "}}")
    }
}

impl<K, V, C, A> Default for TreeMap<K, V, C, A>
where
    C: Compare<K> + Default,
    A: NodeArena<K, V> + Default,
{
    #[inline]
    fn default() -> TreeMap<K, V, C, A> {
        TreeMap::with_arena(Default::default(), Default::default())
    }
}

impl<'a, K, V, C, A, Q: ?Sized> ops::Index<&'a Q> for TreeMap<K, V, C, A>
where
    C: Compare<K> + Compare<Q, K>,
    A: NodeArena<K, V>,
{
    type Output = V;
    #[inline]
    fn index(&self, i: &'a Q) -> &V {
        self.get(i).expect("no entry found for key")
    }
}

impl<'a, K, V, C, A, Q: ?Sized> ops::IndexMut<&'a Q> for TreeMap<K, V, C, A>
where
    C: Compare<K> + Compare<Q, K>,
    A: NodeArena<K, V>,
{
    #[inline]
    fn index_mut(&mut self, i: &'a Q) -> &mut V {
        self.get_mut(i).expect("no entry found for key")
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    /// Creates an empty `TreeMap` ordered according to the natural order
    /// of its keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    /// let mut map: TreeMap<&str, i32> = TreeMap::new();
    /// map.insert("one", 1).unwrap();
    /// ```
    pub fn new() -> TreeMap<K, V> {
        TreeMap::with_comparator(natural())
    }
}

impl<K, V, C> TreeMap<K, V, C>
where
    C: Compare<K>,
{
    /// Creates an empty `TreeMap` ordered according to the given
    /// comparator, backed by an unbounded [`SlabArena`].
    pub fn with_comparator(cmp: C) -> TreeMap<K, V, C> {
        TreeMap::with_arena(cmp, SlabArena::new())
    }
}

impl<K, V, C, A> TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    /// Creates an empty `TreeMap` with the given comparator and node
    /// arena. The arena must be freshly constructed, with no live nodes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::{Error, SlabArena, TreeMap};
    /// use compare::natural;
    ///
    /// let mut map = TreeMap::with_arena(natural(), SlabArena::bounded(1));
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.insert(2, "b"), Err(Error::AllocationFailure));
    /// ```
    pub fn with_arena(cmp: C, arena: A) -> TreeMap<K, V, C, A> {
        TreeMap {
            arena,
            root: NodeId::NIL,
            length: 0,
            cmp,
            marker: PhantomData,
        }
    }

    /// Returns the comparator according to which the `TreeMap` is ordered.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Return the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut a = TreeMap::new();
    /// assert_eq!(a.len(), 0);
    /// a.insert(1, "a").unwrap();
    /// assert_eq!(a.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.length
    }

    /// Return true if the map contains no elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut a = TreeMap::new();
    /// assert!(a.is_empty());
    /// a.insert(1, "a").unwrap();
    /// assert!(!a.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the map, removing all values and returning every node to
    /// the arena. All outstanding positions become stale.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut a = TreeMap::new();
    /// a.insert(1, "a").unwrap();
    /// a.clear();
    /// assert!(a.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = NodeId::NIL;
        self.length = 0;
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form *must* match the ordering on the key
    /// type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    #[inline]
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        C: Compare<Q, K>,
    {
        let id = self.find_node(key);
        self.arena.node(id).entry.as_ref().map(|(_, v)| v)
    }

    /// Returns true if the map contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.contains_key(&1), true);
    /// assert_eq!(map.contains_key(&2), false);
    /// ```
    #[inline]
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        C: Compare<Q, K>,
    {
        self.get(key).is_some()
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// ```
    #[inline]
    pub fn get_mut<Q: ?Sized>(&mut self, key: &Q) -> Option<&mut V>
    where
        C: Compare<Q, K>,
    {
        let id = self.find_node(key);
        self.arena.node_mut(id).entry.as_mut().map(|(_, v)| v)
    }

    /// Inserts a key-value pair into the map. If the key already had a
    /// value present in the map, that value is replaced in place and
    /// returned; otherwise a node is allocated, attached red, and the
    /// balancing invariants are restored.
    ///
    /// Allocation happens before any structural mutation, so
    /// `Err(AllocationFailure)` leaves the map exactly as it was.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// assert_eq!(map.insert(37, "a").unwrap(), None);
    /// assert_eq!(map.is_empty(), false);
    ///
    /// map.insert(37, "b").unwrap();
    /// assert_eq!(map.insert(37, "c").unwrap(), Some("b"));
    /// assert_eq!(map[&37], "c");
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let mut parent = NodeId::NIL;
        let mut cur = self.root;
        let mut went_left = false;
        while !cur.is_nil() {
            parent = cur;
            match self.cmp.compare(&key, self.key_of(cur)) {
                Less => {
                    went_left = true;
                    cur = self.left(cur);
                }
                Greater => {
                    went_left = false;
                    cur = self.right(cur);
                }
                Equal => {
                    let old = replace(self.arena.node_mut(cur).value_mut(), value);
                    return Ok(Some(old));
                }
            }
        }

        let id = self.arena.allocate(key, value)?;
        self.arena.node_mut(id).parent = parent;
        if parent.is_nil() {
            self.root = id;
        } else if went_left {
            self.set_left(parent, id);
        } else {
            self.set_right(parent, id);
        }
        self.insert_fixup(id);
        self.length += 1;
        Ok(None)
    }

    /// Removes a key from the map, returning the value at the key.
    /// Reports [`Error::NotFound`] (and leaves the map untouched) if the
    /// key is not present.
    ///
    /// Only positions at the removed element become stale. When the
    /// removed node has two children, its in-order successor *node* is
    /// spliced into its place; the successor keeps its identity, so
    /// positions held on the successor remain valid and keep referring to
    /// the successor's key.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form *must* match the ordering on the key
    /// type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::{Error, TreeMap};
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.remove(&1), Ok("a"));
    /// assert_eq!(map.remove(&1), Err(Error::NotFound));
    /// ```
    pub fn remove<Q: ?Sized>(&mut self, key: &Q) -> Result<V>
    where
        C: Compare<Q, K>,
    {
        let z = self.find_node(key);
        if z.is_nil() {
            return Err(Error::NotFound);
        }
        let (_, value) = self.remove_node(z);
        Ok(value)
    }

    /// Removes the element a cursor was positioned at, returning the
    /// key-value pair. Reports [`Error::InvalidCursor`] if the position is
    /// the end position or stale (its node was erased, possibly with the
    /// slot since reused).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::{Error, TreeMap};
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// let pos = map.find(&1).position();
    /// assert_eq!(map.remove_at(pos), Ok((1, "a")));
    /// assert_eq!(map.remove_at(pos), Err(Error::InvalidCursor));
    /// ```
    pub fn remove_at(&mut self, pos: Position) -> Result<(K, V)> {
        if !self.is_live(pos) {
            return Err(Error::InvalidCursor);
        }
        Ok(self.remove_node(pos.id))
    }

    /// Returns the minimum key and its value, or `None` on an empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// assert_eq!(map.first(), None);
    /// map.insert(2, "b").unwrap();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.first(), Some((&1, &"a")));
    /// ```
    pub fn first(&self) -> Option<(&K, &V)> {
        let id = subtree_min(&self.arena, self.root);
        self.arena.node(id).entry.as_ref().map(|(k, v)| (k, v))
    }

    /// Returns the maximum key and its value, or `None` on an empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(2, "b").unwrap();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.last(), Some((&2, &"b")));
    /// ```
    pub fn last(&self) -> Option<(&K, &V)> {
        let id = subtree_max(&self.arena, self.root);
        self.arena.node(id).entry.as_ref().map(|(k, v)| (k, v))
    }

    /// Gets a lazy iterator over the key-value pairs in the map, in
    /// ascending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    /// let mut map = TreeMap::new();
    /// map.insert("a", 1).unwrap();
    /// map.insert("c", 3).unwrap();
    /// map.insert("b", 2).unwrap();
    ///
    /// // Print contents in ascending order
    /// for (key, value) in map.iter() {
    ///     println!("{}: {}", key, value);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V, A> {
        Iter {
            arena: &self.arena,
            front: subtree_min(&self.arena, self.root),
            back: subtree_max(&self.arena, self.root),
            remaining: self.length,
            marker: PhantomData,
        }
    }

    /// Gets a lazy forward iterator over the key-value pairs in the map,
    /// with the values being mutable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    /// let mut map = TreeMap::new();
    /// map.insert("a", 1).unwrap();
    /// map.insert("c", 3).unwrap();
    /// map.insert("b", 2).unwrap();
    ///
    /// for (_, value) in map.iter_mut() {
    ///     *value += 10;
    /// }
    ///
    /// assert_eq!(map.get(&"a"), Some(&11));
    /// ```
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, A> {
        IterMut {
            front: subtree_min(&self.arena, self.root),
            back: subtree_max(&self.arena, self.root),
            remaining: self.length,
            arena: &mut self.arena,
            marker: PhantomData,
        }
    }

    /// Gets a lazy iterator over the keys in the map, in ascending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    /// let mut map = TreeMap::new();
    /// map.insert("a", 1).unwrap();
    /// map.insert("c", 3).unwrap();
    /// map.insert("b", 2).unwrap();
    ///
    /// // Print "a", "b", "c" in order.
    /// for x in map.keys() {
    ///     println!("{}", x);
    /// }
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V, A> {
        Keys(self.iter())
    }

    /// Gets a lazy iterator over the values in the map, in ascending
    /// order with respect to the corresponding keys.
    pub fn values(&self) -> Values<'_, K, V, A> {
        Values(self.iter())
    }

    /// Gets a lazy iterator over the values in the map, in ascending
    /// order with respect to the corresponding keys, returning mutable
    /// references.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, A> {
        ValuesMut(self.iter_mut())
    }

    /// Returns a cursor positioned at the element with the given key, or
    /// the end cursor if the key is not present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arena_rbtree::TreeMap;
    ///
    /// let mut map = TreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// map.insert(2, "b").unwrap();
    ///
    /// let mut cur = map.find(&1);
    /// assert_eq!(cur.key(), Some(&1));
    /// cur.move_next().unwrap();
    /// assert_eq!(cur.key(), Some(&2));
    ///
    /// assert!(map.find(&3).is_end());
    /// ```
    pub fn find<Q: ?Sized>(&self, key: &Q) -> Cursor<'_, K, V, C, A>
    where
        C: Compare<Q, K>,
    {
        let id = self.find_node(key);
        Cursor {
            tree: self,
            pos: self.position_of(id),
        }
    }

    /// Returns a cursor positioned at the minimum element, or the end
    /// cursor on an empty map.
    pub fn cursor_front(&self) -> Cursor<'_, K, V, C, A> {
        let id = subtree_min(&self.arena, self.root);
        Cursor {
            tree: self,
            pos: self.position_of(id),
        }
    }

    /// Returns the end cursor: one position past the maximum element.
    /// Moving it backward yields the maximum element.
    pub fn cursor_end(&self) -> Cursor<'_, K, V, C, A> {
        Cursor {
            tree: self,
            pos: Position {
                id: NodeId::NIL,
                generation: 0,
            },
        }
    }

    /// Checks every balancing and ordering invariant of the tree,
    /// panicking with a description on the first violation. Intended for
    /// tests and debugging; cost is O(n).
    ///
    /// Verified: the root and sentinel are black, no red node has a red
    /// child, every root-to-sentinel path carries the same number of
    /// black nodes, parent/child links agree, in-order keys are strictly
    /// increasing under the comparator, and `len()` matches the live node
    /// count.
    pub fn assert_invariants(&self) {
        assert_eq!(self.color(self.root), Color::Black, "root must be black");
        if !self.root.is_nil() {
            assert!(
                self.parent(self.root).is_nil(),
                "root must not have a parent"
            );
        }
        let nil = self.arena.node(NodeId::NIL);
        assert_eq!(nil.color, Color::Black, "sentinel must be black");
        assert!(
            nil.left.is_nil() && nil.right.is_nil(),
            "sentinel children must stay nil"
        );

        let mut count = 0;
        self.check_subtree(self.root, &mut count);
        assert_eq!(count, self.length, "len() does not match node count");

        let mut iter = self.iter();
        if let Some((mut prev, _)) = iter.next() {
            for (k, _) in iter {
                assert_eq!(
                    self.cmp.compare(prev, k),
                    Less,
                    "in-order keys must be strictly increasing"
                );
                prev = k;
            }
        }
    }

    // Returns the black-height of the subtree rooted at `id`.
    fn check_subtree(&self, id: NodeId, count: &mut usize) -> usize {
        if id.is_nil() {
            return 0;
        }
        *count += 1;
        let node = self.arena.node(id);
        assert!(node.entry.is_some(), "live node without a payload");
        if node.color == Color::Red {
            assert_eq!(self.color(node.left), Color::Black, "red-red violation");
            assert_eq!(self.color(node.right), Color::Black, "red-red violation");
        }
        if !node.left.is_nil() {
            assert_eq!(self.parent(node.left), id, "broken parent link");
        }
        if !node.right.is_nil() {
            assert_eq!(self.parent(node.right), id, "broken parent link");
        }
        let lh = self.check_subtree(node.left, count);
        let rh = self.check_subtree(node.right, count);
        assert_eq!(lh, rh, "black-height mismatch");
        lh + (node.color == Color::Black) as usize
    }

    // ------------------------------------------------------------------
    // Link plumbing. Every structural mutation below goes through these,
    // keeping the parent/child links bidirectional.

    #[inline]
    fn key_of(&self, id: NodeId) -> &K {
        self.arena.node(id).key()
    }

    #[inline]
    fn left(&self, id: NodeId) -> NodeId {
        self.arena.node(id).left
    }

    #[inline]
    fn right(&self, id: NodeId) -> NodeId {
        self.arena.node(id).right
    }

    #[inline]
    fn parent(&self, id: NodeId) -> NodeId {
        self.arena.node(id).parent
    }

    #[inline]
    fn color(&self, id: NodeId) -> Color {
        self.arena.node(id).color
    }

    #[inline]
    fn is_red(&self, id: NodeId) -> bool {
        self.arena.node(id).color == Color::Red
    }

    #[inline]
    fn set_left(&mut self, id: NodeId, to: NodeId) {
        self.arena.node_mut(id).left = to;
    }

    #[inline]
    fn set_right(&mut self, id: NodeId, to: NodeId) {
        self.arena.node_mut(id).right = to;
    }

    #[inline]
    fn set_parent(&mut self, id: NodeId, to: NodeId) {
        self.arena.node_mut(id).parent = to;
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.arena.node_mut(id).color = color;
    }

    fn find_node<Q: ?Sized>(&self, key: &Q) -> NodeId
    where
        C: Compare<Q, K>,
    {
        let mut cur = self.root;
        while !cur.is_nil() {
            cur = match self.cmp.compare(key, self.key_of(cur)) {
                Less => self.left(cur),
                Greater => self.right(cur),
                Equal => return cur,
            };
        }
        NodeId::NIL
    }

    fn position_of(&self, id: NodeId) -> Position {
        Position {
            id,
            generation: if id.is_nil() {
                0
            } else {
                self.arena.generation(id)
            },
        }
    }

    fn is_live(&self, pos: Position) -> bool {
        !pos.id.is_nil()
            && self.arena.generation(pos.id) == pos.generation
            && self.arena.node(pos.id).entry.is_some()
    }

    // ------------------------------------------------------------------
    // Rotations: O(1) link surgery preserving the in-order sequence.
    // Neither allocates; both rewrite the three affected parent links and,
    // when `x` was the root, the root handle.

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);
        let yl = self.left(y);
        self.set_right(x, yl);
        if !yl.is_nil() {
            self.set_parent(yl, x);
        }
        let xp = self.parent(x);
        self.set_parent(y, xp);
        if xp.is_nil() {
            self.root = y;
        } else if x == self.left(xp) {
            self.set_left(xp, y);
        } else {
            self.set_right(xp, y);
        }
        self.set_left(y, x);
        self.set_parent(x, y);
    }

    fn rotate_right(&mut self, x: NodeId) {
        let y = self.left(x);
        let yr = self.right(y);
        self.set_left(x, yr);
        if !yr.is_nil() {
            self.set_parent(yr, x);
        }
        let xp = self.parent(x);
        self.set_parent(y, xp);
        if xp.is_nil() {
            self.root = y;
        } else if x == self.right(xp) {
            self.set_right(xp, y);
        } else {
            self.set_left(xp, y);
        }
        self.set_right(y, x);
        self.set_parent(x, y);
    }

    // Restores the invariants after attaching a red node. Walks toward
    // the root while the parent is red: a red uncle means recolor and
    // climb; a black uncle means one or two rotations finish the repair.
    // The loop can leave a red root, hence the unconditional blackening
    // at the end.
    fn insert_fixup(&mut self, mut z: NodeId) {
        while self.is_red(self.parent(z)) {
            let p = self.parent(z);
            let g = self.parent(p);
            if p == self.left(g) {
                let u = self.right(g);
                if self.is_red(u) {
                    self.set_color(p, Color::Black);
                    self.set_color(u, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.right(p) {
                        // zig-zag: rotate the parent down to the straight case
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let u = self.left(g);
                if self.is_red(u) {
                    self.set_color(p, Color::Black);
                    self.set_color(u, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    // Replaces the subtree rooted at `u` with the one rooted at `v` in
    // u's parent. v may be the sentinel; its parent link is still written,
    // because erase-fixup climbs from it.
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let up = self.parent(u);
        if up.is_nil() {
            self.root = v;
        } else if u == self.left(up) {
            self.set_left(up, v);
        } else {
            self.set_right(up, v);
        }
        self.set_parent(v, up);
    }

    // Detaches `z` from the tree and returns its payload to the arena.
    // With two children, the in-order successor *node* (not its payload)
    // is spliced into z's position and takes z's color, so positions held
    // on the successor stay attached to the successor's key.
    fn remove_node(&mut self, z: NodeId) -> (K, V) {
        let mut spliced_color = self.color(z);
        let x;
        if self.left(z).is_nil() {
            x = self.right(z);
            self.transplant(z, x);
        } else if self.right(z).is_nil() {
            x = self.left(z);
            self.transplant(z, x);
        } else {
            let y = subtree_min(&self.arena, self.right(z));
            spliced_color = self.color(y);
            x = self.right(y);
            if self.parent(y) == z {
                // x may be the sentinel; fixup reads this link
                self.set_parent(x, y);
            } else {
                self.transplant(y, x);
                let zr = self.right(z);
                self.set_right(y, zr);
                self.set_parent(zr, y);
            }
            self.transplant(z, y);
            let zl = self.left(z);
            self.set_left(y, zl);
            self.set_parent(zl, y);
            let zc = self.color(z);
            self.set_color(y, zc);
        }
        if spliced_color == Color::Black {
            self.erase_fixup(x);
        }
        self.length -= 1;
        self.arena.deallocate(z)
    }

    // Restores the invariants after a black node was spliced out. `x`
    // fills the vacated position and carries the extra blackness (x may
    // be the sentinel). Walks toward the root examining x's sibling: a
    // red sibling is rotated to expose a black one; a black sibling with
    // two black children pushes the extra black upward; otherwise one or
    // two rotations terminate the loop.
    fn erase_fixup(&mut self, mut x: NodeId) {
        while x != self.root && !self.is_red(x) {
            let p = self.parent(x);
            if x == self.left(p) {
                let mut w = self.right(p);
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_left(p);
                    w = self.right(self.parent(x));
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if !self.is_red(self.right(w)) {
                        let wl = self.left(w);
                        self.set_color(wl, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(self.parent(x));
                    }
                    let p = self.parent(x);
                    let pc = self.color(p);
                    self.set_color(w, pc);
                    self.set_color(p, Color::Black);
                    let wr = self.right(w);
                    self.set_color(wr, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                }
            } else {
                let mut w = self.left(p);
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_right(p);
                    w = self.left(self.parent(x));
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(w, Color::Red);
                    x = self.parent(x);
                } else {
                    if !self.is_red(self.left(w)) {
                        let wr = self.right(w);
                        self.set_color(wr, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(self.parent(x));
                    }
                    let p = self.parent(x);
                    let pc = self.color(p);
                    self.set_color(w, pc);
                    self.set_color(p, Color::Black);
                    let wl = self.left(w);
                    self.set_color(wl, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }
}

// ---------------------------------------------------------------------
// Order walks. These consult only the arena links, never the tree, so
// iterators keep working from the handles they hold.

pub(crate) fn subtree_min<K, V, A: NodeArena<K, V>>(arena: &A, mut x: NodeId) -> NodeId {
    if x.is_nil() {
        return NodeId::NIL;
    }
    loop {
        let l = arena.node(x).left;
        if l.is_nil() {
            return x;
        }
        x = l;
    }
}

pub(crate) fn subtree_max<K, V, A: NodeArena<K, V>>(arena: &A, mut x: NodeId) -> NodeId {
    if x.is_nil() {
        return NodeId::NIL;
    }
    loop {
        let r = arena.node(x).right;
        if r.is_nil() {
            return x;
        }
        x = r;
    }
}

pub(crate) fn successor<K, V, A: NodeArena<K, V>>(arena: &A, mut x: NodeId) -> NodeId {
    let r = arena.node(x).right;
    if !r.is_nil() {
        return subtree_min(arena, r);
    }
    let mut p = arena.node(x).parent;
    while !p.is_nil() && x == arena.node(p).right {
        x = p;
        p = arena.node(p).parent;
    }
    p
}

pub(crate) fn predecessor<K, V, A: NodeArena<K, V>>(arena: &A, mut x: NodeId) -> NodeId {
    let l = arena.node(x).left;
    if !l.is_nil() {
        return subtree_max(arena, l);
    }
    let mut p = arena.node(x).parent;
    while !p.is_nil() && x == arena.node(p).left {
        x = p;
        p = arena.node(p).parent;
    }
    p
}

// ---------------------------------------------------------------------
// Cursors.

/// A detached cursor position: a node handle plus the generation of its
/// slot at the time the position was taken.
///
/// Positions are plain tokens carrying no borrow of the tree, so they can
/// be stored and later handed to [`TreeMap::remove_at`]. A position whose
/// node has since been erased is *stale* and is reported as
/// [`Error::InvalidCursor`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    id: NodeId,
    generation: u32,
}

/// A cursor over a map: a [`Position`] plus in-order navigation.
///
/// Two cursors are equal iff they reference the same node identity. The
/// end cursor sits one past the maximum element; moving it backward
/// yields the maximum. Moving forward from the end, or backward from the
/// minimum, is reported as [`Error::InvalidCursor`], as is any move or
/// read through a stale cursor.
pub struct Cursor<'a, K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    tree: &'a TreeMap<K, V, C, A>,
    pos: Position,
}

impl<'a, K, V, C, A> Clone for Cursor<'a, K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, C, A> Copy for Cursor<'a, K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
}

impl<'a, K, V, C, A> PartialEq for Cursor<'a, K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    fn eq(&self, other: &Self) -> bool {
        self.pos.id == other.pos.id
    }
}

impl<'a, K, V, C, A> Eq for Cursor<'a, K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
}

impl<'a, K, V, C, A> Cursor<'a, K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    /// True if this is the end cursor.
    pub fn is_end(&self) -> bool {
        self.pos.id.is_nil()
    }

    /// True if the cursor points at a live element (not end, not stale).
    pub fn is_valid(&self) -> bool {
        self.tree.is_live(self.pos)
    }

    /// The detached position token for this cursor.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// The key at the cursor, or `None` at the end position or through a
    /// stale cursor.
    pub fn key(&self) -> Option<&'a K> {
        if !self.tree.is_live(self.pos) {
            return None;
        }
        self.tree
            .arena
            .node(self.pos.id)
            .entry
            .as_ref()
            .map(|(k, _)| k)
    }

    /// The value at the cursor, or `None` at the end position or through
    /// a stale cursor.
    pub fn value(&self) -> Option<&'a V> {
        if !self.tree.is_live(self.pos) {
            return None;
        }
        self.tree
            .arena
            .node(self.pos.id)
            .entry
            .as_ref()
            .map(|(_, v)| v)
    }

    /// Moves to the in-order successor. Moving past the maximum element
    /// lands on the end cursor; moving *from* the end cursor (or through
    /// a stale cursor) is an error.
    pub fn move_next(&mut self) -> Result<()> {
        if !self.tree.is_live(self.pos) {
            return Err(Error::InvalidCursor);
        }
        let next = successor(&self.tree.arena, self.pos.id);
        self.pos = self.tree.position_of(next);
        Ok(())
    }

    /// Moves to the in-order predecessor. Moving backward from the end
    /// cursor lands on the maximum element; moving backward from the
    /// minimum (or through a stale cursor) is an error.
    pub fn move_prev(&mut self) -> Result<()> {
        let prev = if self.pos.id.is_nil() {
            subtree_max(&self.tree.arena, self.tree.root)
        } else if !self.tree.is_live(self.pos) {
            return Err(Error::InvalidCursor);
        } else {
            predecessor(&self.tree.arena, self.pos.id)
        };
        if prev.is_nil() {
            return Err(Error::InvalidCursor);
        }
        self.pos = self.tree.position_of(prev);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Iterators.

/// Lazy double-ended iterator over a map.
pub struct Iter<'a, K, V, A: NodeArena<K, V>> {
    arena: &'a A,
    front: NodeId,
    back: NodeId,
    remaining: usize,
    marker: PhantomData<&'a (K, V)>,
}

impl<'a, K, V, A: NodeArena<K, V>> Clone for Iter<'a, K, V, A> {
    fn clone(&self) -> Self {
        Iter {
            arena: self.arena,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V, A: NodeArena<K, V>> Iterator for Iter<'a, K, V, A> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front;
        self.front = successor(self.arena, id);
        self.remaining -= 1;
        let (k, v) = self.arena.node(id).entry.as_ref()?;
        Some((k, v))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, A: NodeArena<K, V>> DoubleEndedIterator for Iter<'a, K, V, A> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back;
        self.back = predecessor(self.arena, id);
        self.remaining -= 1;
        let (k, v) = self.arena.node(id).entry.as_ref()?;
        Some((k, v))
    }
}

impl<'a, K, V, A: NodeArena<K, V>> ExactSizeIterator for Iter<'a, K, V, A> {}

/// Lazy double-ended iterator over a map that allows mutation of the
/// values.
pub struct IterMut<'a, K, V, A: NodeArena<K, V>> {
    // Holding `&mut A` across yielded items would alias the `&mut V`s we
    // hand out, so the arena is kept as a raw pointer. Each step visits a
    // distinct node and only the value half of its payload is handed out
    // mutably; the links the walk reads are never exposed.
    arena: *mut A,
    front: NodeId,
    back: NodeId,
    remaining: usize,
    marker: PhantomData<(&'a mut A, &'a K, &'a mut V)>,
}

impl<'a, K, V, A: NodeArena<K, V>> IterMut<'a, K, V, A> {
    fn step(&mut self, forward: bool) -> Option<(&'a K, &'a mut V)> {
        if self.remaining == 0 {
            return None;
        }
        let arena = unsafe { &mut *self.arena };
        let id = if forward {
            let id = self.front;
            self.front = successor(arena, id);
            id
        } else {
            let id = self.back;
            self.back = predecessor(arena, id);
            id
        };
        self.remaining -= 1;
        let (k, v) = arena.node_mut(id).entry.as_mut()?;
        Some(unsafe { (&*(k as *const K), &mut *(v as *mut V)) })
    }
}

impl<'a, K, V, A: NodeArena<K, V>> Iterator for IterMut<'a, K, V, A> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.step(true)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, A: NodeArena<K, V>> DoubleEndedIterator for IterMut<'a, K, V, A> {
    fn next_back(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.step(false)
    }
}

impl<'a, K, V, A: NodeArena<K, V>> ExactSizeIterator for IterMut<'a, K, V, A> {}

/// TreeMap keys iterator.
pub struct Keys<'a, K, V, A: NodeArena<K, V>>(Iter<'a, K, V, A>);

/// TreeMap values iterator.
pub struct Values<'a, K, V, A: NodeArena<K, V>>(Iter<'a, K, V, A>);

/// TreeMap mutable values iterator.
pub struct ValuesMut<'a, K, V, A: NodeArena<K, V>>(IterMut<'a, K, V, A>);

impl<'a, K, V, A: NodeArena<K, V>> Iterator for Keys<'a, K, V, A> {
    type Item = &'a K;
    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.0.next().map(|(k, _)| k)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, A: NodeArena<K, V>> DoubleEndedIterator for Keys<'a, K, V, A> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a K> {
        self.0.next_back().map(|(k, _)| k)
    }
}

impl<'a, K, V, A: NodeArena<K, V>> ExactSizeIterator for Keys<'a, K, V, A> {}

impl<'a, K, V, A: NodeArena<K, V>> Iterator for Values<'a, K, V, A> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.0.next().map(|(_, v)| v)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, A: NodeArena<K, V>> DoubleEndedIterator for Values<'a, K, V, A> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a V> {
        self.0.next_back().map(|(_, v)| v)
    }
}

impl<'a, K, V, A: NodeArena<K, V>> ExactSizeIterator for Values<'a, K, V, A> {}

impl<'a, K, V, A: NodeArena<K, V>> Iterator for ValuesMut<'a, K, V, A> {
    type Item = &'a mut V;
    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.0.next().map(|(_, v)| v)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, A: NodeArena<K, V>> ExactSizeIterator for ValuesMut<'a, K, V, A> {}

/// Lazy forward iterator that consumes the map.
///
/// Payloads are moved out of their slots one at a time; the links stay in
/// place so the in-order walk keeps working. Whatever was not consumed is
/// dropped with the arena.
pub struct IntoIter<K, V, A: NodeArena<K, V>> {
    arena: A,
    next: NodeId,
    remaining: usize,
    marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, A: NodeArena<K, V>> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.next;
        self.next = successor(&self.arena, id);
        self.remaining -= 1;
        self.arena.node_mut(id).entry.take()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, A: NodeArena<K, V>> ExactSizeIterator for IntoIter<K, V, A> {}

// ---------------------------------------------------------------------
// Std trait surface.

impl<K, V, C, A> iter::FromIterator<(K, V)> for TreeMap<K, V, C, A>
where
    C: Compare<K> + Default,
    A: NodeArena<K, V> + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> TreeMap<K, V, C, A> {
        let mut map: TreeMap<K, V, C, A> = Default::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C, A> Extend<(K, V)> for TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    #[inline]
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            if self.insert(k, v).is_err() {
                panic!("node arena out of capacity while extending");
            }
        }
    }
}

impl<K: Hash, V: Hash, C, A> Hash for TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        for elt in self.iter() {
            elt.hash(state);
        }
    }
}

impl<'a, K, V, C, A> IntoIterator for &'a TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, A>;
    fn into_iter(self) -> Iter<'a, K, V, A> {
        self.iter()
    }
}

impl<'a, K, V, C, A> IntoIterator for &'a mut TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, A>;
    fn into_iter(self) -> IterMut<'a, K, V, A> {
        self.iter_mut()
    }
}

impl<K, V, C, A> IntoIterator for TreeMap<K, V, C, A>
where
    C: Compare<K>,
    A: NodeArena<K, V>,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;
    fn into_iter(self) -> IntoIter<K, V, A> {
        let next = subtree_min(&self.arena, self.root);
        IntoIter {
            arena: self.arena,
            next,
            remaining: self.length,
            marker: PhantomData,
        }
    }
}

#[cfg(feature = "ordered_iter")]
impl<'a, K, V, A: NodeArena<K, V>> ::ordered_iter::OrderedMapIterator for Iter<'a, K, V, A> {
    type Key = &'a K;
    type Val = &'a V;
}
