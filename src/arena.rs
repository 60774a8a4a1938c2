// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Node storage for the red-black tree.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`] handles
//! rather than pointers. Index 0 is reserved for the sentinel: a single
//! black, payload-free node that terminates every leaf link and stands in
//! for "no child" and "no parent", so the balancing code never branches on
//! a null pointer. An empty tree's root is the sentinel.
//!
//! The [`NodeArena`] trait is the allocator seam: the tree calls
//! `allocate` exactly once per inserted node and `deallocate` exactly once
//! per erased node, and an alternate storage strategy (pool, bump region)
//! can be substituted without touching the tree logic. [`SlabArena`] is
//! the default strategy: a `Vec` of slots threaded with a free list, with
//! per-slot generation counters so stale cursors can be detected after a
//! slot is reused.

use crate::error::{Error, Result};

/// Handle to a node slot in an arena.
///
/// `NodeId::NIL` (index 0) is the sentinel and means "no child"/"no
/// parent"/"end of sequence" depending on context.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The sentinel handle.
    pub const NIL: NodeId = NodeId(0);

    /// Returns true if this is the sentinel handle.
    #[inline]
    pub fn is_nil(self) -> bool {
        self == NodeId::NIL
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_nil() {
            write!(f, "NodeId(nil)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// Node color. The sentinel and the root are always black.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Color {
    Red,
    Black,
}

/// A tree vertex: three links, a color, and an optional payload.
///
/// `entry` is `Some` for every live node and `None` for the sentinel and
/// for free slots. Links are handles into the owning arena; the arena is
/// the sole owner of every node, so parent back-references cannot dangle.
#[derive(Clone, Debug)]
pub struct Node<K, V> {
    pub parent: NodeId,
    pub left: NodeId,
    pub right: NodeId,
    pub color: Color,
    pub entry: Option<(K, V)>,
}

impl<K, V> Node<K, V> {
    /// The node's key.
    ///
    /// # Panics
    ///
    /// Panics if called on the sentinel or a free slot.
    #[inline]
    pub fn key(&self) -> &K {
        &self.entry.as_ref().unwrap().0
    }

    /// The node's value.
    ///
    /// # Panics
    ///
    /// Panics if called on the sentinel or a free slot.
    #[inline]
    pub fn value(&self) -> &V {
        &self.entry.as_ref().unwrap().1
    }

    /// Mutable access to the node's value.
    ///
    /// # Panics
    ///
    /// Panics if called on the sentinel or a free slot.
    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.entry.as_mut().unwrap().1
    }

    fn sentinel() -> Node<K, V> {
        Node {
            parent: NodeId::NIL,
            left: NodeId::NIL,
            right: NodeId::NIL,
            color: Color::Black,
            entry: None,
        }
    }
}

/// Storage capability consumed by the tree.
///
/// Implementations own the nodes outright. The contract the tree relies
/// on:
///
/// - slot 0 exists from construction, is black, payload-free, and is never
///   allocated or deallocated; its links are writable (erase rebalancing
///   uses the sentinel's `parent` as scratch);
/// - `allocate` returns a red node with all links NIL and the given
///   payload, or `Error::AllocationFailure` without other effects;
/// - `deallocate` returns the payload and bumps the slot's generation so
///   outstanding handles to the old node can be recognized as stale;
/// - `node`/`node_mut` panic on handles that were never allocated
///   (programming error, not a recoverable condition).
pub trait NodeArena<K, V> {
    /// Allocates and initializes a new node. Called exactly once per
    /// inserted element.
    fn allocate(&mut self, key: K, value: V) -> Result<NodeId>;

    /// Releases a node and returns its payload. Called exactly once per
    /// erased element.
    fn deallocate(&mut self, id: NodeId) -> (K, V);

    /// Shared access to a node (the sentinel included).
    fn node(&self, id: NodeId) -> &Node<K, V>;

    /// Exclusive access to a node (the sentinel included).
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V>;

    /// Current generation of a slot. Bumped by every `deallocate`.
    fn generation(&self, id: NodeId) -> u32;

    /// Releases every live node and resets the sentinel's links.
    ///
    /// Each live payload is dropped exactly once.
    fn clear(&mut self);
}

struct Slot<K, V> {
    node: Node<K, V>,
    generation: u32,
}

/// The default arena: a `Vec` of slots threaded with a free list.
///
/// Freed slots are reused in LIFO order, chaining the free list through
/// the `parent` link of the freed node. An optional limit on live nodes
/// makes allocation failure an observable outcome:
///
/// ```rust
/// use arena_rbtree::{NodeArena, SlabArena};
///
/// let mut arena: SlabArena<i32, ()> = SlabArena::bounded(1);
/// let id = arena.allocate(1, ()).unwrap();
/// assert!(arena.allocate(2, ()).is_err());
/// arena.deallocate(id);
/// assert!(arena.allocate(2, ()).is_ok());
/// ```
pub struct SlabArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: NodeId,
    live: usize,
    limit: Option<usize>,
}

impl<K, V> SlabArena<K, V> {
    /// Creates an arena with no limit on the number of live nodes.
    pub fn new() -> SlabArena<K, V> {
        SlabArena {
            slots: vec![Slot {
                node: Node::sentinel(),
                generation: 0,
            }],
            free: NodeId::NIL,
            live: 0,
            limit: None,
        }
    }

    /// Creates an arena that refuses to hold more than `max_nodes` live
    /// nodes at a time.
    pub fn bounded(max_nodes: usize) -> SlabArena<K, V> {
        SlabArena {
            limit: Some(max_nodes),
            ..SlabArena::new()
        }
    }

    /// Number of live (allocated, not yet deallocated) nodes.
    pub fn live(&self) -> usize {
        self.live
    }
}

impl<K, V> Default for SlabArena<K, V> {
    fn default() -> SlabArena<K, V> {
        SlabArena::new()
    }
}

impl<K: Clone, V: Clone> Clone for SlabArena<K, V> {
    fn clone(&self) -> SlabArena<K, V> {
        SlabArena {
            slots: self
                .slots
                .iter()
                .map(|s| Slot {
                    node: s.node.clone(),
                    generation: s.generation,
                })
                .collect(),
            free: self.free,
            live: self.live,
            limit: self.limit,
        }
    }
}

impl<K, V> NodeArena<K, V> for SlabArena<K, V> {
    fn allocate(&mut self, key: K, value: V) -> Result<NodeId> {
        if let Some(limit) = self.limit {
            if self.live >= limit {
                return Err(Error::AllocationFailure);
            }
        }
        let id = if !self.free.is_nil() {
            let id = self.free;
            let node = &mut self.slots[id.index()].node;
            self.free = node.parent;
            node.parent = NodeId::NIL;
            node.left = NodeId::NIL;
            node.right = NodeId::NIL;
            node.color = Color::Red;
            node.entry = Some((key, value));
            id
        } else {
            let index = self.slots.len();
            if index > u32::MAX as usize {
                return Err(Error::AllocationFailure);
            }
            self.slots.push(Slot {
                node: Node {
                    parent: NodeId::NIL,
                    left: NodeId::NIL,
                    right: NodeId::NIL,
                    color: Color::Red,
                    entry: Some((key, value)),
                },
                generation: 0,
            });
            NodeId(index as u32)
        };
        self.live += 1;
        Ok(id)
    }

    fn deallocate(&mut self, id: NodeId) -> (K, V) {
        assert!(!id.is_nil(), "cannot deallocate the sentinel");
        let slot = &mut self.slots[id.index()];
        let entry = slot.node.entry.take().unwrap();
        slot.generation = slot.generation.wrapping_add(1);
        slot.node.parent = self.free;
        self.free = id;
        self.live -= 1;
        entry
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.slots[id.index()].node
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.slots[id.index()].node
    }

    #[inline]
    fn generation(&self, id: NodeId) -> u32 {
        self.slots[id.index()].generation
    }

    fn clear(&mut self) {
        // Slots are kept (not truncated) so generations stay monotone and
        // cursors held across a clear read as stale, never as live.
        for index in 1..self.slots.len() {
            let slot = &mut self.slots[index];
            if slot.node.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                slot.node.parent = self.free;
                self.free = NodeId(index as u32);
            }
        }
        self.slots[0].node = Node::sentinel();
        self.live = 0;
    }
}

#[cfg(test)]
mod test_arena {
    use super::{Color, NodeArena, NodeId, SlabArena};
    use crate::error::Error;

    #[test]
    fn sentinel_is_black_and_reserved() {
        let arena: SlabArena<i32, i32> = SlabArena::new();
        let nil = arena.node(NodeId::NIL);
        assert_eq!(nil.color, Color::Black);
        assert!(nil.entry.is_none());
        assert!(nil.left.is_nil() && nil.right.is_nil() && nil.parent.is_nil());
    }

    #[test]
    fn allocate_reuses_freed_slots() {
        let mut arena: SlabArena<i32, i32> = SlabArena::new();
        let a = arena.allocate(1, 10).unwrap();
        let b = arena.allocate(2, 20).unwrap();
        assert_ne!(a, b);
        assert_eq!(arena.deallocate(a), (1, 10));
        let c = arena.allocate(3, 30).unwrap();
        assert_eq!(a, c); // LIFO reuse
        assert_eq!(arena.live(), 2);
    }

    #[test]
    fn generation_bumps_on_deallocate() {
        let mut arena: SlabArena<i32, i32> = SlabArena::new();
        let a = arena.allocate(1, 10).unwrap();
        let before = arena.generation(a);
        arena.deallocate(a);
        let reused = arena.allocate(2, 20).unwrap();
        assert_eq!(a, reused);
        assert_ne!(arena.generation(reused), before);
    }

    #[test]
    fn bounded_arena_reports_allocation_failure() {
        let mut arena: SlabArena<i32, i32> = SlabArena::bounded(2);
        let a = arena.allocate(1, 10).unwrap();
        arena.allocate(2, 20).unwrap();
        assert_eq!(arena.allocate(3, 30), Err(Error::AllocationFailure));
        arena.deallocate(a);
        assert!(arena.allocate(3, 30).is_ok());
    }

    #[test]
    fn clear_releases_everything_and_keeps_generations_monotone() {
        let mut arena: SlabArena<i32, i32> = SlabArena::new();
        let a = arena.allocate(1, 10).unwrap();
        let gen = arena.generation(a);
        arena.allocate(2, 20).unwrap();
        arena.clear();
        assert_eq!(arena.live(), 0);
        assert_ne!(arena.generation(a), gen);
        // Slots are reusable after a clear.
        arena.allocate(3, 30).unwrap();
        assert_eq!(arena.live(), 1);
    }
}
