// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An ordered map and set based on an arena-backed red-black tree.
//!
//! [`TreeMap`] keeps its nodes in an arena and links them by [`NodeId`]
//! handles, with a reserved black sentinel slot terminating every leaf
//! link. That layout gives the parent back-references the red-black
//! balancing code wants without raw pointers in the tree structure, and
//! the per-slot generation counters make stale cursors a detectable
//! error ([`Error::InvalidCursor`]) instead of a silent read of a reused
//! slot.
//!
//! Ordering comes from a [`compare::Compare`] comparator (natural order
//! by default), and node storage from a [`NodeArena`] implementation
//! ([`SlabArena`] by default; a bounded arena turns allocation failure
//! into a testable [`Error::AllocationFailure`]).
//!
//! ```rust
//! use arena_rbtree::TreeMap;
//!
//! let mut map = TreeMap::new();
//! map.insert(2, "two").unwrap();
//! map.insert(1, "one").unwrap();
//!
//! assert_eq!(map.first(), Some((&1, &"one")));
//! assert_eq!(map.remove(&2), Ok("two"));
//! ```

mod arena;
mod error;
mod map;
mod set;

pub use crate::arena::{Color, Node, NodeArena, NodeId, SlabArena};
pub use crate::error::{Error, Result};
pub use crate::map::{Cursor, IntoIter, Iter, IterMut, Keys, Position, TreeMap, Values, ValuesMut};
pub use crate::set::{SetIntoIter, SetIter, TreeSet};
