// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types for tree operations.
//!
//! All fallible operations on [`TreeMap`](crate::TreeMap) and
//! [`TreeSet`](crate::TreeSet) report one of the variants below. Internal
//! balancing mistakes are programming errors, not error values: they are
//! caught by `assert_invariants` in the test suites and surface as panics.

use thiserror::Error;

/// Errors reported by tree operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The arena could not provide storage for a new node.
    ///
    /// Insertion allocates before touching the tree structure, so a failed
    /// insert leaves the tree exactly as it was before the call.
    #[error("arena cannot allocate another node")]
    AllocationFailure,

    /// Erase-by-key found no element with the given key.
    ///
    /// The tree is left unchanged. Lookups (`find`, `get`) report a miss
    /// as an end cursor or `None` instead; only erasure treats a miss as
    /// an error.
    #[error("no element found for key")]
    NotFound,

    /// A cursor operation referred to a node that no longer exists, or
    /// walked past the end of the sequence.
    ///
    /// Cursors snapshot the generation of the slot they point at; erasing
    /// that node bumps the generation, so a stale cursor is detected in
    /// O(1) instead of reading a reused slot. Incrementing the end cursor
    /// and decrementing at the minimum report the same variant.
    #[error("cursor refers to a reclaimed node or ran past the sequence")]
    InvalidCursor,
}

/// A `Result` alias using the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
