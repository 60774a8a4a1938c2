//! Cursor semantics through the public API: begin/end navigation, stale
//! detection after erasure and slot reuse, erase-by-position, and the
//! identity-preserving successor splice.

use arena_rbtree::{Error, TreeMap};

fn digits() -> TreeMap<i32, &'static str> {
    let mut map = TreeMap::new();
    for (k, v) in [(1, "one"), (2, "two"), (3, "three"), (4, "four"), (5, "five")] {
        map.insert(k, v).unwrap();
    }
    map
}

#[test]
fn front_cursor_walks_the_whole_sequence() {
    let map = digits();
    let mut cur = map.cursor_front();
    let mut seen = Vec::new();
    while !cur.is_end() {
        seen.push(*cur.key().unwrap());
        cur.move_next().unwrap();
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

#[test]
fn end_cursor_decrements_to_maximum() {
    let map = digits();
    let mut cur = map.cursor_end();
    assert!(cur.is_end());
    assert_eq!(cur.key(), None);
    assert_eq!(cur.value(), None);

    cur.move_prev().unwrap();
    assert_eq!(cur.key(), Some(&5));
    assert_eq!(cur.value(), Some(&"five"));
}

#[test]
fn overrun_is_reported() {
    let map = digits();

    let mut cur = map.cursor_end();
    assert_eq!(cur.move_next(), Err(Error::InvalidCursor));

    let mut front = map.cursor_front();
    assert_eq!(front.move_prev(), Err(Error::InvalidCursor));
    // The failed move leaves the cursor where it was.
    assert_eq!(front.key(), Some(&1));
}

#[test]
fn empty_map_cursors() {
    let map: TreeMap<i32, i32> = TreeMap::new();
    assert!(map.cursor_front().is_end());
    assert!(map.find(&1).is_end());
    let mut cur = map.cursor_end();
    assert_eq!(cur.move_prev(), Err(Error::InvalidCursor));
}

#[test]
fn find_hit_and_miss() {
    let map = digits();

    let cur = map.find(&3);
    assert!(cur.is_valid());
    assert_eq!(cur.key(), Some(&3));
    assert_eq!(cur.value(), Some(&"three"));

    let miss = map.find(&6);
    assert!(miss.is_end());
    assert!(!miss.is_valid());
    assert_eq!(miss.key(), None);
}

#[test]
fn cursor_equality_is_node_identity() {
    let map = digits();
    assert!(map.find(&2) == map.find(&2));
    assert!(map.find(&2) != map.find(&3));

    let mut walked = map.cursor_front();
    walked.move_next().unwrap();
    assert!(walked == map.find(&2));
}

#[test]
fn erase_by_position() {
    let mut map = digits();
    let pos = map.find(&3).position();

    assert_eq!(map.remove_at(pos), Ok((3, "three")));
    assert_eq!(map.len(), 4);
    let keys: Vec<i32> = map.keys().copied().collect();
    assert_eq!(keys, vec![1, 2, 4, 5]);
    map.assert_invariants();

    // The position is now stale.
    assert_eq!(map.remove_at(pos), Err(Error::InvalidCursor));
}

#[test]
fn end_position_cannot_be_erased() {
    let mut map = digits();
    let end = map.cursor_end().position();
    assert_eq!(map.remove_at(end), Err(Error::InvalidCursor));
    assert_eq!(map.len(), 5);
}

#[test]
fn stale_position_survives_slot_reuse() {
    let mut map = digits();
    let pos = map.find(&1).position();

    map.remove(&1).unwrap();
    // A fresh insert reuses the freed slot; the old position must still
    // read as stale, not as the new element.
    map.insert(6, "six").unwrap();
    assert_eq!(map.remove_at(pos), Err(Error::InvalidCursor));
    assert!(map.contains_key(&6));
    map.assert_invariants();
}

#[test]
fn stale_position_survives_clear() {
    let mut map = digits();
    let pos = map.find(&2).position();

    map.clear();
    map.insert(2, "two again").unwrap();
    assert_eq!(map.remove_at(pos), Err(Error::InvalidCursor));
    assert_eq!(map.len(), 1);
}

#[test]
fn erasing_one_element_invalidates_only_its_positions() {
    let mut map = digits();
    let p2 = map.find(&2).position();
    let p4 = map.find(&4).position();

    assert_eq!(map.remove(&2), Ok("two"));

    assert_eq!(map.remove_at(p2), Err(Error::InvalidCursor));
    assert_eq!(map.remove_at(p4), Ok((4, "four")));
    map.assert_invariants();
}

#[test]
fn successor_splice_preserves_successor_position() {
    // Erase a key with two children; its in-order successor node is
    // spliced into the vacated spot but keeps its identity, so a position
    // taken on the successor stays valid and still names the successor.
    let mut map = TreeMap::new();
    for i in [4, 2, 6, 1, 3, 5, 7] {
        map.insert(i, i * 10).unwrap();
    }

    let pos = map.find(&5).position(); // successor of 4
    assert_eq!(map.remove(&4), Ok(40));
    map.assert_invariants();

    assert_eq!(map.remove_at(pos), Ok((5, 50)));
    assert!(!map.contains_key(&5));
    map.assert_invariants();
}

#[test]
fn cursor_walks_after_unrelated_erase() {
    let mut map = digits();
    map.remove(&3).unwrap();

    let mut cur = map.find(&2);
    cur.move_next().unwrap();
    assert_eq!(cur.key(), Some(&4));
    cur.move_prev().unwrap();
    assert_eq!(cur.key(), Some(&2));
}
