//! B+Tree integration tests.
//!
//! These exercise whole-tree behavior through the public API: a concrete
//! order-5 scenario, close/reopen round-trips, and rebalancing under
//! bulk deletion.

use rowstore::{BTree, RowAddr};
use std::collections::BTreeMap;
use tempfile::tempdir;

/// Block size 60 gives an order-5 tree: 4 keys per node, minimum 2.
const BLOCK_SIZE: u32 = 60;

fn create_tree() -> (BTree, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let tree = BTree::create(dir.path().join("test.idx"), BLOCK_SIZE).unwrap();
    (tree, dir)
}

/// Deterministic pseudo-random sequence, enough to shuffle keys.
fn lcg(seed: u64) -> impl Iterator<Item = u64> {
    let mut state = seed;
    std::iter::from_fn(move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        Some(state >> 33)
    })
}

// ============================================================================
// The concrete order-5 scenario
// ============================================================================

/// Insert 0,3,...,48 then 2,5,...,50; check point and range search; remove
/// every odd key in [1,49]; verify membership afterwards.
#[test]
fn test_order_five_scenario() {
    let (mut tree, _dir) = create_tree();
    assert_eq!(tree.order(), 5);

    let mut recorded: BTreeMap<i32, RowAddr> = BTreeMap::new();
    let mut next_row = 16u64;
    for key in (0..=48).step_by(3).chain((2..=50).step_by(3)) {
        let addr = RowAddr::new(next_row);
        next_row += 34;
        assert!(tree.insert(key, addr).unwrap(), "key {} rejected", key);
        recorded.insert(key, addr);
    }
    tree.check_invariants().unwrap();

    // search(26) returns the address recorded at its insert.
    assert_eq!(tree.search(26).unwrap(), Some(recorded[&26]));

    // range_search(0, 25) returns exactly the inserted keys <= 25, in order.
    let got = tree.range_search(0, 25).unwrap();
    let want: Vec<RowAddr> = recorded
        .iter()
        .filter(|(k, _)| **k <= 25)
        .map(|(_, a)| *a)
        .collect();
    assert_eq!(got, want);

    // Remove all odd keys in [1, 49].
    for key in (1..=49).step_by(2) {
        let removed = tree.remove(key).unwrap();
        assert_eq!(removed, recorded.remove(&key), "key {}", key);
        tree.check_invariants().unwrap();
    }

    // Removed keys are gone; everything else is still found.
    for key in 0..=50 {
        assert_eq!(tree.search(key).unwrap(), recorded.get(&key).copied(), "key {}", key);
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_round_trip_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.idx");

    let mut recorded = BTreeMap::new();
    {
        let mut tree = BTree::create(&path, BLOCK_SIZE).unwrap();
        for (i, key) in lcg(7).map(|r| (r % 1000) as i32).take(300).enumerate() {
            let addr = RowAddr::new(1000 + i as u64 * 8);
            if tree.insert(key, addr).unwrap() {
                recorded.insert(key, addr);
            }
        }
        tree.close().unwrap();
    }

    let mut tree = BTree::open(&path).unwrap();
    assert_eq!(tree.order(), 5);
    tree.check_invariants().unwrap();

    // Every key maps to the identical row address it had before close.
    for (key, addr) in &recorded {
        assert_eq!(tree.search(*key).unwrap(), Some(*addr), "key {}", key);
    }

    // And the tree keeps working after reopen.
    assert!(tree.insert(100_000, RowAddr::new(4)).unwrap());
    assert_eq!(tree.search(100_000).unwrap(), Some(RowAddr::new(4)));
}

#[test]
fn test_open_expecting_block_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.idx");
    BTree::create(&path, BLOCK_SIZE).unwrap().close().unwrap();

    assert!(BTree::open_expecting(&path, BLOCK_SIZE).is_ok());
    match BTree::open_expecting(&path, 120) {
        Err(rowstore::Error::BlockSizeMismatch {
            stored: 60,
            expected: 120,
        }) => {}
        other => panic!("expected BlockSizeMismatch, got {:?}", other.map(|_| ())),
    }
}

// ============================================================================
// Range search vs. linear scan
// ============================================================================

#[test]
fn test_range_matches_linear_scan() {
    let (mut tree, _dir) = create_tree();

    let mut recorded = BTreeMap::new();
    for (i, key) in lcg(42).map(|r| (r % 500) as i32).take(400).enumerate() {
        let addr = RowAddr::new(16 + i as u64 * 8);
        if tree.insert(key, addr).unwrap() {
            recorded.insert(key, addr);
        }
    }
    tree.check_invariants().unwrap();

    for (low, high) in [(0, 499), (100, 250), (37, 37), (450, 600), (-50, 10)] {
        let got = tree.range_search(low, high).unwrap();
        let want: Vec<RowAddr> = recorded
            .range(low..=high)
            .map(|(_, a)| *a)
            .collect();
        assert_eq!(got, want, "range [{}, {}]", low, high);
    }

    // A range past every stored key comes back empty.
    assert_eq!(tree.range_search(i32::MAX - 1, i32::MAX).unwrap(), vec![]);
}

// ============================================================================
// Delete/reinsert stability
// ============================================================================

#[test]
fn test_delete_all_then_reinsert_subset() {
    let (mut tree, _dir) = create_tree();

    let keys: Vec<i32> = lcg(3).map(|r| (r % 400) as i32).take(300).collect();
    let mut present = BTreeMap::new();
    for (i, &key) in keys.iter().enumerate() {
        if tree.insert(key, RowAddr::new(16 + i as u64 * 8)).unwrap() {
            present.insert(key, ());
        }
    }

    // Remove everything the tree ever held, in a shuffled-ish order.
    let mut to_remove: Vec<i32> = present.keys().copied().collect();
    to_remove.reverse();
    for key in to_remove {
        assert!(tree.remove(key).unwrap().is_some(), "key {}", key);
    }
    assert!(tree.is_empty());

    // Reinsert a subset; the tree must come back fully consistent.
    let mut reinserted = BTreeMap::new();
    for (i, key) in (0..400).step_by(7).enumerate() {
        let addr = RowAddr::new(5000 + i as u64 * 8);
        assert!(tree.insert(key, addr).unwrap());
        reinserted.insert(key, addr);
    }
    tree.check_invariants().unwrap();

    for key in 0..400 {
        assert_eq!(tree.search(key).unwrap(), reinserted.get(&key).copied(), "key {}", key);
    }
}

// ============================================================================
// Duplicate rejection
// ============================================================================

#[test]
fn test_duplicate_rejection_is_idempotent() {
    let (mut tree, _dir) = create_tree();

    for key in 0..50 {
        assert!(tree.insert(key, RowAddr::new(16 + key as u64 * 8)).unwrap());
    }
    let before = tree.range_search(0, 49).unwrap();

    // Second insert of every key fails and changes nothing.
    for key in 0..50 {
        assert!(!tree.insert(key, RowAddr::new(99_999)).unwrap());
    }
    tree.check_invariants().unwrap();
    assert_eq!(tree.range_search(0, 49).unwrap(), before);
}
