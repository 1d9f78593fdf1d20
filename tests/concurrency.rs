// Multi-threaded scenarios. Threads share a `&Table` through
// `std::thread::scope`; the table-wide lock is the only synchronization.
use chained_hashmap::{Key, Table};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

// Test: five concurrent puts of distinct byte keys, then two removals.
// Verifies: iterate yields exactly the survivors and len is 3.
#[test]
fn concurrent_puts_then_removals() {
    let t: Table<usize> = Table::new(16);
    thread::scope(|s| {
        for i in 1..=5usize {
            let t = &t;
            s.spawn(move || {
                t.put(format!("key{i}").into_bytes(), i);
            });
        }
    });
    assert_eq!(t.len(), 5);

    t.remove(b"key2");
    t.remove(b"key3");

    let mut seen = BTreeSet::new();
    t.iterate(|k, _| {
        seen.insert(k.clone());
    });
    let expected: BTreeSet<Key> = ["key1", "key4", "key5"]
        .iter()
        .map(|k| Key::Bytes(k.as_bytes().to_vec()))
        .collect();
    assert_eq!(seen, expected);
    assert_eq!(t.len(), 3);
}

// Test: many threads racing to insert the same keys.
// Verifies: check-and-insert is atomic; no key ever gets two chain entries.
#[test]
fn racing_puts_on_same_key_never_duplicate() {
    let t: Table<usize> = Table::new(16);
    thread::scope(|s| {
        for worker in 0..8usize {
            let t = &t;
            s.spawn(move || {
                for round in 0..200u64 {
                    t.put(round % 32, worker);
                }
            });
        }
    });
    assert_eq!(t.len(), 32);
    let mut visits = 0;
    t.iterate(|_, _| visits += 1);
    assert_eq!(visits, 32);
}

// Test: readers concurrent with writers.
// Verifies: readers only ever observe fully written values and the final
// state matches the writers' last writes.
#[test]
fn readers_see_consistent_values() {
    let t: Table<(u32, u32)> = Table::new(64);
    thread::scope(|s| {
        for w in 0..4u32 {
            let t = &t;
            s.spawn(move || {
                for i in 0..500u32 {
                    let k = w * 1000 + (i % 50);
                    t.put(k, (k, i));
                }
            });
        }
        for _ in 0..4 {
            let t = &t;
            s.spawn(move || {
                for i in 0..2000u32 {
                    let k = (i % 4) * 1000 + (i % 50);
                    if let Some((stored_key, _)) = t.get(k) {
                        assert_eq!(stored_key, k);
                    }
                    t.iterate(|key, v| {
                        assert_eq!(key, &Key::U32(v.0));
                    });
                }
            });
        }
    });
    assert_eq!(t.len(), 200);
    for w in 0..4u32 {
        for j in 0..50u32 {
            let k = w * 1000 + j;
            assert_eq!(t.get(k), Some((k, 450 + j)));
        }
    }
}

// Test: concurrent update_with increments.
// Verifies: each callback runs under the exclusive lock, so no update is lost.
#[test]
fn update_with_is_atomic() {
    let t: Table<u64> = Table::new(16);
    t.put("counter", 0);
    thread::scope(|s| {
        for _ in 0..8 {
            let t = &t;
            s.spawn(move || {
                for _ in 0..1000 {
                    t.update_with("counter", |v| {
                        if let Some(v) = v {
                            *v += 1;
                        }
                    });
                }
            });
        }
    });
    assert_eq!(t.get("counter"), Some(8000));
}

// Test: concurrent removals of one key.
// Verifies: exactly one remover receives the value; the rest are no-ops.
#[test]
fn concurrent_removals_hand_out_value_once() {
    let t: Table<u32> = Table::new(16);
    for k in 0..64isize {
        t.put(k, 1);
    }
    let total: u32 = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let t = &t;
                s.spawn(move || (0..64isize).filter_map(|k| t.remove(k)).sum::<u32>())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });
    assert_eq!(total, 64);
    assert!(t.is_empty());
}

// Test: expand while other threads keep writing to the source.
// Verifies: the new table is a consistent snapshot and the source keeps
// accepting writes; swapping is left to the caller.
#[test]
fn expand_under_concurrent_writes() {
    let t = Arc::new(Table::<u64>::new(16));
    for i in 0..100u64 {
        t.put(i, i);
    }
    let writer = {
        let t = Arc::clone(&t);
        thread::spawn(move || {
            for i in 100..300u64 {
                t.put(i, i);
            }
        })
    };
    let bigger = t.expand(1024).expect("1024 exceeds any possible count");
    writer.join().unwrap();

    let n = bigger.len();
    assert!((100..=300).contains(&n));
    bigger.iterate(|k, v| match k {
        Key::U64(k) => assert_eq!(k, v),
        other => panic!("unexpected key {other:?}"),
    });
    assert_eq!(t.len(), 300);
}

// Test: write guard makes a read-modify-write sequence atomic.
#[test]
fn write_guard_transfers_atomically() {
    let t: Table<i64> = Table::new(16);
    t.put("a", 1000);
    t.put("b", 0);
    thread::scope(|s| {
        for _ in 0..4 {
            let t = &t;
            s.spawn(move || {
                for _ in 0..100 {
                    let mut g = t.write();
                    let a = g.remove("a").unwrap_or(0);
                    g.put("a", a - 1);
                    if let Some(b) = g.get_mut("b") {
                        *b += 1;
                    }
                }
            });
        }
        let t = &t;
        s.spawn(move || {
            for _ in 0..400 {
                let sum: i64 = {
                    let g = t.write();
                    g.iter().map(|(_, v)| *v).sum()
                };
                assert_eq!(sum, 1000);
            }
        });
    });
    assert_eq!(t.get("a"), Some(600));
    assert_eq!(t.get("b"), Some(400));
}

#[test]
fn table_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Table<String>>();
    assert_send_sync::<Table<Vec<u8>>>();
}
