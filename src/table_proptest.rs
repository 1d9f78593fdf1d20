#![cfg(test)]

// Property tests for Table kept inside the crate so they can check chain
// invariants through internal modules if needed.

use crate::key::Key;
use crate::table::{effective_capacity, Table};
use crate::Error;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Remove(usize),
    RemoveAndUpdate(usize),
    Get(usize),
    Contains(usize),
    Update(usize, i32),
    Iterate,
    // Drop every entry whose value is below the threshold.
    Retain(i32),
    // Grow by this many buckets past the current count, then continue on the copy.
    Expand(usize),
}

// Small ranges so integer keys collide on their low bits and text/bytes of
// equal content coexist as distinct keys.
fn arb_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        "[a-c]{0,3}".prop_map(Key::Str),
        proptest::collection::vec(b'a'..=b'c', 0..3).prop_map(Key::Bytes),
        (-40isize..40).prop_map(Key::Int),
        (0u32..64).prop_map(Key::U32),
        (0u64..64).prop_map(Key::U64),
    ]
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Key>, Vec<OpI>)> {
    proptest::collection::vec(arb_key(), 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), -100i32..100).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveAndUpdate),
            2 => idx.clone().prop_map(OpI::Get),
            1 => idx.clone().prop_map(OpI::Contains),
            1 => (idx.clone(), -10i32..10).prop_map(|(i, d)| OpI::Update(i, d)),
            1 => Just(OpI::Iterate),
            1 => (-100i32..100).prop_map(OpI::Retain),
            1 => (0usize..40).prop_map(OpI::Expand),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn snapshot<S: BuildHasher>(t: &Table<i32, S>) -> HashMap<Key, i32> {
    let mut out = HashMap::new();
    t.iterate(|k, v| {
        let prev = out.insert(k.clone(), *v);
        assert!(prev.is_none(), "key visited twice: {:?}", k);
    });
    out
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `len` equals the number of distinct live keys after every op.
// - `get` returns the most recent `put` for each live key; absent otherwise.
// - `remove` of a missing key is a no-op; `remove_and_update` runs its
//   callback only for present keys.
// - `iterate` yields each live entry exactly once.
// - `iterate_and_update` removes exactly the rejected entries.
// - `expand` copies every mapping and leaves the source unchanged.
fn run_scenario<S>(
    mut sut: Table<i32, S>,
    pool: &[Key],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model: HashMap<Key, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = pool[i].clone();
                let prev = sut.put(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k), model.remove(k));
                // Idempotent
                prop_assert_eq!(sut.remove(k), None);
            }
            OpI::RemoveAndUpdate(i) => {
                let k = &pool[i];
                let mut seen = None;
                let r = sut.remove_and_update(k, |v| {
                    seen = Some(v);
                    v
                });
                let expected = model.remove(k);
                prop_assert_eq!(r, expected);
                prop_assert_eq!(seen, expected);
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k).copied());
            }
            OpI::Contains(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            OpI::Update(i, d) => {
                let k = &pool[i];
                let was_present = sut.update_with(k, |v| match v {
                    Some(v) => {
                        *v = v.saturating_add(d);
                        true
                    }
                    None => false,
                });
                prop_assert_eq!(was_present, model.contains_key(k));
                if let Some(mv) = model.get_mut(k) {
                    *mv = mv.saturating_add(d);
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = snapshot(&sut).into_keys().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::Retain(threshold) => {
                let mut visits = 0;
                sut.iterate_and_update(|_, v| {
                    visits += 1;
                    *v >= threshold
                });
                prop_assert_eq!(visits, model.len());
                model.retain(|_, v| *v >= threshold);
            }
            OpI::Expand(extra) => {
                let count = sut.len();
                prop_assert_eq!(
                    sut.expand(count).err(),
                    Some(Error::CapacityTooSmall { requested: count, count })
                );
                let before = snapshot(&sut);
                let requested = count + 1 + extra;
                let bigger = sut.expand(requested).expect("room for every entry");
                prop_assert_eq!(bigger.capacity(), effective_capacity(requested));
                prop_assert_eq!(snapshot(&sut), before.clone());
                prop_assert_eq!(snapshot(&bigger), before);
                sut = bigger;
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(snapshot(&sut), model.clone());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(Table::new(16), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, with every byte/text key
// in bucket 0. This stresses long chains, head/tail removal and re-anchoring.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(Table::with_hasher(16, ConstBuildHasher), &pool, ops)?;
    }
}
