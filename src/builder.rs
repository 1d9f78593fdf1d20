use crate::hash::BuildFnv1Hasher;
use crate::table::{Table, MIN_CAPACITY};
use core::hash::BuildHasher;
use core::marker::PhantomData;

/// Builds a [`Table`] with various configuration knobs.
///
/// # Examples
///
/// ```rust
/// use chained_hashmap::Table;
///
/// let table: Table<u64> = Table::builder()
///     // Rounded up to 1024 buckets.
///     .initial_capacity(1000)
///     // Prefixes log records emitted by this table.
///     .name("sessions")
///     .build();
///
/// assert_eq!(table.capacity(), 1024);
/// table.put("alice", 1);
/// assert_eq!(table.get("alice"), Some(1));
/// ```
pub struct TableBuilder<V, S = BuildFnv1Hasher> {
    initial_capacity: usize,
    name: Option<String>,
    hasher: S,
    value_type: PhantomData<fn() -> V>,
}

impl<V> TableBuilder<V> {
    pub fn new() -> Self {
        Self {
            initial_capacity: MIN_CAPACITY,
            name: None,
            hasher: BuildFnv1Hasher,
            value_type: PhantomData,
        }
    }
}

impl<V> Default for TableBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> TableBuilder<V, S>
where
    S: BuildHasher,
{
    /// Sets the requested bucket count. The table rounds it up to a power of
    /// two with a floor of 16.
    pub fn initial_capacity(self, requested: usize) -> Self {
        Self {
            initial_capacity: requested,
            ..self
        }
    }

    /// Sets the name used to prefix this table's log records.
    pub fn name(self, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..self
        }
    }

    /// Sets the hasher used for byte and text keys.
    pub fn hasher<S2>(self, hasher: S2) -> TableBuilder<V, S2>
    where
        S2: BuildHasher,
    {
        TableBuilder {
            initial_capacity: self.initial_capacity,
            name: self.name,
            hasher,
            value_type: PhantomData,
        }
    }

    pub fn build(self) -> Table<V, S> {
        Table::from_parts(self.initial_capacity, self.hasher, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;

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
        } // force all byte/text keys into bucket 0
    }

    #[test]
    fn defaults() {
        let t: Table<i32> = TableBuilder::new().build();
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.name(), None);
        assert!(t.is_empty());
    }

    #[test]
    fn knobs_are_applied() {
        let t: Table<i32> = TableBuilder::default()
            .initial_capacity(100)
            .name("knobs")
            .build();
        assert_eq!(t.capacity(), 128);
        assert_eq!(t.name(), Some("knobs"));
    }

    /// Every key collides under a constant hasher; equality still resolves
    /// each key to its own entry.
    #[test]
    fn custom_hasher_collisions_resolve_by_equality() {
        let t: Table<i32, ConstBuildHasher> = Table::builder()
            .hasher(ConstBuildHasher)
            .name("const")
            .build();
        for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
            t.put(*k, i as i32);
        }
        t.put(&b"a"[..], 99);
        assert_eq!(t.len(), 5);
        assert_eq!(t.get("c"), Some(2));
        assert_eq!(t.get(&b"a"[..]), Some(99));
        assert_eq!(t.remove("d"), Some(3));
        assert_eq!(t.get("a"), Some(0));
        assert_eq!(t.len(), 4);
    }
}
