//! Table: the locked public surface over `Chains`.

use crate::builder::TableBuilder;
use crate::chain::{Chains, Iter};
use crate::error::{Error, Result};
use crate::hash::BuildFnv1Hasher;
use crate::key::{Key, KeyRef};
use crate::reentrancy::{DebugReentrancy, ReentrancyGuard};
use core::fmt;
use core::hash::BuildHasher;
use parking_lot::{RwLock, RwLockWriteGuard};

/// Smallest bucket count a table is ever built with.
pub const MIN_CAPACITY: usize = 16;

/// Rounds a requested capacity up to a power of two, floored at
/// [`MIN_CAPACITY`].
pub fn effective_capacity(requested: usize) -> usize {
    requested.max(MIN_CAPACITY).next_power_of_two()
}

/// A chained hash table safe to share between threads.
///
/// One reader/writer lock guards the whole table. Lookups, `len` and
/// `iterate` take it shared; everything that can change a chain or a value
/// takes it exclusive. The lock is held for the full operation, including
/// any callback the operation runs.
///
/// # Callbacks
///
/// The lock is not reentrant. A callback passed to `update_with`,
/// `remove_and_update`, `iterate` or `iterate_and_update` must not call any
/// method on the same table; doing so deadlocks (debug builds panic with
/// "reentrancy detected" instead). Use [`Table::write`] to run several
/// operations inside one critical section.
///
/// # Capacity
///
/// The bucket count is fixed for the life of a table. [`Table::expand`]
/// builds a new, larger table and leaves `self` untouched; swapping any
/// shared reference over to the new table is up to the caller.
pub struct Table<V, S = BuildFnv1Hasher> {
    chains: RwLock<Chains<V>>,
    capacity: usize,
    mask: usize,
    hasher: S,
    name: Option<String>,
    reentrancy: DebugReentrancy,
}

impl<V> Table<V> {
    /// Creates a table with at least `requested` buckets (rounded up to a
    /// power of two, minimum 16) using 32-bit FNV-1 for byte and text keys.
    pub fn new(requested: usize) -> Self {
        Self::with_hasher(requested, BuildFnv1Hasher)
    }

    pub fn builder() -> TableBuilder<V> {
        TableBuilder::new()
    }
}

impl<V, S> Table<V, S>
where
    S: BuildHasher,
{
    /// Creates a table that hashes byte and text keys with `hasher`. Only
    /// the low 32 bits of each hash are used.
    pub fn with_hasher(requested: usize, hasher: S) -> Self {
        Self::from_parts(requested, hasher, None)
    }

    pub(crate) fn from_parts(requested: usize, hasher: S, name: Option<String>) -> Self {
        let capacity = effective_capacity(requested);
        #[cfg(feature = "logging")]
        log::debug!(
            "{}Created table with {capacity} buckets (requested {requested})",
            log_prefix(name.as_deref())
        );
        Self {
            chains: RwLock::new(Chains::new(capacity)),
            capacity,
            mask: capacity - 1,
            hasher,
            name,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of buckets. Always a power of two and at least 16.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let _g = self.reentrancy.enter();
        self.chains.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn index_of(&self, q: KeyRef<'_>) -> usize {
        q.bucket_index(&self.hasher, self.mask)
    }

    /// Returns a clone of the value stored under `key`.
    pub fn get<'q>(&self, key: impl Into<KeyRef<'q>>) -> Option<V>
    where
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Runs `f` on the value stored under `key` while the shared lock is held.
    pub fn get_with<'q, R>(&self, key: impl Into<KeyRef<'q>>, f: impl FnOnce(&V) -> R) -> Option<R> {
        let q = key.into();
        let index = self.index_of(q);
        let _g = self.reentrancy.enter();
        let chains = self.chains.read();
        chains.find(index, q).map(f)
    }

    pub fn contains_key<'q>(&self, key: impl Into<KeyRef<'q>>) -> bool {
        let q = key.into();
        let index = self.index_of(q);
        let _g = self.reentrancy.enter();
        let chains = self.chains.read();
        chains.find(index, q).is_some()
    }

    /// Inserts `value` under `key`, or overwrites the value of an existing
    /// equal key in place and returns the old value. The stored key is kept.
    pub fn put(&self, key: impl Into<Key>, value: V) -> Option<V> {
        let key = key.into();
        let index = self.index_of(key.as_key_ref());
        let _g = self.reentrancy.enter();
        let mut chains = self.chains.write();
        chains.insert(index, key, value)
    }

    /// Runs `f` once under the exclusive lock with the value stored under
    /// `key`, or with `None` when the key is absent.
    pub fn update_with<'q, R>(
        &self,
        key: impl Into<KeyRef<'q>>,
        f: impl FnOnce(Option<&mut V>) -> R,
    ) -> R {
        let q = key.into();
        let index = self.index_of(q);
        let _g = self.reentrancy.enter();
        let mut chains = self.chains.write();
        f(chains.find_mut(index, q))
    }

    /// Detaches the entry for `key` and returns its value. Removing an absent
    /// key does nothing.
    pub fn remove<'q>(&self, key: impl Into<KeyRef<'q>>) -> Option<V> {
        self.remove_and_update(key, core::convert::identity)
    }

    /// Detaches the entry for `key` and hands its value to `f` before the
    /// exclusive lock is released. `f` is not called when the key is absent.
    pub fn remove_and_update<'q, R>(
        &self,
        key: impl Into<KeyRef<'q>>,
        f: impl FnOnce(V) -> R,
    ) -> Option<R> {
        let q = key.into();
        let index = self.index_of(q);
        let _g = self.reentrancy.enter();
        let mut chains = self.chains.write();
        chains.unlink(index, q).map(|(_key, value)| f(value))
    }

    /// Calls `f` on every entry, in bucket order then chain order, under the
    /// shared lock.
    pub fn iterate(&self, mut f: impl FnMut(&Key, &V)) {
        let _g = self.reentrancy.enter();
        let chains = self.chains.read();
        for (key, value) in chains.iter() {
            f(key, value);
        }
    }

    /// Calls `f` on every entry under the exclusive lock. Entries for which
    /// `f` returns `false` are removed on the spot; every other live entry is
    /// still visited exactly once.
    pub fn iterate_and_update(&self, f: impl FnMut(&Key, &mut V) -> bool) {
        let _g = self.reentrancy.enter();
        let mut chains = self.chains.write();
        chains.retain(f);
    }

    /// Takes the exclusive lock and returns a guard that runs operations
    /// without re-acquiring it.
    pub fn write(&self) -> TableWriteGuard<'_, V, S> {
        let reentrancy = self.reentrancy.enter();
        TableWriteGuard {
            chains: self.chains.write(),
            table: self,
            _reentrancy: reentrancy,
        }
    }

    /// Builds a new table with at least `requested` buckets holding a copy of
    /// every entry, re-hashed against the new mask.
    ///
    /// `self` is read under its exclusive lock and is left unchanged. The new
    /// table shares nothing with `self`, uses a clone of its hasher and
    /// inherits its name.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityTooSmall`] when `requested` does not exceed the number
    /// of live entries.
    pub fn expand(&self, requested: usize) -> Result<Table<V, S>>
    where
        V: Clone,
        S: Clone,
    {
        let _g = self.reentrancy.enter();
        let chains = self.chains.write();
        let count = chains.len();
        if requested <= count {
            #[cfg(feature = "logging")]
            log::warn!(
                "{}Refused to expand to {requested} buckets: table holds {count} entries",
                log_prefix(self.name())
            );
            return Err(Error::CapacityTooSmall { requested, count });
        }

        let target = Table::from_parts(requested, self.hasher.clone(), self.name.clone());
        for (key, value) in chains.iter() {
            target.put(key.clone(), value.clone());
        }

        #[cfg(feature = "logging")]
        log::debug!(
            "{}Expanded table from {} to {} buckets ({count} entries)",
            log_prefix(self.name()),
            self.capacity,
            target.capacity
        );
        Ok(target)
    }
}

impl<V, S> fmt::Debug for Table<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Table");
        d.field("name", &self.name).field("capacity", &self.capacity);
        // Never block, so formatting from inside a callback stays safe.
        match self.chains.try_read() {
            Some(chains) => d.field("len", &chains.len()),
            None => d.field("len", &format_args!("<locked>")),
        };
        d.finish()
    }
}

#[cfg(feature = "logging")]
fn log_prefix(name: Option<&str>) -> String {
    name.map(|n| format!("[{n}] ")).unwrap_or_default()
}

/// Exclusive access to a [`Table`] for the lifetime of the guard.
///
/// Every method runs inside the critical section already held, so the guard
/// can look up, insert and remove any number of entries atomically with
/// respect to other threads. Calling methods on the `Table` itself while the
/// guard is alive deadlocks.
pub struct TableWriteGuard<'a, V, S = BuildFnv1Hasher> {
    chains: RwLockWriteGuard<'a, Chains<V>>,
    table: &'a Table<V, S>,
    _reentrancy: ReentrancyGuard<'a>,
}

impl<'a, V, S> TableWriteGuard<'a, V, S>
where
    S: BuildHasher,
{
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.len() == 0
    }

    pub fn get<'q>(&self, key: impl Into<KeyRef<'q>>) -> Option<&V> {
        let q = key.into();
        self.chains.find(self.table.index_of(q), q)
    }

    pub fn get_mut<'q>(&mut self, key: impl Into<KeyRef<'q>>) -> Option<&mut V> {
        let q = key.into();
        let index = self.table.index_of(q);
        self.chains.find_mut(index, q)
    }

    pub fn contains_key<'q>(&self, key: impl Into<KeyRef<'q>>) -> bool {
        self.get(key).is_some()
    }

    pub fn put(&mut self, key: impl Into<Key>, value: V) -> Option<V> {
        let key = key.into();
        let index = self.table.index_of(key.as_key_ref());
        self.chains.insert(index, key, value)
    }

    /// Removes `key` without touching the lock; the caller already holds it.
    pub fn remove<'q>(&mut self, key: impl Into<KeyRef<'q>>) -> Option<V> {
        let q = key.into();
        let index = self.table.index_of(q);
        self.chains.unlink(index, q).map(|(_key, value)| value)
    }

    pub fn iter(&self) -> Iter<'_, V> {
        self.chains.iter()
    }
}
