//! chained-hashmap: a concurrent hash table with bucket chaining over a
//! closed set of key domains.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: predictable O(1) average lookup, explicit (never automatic)
//!   growth, and safe mutation from many threads, with each layer small
//!   enough to reason about on its own.
//! - Layers:
//!   - `key`: the five key domains (byte sequence, text, `isize`, `u32`,
//!     `u64`) as a closed sum type, plus bucket indexing and equality.
//!   - `chain`: bucket array and singly linked chains stored in a
//!     generational arena. No synchronization; callers hold the lock.
//!   - `Table<V, S>`: public API. Owns the chains behind one table-wide
//!     reader/writer lock and exposes every operation as a method that takes
//!     the lock first, so no access path bypasses it.
//!
//! Constraints
//! - Bucket count is a power of two, at least 16, fixed per table.
//! - One lock per table, held for the whole operation (never per bucket).
//!   Shared: `get`, `contains_key`, `iterate`, `len`. Exclusive: `put`,
//!   `update_with`, `remove`, `remove_and_update`, `iterate_and_update`,
//!   and `expand`'s read of the source.
//! - Insert-if-absent is one exclusive critical section, so two racing
//!   `put`s of the same key never produce two entries.
//!
//! Chains and the tail anchor
//! - Each bucket holds the id of its head node; each node links to its
//!   successor. The head alone caches the id of the chain's last node, so
//!   an append is O(1). Removing the tail re-anchors the head to the new
//!   last node; removing the head moves the anchor to the new head.
//! - Removal unlinks before the node leaves the arena and returns the
//!   detached key and value by value, so nothing unreachable is retained.
//!
//! Hashing
//! - Byte and text keys: low 32 bits of a pluggable `BuildHasher` fed the
//!   raw bytes (32-bit FNV-1 by default), masked by `capacity - 1`.
//! - Integer keys: the integer's own bits, masked. There is no diffusion;
//!   keys that share low bits share a bucket. This is deliberate and
//!   observable through bucket placement.
//!
//! Reentrancy policy
//! - The lock is not reentrant. Callbacks run under the lock and must not
//!   call back into the same table. Debug builds detect this per thread and
//!   panic; release builds deadlock. [`Table::write`] is the supported way
//!   to run several operations under one acquisition.
//!
//! Growth
//! - [`Table::expand`] re-inserts a clone of every entry into a new table
//!   through its ordinary insert path. The source is untouched and stays
//!   usable; swapping shared references is the caller's job.
//!
//! Errors
//! - A missing key is never an error. [`Error::CapacityTooSmall`] comes
//!   from `expand`; [`Error::BadKeyType`] from converting a `dyn Any` into
//!   a [`Key`].

mod builder;
mod chain;
mod error;
pub mod hash;
pub mod key;
mod reentrancy;
mod table;
mod table_proptest;

// Public surface
pub use builder::TableBuilder;
pub use chain::Iter;
pub use error::{Error, Result};
pub use hash::{BuildFnv1Hasher, Fnv1Hasher};
pub use key::{Key, KeyDomain, KeyRef};
pub use table::{effective_capacity, Table, TableWriteGuard, MIN_CAPACITY};
