/// Errors reported by table operations.
///
/// A missing key is never an error; lookups and removals return `Option`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A key outside the supported domains was presented. Keys must be a
    /// byte sequence, a string, an `isize`, a `u32` or a `u64`.
    #[error("bad key type: expected a byte sequence, string, isize, u32 or u64")]
    BadKeyType,

    /// [`Table::expand`](crate::Table::expand) was asked for a capacity that
    /// does not exceed the number of live entries.
    #[error("requested capacity {requested} does not exceed the current entry count {count}")]
    CapacityTooSmall { requested: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
