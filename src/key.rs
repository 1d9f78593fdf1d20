//! Key domains: owned and borrowed keys, bucket indexing and equality.
//!
//! Byte and text keys are hashed with the table's 32-bit hasher. Integer
//! keys index by their own low bits with no diffusion, so a set of integers
//! sharing low bits will share a bucket.

use crate::error::Error;
use crate::hash::hash32;
use core::any::Any;
use core::hash::BuildHasher;

/// The five supported key domains.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeyDomain {
    Bytes,
    Str,
    Int,
    U32,
    U64,
}

/// An owned key as stored in the table.
///
/// Keys of different domains never compare equal, even when their bytes
/// match (`Key::Bytes(b"a")` and `Key::Str("a")` are distinct keys).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Key {
    Bytes(Vec<u8>),
    Str(String),
    Int(isize),
    U32(u32),
    U64(u64),
}

/// A borrowed key used for lookups and removals.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeyRef<'a> {
    Bytes(&'a [u8]),
    Str(&'a str),
    Int(isize),
    U32(u32),
    U64(u64),
}

impl Key {
    pub fn domain(&self) -> KeyDomain {
        self.as_key_ref().domain()
    }

    pub fn as_key_ref(&self) -> KeyRef<'_> {
        match self {
            Key::Bytes(b) => KeyRef::Bytes(b),
            Key::Str(s) => KeyRef::Str(s),
            Key::Int(i) => KeyRef::Int(*i),
            Key::U32(u) => KeyRef::U32(*u),
            Key::U64(u) => KeyRef::U64(*u),
        }
    }
}

impl<'a> KeyRef<'a> {
    pub fn domain(&self) -> KeyDomain {
        match self {
            KeyRef::Bytes(_) => KeyDomain::Bytes,
            KeyRef::Str(_) => KeyDomain::Str,
            KeyRef::Int(_) => KeyDomain::Int,
            KeyRef::U32(_) => KeyDomain::U32,
            KeyRef::U64(_) => KeyDomain::U64,
        }
    }

    pub fn to_key(&self) -> Key {
        match *self {
            KeyRef::Bytes(b) => Key::Bytes(b.to_vec()),
            KeyRef::Str(s) => Key::Str(s.to_owned()),
            KeyRef::Int(i) => Key::Int(i),
            KeyRef::U32(u) => Key::U32(u),
            KeyRef::U64(u) => Key::U64(u),
        }
    }

    /// Bucket index for this key in a table whose mask is `mask`
    /// (`capacity - 1`, capacity a power of two).
    #[inline]
    pub fn bucket_index<S: BuildHasher>(&self, hasher: &S, mask: usize) -> usize {
        match *self {
            KeyRef::Bytes(b) => (hash32(hasher, b) & mask as u32) as usize,
            KeyRef::Str(s) => (hash32(hasher, s.as_bytes()) & mask as u32) as usize,
            // Two's-complement bits, so negative keys still land in range.
            KeyRef::Int(i) => (i as usize) & mask,
            KeyRef::U32(u) => (u & mask as u32) as usize,
            KeyRef::U64(u) => (u & mask as u64) as usize,
        }
    }
}

impl PartialEq<KeyRef<'_>> for Key {
    fn eq(&self, other: &KeyRef<'_>) -> bool {
        self.as_key_ref() == *other
    }
}

impl From<KeyRef<'_>> for Key {
    fn from(k: KeyRef<'_>) -> Self {
        k.to_key()
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Key::Bytes(b)
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Key::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Key {
    fn from(b: &[u8; N]) -> Self {
        Key::Bytes(b.to_vec())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_owned())
    }
}

impl From<isize> for Key {
    fn from(i: isize) -> Self {
        Key::Int(i)
    }
}

impl From<u32> for Key {
    fn from(u: u32) -> Self {
        Key::U32(u)
    }
}

impl From<u64> for Key {
    fn from(u: u64) -> Self {
        Key::U64(u)
    }
}

impl<'a> From<&'a Key> for KeyRef<'a> {
    fn from(k: &'a Key) -> Self {
        k.as_key_ref()
    }
}

impl<'a> From<&'a [u8]> for KeyRef<'a> {
    fn from(b: &'a [u8]) -> Self {
        KeyRef::Bytes(b)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for KeyRef<'a> {
    fn from(b: &'a [u8; N]) -> Self {
        KeyRef::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for KeyRef<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        KeyRef::Bytes(b)
    }
}

impl<'a> From<&'a str> for KeyRef<'a> {
    fn from(s: &'a str) -> Self {
        KeyRef::Str(s)
    }
}

impl<'a> From<&'a String> for KeyRef<'a> {
    fn from(s: &'a String) -> Self {
        KeyRef::Str(s)
    }
}

impl From<isize> for KeyRef<'_> {
    fn from(i: isize) -> Self {
        KeyRef::Int(i)
    }
}

impl From<u32> for KeyRef<'_> {
    fn from(u: u32) -> Self {
        KeyRef::U32(u)
    }
}

impl From<u64> for KeyRef<'_> {
    fn from(u: u64) -> Self {
        KeyRef::U64(u)
    }
}

/// Converts a dynamically typed value into a key, rejecting anything outside
/// the supported domains with [`Error::BadKeyType`].
impl TryFrom<&dyn Any> for Key {
    type Error = Error;

    fn try_from(value: &dyn Any) -> Result<Self, Error> {
        if let Some(k) = value.downcast_ref::<Key>() {
            Ok(k.clone())
        } else if let Some(b) = value.downcast_ref::<Vec<u8>>() {
            Ok(Key::Bytes(b.clone()))
        } else if let Some(b) = value.downcast_ref::<&'static [u8]>() {
            Ok(Key::Bytes(b.to_vec()))
        } else if let Some(s) = value.downcast_ref::<String>() {
            Ok(Key::Str(s.clone()))
        } else if let Some(s) = value.downcast_ref::<&'static str>() {
            Ok(Key::Str((*s).to_owned()))
        } else if let Some(i) = value.downcast_ref::<isize>() {
            Ok(Key::Int(*i))
        } else if let Some(u) = value.downcast_ref::<u32>() {
            Ok(Key::U32(*u))
        } else if let Some(u) = value.downcast_ref::<u64>() {
            Ok(Key::U64(*u))
        } else {
            Err(Error::BadKeyType)
        }
    }
}
