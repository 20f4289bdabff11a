use crate::{Heap, Str, Tagged, Value};

/// An integer that fits in a fixnum word.
///
/// Integer keys are stored as fixnums in keyed dictionaries, so a key outside
/// [`Value::FIXNUM_MIN`]..=[`Value::FIXNUM_MAX`] cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntegerKey(i64);

impl IntegerKey {
    pub const MIN: Self = Self(Value::FIXNUM_MIN);
    pub const MAX: Self = Self(Value::FIXNUM_MAX);

    #[inline]
    pub const fn new(n: i64) -> Option<Self> {
        if n >= Value::FIXNUM_MIN && n <= Value::FIXNUM_MAX {
            Some(Self(n))
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Canonical comparison form of a property key.
///
/// Names are interned per heap, so two name keys are the same key exactly
/// when they reference the same [`Str`] cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Integer(IntegerKey),
    Name(Tagged<Str>),
}

impl PropertyKey {
    /// Integer key for `n`, or `None` when `n` does not fit in a fixnum.
    #[inline]
    pub const fn integer(n: i64) -> Option<Self> {
        match IntegerKey::new(n) {
            Some(key) => Some(PropertyKey::Integer(key)),
            None => None,
        }
    }

    /// The integer this key names, if it is an integer key.
    #[inline]
    pub fn as_integer(self) -> Option<i64> {
        match self {
            PropertyKey::Integer(n) => Some(n.get()),
            PropertyKey::Name(_) => None,
        }
    }

    /// The word stored in the key half of a keyed dictionary entry.
    #[inline]
    pub fn to_value(self) -> Value {
        match self {
            PropertyKey::Integer(n) => Value::from_i64(n.get()),
            PropertyKey::Name(name) => name.value(),
        }
    }

    /// Recover a key from a stored key word.
    ///
    /// Only fixnums and name references are ever written as keys, so any
    /// other word is `None` (an empty slot reads as [`Value::HOLE`]).
    #[inline]
    pub fn from_value(value: Value) -> Option<Self> {
        if let Some(n) = value.to_i64() {
            return Some(PropertyKey::Integer(IntegerKey(n)));
        }
        value
            .ref_index()
            .map(|index| PropertyKey::Name(Tagged::from_index(index)))
    }

    /// Index into a dense dictionary, if this key can address one.
    #[inline]
    pub fn dense_index(self) -> Option<usize> {
        match self {
            PropertyKey::Integer(n) if n.get() >= 0 => Some(n.get() as usize),
            _ => None,
        }
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        matches!(self, PropertyKey::Integer(_))
    }

    /// Full 64-bit hash; dictionaries mask the low bits.
    ///
    /// The integer mix is a bijection, so distinct integer keys never share
    /// a hash.
    pub fn hash(self, heap: &Heap) -> u64 {
        match self {
            PropertyKey::Integer(n) => {
                // splitmix64 finalizer
                let mut z = n.get() as u64;
                z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
                z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
                z ^ (z >> 31)
            }
            PropertyKey::Name(name) => heap.string(name).symbol().hash,
        }
    }

    pub fn is_same(self, other: Self) -> bool {
        self == other
    }
}

impl From<IntegerKey> for PropertyKey {
    fn from(value: IntegerKey) -> Self {
        PropertyKey::Integer(value)
    }
}

impl From<i32> for PropertyKey {
    fn from(value: i32) -> Self {
        PropertyKey::Integer(IntegerKey(value as i64))
    }
}

impl From<u32> for PropertyKey {
    fn from(value: u32) -> Self {
        PropertyKey::Integer(IntegerKey(value as i64))
    }
}

impl From<Tagged<Str>> for PropertyKey {
    fn from(value: Tagged<Str>) -> Self {
        PropertyKey::Name(value)
    }
}
