// low-bit tags
const FIXNUM_MASK: u64 = 0b1;
const TAG_MASK: u64 = 0b11;
const REF_TAG: u64 = 0b01;
const SPECIAL_TAG: u64 = 0b11;
const PAYLOAD_SHIFT: u64 = 2;

/// One machine word: a small integer, an arena reference or a sentinel.
///
/// Low bits:
/// - **Fixnum**:    `...XXXXX0`, 63-bit signed integer.
/// - **Reference**: `...XXXX01`, index of a cell in the [`Heap`](crate::Heap) arena.
/// - **Special**:   `...XXXX11`, immediate sentinels ([`Value::HOLE`], [`Value::UNDEFINED`]).
///
/// References are arena indices, not addresses. Replacing the storage an
/// object points at is a single index update and a stale index can never
/// be dereferenced as raw memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Value(u64);

impl Value {
    /// Marks an unused slot. Distinct from a stored [`Value::UNDEFINED`].
    pub const HOLE: Self = Self((0 << PAYLOAD_SHIFT) | SPECIAL_TAG);

    /// The canonical "undefined" domain value.
    pub const UNDEFINED: Self = Self((1 << PAYLOAD_SHIFT) | SPECIAL_TAG);

    /// Smallest integer a fixnum holds.
    pub const FIXNUM_MIN: i64 = -(1 << 62);
    /// Largest integer a fixnum holds.
    pub const FIXNUM_MAX: i64 = (1 << 62) - 1;

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    // ── Fixnum ─────────────────────────────────────────────────────

    #[inline(always)]
    pub const fn is_fixnum(self) -> bool {
        self.0 & FIXNUM_MASK == 0
    }

    /// Tag `n` if it fits in a fixnum.
    #[inline(always)]
    pub const fn try_from_i64(n: i64) -> Option<Self> {
        if n >= Self::FIXNUM_MIN && n <= Self::FIXNUM_MAX {
            Some(Self((n << 1) as u64))
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn from_i64(n: i64) -> Self {
        debug_assert!(
            (Self::FIXNUM_MIN..=Self::FIXNUM_MAX).contains(&n),
            "fixnum overflow: {n}"
        );
        Self((n << 1) as u64)
    }

    /// Untag a fixnum.
    ///
    /// Returns `None` for references and sentinels.
    #[inline(always)]
    pub const fn to_i64(self) -> Option<i64> {
        if self.is_fixnum() {
            Some((self.0 as i64) >> 1)
        } else {
            None
        }
    }

    // ── Arena references ───────────────────────────────────────────

    #[inline(always)]
    pub const fn is_ref(self) -> bool {
        self.0 & TAG_MASK == REF_TAG
    }

    #[inline(always)]
    pub const fn from_index(index: u32) -> Self {
        Self(((index as u64) << PAYLOAD_SHIFT) | REF_TAG)
    }

    /// Arena index of a reference.
    #[inline(always)]
    pub const fn ref_index(self) -> Option<u32> {
        if self.is_ref() {
            Some((self.0 >> PAYLOAD_SHIFT) as u32)
        } else {
            None
        }
    }

    // ── Sentinels ──────────────────────────────────────────────────

    #[inline(always)]
    pub const fn is_special(self) -> bool {
        self.0 & TAG_MASK == SPECIAL_TAG
    }

    #[inline(always)]
    pub const fn is_hole(self) -> bool {
        self.0 == Self::HOLE.0
    }

    #[inline(always)]
    pub const fn is_undefined(self) -> bool {
        self.0 == Self::UNDEFINED.0
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::from_i64(value)
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(n) = self.to_i64() {
            write!(f, "Fixnum({n})")
        } else if let Some(index) = self.ref_index() {
            write!(f, "Ref(#{index})")
        } else if self.is_hole() {
            write!(f, "Hole")
        } else if self.is_undefined() {
            write!(f, "Undefined")
        } else {
            write!(f, "Special(0x{:016x})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixnum_round_trip() {
        for &n in &[0i64, 1, -1, 42, -42, i64::MAX >> 2, i64::MIN >> 2] {
            let v = Value::from_i64(n);
            assert!(v.is_fixnum());
            assert!(!v.is_ref());
            assert!(!v.is_special());
            assert_eq!(v.to_i64(), Some(n));
        }
    }

    #[test]
    fn fixnum_range_bounds() {
        for n in [Value::FIXNUM_MIN, Value::FIXNUM_MAX] {
            assert_eq!(Value::try_from_i64(n).and_then(Value::to_i64), Some(n));
        }
        assert_eq!(Value::try_from_i64(Value::FIXNUM_MAX + 1), None);
        assert_eq!(Value::try_from_i64(Value::FIXNUM_MIN - 1), None);
        assert_eq!(Value::try_from_i64(i64::MAX), None);
    }

    #[test]
    fn fixnum_zero_is_zero_bits() {
        assert_eq!(Value::from_i64(0).raw(), 0);
    }

    #[test]
    fn reference_tagging() {
        let v = Value::from_index(1234);
        assert!(v.is_ref());
        assert!(!v.is_fixnum());
        assert!(!v.is_special());
        assert_eq!(v.ref_index(), Some(1234));
        assert_eq!(v.to_i64(), None);
    }

    #[test]
    fn sentinels_are_distinct() {
        assert_ne!(Value::HOLE, Value::UNDEFINED);
        assert!(Value::HOLE.is_hole());
        assert!(!Value::HOLE.is_undefined());
        assert!(Value::UNDEFINED.is_undefined());
        assert!(Value::HOLE.is_special() && Value::UNDEFINED.is_special());
        assert_eq!(Value::HOLE.ref_index(), None);
        assert_eq!(Value::UNDEFINED.to_i64(), None);
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Value::from_i64(-3)), "Fixnum(-3)");
        assert_eq!(format!("{:?}", Value::from_index(7)), "Ref(#7)");
        assert_eq!(format!("{:?}", Value::HOLE), "Hole");
    }
}
