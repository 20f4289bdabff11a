//! Value: any raw word, fixnum/reference/sentinel
//!
//! Tagged<T>: same as Value but typed to the arena entity it refers to.
//! The type is only a promise, the heap checks the actual cell kind on access.
use core::{
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use crate::Value;

/// A reference to an arena cell holding a `T`.
#[repr(transparent)]
pub struct Tagged<T> {
    value: Value,
    _marker: PhantomData<*const T>,
}

// we need custom impls as derive would require T: Clone etc.
// but this represents a reference to a T, not T itself
impl<T> Clone for Tagged<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Tagged<T> {}

impl<T> PartialEq for Tagged<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Tagged<T> {}

impl<T> Hash for Tagged<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> Tagged<T> {
    #[inline(always)]
    pub(crate) const fn from_index(index: u32) -> Self {
        Self {
            value: Value::from_index(index),
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn value(self) -> Value {
        self.value
    }

    /// Position of the referenced cell in the arena.
    #[inline(always)]
    pub fn index(self) -> usize {
        match self.value.ref_index() {
            Some(index) => index as usize,
            None => unreachable!("Tagged always holds a reference"),
        }
    }

    /// Reinterpret as a reference to another entity kind.
    /// The heap still verifies the cell kind when it is accessed.
    #[inline(always)]
    pub(crate) fn cast<U>(self) -> Tagged<U> {
        Tagged {
            value: self.value,
            _marker: PhantomData,
        }
    }
}

impl<T> core::fmt::Debug for Tagged<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Tagged({:?})", self.value)
    }
}

impl<T> From<Tagged<T>> for Value {
    fn from(tagged: Tagged<T>) -> Self {
        tagged.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn tagged_round_trips_through_value() {
        let t = Tagged::<Marker>::from_index(42);
        let v: Value = t.into();
        assert!(v.is_ref());
        assert_eq!(v.ref_index(), Some(42));
        assert_eq!(t.index(), 42);
    }

    #[test]
    fn tagged_is_copy_and_compares_by_identity() {
        let a = Tagged::<Marker>::from_index(3);
        let b = a;
        let c = Tagged::<Marker>::from_index(4);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.cast::<()>().value(), a.value());
    }
}
