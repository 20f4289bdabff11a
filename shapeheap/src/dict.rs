//! Views over the Field behind an object.
//!
//! A keyed dictionary stores `ITEM_SIZE` words per entry, `[key, value]`,
//! in a power-of-two number of entries. A dense dictionary stores the value
//! for integer key `i` in slot `i` and has no key words at all.
//!
//! Views borrow the Field, so a view can never outlive a storage swap.
use crate::{Field, Value};

/// Words per keyed entry.
pub const ITEM_SIZE: usize = 2;

#[derive(Debug, Clone, Copy)]
pub enum Dict<'a> {
    Dense(&'a Field),
    Keyed(&'a Field),
}

impl<'a> Dict<'a> {
    #[inline]
    pub fn new(field: &'a Field, dense: bool) -> Self {
        if dense {
            Dict::Dense(field)
        } else {
            Dict::Keyed(field)
        }
    }

    #[inline]
    pub fn is_dense(&self) -> bool {
        matches!(self, Dict::Dense(_))
    }

    /// Number of entries, not slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        match self {
            Dict::Dense(field) => field.len(),
            Dict::Keyed(field) => field.len() / ITEM_SIZE,
        }
    }

    /// Key word of entry `index`; `HOLE` for an empty entry.
    #[inline]
    pub fn key(&self, index: usize) -> Value {
        match self {
            Dict::Dense(field) if field.get(index).is_hole() => Value::HOLE,
            Dict::Dense(_) => Value::from_i64(index as i64),
            Dict::Keyed(field) => field.get(index * ITEM_SIZE),
        }
    }

    #[inline]
    pub fn value(&self, index: usize) -> Value {
        match self {
            Dict::Dense(field) => field.get(index),
            Dict::Keyed(field) => field.get(index * ITEM_SIZE + 1),
        }
    }
}

#[derive(Debug)]
pub enum DictMut<'a> {
    Dense(&'a mut Field),
    Keyed(&'a mut Field),
}

impl<'a> DictMut<'a> {
    #[inline]
    pub fn new(field: &'a mut Field, dense: bool) -> Self {
        if dense {
            DictMut::Dense(field)
        } else {
            DictMut::Keyed(field)
        }
    }

    pub fn as_dict(&self) -> Dict<'_> {
        match self {
            DictMut::Dense(field) => Dict::Dense(field),
            DictMut::Keyed(field) => Dict::Keyed(field),
        }
    }

    /// Dense dictionaries derive keys from the index, writing one is a no-op.
    #[inline]
    pub fn set_key(&mut self, index: usize, key: Value) {
        match self {
            DictMut::Dense(_) => {
                debug_assert_eq!(key.to_i64(), Some(index as i64));
            }
            DictMut::Keyed(field) => field.set(index * ITEM_SIZE, key),
        }
    }

    #[inline]
    pub fn set_value(&mut self, index: usize, value: Value) {
        match self {
            DictMut::Dense(field) => field.set(index, value),
            DictMut::Keyed(field) => field.set(index * ITEM_SIZE + 1, value),
        }
    }
}
