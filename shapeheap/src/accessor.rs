use bitflags::bitflags;

use crate::{Value, Visitable, Visitor};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PairAttributes: u8 {
        const ENUMERABLE = 1 << 0;
    }
}

/// A getter/setter pair stored as a property value.
///
/// Either half may be any value. Only function values are ever invoked; a
/// missing getter reads as undefined and a missing setter ignores writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorPair {
    getter: Value,
    setter: Value,
    attributes: PairAttributes,
}

impl AccessorPair {
    pub const GETTER_OFFSET: usize = 8;
    pub const SETTER_OFFSET: usize = 16;

    pub fn new(getter: Value, setter: Value, attributes: PairAttributes) -> Self {
        Self {
            getter,
            setter,
            attributes,
        }
    }

    #[inline]
    pub fn getter(&self) -> Value {
        self.getter
    }

    #[inline]
    pub fn setter(&self) -> Value {
        self.setter
    }

    #[inline]
    pub fn attributes(&self) -> PairAttributes {
        self.attributes
    }

    #[inline]
    pub fn is_enumerable(&self) -> bool {
        self.attributes.contains(PairAttributes::ENUMERABLE)
    }
}

impl Visitable for AccessorPair {
    fn visit_edges(&self, holder: Value, visitor: &mut impl Visitor) {
        visitor.visit(holder, Self::GETTER_OFFSET, "getter", self.getter);
        visitor.visit(holder, Self::SETTER_OFFSET, "setter", self.setter);
    }
}
