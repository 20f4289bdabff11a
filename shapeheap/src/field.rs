use crate::{Value, Visitable, Visitor};

/// Raw slot storage behind a dictionary. Every slot starts out as
/// [`Value::HOLE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    slots: Box<[Value]>,
}

impl Field {
    pub const LENGTH_OFFSET: usize = 8;
    pub const SLOTS_OFFSET: usize = 16;

    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Value::HOLE; capacity].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Value {
        self.slots[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: Value) {
        self.slots[index] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.slots.iter().copied()
    }
}

impl Visitable for Field {
    fn visit_edges(&self, holder: Value, visitor: &mut impl Visitor) {
        for (i, &slot) in self.slots.iter().enumerate() {
            let offset = Self::SLOTS_OFFSET + i * size_of::<Value>();
            visitor.visit(holder, offset, "slot", slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_field_is_all_holes() {
        let field = Field::new(3);
        assert_eq!(field.len(), 3);
        assert!(!field.is_empty());
        assert_eq!(field.as_slice(), &[Value::HOLE; 3]);
    }

    #[test]
    fn visit_reports_slot_offsets() {
        let mut field = Field::new(2);
        field.set(1, Value::from_i64(9));
        let mut seen = Vec::new();
        let mut record = |_: Value, offset: usize, name: &'static str, target: Value| {
            seen.push((offset, name, target))
        };
        field.visit_edges(Value::from_index(0), &mut record);
        assert_eq!(
            seen,
            vec![
                (16, "slot", Value::HOLE),
                (24, "slot", Value::from_i64(9)),
            ]
        );
    }
}
