use crate::Value;

/// Receives every outgoing reference of a heap entity.
///
/// `holder` is the entity being visited, `offset` the byte offset of the
/// edge inside it and `name` a short label for the edge.
pub trait Visitor {
    fn visit(&mut self, holder: Value, offset: usize, name: &'static str, target: Value);
}

impl<F> Visitor for F
where
    F: FnMut(Value, usize, &'static str, Value),
{
    #[inline]
    fn visit(&mut self, holder: Value, offset: usize, name: &'static str, target: Value) {
        self(holder, offset, name, target)
    }
}

pub trait Visitable {
    /// Report each reference this entity holds. Non-reference words may be
    /// reported too; visitors filter on [`Value::is_ref`].
    fn visit_edges(&self, holder: Value, visitor: &mut impl Visitor);
}
