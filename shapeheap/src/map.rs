use std::collections::HashMap;

use crate::{Heap, Object, PropertyKey, Tagged, Value, Visitable, Visitor};

/// The kind of a map decides whether adding a key moves to a new shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    /// Storage is a dense array, shape changes are not tracked.
    Dense,
    /// Regular object, every new key transitions to a child map.
    Object,
    /// Shape tracking given up, new keys keep the map.
    Generic,
    /// Object holds accessor pairs, new keys keep the map.
    Accessor,
}

/// Shape descriptor shared by objects with the same key history.
#[derive(Debug, Clone)]
pub struct Map {
    kind: MapKind,
    proto: Value,
    depth: usize,
    transitions: HashMap<PropertyKey, Tagged<Map>, ahash::RandomState>,
}

impl Map {
    pub const PROTO_OFFSET: usize = 8;
    pub const TRANSITIONS_OFFSET: usize = 24;

    pub(crate) fn new(kind: MapKind, proto: Value, depth: usize) -> Self {
        Self {
            kind,
            proto,
            depth,
            transitions: HashMap::default(),
        }
    }

    #[inline]
    pub fn kind(&self) -> MapKind {
        self.kind
    }

    /// Prototype object of every instance, or `HOLE` for none.
    #[inline]
    pub fn proto(&self) -> Value {
        self.proto
    }

    /// Number of transitions from the root map.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }
}

impl Tagged<Map> {
    /// The map an object with this map moves to after `key` is added.
    ///
    /// `None` means the object keeps its current map.
    pub fn transition(
        self,
        heap: &mut Heap,
        key: PropertyKey,
        object: Tagged<Object>,
    ) -> Option<Tagged<Map>> {
        let map = heap.map(self);
        if map.kind != MapKind::Object {
            return None;
        }
        if let Some(&next) = map.transitions.get(&key) {
            log::trace!("{object:?}: reusing shape edge {key:?} -> {next:?}");
            return Some(next);
        }

        let proto = map.proto;
        let depth = map.depth + 1;
        if depth > heap.settings().max_transition_depth {
            log::trace!("{object:?}: shape chain too deep, using generic map");
            return Some(heap.root_map(MapKind::Generic, proto));
        }

        let next = heap.alloc_map(Map::new(MapKind::Object, proto, depth));
        heap.map_mut(self).transitions.insert(key, next);
        log::trace!("{object:?}: new shape {next:?} at depth {depth} for {key:?}");
        Some(next)
    }
}

impl Visitable for Map {
    fn visit_edges(&self, holder: Value, visitor: &mut impl Visitor) {
        visitor.visit(holder, Self::PROTO_OFFSET, "proto", self.proto);
        for (key, next) in &self.transitions {
            visitor.visit(holder, Self::TRANSITIONS_OFFSET, "transition_key", key.to_value());
            visitor.visit(holder, Self::TRANSITIONS_OFFSET, "transition", next.value());
        }
    }
}
