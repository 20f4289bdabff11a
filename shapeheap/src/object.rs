use bitflags::bitflags;

use crate::{
    Dict, DictMut, Field, Heap, Map, MapKind, PropertyKey, Tagged, Value,
    ValueKind, Visitable, Visitor, slots::Resolve,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u8 {
        /// Storage is a dense array indexed by integer key.
        const DENSE = 1 << 0;
        /// At least one stored value is an accessor pair.
        const ACCESS = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SetOptions: u8 {
        /// Insert without moving the object to a new shape.
        const NO_TRANSITION = 1 << 0;
    }
}

/// Header of a dictionary-backed object.
///
/// ```text
///  0: header
///  8: map
/// 16: flags
/// 24: field
/// 32: probe budget
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Object {
    pub(crate) map: Tagged<Map>,
    pub(crate) flags: ObjectFlags,
    pub(crate) field: Tagged<Field>,
    pub(crate) probes: usize,
}

impl Object {
    pub const MAP_OFFSET: usize = 8;
    pub const FLAGS_OFFSET: usize = 16;
    pub const FIELD_OFFSET: usize = 24;
    pub const PROBES_OFFSET: usize = 32;

    #[inline]
    pub fn map(&self) -> Tagged<Map> {
        self.map
    }

    #[inline]
    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    #[inline]
    pub fn field(&self) -> Tagged<Field> {
        self.field
    }

    /// Linear-probe budget of keyed lookups on this object. Starts at
    /// [`HeapSettings::max_probes`](crate::HeapSettings::max_probes) and
    /// only widens when keys cluster in an already sparse table.
    #[inline]
    pub fn probe_budget(&self) -> usize {
        self.probes
    }

    #[inline]
    pub fn is_dense(&self) -> bool {
        self.flags.contains(ObjectFlags::DENSE)
    }

    #[inline]
    pub fn has_access_pairs(&self) -> bool {
        self.flags.contains(ObjectFlags::ACCESS)
    }
}

impl Visitable for Object {
    fn visit_edges(&self, holder: Value, visitor: &mut impl Visitor) {
        visitor.visit(holder, Self::MAP_OFFSET, "map", self.map.value());
        visitor.visit(holder, Self::FIELD_OFFSET, "field", self.field.value());
    }
}

impl Heap {
    /// A keyed object with prototype `proto`.
    pub fn new_object(&mut self, proto: Option<Tagged<Object>>) -> Tagged<Object> {
        self.new_object_with(MapKind::Object, ObjectFlags::empty(), proto)
    }

    /// An object whose storage starts as a dense array.
    pub fn new_dense_object(&mut self, proto: Option<Tagged<Object>>) -> Tagged<Object> {
        self.new_object_with(MapKind::Dense, ObjectFlags::DENSE, proto)
    }

    fn new_object_with(
        &mut self,
        kind: MapKind,
        flags: ObjectFlags,
        proto: Option<Tagged<Object>>,
    ) -> Tagged<Object> {
        let proto = proto.map_or(Value::HOLE, Tagged::value);
        let map = self.root_map(kind, proto);
        let field = self.alloc_field(self.settings().min_field_size);
        let probes = self.settings().max_probes;
        self.alloc_object(Object {
            map,
            flags,
            field,
            probes,
        })
    }
}

impl Tagged<Object> {
    // ── Views ─────────────────────────────────────────────────────────

    /// View of the current storage.
    ///
    /// Anything that may grow the object invalidates the view, the borrow
    /// checker enforces re-deriving it.
    pub fn dict(self, heap: &Heap) -> Dict<'_> {
        let object = heap.object(self);
        Dict::new(heap.field(object.field), object.is_dense())
    }

    pub fn dict_mut(self, heap: &mut Heap) -> DictMut<'_> {
        let object = *heap.object(self);
        DictMut::new(heap.field_mut(object.field), object.is_dense())
    }

    /// Entry capacity of the current storage.
    pub fn capacity(self, heap: &Heap) -> usize {
        self.dict(heap).capacity()
    }

    /// Number of occupied entries.
    pub fn len(self, heap: &Heap) -> usize {
        let dict = self.dict(heap);
        (0..dict.capacity())
            .filter(|&i| !dict.key(i).is_hole())
            .count()
    }

    pub fn is_empty(self, heap: &Heap) -> bool {
        self.len(heap) == 0
    }

    // ── Prototype ─────────────────────────────────────────────────────

    pub fn prototype(self, heap: &Heap) -> Option<Tagged<Object>> {
        let proto = heap.map(heap.object(self).map).proto();
        match heap.kind(proto) {
            ValueKind::Object(proto) => Some(proto),
            _ => None,
        }
    }

    /// Replace the prototype.
    ///
    /// A fresh object keeps its kind of root map. An object that already
    /// took shape transitions gives up shape tracking.
    pub fn set_prototype(self, heap: &mut Heap, proto: Option<Tagged<Object>>) {
        let current = heap.map(heap.object(self).map);
        let kind = match current.kind() {
            MapKind::Object if current.depth() > 0 => MapKind::Generic,
            kind => kind,
        };
        let proto = proto.map_or(Value::HOLE, Tagged::value);
        let map = heap.root_map(kind, proto);
        heap.object_mut(self).map = map;
    }

    // ── Reads ─────────────────────────────────────────────────────────

    /// Own property lookup. Accessor getters run, the prototype is not
    /// consulted.
    pub fn get_own(self, heap: &mut Heap, key: PropertyKey) -> Option<Value> {
        let slot = self.resolve_slot(heap, key, Resolve::empty())?;
        let raw = self.dict(heap).value(slot);
        if raw.is_hole() {
            return None;
        }
        Some(self.getter_wrap(heap, raw))
    }

    /// Property lookup along the prototype chain.
    ///
    /// Returns `UNDEFINED` when no object on the chain has `key`. A chain
    /// that loops back onto itself ends the lookup.
    pub fn get(self, heap: &mut Heap, key: PropertyKey) -> Value {
        if let Some(value) = self.get_own(heap, key) {
            return value;
        }
        heap.scope(|heap| {
            heap.pin(self);
            let mut visited = vec![self];
            let mut proto = self.prototype(heap);
            while let Some(current) = proto {
                if visited.contains(&current) {
                    log::trace!("{self:?}: prototype chain loops at {current:?}");
                    break;
                }
                heap.pin(current);
                if let Some(value) = current.get_own(heap, key) {
                    return value;
                }
                visited.push(current);
                proto = current.prototype(heap);
            }
            Value::UNDEFINED
        })
    }

    /// Slot index holding `key`, without inserting.
    pub fn get_property_slot(self, heap: &mut Heap, key: PropertyKey) -> Option<usize> {
        self.resolve_slot(heap, key, Resolve::empty())
    }

    // ── Writes ────────────────────────────────────────────────────────

    pub fn set(self, heap: &mut Heap, key: PropertyKey, value: Value) {
        self.set_with(heap, key, value, SetOptions::empty());
    }

    pub fn set_with(
        self,
        heap: &mut Heap,
        key: PropertyKey,
        value: Value,
        options: SetOptions,
    ) {
        debug_assert!(!value.is_hole(), "HOLE marks empty slots and cannot be stored");

        if heap.object(self).is_dense() {
            let limit = heap.settings().dense_index_limit;
            match key.dense_index() {
                Some(index) if index < limit => (),
                _ => self.transition_to_keyed(heap),
            }
        }

        let mut resolve = Resolve::UPDATE;
        if options.contains(SetOptions::NO_TRANSITION) {
            resolve |= Resolve::NO_TRANSITION;
        }
        let Some(slot) = self.resolve_slot(heap, key, resolve) else {
            unreachable!("insertion grows until a slot is found")
        };

        if !self.setter_wrap(heap, slot, value) {
            self.dict_mut(heap).set_value(slot, value);
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────

    /// Route a write through an accessor pair.
    ///
    /// Returns `true` when the write was handled and must not be stored.
    fn setter_wrap(self, heap: &mut Heap, slot: usize, value: Value) -> bool {
        if !heap.object(self).has_access_pairs() {
            if let ValueKind::AccessorPair(_) = heap.kind(value) {
                let proto = heap.map(heap.object(self).map).proto();
                let map = heap.root_map(MapKind::Accessor, proto);
                let object = heap.object_mut(self);
                object.flags.insert(ObjectFlags::ACCESS);
                object.map = map;
                log::trace!("{self:?}: first accessor pair stored");
            }
            return false;
        }

        let existing = self.dict(heap).value(slot);
        let ValueKind::AccessorPair(pair) = heap.kind(existing) else {
            return false;
        };
        // a pair without a callable setter swallows the write
        if let ValueKind::Function(setter) = heap.kind(heap.pair(pair).setter()) {
            heap.call(setter, self.value(), &[value]);
        }
        true
    }

    fn getter_wrap(self, heap: &mut Heap, raw: Value) -> Value {
        if !heap.object(self).has_access_pairs() {
            return raw;
        }
        let ValueKind::AccessorPair(pair) = heap.kind(raw) else {
            return raw;
        };
        match heap.kind(heap.pair(pair).getter()) {
            ValueKind::Function(getter) => heap.call(getter, self.value(), &[]),
            _ => Value::UNDEFINED,
        }
    }

    // ── Enumeration ───────────────────────────────────────────────────

    fn is_enumerable(self, heap: &Heap, raw: Value) -> bool {
        if !heap.object(self).has_access_pairs() {
            return true;
        }
        match heap.kind(raw) {
            ValueKind::AccessorPair(pair) => heap.pair(pair).is_enumerable(),
            _ => true,
        }
    }

    /// Call `f` with every occupied entry in storage order. Accessor pairs
    /// without [`PairAttributes::ENUMERABLE`](crate::PairAttributes) are skipped,
    /// the others yield their getter's result.
    ///
    /// `f` may mutate the object. The storage is re-read on every step, so
    /// entries moved by a resize may be skipped or seen twice but the walk
    /// never reads a discarded Field.
    pub fn iterate(self, heap: &mut Heap, mut f: impl FnMut(&mut Heap, PropertyKey, Value)) {
        heap.scope(|heap| {
            heap.pin(self);
            let mut index = 0;
            while index < self.capacity(heap) {
                let dict = self.dict(heap);
                let (key, value) = (dict.key(index), dict.value(index));
                index += 1;
                let Some(key) = PropertyKey::from_value(key) else {
                    continue;
                };
                if value.is_hole() || !self.is_enumerable(heap, value) {
                    continue;
                }
                let value = self.getter_wrap(heap, value);
                f(heap, key, value);
            }
        })
    }

    /// Every key in storage order.
    pub fn keys(self, heap: &Heap) -> Vec<PropertyKey> {
        let dict = self.dict(heap);
        (0..dict.capacity())
            .filter(|&i| !dict.value(i).is_hole())
            .filter_map(|i| PropertyKey::from_value(dict.key(i)))
            .collect()
    }

    /// Report the map and field edges of this object.
    pub fn visit(self, heap: &Heap, visitor: &mut impl Visitor) {
        heap.object(self).visit_edges(self.value(), visitor);
    }
}
