//! Slot resolution, growth and storage transitions.
use bitflags::bitflags;

use crate::{
    Dict, Heap, MapKind, Object, ObjectFlags, PropertyKey, Tagged, dict::ITEM_SIZE,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Resolve: u8 {
        /// Claim an empty slot if the key is missing.
        const UPDATE = 1 << 0;
        /// Re-insertion during growth: no nested growth, no shape change.
        const GROWING = 1 << 1;
        const NO_TRANSITION = 1 << 2;
    }
}

/// A keyed table at least this many times larger than its entry count is
/// not grown on probe exhaustion, its probe budget widens instead.
const SPARSE_FACTOR: usize = 4;

/// Result of one probe sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Probe {
    index: Option<usize>,
    /// The key was newly inserted.
    inserted: bool,
}

impl Probe {
    const MISSING: Self = Self {
        index: None,
        inserted: false,
    };

    const fn found(index: usize) -> Self {
        Self {
            index: Some(index),
            inserted: false,
        }
    }
}

impl Tagged<Object> {
    fn probe(self, heap: &mut Heap, key: PropertyKey, update: bool) -> Probe {
        if heap.object(self).is_dense() {
            let Some(index) = key.dense_index() else {
                return Probe::MISSING;
            };
            if update {
                self.dense_update(heap, index);
            } else if index >= self.capacity(heap) {
                return Probe::MISSING;
            }
            return Probe::found(index);
        }

        let word = key.to_value();
        let hash = key.hash(heap);
        let max_probes = heap.object(self).probes;

        let dict = self.dict(heap);
        let mask = dict.capacity() - 1;
        let mut index = (hash & mask as u64) as usize;
        let mut empty = None;
        for _ in 0..max_probes.min(dict.capacity()) {
            let existing = dict.key(index);
            // interned names and fixnums compare by word identity
            if existing == word {
                return Probe::found(index);
            }
            if existing.is_hole() {
                empty = Some(index);
                break;
            }
            index = (index + 1) & mask;
        }

        match empty {
            Some(index) if update => {
                self.dict_mut(heap).set_key(index, word);
                Probe {
                    index: Some(index),
                    inserted: true,
                }
            }
            Some(_) => Probe::MISSING,
            None => {
                log::trace!("{self:?}: {max_probes} probes exhausted for {key:?}");
                Probe::MISSING
            }
        }
    }

    /// Find the slot for `key`, optionally inserting it.
    ///
    /// Insertion grows the storage until the key fits and applies the shape
    /// transition for a new key. Re-insertion during growth does neither.
    pub(crate) fn resolve_slot(
        self,
        heap: &mut Heap,
        key: PropertyKey,
        resolve: Resolve,
    ) -> Option<usize> {
        let update = resolve.contains(Resolve::UPDATE);
        let probe = self.probe(heap, key, update);
        if !update || resolve.contains(Resolve::GROWING) {
            return probe.index;
        }

        let Some(index) = probe.index else {
            if self.capacity(heap) >= SPARSE_FACTOR * (self.len(heap) + 1) {
                self.widen_probes(heap);
            } else {
                self.grow(heap, 0);
            }
            return self.resolve_slot(heap, key, resolve);
        };
        if probe.inserted && !resolve.contains(Resolve::NO_TRANSITION) {
            let map = heap.object(self).map;
            if let Some(next) = map.transition(heap, key, self) {
                heap.object_mut(self).map = next;
                heap.stats.shape_transitions += 1;
            }
        }
        Some(index)
    }

    /// Replace the storage with one of at least twice the size, holding at
    /// least `min_entries` entries, and re-insert every entry.
    ///
    /// Doubles again whenever a re-insert runs out of probes, until the
    /// table is sparse. From then on the object's probe budget widens
    /// instead, so keys sharing their low hash bits cannot grow the table
    /// without bound.
    pub fn grow(self, heap: &mut Heap, min_entries: usize) {
        let object = *heap.object(self);
        let old = object.field;
        let dense = object.is_dense();
        let item_size = if dense { 1 } else { ITEM_SIZE };
        let old_len = heap.field(old).len();
        let entries = self.len(heap);

        let mut size = (old_len * 2).max(heap.settings().min_field_size);
        while size < min_entries * item_size {
            size *= 2;
        }

        loop {
            let field = heap.alloc_field(size);
            heap.object_mut(self).field = field;
            if self.reinsert(heap, old) {
                break;
            }
            log::debug!("{self:?}: rehash into {size} slots ran out of probes");
            if size / item_size >= SPARSE_FACTOR * entries {
                self.widen_probes(heap);
            } else {
                size = size
                    .checked_mul(2)
                    .expect("dictionary grew past the address space");
            }
        }

        heap.stats.grows += 1;
        log::debug!(
            "{self:?}: grew {} storage {old_len} -> {size} slots",
            if dense { "dense" } else { "keyed" }
        );
    }

    /// Double the probe budget, up to the whole table.
    fn widen_probes(self, heap: &mut Heap) {
        let capacity = self.capacity(heap);
        let object = heap.object_mut(self);
        object.probes = (object.probes * 2).min(capacity);
        log::debug!(
            "{self:?}: probe budget widened to {} of {capacity} entries",
            object.probes
        );
    }

    fn reinsert(self, heap: &mut Heap, old: Tagged<crate::Field>) -> bool {
        let dense = heap.object(self).is_dense();
        let capacity = Dict::new(heap.field(old), dense).capacity();
        for i in 0..capacity {
            let (key, value) = {
                let dict = Dict::new(heap.field(old), dense);
                (dict.key(i), dict.value(i))
            };
            let Some(key) = PropertyKey::from_value(key) else {
                continue;
            };
            let resolve = Resolve::UPDATE | Resolve::GROWING;
            match self.resolve_slot(heap, key, resolve) {
                Some(slot) => self.dict_mut(heap).set_value(slot, value),
                None => return false,
            }
        }
        true
    }

    fn dense_update(self, heap: &mut Heap, index: usize) {
        if index >= self.capacity(heap) {
            self.grow(heap, index + 1);
        }
    }

    /// Move a dense object to keyed storage under the generic map of its
    /// prototype. Every present element is re-set under its integer key.
    pub(crate) fn transition_to_keyed(self, heap: &mut Heap) {
        let object = *heap.object(self);
        let proto = heap.map(object.map).proto();
        let kind = if object.has_access_pairs() {
            MapKind::Accessor
        } else {
            MapKind::Generic
        };
        let map = heap.root_map(kind, proto);
        let old_len = heap.field(object.field).len();
        let field = heap.alloc_field(2 * ITEM_SIZE * old_len);

        let header = heap.object_mut(self);
        header.flags.remove(ObjectFlags::DENSE);
        header.map = map;
        header.field = field;
        heap.stats.dense_to_keyed += 1;
        log::debug!("{self:?}: dense -> keyed with {old_len} elements");

        for i in 0..old_len {
            let value = heap.field(object.field).get(i);
            if value.is_hole() {
                continue;
            }
            let Some(key) = PropertyKey::integer(i as i64) else {
                unreachable!("dense index {i} beyond fixnum range");
            };
            self.set(heap, key, value);
        }
    }
}
