use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InternedId(u64);

/// An interned property name: a stable id plus the hash used by keyed
/// dictionaries. The hash is computed once, at intern time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub id: InternedId,
    pub hash: u64,
}

struct InternerImpl {
    table: HashMap<InternedId, Arc<str>, ahash::RandomState>,
    mappings: HashMap<Arc<str>, Symbol, ahash::RandomState>,
    hasher: ahash::RandomState,
}

/// Name table shared by every heap created from it.
///
/// Cloning an `Interner` clones the handle, not the table.
#[derive(Clone)]
pub struct Interner(Arc<RwLock<InternerImpl>>);

// fixed seeds: the same name hashes the same in every heap and every run
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

impl InternerImpl {
    fn new() -> Self {
        Self {
            table: HashMap::default(),
            mappings: HashMap::default(),
            hasher: ahash::RandomState::with_seeds(
                SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3],
            ),
        }
    }

    fn get_or_add(&mut self, value: &str) -> Symbol {
        if let Some(&symbol) = self.mappings.get(value) {
            return symbol;
        }
        let id = InternedId(self.table.len() as u64);
        let symbol = Symbol {
            id,
            hash: self.hasher.hash_one(value.as_bytes()),
        };
        let interned = Arc::<str>::from(value);
        self.mappings.insert(interned.clone(), symbol);
        self.table.insert(id, interned);
        symbol
    }

    fn get(&self, id: &InternedId) -> Option<Arc<str>> {
        self.table.get(id).cloned()
    }
}

impl Interner {
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(InternerImpl::new())))
    }

    pub fn add(&self, value: &str) -> Symbol {
        if let Some(&symbol) = self.0.read().mappings.get(value) {
            return symbol;
        }
        self.0.write().get_or_add(value)
    }

    pub fn get(&self, id: &InternedId) -> Option<Arc<str>> {
        self.0.read().get(id)
    }

    pub fn len(&self) -> usize {
        self.0.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Interner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}
