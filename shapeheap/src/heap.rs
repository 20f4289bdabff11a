use std::{collections::HashMap, rc::Rc};

use crate::{
    AccessorPair, Field, Function, Interner, Map, MapKind, NativeFn, Object,
    PairAttributes, Str, Tagged, Value, Visitable, Visitor, dict::ITEM_SIZE,
    interning::InternedId,
};

// ── Heap settings ─────────────────────────────────────────────────────

/// Configuration for the object heap.
#[derive(Debug, Clone)]
pub struct HeapSettings {
    /// Slot count of the first Field an object gets. Must be a power of two
    /// large enough to hold one keyed entry.
    pub min_field_size: usize,
    /// Initial linear-probe budget of a keyed lookup before the dictionary
    /// grows. Any value from 1 terminates: once a table is four times
    /// larger than its entries, exhaustion widens that object's budget
    /// instead of growing it.
    pub max_probes: usize,
    /// Integer keys at or above this index move a dense object to keyed
    /// storage instead of growing it.
    pub dense_index_limit: usize,
    /// Longest shape chain before an object falls back to a generic map.
    pub max_transition_depth: usize,
    /// Arena cells reserved up front.
    pub initial_cells: usize,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            min_field_size: 8,
            max_probes: 8,
            dense_index_limit: 65_536,
            max_transition_depth: 64,
            initial_cells: 256,
        }
    }
}

impl HeapSettings {
    #[inline]
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.min_field_size.is_power_of_two() {
            return Err("min_field_size must be a power of two");
        }
        if self.min_field_size < ITEM_SIZE {
            return Err("min_field_size must hold at least one keyed entry");
        }
        if self.max_probes == 0 {
            return Err("max_probes must be > 0");
        }
        if self.dense_index_limit == 0 {
            return Err("dense_index_limit must be > 0");
        }
        if self.max_transition_depth == 0 {
            return Err("max_transition_depth must be > 0");
        }
        Ok(())
    }
}

// ── Cells ─────────────────────────────────────────────────────────────

/// One arena slot.
pub enum HeapCell {
    Free,
    Object(Object),
    Field(Field),
    Map(Map),
    Str(Str),
    AccessorPair(AccessorPair),
    Function(Function),
}

impl HeapCell {
    fn type_name(&self) -> &'static str {
        match self {
            HeapCell::Free => "free cell",
            HeapCell::Object(_) => "object",
            HeapCell::Field(_) => "field",
            HeapCell::Map(_) => "map",
            HeapCell::Str(_) => "string",
            HeapCell::AccessorPair(_) => "accessor pair",
            HeapCell::Function(_) => "function",
        }
    }
}

// dispatch to the concrete entity, each reports its own edges
impl Visitable for HeapCell {
    fn visit_edges(&self, holder: Value, visitor: &mut impl Visitor) {
        match self {
            HeapCell::Free | HeapCell::Str(_) | HeapCell::Function(_) => (),
            HeapCell::Object(object) => object.visit_edges(holder, visitor),
            HeapCell::Field(field) => field.visit_edges(holder, visitor),
            HeapCell::Map(map) => map.visit_edges(holder, visitor),
            HeapCell::AccessorPair(pair) => pair.visit_edges(holder, visitor),
        }
    }
}

/// What a [`Value`] is, resolved against the heap.
///
/// Every decision point that depends on the kind of a key or value matches
/// on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Fixnum(i64),
    Undefined,
    Hole,
    Object(Tagged<Object>),
    Field(Tagged<Field>),
    Map(Tagged<Map>),
    Str(Tagged<Str>),
    AccessorPair(Tagged<AccessorPair>),
    Function(Tagged<Function>),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub allocations: usize,
    pub grows: usize,
    pub dense_to_keyed: usize,
    pub shape_transitions: usize,
    pub collections: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectStats {
    pub live: usize,
    pub freed: usize,
}

// ── Heap ──────────────────────────────────────────────────────────────

pub struct Heap {
    settings: HeapSettings,
    cells: Vec<HeapCell>,
    free: Vec<u32>,
    handles: Vec<Value>,
    interner: Interner,
    names: HashMap<InternedId, Tagged<Str>, ahash::RandomState>,
    root_maps: HashMap<(MapKind, Value), Tagged<Map>, ahash::RandomState>,
    pub(crate) stats: HeapStats,
}

macro_rules! cell_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty) => {
        pub fn $get(&self, tagged: Tagged<$ty>) -> &$ty {
            match self.cell(tagged.index()) {
                HeapCell::$variant(inner) => inner,
                other => panic!(
                    "expected {} at #{}, found {}",
                    stringify!($variant),
                    tagged.index(),
                    other.type_name()
                ),
            }
        }

        pub fn $get_mut(&mut self, tagged: Tagged<$ty>) -> &mut $ty {
            match self.cell_mut(tagged.index()) {
                HeapCell::$variant(inner) => inner,
                other => panic!(
                    "expected {} at #{}, found {}",
                    stringify!($variant),
                    tagged.index(),
                    other.type_name()
                ),
            }
        }
    };
}

impl Heap {
    pub fn new(settings: HeapSettings) -> Self {
        Self::try_new(settings).expect("Invalid Heap Settings")
    }

    pub fn try_new(settings: HeapSettings) -> Result<Self, &'static str> {
        Self::with_interner(settings, Interner::new())
    }

    /// Create a heap that shares its name table with other heaps.
    pub fn with_interner(
        settings: HeapSettings,
        interner: Interner,
    ) -> Result<Self, &'static str> {
        settings.validate()?;
        let cells = Vec::with_capacity(settings.initial_cells);
        Ok(Self {
            settings,
            cells,
            free: Vec::new(),
            handles: Vec::new(),
            interner,
            names: HashMap::default(),
            root_maps: HashMap::default(),
            stats: HeapStats::default(),
        })
    }

    #[inline]
    pub fn settings(&self) -> &HeapSettings {
        &self.settings
    }

    #[inline]
    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    #[inline]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Number of occupied cells.
    pub fn live_cells(&self) -> usize {
        self.cells.len() - self.free.len()
    }

    fn cell(&self, index: usize) -> &HeapCell {
        match self.cells.get(index) {
            Some(HeapCell::Free) => panic!("use of freed heap cell #{index}"),
            Some(cell) => cell,
            None => panic!("heap cell #{index} out of bounds"),
        }
    }

    fn cell_mut(&mut self, index: usize) -> &mut HeapCell {
        match self.cells.get_mut(index) {
            Some(HeapCell::Free) => panic!("use of freed heap cell #{index}"),
            Some(cell) => cell,
            None => panic!("heap cell #{index} out of bounds"),
        }
    }

    cell_accessors!(object, object_mut, Object, Object);
    cell_accessors!(field, field_mut, Field, Field);
    cell_accessors!(map, map_mut, Map, Map);
    cell_accessors!(string, string_mut, Str, Str);
    cell_accessors!(pair, pair_mut, AccessorPair, AccessorPair);
    cell_accessors!(function, function_mut, Function, Function);

    /// Resolve what `value` is.
    pub fn kind(&self, value: Value) -> ValueKind {
        if let Some(n) = value.to_i64() {
            return ValueKind::Fixnum(n);
        }
        if value.is_hole() {
            return ValueKind::Hole;
        }
        let Some(index) = value.ref_index() else {
            return ValueKind::Undefined;
        };
        let tagged = Tagged::<()>::from_index(index);
        match self.cell(index as usize) {
            HeapCell::Free => unreachable!("cell() rejects free cells"),
            HeapCell::Object(_) => ValueKind::Object(tagged.cast()),
            HeapCell::Field(_) => ValueKind::Field(tagged.cast()),
            HeapCell::Map(_) => ValueKind::Map(tagged.cast()),
            HeapCell::Str(_) => ValueKind::Str(tagged.cast()),
            HeapCell::AccessorPair(_) => ValueKind::AccessorPair(tagged.cast()),
            HeapCell::Function(_) => ValueKind::Function(tagged.cast()),
        }
    }

    // ── Allocation ────────────────────────────────────────────────────

    fn allocate(&mut self, cell: HeapCell) -> u32 {
        self.stats.allocations += 1;
        if let Some(index) = self.free.pop() {
            self.cells[index as usize] = cell;
            return index;
        }
        let index = u32::try_from(self.cells.len())
            .ok()
            .filter(|&index| index < (u32::MAX >> 1))
            .expect("heap arena exhausted");
        self.cells.push(cell);
        index
    }

    /// Allocate a Field of `capacity` slots, all holes.
    pub fn alloc_field(&mut self, capacity: usize) -> Tagged<Field> {
        let index = self.allocate(HeapCell::Field(Field::new(capacity)));
        Tagged::from_index(index)
    }

    pub(crate) fn alloc_map(&mut self, map: Map) -> Tagged<Map> {
        Tagged::from_index(self.allocate(HeapCell::Map(map)))
    }

    pub(crate) fn alloc_object(&mut self, object: Object) -> Tagged<Object> {
        Tagged::from_index(self.allocate(HeapCell::Object(object)))
    }

    pub fn alloc_pair(
        &mut self,
        getter: Value,
        setter: Value,
        attributes: PairAttributes,
    ) -> Tagged<AccessorPair> {
        let pair = AccessorPair::new(getter, setter, attributes);
        Tagged::from_index(self.allocate(HeapCell::AccessorPair(pair)))
    }

    pub fn alloc_function<F>(&mut self, name: &str, body: F) -> Tagged<Function>
    where
        F: Fn(&mut Heap, Value, &[Value]) -> Value + 'static,
    {
        let body: Rc<NativeFn> = Rc::new(body);
        let function = Function::new(name, body);
        Tagged::from_index(self.allocate(HeapCell::Function(function)))
    }

    /// The heap's string cell for `text`. Equal texts give the same cell.
    pub fn intern(&mut self, text: &str) -> Tagged<Str> {
        let symbol = self.interner.add(text);
        if let Some(&existing) = self.names.get(&symbol.id) {
            return existing;
        }
        let interned = self.interner.get(&symbol.id).unwrap_or_else(|| text.into());
        let index = self.allocate(HeapCell::Str(Str::new(symbol, interned)));
        let string = Tagged::from_index(index);
        self.names.insert(symbol.id, string);
        string
    }

    /// The shared root map of `kind` for prototype `proto` (`HOLE` = none).
    pub fn root_map(&mut self, kind: MapKind, proto: Value) -> Tagged<Map> {
        if let Some(&map) = self.root_maps.get(&(kind, proto)) {
            return map;
        }
        let map = self.alloc_map(Map::new(kind, proto, 0));
        self.root_maps.insert((kind, proto), map);
        map
    }

    // ── Scopes & invocation ───────────────────────────────────────────

    /// Run `f` in a handle scope: values pinned inside stay GC roots until
    /// the scope exits.
    pub fn scope<R>(&mut self, f: impl FnOnce(&mut Heap) -> R) -> R {
        let mark = self.handles.len();
        let result = f(self);
        self.handles.truncate(mark);
        result
    }

    #[inline]
    pub fn pin(&mut self, value: impl Into<Value>) {
        self.handles.push(value.into());
    }

    /// Invoke a native function with `receiver` as `this`.
    pub fn call(
        &mut self,
        function: Tagged<Function>,
        receiver: Value,
        args: &[Value],
    ) -> Value {
        let body = self.function(function).body();
        self.scope(|heap| {
            heap.pin(receiver);
            args.iter().for_each(|&arg| heap.pin(arg));
            (*body)(heap, receiver, args)
        })
    }

    // ── Collection ────────────────────────────────────────────────────

    /// Free every cell not reachable from `roots`, pinned handles, interned
    /// names or root maps.
    pub fn collect(&mut self, roots: &[Value]) -> CollectStats {
        struct Marker<'a> {
            pending: &'a mut Vec<Value>,
        }

        impl Visitor for Marker<'_> {
            fn visit(&mut self, _holder: Value, _offset: usize, _name: &'static str, target: Value) {
                if target.is_ref() {
                    self.pending.push(target);
                }
            }
        }

        let mut marks = vec![false; self.cells.len()];
        let mut pending: Vec<Value> = roots
            .iter()
            .chain(self.handles.iter())
            .copied()
            .chain(self.names.values().map(|name| name.value()))
            .chain(self.root_maps.values().map(|map| map.value()))
            .collect();

        while let Some(value) = pending.pop() {
            let Some(index) = value.ref_index() else {
                continue;
            };
            let index = index as usize;
            if marks[index] {
                continue;
            }
            marks[index] = true;
            let mut marker = Marker {
                pending: &mut pending,
            };
            self.cell(index).visit_edges(value, &mut marker);
        }

        let mut stats = CollectStats::default();
        for (index, cell) in self.cells.iter_mut().enumerate() {
            if matches!(cell, HeapCell::Free) {
                continue;
            }
            if marks[index] {
                stats.live += 1;
            } else {
                *cell = HeapCell::Free;
                self.free.push(index as u32);
                stats.freed += 1;
            }
        }
        self.stats.collections += 1;
        log::debug!(
            "collection #{}: {} live, {} freed",
            self.stats.collections,
            stats.live,
            stats.freed
        );
        stats
    }
}

impl core::fmt::Debug for Heap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Heap")
            .field("settings", &self.settings)
            .field("cells", &self.cells.len())
            .field("free", &self.free.len())
            .field("handles", &self.handles.len())
            .field("stats", &self.stats)
            .finish()
    }
}
