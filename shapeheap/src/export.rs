//! Conversion of object graphs into plain host-side values.
use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
    sync::Arc,
};

use crate::{Heap, Object, PropertyKey, Tagged, Value, ValueKind};

pub type ExportedRef = Rc<RefCell<ExportedObject>>;

/// A plain mapping from property names to exported values, in the order
/// the properties were enumerated.
#[derive(Debug, Default)]
pub struct ExportedObject {
    entries: Vec<(String, Exported)>,
    /// Position of each name in `entries`.
    index: HashMap<String, usize, ahash::RandomState>,
}

impl ExportedObject {
    pub fn get(&self, key: &str) -> Option<&Exported> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Later writes to a key replace earlier ones.
    pub fn insert(&mut self, key: String, value: Exported) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }
}

#[derive(Debug, Clone)]
pub enum Exported {
    Undefined,
    Integer(i64),
    String(Arc<str>),
    /// A function, by name.
    Function(Arc<str>),
    /// The slots of a raw Field.
    List(Vec<Exported>),
    Object(ExportedRef),
    /// A reference back to an object still being exported.
    Cycle(Weak<RefCell<ExportedObject>>),
    /// Internal cells with no host form.
    Opaque(&'static str),
}

impl Exported {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Exported::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ExportedRef> {
        match self {
            Exported::Object(object) => Some(object.clone()),
            Exported::Cycle(object) => object.upgrade(),
            _ => None,
        }
    }
}

/// Objects currently being exported, outermost first.
#[derive(Debug, Default)]
pub struct ExportStack {
    frames: Vec<(Tagged<Object>, ExportedRef)>,
}

impl ExportStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn find(&self, object: Tagged<Object>) -> Option<&ExportedRef> {
        self.frames
            .iter()
            .rev()
            .find(|(source, _)| *source == object)
            .map(|(_, target)| target)
    }
}

impl Tagged<Object> {
    /// Export this object and everything reachable from it.
    ///
    /// A reference to an object that is still being exported becomes
    /// [`Exported::Cycle`] pointing at the partially built result.
    pub fn export(self, heap: &mut Heap) -> ExportedRef {
        self.export_into(heap, &mut ExportStack::new(), None)
    }

    /// Export into `target` (a fresh mapping when `None`) with an existing
    /// stack of enclosing objects.
    pub fn export_into(
        self,
        heap: &mut Heap,
        stack: &mut ExportStack,
        target: Option<ExportedRef>,
    ) -> ExportedRef {
        let target = target.unwrap_or_default();
        stack.frames.push((self, target.clone()));
        self.iterate(heap, |heap, key, value| {
            let name = key_name(heap, key);
            let exported = export_value(heap, stack, value);
            target.borrow_mut().insert(name, exported);
        });
        stack.frames.pop();
        target
    }
}

fn key_name(heap: &Heap, key: PropertyKey) -> String {
    match key {
        PropertyKey::Integer(n) => n.get().to_string(),
        PropertyKey::Name(name) => heap.string(name).as_str().to_owned(),
    }
}

fn export_value(heap: &mut Heap, stack: &mut ExportStack, value: Value) -> Exported {
    match heap.kind(value) {
        ValueKind::Object(object) => {
            if let Some(ancestor) = stack.find(object) {
                return Exported::Cycle(Rc::downgrade(ancestor));
            }
            Exported::Object(object.export_into(heap, stack, None))
        }
        ValueKind::Field(field) => {
            let len = heap.field(field).len();
            let items = (0..len)
                .map(|i| {
                    let slot = heap.field(field).get(i);
                    match heap.kind(slot) {
                        ValueKind::Field(_) => Exported::Opaque("field"),
                        _ => export_value(heap, stack, slot),
                    }
                })
                .collect();
            Exported::List(items)
        }
        ValueKind::Fixnum(n) => Exported::Integer(n),
        ValueKind::Undefined | ValueKind::Hole => Exported::Undefined,
        ValueKind::Str(string) => Exported::String(heap.string(string).text()),
        ValueKind::Function(function) => Exported::Function(heap.function(function).name()),
        // only reachable when stored without the accessor flag
        ValueKind::AccessorPair(_) => Exported::Undefined,
        ValueKind::Map(_) => Exported::Opaque("map"),
    }
}
