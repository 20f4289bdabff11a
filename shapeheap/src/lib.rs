//! Property storage for a dynamic-language object model.
//!
//! Objects keep their properties in a dictionary over a raw slot array, a
//! [`Field`]. The dictionary is either dense (integer keys index slots
//! directly) or keyed (open addressing over `[key, value]` pairs). Shape
//! descriptors, [`Map`]s, record key history and the prototype.
//!
//! All entities live in a [`Heap`] arena and refer to each other through
//! tagged [`Value`] words.
mod accessor;
mod dict;
mod export;
mod field;
mod function;
mod heap;
mod interning;
mod key;
mod map;
mod object;
mod slots;
mod strings;
mod tagged;
mod value;
mod visitor;

pub use accessor::{AccessorPair, PairAttributes};
pub use dict::{Dict, DictMut, ITEM_SIZE};
pub use export::{ExportStack, Exported, ExportedObject, ExportedRef};
pub use field::Field;
pub use function::{Function, NativeFn};
pub use heap::{CollectStats, Heap, HeapCell, HeapSettings, HeapStats, ValueKind};
pub use interning::{InternedId, Interner, Symbol};
pub use key::{IntegerKey, PropertyKey};
pub use map::{Map, MapKind};
pub use object::{Object, ObjectFlags, SetOptions};
pub use strings::Str;
pub use tagged::Tagged;
pub use value::Value;
pub use visitor::{Visitable, Visitor};
