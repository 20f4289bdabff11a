use std::{rc::Rc, sync::Arc};

use crate::{Heap, Value};

/// Native code behind a [`Function`]: `(heap, receiver, args) -> result`.
pub type NativeFn = dyn Fn(&mut Heap, Value, &[Value]) -> Value;

/// A callable heap cell.
pub struct Function {
    name: Arc<str>,
    body: Rc<NativeFn>,
}

impl Function {
    pub(crate) fn new(name: &str, body: Rc<NativeFn>) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    #[inline]
    pub fn name(&self) -> Arc<str> {
        self.name.clone()
    }

    /// The body, detached from the heap so it can be called with `&mut Heap`.
    #[inline]
    pub fn body(&self) -> Rc<NativeFn> {
        self.body.clone()
    }
}

impl core::fmt::Debug for Function {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}
