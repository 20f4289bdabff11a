use std::sync::Arc;

use crate::Symbol;

/// An interned name living in the heap.
#[derive(Debug, Clone)]
pub struct Str {
    symbol: Symbol,
    text: Arc<str>,
}

impl Str {
    pub(crate) fn new(symbol: Symbol, text: Arc<str>) -> Self {
        Self { symbol, text }
    }

    #[inline]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn text(&self) -> Arc<str> {
        self.text.clone()
    }
}
