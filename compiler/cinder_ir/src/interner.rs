//! Thread-safe string interner.
//!
//! Names are resolved once per snapshot by the symbol-table builder and then
//! read concurrently by every bind request, so lookups take a shared lock
//! only.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

#[derive(Default)]
struct InternTable {
    map: FxHashMap<Arc<str>, Name>,
    strings: Vec<Arc<str>>,
}

/// Maps identifier text to [`Name`] handles and back.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

/// Interner shared between the snapshot and its consumers.
pub type SharedInterner = Arc<StringInterner>;

impl StringInterner {
    pub fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut table = InternTable::default();
        table.map.insert(Arc::clone(&empty), Name::EMPTY);
        table.strings.push(empty);
        StringInterner {
            table: RwLock::new(table),
        }
    }

    /// Intern `text`, returning the existing handle if it was seen before.
    pub fn intern(&self, text: &str) -> Name {
        if let Some(&name) = self.table.read().map.get(text) {
            return name;
        }

        let mut table = self.table.write();
        // Another writer may have won the race between the two locks.
        if let Some(&name) = table.map.get(text) {
            return name;
        }
        let raw = u32::try_from(table.strings.len()).unwrap_or(u32::MAX);
        let name = Name::from_raw(raw);
        let stored: Arc<str> = Arc::from(text);
        table.strings.push(Arc::clone(&stored));
        table.map.insert(stored, name);
        name
    }

    /// Text of `name`, or `None` for a handle from another interner.
    pub fn lookup(&self, name: Name) -> Option<Arc<str>> {
        self.table.read().strings.get(name.index()).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        // The empty string is always present.
        false
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
