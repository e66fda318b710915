use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{validate_key, Store, StoreError, Write};

/// In-process store. A single mutex serializes every key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl Store for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn with_lock(
        &self,
        key: &str,
        mutate: &mut dyn FnMut(Option<&str>) -> Write,
    ) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut entries = self.entries.lock();
        match mutate(entries.get(key).map(String::as_str)) {
            Write::Keep => {}
            Write::Put(next) => {
                entries.insert(key.to_string(), next);
            }
            Write::Delete => {
                entries.remove(key);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}
