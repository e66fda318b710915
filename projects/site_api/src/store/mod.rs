pub mod flat_file;
pub mod memory;
pub mod rate_limit;
pub mod star;

use thiserror::Error;

pub use flat_file::FlatFileStore;
pub use memory::MemoryStore;

/// Outcome of a locked mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Keep,
    Put(String),
    Delete,
}

/// Key-value access to small state files.
///
/// `with_lock` holds an exclusive lock scoped to `key` for the whole
/// read-mutate-write cycle and calls `mutate` exactly once on success.
pub trait Store: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn with_lock(
        &self,
        key: &str,
        mutate: &mut dyn FnMut(Option<&str>) -> Write,
    ) -> Result<(), StoreError>;

    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Runs `mutate` under the key lock and hands back the value it computed.
pub fn update<S, T, F>(store: &S, key: &str, mut mutate: F) -> Result<T, StoreError>
where
    S: Store + ?Sized,
    F: FnMut(Option<&str>) -> (Write, T),
{
    let mut output = None;
    store.with_lock(key, &mut |current| {
        let (write, value) = mutate(current);
        output = Some(value);
        write
    })?;
    output.ok_or_else(|| StoreError::MutationSkipped {
        key: key.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("InvalidKey: {key}")]
    InvalidKey {
        key: String,
    },
    #[error("Io({key}): {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("MutationSkipped: {key}")]
    MutationSkipped {
        key: String,
    },
}

impl StoreError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Keys double as file names, so only a conservative alphabet is accepted.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey {
            key: key.to_string(),
        })
    }
}
