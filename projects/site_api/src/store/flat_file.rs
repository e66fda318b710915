use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use super::{validate_key, Store, StoreError, Write};

/// One file per key under `root`, guarded by advisory OS locks.
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    root: PathBuf,
}

impl FlatFileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Opens `path` and takes the exclusive lock, retrying when a concurrent
    /// delete unlinked the file between open and lock.
    fn open_exclusive(&self, key: &str, path: &Path) -> Result<File, StoreError> {
        loop {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .map_err(|source| StoreError::io(key, source))?;
            FileExt::lock_exclusive(&file).map_err(|source| StoreError::io(key, source))?;

            if still_linked(&file, path).map_err(|source| StoreError::io(key, source))? {
                return Ok(file);
            }
            debug!(key, "lock target was unlinked while waiting, reopening");
        }
    }
}

impl Store for FlatFileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::io(key, source)),
        };
        FileExt::lock_shared(&file).map_err(|source| StoreError::io(key, source))?;

        let mut contents = String::new();
        let result = file.read_to_string(&mut contents);
        let _ = FileExt::unlock(&file);
        result.map_err(|source| StoreError::io(key, source))?;

        Ok(non_empty(contents))
    }

    fn with_lock(
        &self,
        key: &str,
        mutate: &mut dyn FnMut(Option<&str>) -> Write,
    ) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let mut file = self.open_exclusive(key, &path)?;

        // The lock is tied to the handle, so every early return below releases it.
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|source| StoreError::io(key, source))?;
        let current = non_empty(contents);

        match mutate(current.as_deref()) {
            Write::Keep => {}
            Write::Put(next) => {
                file.set_len(0).map_err(|source| StoreError::io(key, source))?;
                file.seek(SeekFrom::Start(0))
                    .map_err(|source| StoreError::io(key, source))?;
                file.write_all(next.as_bytes())
                    .map_err(|source| StoreError::io(key, source))?;
                file.sync_data().map_err(|source| StoreError::io(key, source))?;
            }
            Write::Delete => match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::io(key, source)),
            },
        }

        let _ = FileExt::unlock(&file);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let root_key = self.root.display().to_string();
        let entries = fs::read_dir(&self.root).map_err(|source| StoreError::io(&root_key, source))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::io(&root_key, source))?;
            let is_file = entry
                .file_type()
                .map_err(|source| StoreError::io(&root_key, source))?
                .is_file();
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_key(name).is_ok() {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn non_empty(contents: String) -> Option<String> {
    if contents.trim().is_empty() {
        None
    } else {
        Some(contents)
    }
}

#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    match fs::metadata(path) {
        Ok(on_disk) => Ok(held.dev() == on_disk.dev() && held.ino() == on_disk.ino()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> std::io::Result<bool> {
    Ok(path.exists())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use tempfile::tempdir;

    use super::*;
    use crate::store::update;

    #[test]
    fn missing_and_empty_keys_read_as_none() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::open(dir.path()).unwrap();
        assert_eq!(store.read("star_data.txt").unwrap(), None);

        fs::write(dir.path().join("star_data.txt"), "  \n").unwrap();
        assert_eq!(store.read("star_data.txt").unwrap(), None);
    }

    #[test]
    fn put_then_read_and_delete() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::open(dir.path()).unwrap();

        store
            .with_lock("star_data.txt", &mut |_| Write::Put("12".to_string()))
            .unwrap();
        assert_eq!(store.read("star_data.txt").unwrap().as_deref(), Some("12"));

        // Shorter contents must not leave a tail of the previous value.
        store
            .with_lock("star_data.txt", &mut |_| Write::Put("3".to_string()))
            .unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("star_data.txt")).unwrap(), "3");

        store.with_lock("star_data.txt", &mut |_| Write::Delete).unwrap();
        assert!(!dir.path().join("star_data.txt").exists());
    }

    #[test]
    fn keys_skip_directories_and_hidden_files() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("email_b.lock"), "1").unwrap();
        fs::write(dir.path().join("email_a.lock"), "1").unwrap();
        fs::write(dir.path().join(".tmp"), "1").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["email_a.lock", "email_b.lock"]);
    }

    #[test]
    fn rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let store = FlatFileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.read("../outside"),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn concurrent_increments_are_serialized() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FlatFileStore::open(dir.path()).unwrap());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..25 {
                        update(store.as_ref(), "counter", |current| {
                            let value: u64 = current.and_then(|s| s.trim().parse().ok()).unwrap_or(0);
                            (Write::Put((value + 1).to_string()), ())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.read("counter").unwrap().as_deref(), Some("200"));
    }
}
