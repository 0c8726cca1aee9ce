use crate::core::prelude::*;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Durable key-value storage for string values.
pub trait Storage {
    /// `Ok(None)` if nothing was ever saved under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process storage. Clones share the same contents.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: UniqueShared<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get().get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.get().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`. Writes go to a temporary file that is then renamed
/// over the old one, so a crash never leaves a half-written value behind.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("could not read {}", path.display()))?;
        Ok(Some(contents))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("could not create {}", self.dir.display()))?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value).with_context(|| format!("could not write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("could not replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_is_shared_between_clones() {
        let mut a = MemoryStorage::new();
        let b = a.clone();
        assert_eq!(b.load("k").unwrap(), None);
        a.save("k", "v").unwrap();
        assert_eq!(b.load("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("vmatrix-storage-{}", rand::random::<u64>()));
        let mut storage = FileStorage::new(&dir);
        assert_eq!(storage.load("history").unwrap(), None);
        storage.save("history", "[1]").unwrap();
        storage.save("history", "[1,2]").unwrap();
        assert_eq!(storage.load("history").unwrap(), Some("[1,2]".to_string()));
        assert!(storage.path_for("history").ends_with("history.json"));
        assert!(!dir.join("history.json.tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
