use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key-value persistence collaborator. Each collection is read and written as
/// a whole serialized document; there is no batching or partial update.
pub trait CollectionStore: Send + Sync {
    fn read(&self, collection: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, collection: &str, payload: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection '{collection}' io failure: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

impl<S: CollectionStore + ?Sized> CollectionStore for Arc<S> {
    fn read(&self, collection: &str) -> Result<Option<String>, StoreError> {
        (**self).read(collection)
    }

    fn write(&self, collection: &str, payload: &str) -> Result<(), StoreError> {
        (**self).write(collection, payload)
    }
}

/// Process-local store, used by tests and by the service when no directory is configured.
#[derive(Debug, Default, Clone)]
pub struct MemoryCollectionStore {
    collections: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for MemoryCollectionStore {
    fn read(&self, collection: &str) -> Result<Option<String>, StoreError> {
        let guard = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(collection).cloned())
    }

    fn write(&self, collection: &str, payload: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        guard.insert(collection.to_string(), payload.to_string());
        Ok(())
    }
}

/// One `<collection>.json` file per collection under a root directory.
#[derive(Debug, Clone)]
pub struct FileCollectionStore {
    root: PathBuf,
}

impl FileCollectionStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            collection: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }
}

impl CollectionStore for FileCollectionStore {
    fn read(&self, collection: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(collection)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                collection: collection.to_string(),
                source,
            }),
        }
    }

    fn write(&self, collection: &str, payload: &str) -> Result<(), StoreError> {
        // Staged write, then rename over the live document.
        let target = self.path_for(collection);
        let staging = self.root.join(format!(".{collection}.json.tmp"));
        let io_err = |source| StoreError::Io {
            collection: collection.to_string(),
            source,
        };
        fs::write(&staging, payload).map_err(io_err)?;
        fs::rename(&staging, &target).map_err(io_err)
    }
}
