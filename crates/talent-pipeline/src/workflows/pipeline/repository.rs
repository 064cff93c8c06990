use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::domain::{Candidate, CandidateId, StageTransitionRecord};
use super::store::{CollectionStore, StoreError};

pub const CANDIDATES_COLLECTION: &str = "candidates";
pub const TRANSITIONS_COLLECTION: &str = "stage_transitions";

/// Storage abstraction so the service module can be exercised in isolation.
pub trait CandidateRepository: Send + Sync {
    fn list(&self) -> Result<Vec<Candidate>, RepositoryError>;
    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError>;
    /// Compare-and-swap write. Succeeds only while the stored version equals
    /// `expected_version`; the stored copy comes back with its version bumped.
    fn replace(
        &self,
        candidate: Candidate,
        expected_version: u64,
    ) -> Result<Candidate, RepositoryError>;
    fn append_transition(&self, record: StageTransitionRecord) -> Result<(), RepositoryError>;
    fn transitions(&self, id: &CandidateId)
        -> Result<Vec<StageTransitionRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stale write: expected version {expected}, stored version {actual}")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("collection '{collection}' is corrupt: {source}")]
    Corrupt {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("collection '{collection}' could not be encoded: {source}")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("repository unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

/// Candidate repository over whole-collection documents in a [`CollectionStore`].
pub struct CollectionRepository<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: CollectionStore> CollectionRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Bulk-load intake records. Existing ids are left untouched.
    pub fn seed(&self, candidates: Vec<Candidate>) -> Result<usize, RepositoryError> {
        let _guard = self.lock()?;
        let mut stored: Vec<Candidate> = self.load(CANDIDATES_COLLECTION)?;
        let before = stored.len();
        for candidate in candidates {
            if !stored.iter().any(|existing| existing.id == candidate.id) {
                stored.push(candidate);
            }
        }
        let added = stored.len() - before;
        if added > 0 {
            self.save(CANDIDATES_COLLECTION, &stored)?;
        }
        Ok(added)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, RepositoryError> {
        self.write_lock
            .lock()
            .map_err(|_| RepositoryError::Unavailable(StoreError::Poisoned))
    }

    fn load<T: DeserializeOwned>(&self, collection: &'static str) -> Result<Vec<T>, RepositoryError> {
        match self.store.read(collection)? {
            Some(payload) if !payload.trim().is_empty() => serde_json::from_str(&payload)
                .map_err(|source| RepositoryError::Corrupt { collection, source }),
            _ => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&self, collection: &'static str, records: &[T]) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(records)
            .map_err(|source| RepositoryError::Encode { collection, source })?;
        self.store.write(collection, &payload)?;
        Ok(())
    }
}

impl<S: CollectionStore> CandidateRepository for CollectionRepository<S> {
    fn list(&self) -> Result<Vec<Candidate>, RepositoryError> {
        self.load(CANDIDATES_COLLECTION)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let candidates: Vec<Candidate> = self.load(CANDIDATES_COLLECTION)?;
        Ok(candidates.into_iter().find(|candidate| &candidate.id == id))
    }

    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let _guard = self.lock()?;
        let mut candidates: Vec<Candidate> = self.load(CANDIDATES_COLLECTION)?;
        if candidates.iter().any(|existing| existing.id == candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        candidates.push(candidate.clone());
        self.save(CANDIDATES_COLLECTION, &candidates)?;
        Ok(candidate)
    }

    fn replace(
        &self,
        mut candidate: Candidate,
        expected_version: u64,
    ) -> Result<Candidate, RepositoryError> {
        let _guard = self.lock()?;
        let mut candidates: Vec<Candidate> = self.load(CANDIDATES_COLLECTION)?;
        let slot = candidates
            .iter_mut()
            .find(|existing| existing.id == candidate.id)
            .ok_or(RepositoryError::NotFound)?;

        if slot.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                actual: slot.version,
            });
        }

        candidate.version = expected_version + 1;
        *slot = candidate.clone();
        self.save(CANDIDATES_COLLECTION, &candidates)?;
        Ok(candidate)
    }

    fn append_transition(&self, record: StageTransitionRecord) -> Result<(), RepositoryError> {
        let _guard = self.lock()?;
        let mut log: Vec<StageTransitionRecord> = self.load(TRANSITIONS_COLLECTION)?;
        log.push(record);
        self.save(TRANSITIONS_COLLECTION, &log)
    }

    fn transitions(
        &self,
        id: &CandidateId,
    ) -> Result<Vec<StageTransitionRecord>, RepositoryError> {
        let log: Vec<StageTransitionRecord> = self.load(TRANSITIONS_COLLECTION)?;
        Ok(log
            .into_iter()
            .filter(|record| &record.candidate_id == id)
            .collect())
    }
}
