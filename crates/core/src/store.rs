//! JSON document storage.
//!
//! Every entity lives as one pretty-printed JSON file under the data
//! directory:
//!
//! ```text
//! <data_dir>/
//!   users/<uuid>.json
//!   patients/<uuid>.json
//!   appointments/<uuid>.json
//!   consultations/<uuid>.json
//! ```
//!
//! ## Connection model
//!
//! [`SharedDatabase`] is the process-wide handle. The underlying
//! [`Database`] is established lazily on first use; a failed attempt
//! caches nothing, so the next call retries from scratch instead of
//! wedging the process on a transient startup failure.
//!
//! ## Write serialization
//!
//! Each collection has a mutex. Read-count-then-write sequences
//! (sequential code assignment, slot booking, consultation eligibility)
//! run inside [`Database::with_collection_lock`], which makes them atomic
//! within this process. Cross-process writers are out of scope; the
//! deployment assumption is a single server process, same as the system
//! this replaces.

use crate::{ClinicError, ClinicResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// The four document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Patients,
    Appointments,
    Consultations,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Users,
        Collection::Patients,
        Collection::Appointments,
        Collection::Consultations,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Patients => "patients",
            Collection::Appointments => "appointments",
            Collection::Consultations => "consultations",
        }
    }

    fn index(self) -> usize {
        match self {
            Collection::Users => 0,
            Collection::Patients => 1,
            Collection::Appointments => 2,
            Collection::Consultations => 3,
        }
    }
}

/// An open document store rooted at a data directory.
pub struct Database {
    data_dir: PathBuf,
    locks: [Mutex<()>; 4],
}

impl Database {
    /// Opens the store, creating the data directory and every collection
    /// directory if needed.
    pub fn open(data_dir: &Path) -> ClinicResult<Self> {
        for collection in Collection::ALL {
            fs::create_dir_all(data_dir.join(collection.dir_name()))
                .map_err(ClinicError::StorageDirCreation)?;
        }

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            locks: Default::default(),
        })
    }

    fn doc_path(&self, collection: Collection, id: Uuid) -> PathBuf {
        self.data_dir
            .join(collection.dir_name())
            .join(format!("{id}.json"))
    }

    /// Runs `f` while holding the collection's write lock.
    ///
    /// Use for any read-then-write sequence whose correctness depends on
    /// no interleaved writer: counting documents to assign a sequential
    /// code, checking a slot before booking it, checking consultation
    /// eligibility before recording one.
    pub fn with_collection_lock<T>(
        &self,
        collection: Collection,
        f: impl FnOnce() -> ClinicResult<T>,
    ) -> ClinicResult<T> {
        let _guard = self.locks[collection.index()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }

    /// Reads one document, or `None` if it does not exist.
    pub fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> ClinicResult<Option<T>> {
        let path = self.doc_path(collection, id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(ClinicError::FileRead)?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(ClinicError::Deserialization)
    }

    /// Writes (creates or replaces) one document.
    pub fn put<T: Serialize>(&self, collection: Collection, id: Uuid, doc: &T) -> ClinicResult<()> {
        let json = serde_json::to_string_pretty(doc).map_err(ClinicError::Serialization)?;
        fs::write(self.doc_path(collection, id), json).map_err(ClinicError::FileWrite)
    }

    /// Reads every document in a collection. Order is unspecified.
    pub fn list<T: DeserializeOwned>(&self, collection: Collection) -> ClinicResult<Vec<T>> {
        let dir = self.data_dir.join(collection.dir_name());
        let mut docs = Vec::new();

        for entry in fs::read_dir(&dir).map_err(ClinicError::FileRead)? {
            let entry = entry.map_err(ClinicError::FileRead)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = fs::read_to_string(&path).map_err(ClinicError::FileRead)?;
            docs.push(serde_json::from_str(&raw).map_err(ClinicError::Deserialization)?);
        }

        Ok(docs)
    }

    /// Counts the documents in a collection.
    pub fn count(&self, collection: Collection) -> ClinicResult<usize> {
        let dir = self.data_dir.join(collection.dir_name());
        let mut n = 0;
        for entry in fs::read_dir(&dir).map_err(ClinicError::FileRead)? {
            let entry = entry.map_err(ClinicError::FileRead)?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                n += 1;
            }
        }
        Ok(n)
    }
}

/// Process-wide, lazily-connected store handle.
///
/// Cheap to clone; every service holds one. The first operation opens the
/// underlying [`Database`]; on failure nothing is cached, so a later
/// request attempts the connection fresh rather than finding a
/// permanently wedged handle.
#[derive(Clone)]
pub struct SharedDatabase {
    inner: Arc<LazyInner>,
}

struct LazyInner {
    data_dir: PathBuf,
    connected: Mutex<Option<Arc<Database>>>,
}

impl SharedDatabase {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                data_dir,
                connected: Mutex::new(None),
            }),
        }
    }

    /// Returns the open database, connecting on first use.
    pub fn get(&self) -> ClinicResult<Arc<Database>> {
        let mut connected = self
            .inner
            .connected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(db) = connected.as_ref() {
            return Ok(Arc::clone(db));
        }

        let db = Arc::new(Database::open(&self.inner.data_dir)?);
        *connected = Some(Arc::clone(&db));
        tracing::debug!(data_dir = %self.inner.data_dir.display(), "document store opened");
        Ok(db)
    }
}
