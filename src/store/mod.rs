//! Persistence handle shared by every data-access function.
//!
//! A [`Store`] pairs the optional document store connection with the JSON mirror.
//! Reads prefer the document store, writes go to the document store when it is
//! connected and are always mirrored to a file.

/// JSON mirror files
pub mod files;

pub use files::JsonFiles;

use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use tokio::sync::{Mutex, MutexGuard};

/// Document store connection plus JSON mirror.
#[derive(Debug)]
pub struct Store {
    db: Option<DatabaseConnection>,
    files: JsonFiles,
    writes: Mutex<()>,
}

impl Store {
    /// Creates a store. `db` is `None` in file-only mode.
    pub fn new(db: Option<DatabaseConnection>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            files: JsonFiles::new(data_dir),
            writes: Mutex::new(()),
        }
    }

    /// The document store connection, if one is available.
    #[must_use]
    pub const fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    /// The JSON mirror.
    #[must_use]
    pub const fn files(&self) -> &JsonFiles {
        &self.files
    }

    /// True when a database connection is configured.
    #[must_use]
    pub const fn has_document_store(&self) -> bool {
        self.db.is_some()
    }

    /// Serialises read-modify-write cycles on whole collections.
    ///
    /// Held by every operation that loads a collection, edits it and saves it back.
    /// The plain `load_*`/`save_*` functions never take it, so they can be called while
    /// it is held.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }
}
