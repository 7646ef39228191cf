// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Boundary to the file storage collaborator used by file uploads.
//!
//! Multipart parsing and the storage engine live outside this crate. This
//! module fixes the contract between them: how a file is created and how a
//! duplicate identifier is told apart from other failures.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use thiserror::Error;

use crate::tracing_utils::warn;

pub const STATUS_CREATED: u16 = 201;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;
pub const STATUS_NOT_IMPLEMENTED: u16 = 501;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A file with this id already exists. Updating files is unsupported.
    #[error("file '{0}' already exists")]
    DuplicateId(String),

    #[error("storage failure: {0}")]
    Backend(String),
}

/// Storage collaborator for uploaded files.
pub trait FileStore: Send + Sync {
    /// Store a new file and return the HTTP status to reply with.
    fn create_file(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        metadata: &Value,
        content: &[u8],
    ) -> Result<u16, StorageError>;
}

/// Map a storage outcome to a response status and optional message.
pub fn upload_status(result: &Result<u16, StorageError>) -> (u16, Option<&'static str>) {
    match result {
        Ok(status) => (*status, None),
        Err(StorageError::DuplicateId(_)) => (
            STATUS_NOT_IMPLEMENTED,
            Some("file resource update is not yet implemented"),
        ),
        Err(StorageError::Backend(_)) => (STATUS_INTERNAL_SERVER_ERROR, Some("error storing the file")),
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub metadata: Value,
    pub content: Vec<u8>,
}

/// In-process [`FileStore`], keyed by database, collection and id.
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    files: RwLock<HashMap<(String, String, String), StoredFile>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, database: &str, collection: &str, id: &str) -> Option<StoredFile> {
        let files = self.files.read().ok()?;
        files
            .get(&(database.to_string(), collection.to_string(), id.to_string()))
            .cloned()
    }
}

impl FileStore for InMemoryFileStore {
    fn create_file(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        metadata: &Value,
        content: &[u8],
    ) -> Result<u16, StorageError> {
        let mut files = self
            .files
            .write()
            .map_err(|_| StorageError::Backend("file index lock poisoned".to_string()))?;

        let key = (database.to_string(), collection.to_string(), id.to_string());
        if files.contains_key(&key) {
            warn!("refusing to overwrite file {id} in {database}/{collection}");
            return Err(StorageError::DuplicateId(id.to_string()));
        }

        files.insert(
            key,
            StoredFile {
                metadata: metadata.clone(),
                content: content.to_vec(),
            },
        );
        Ok(STATUS_CREATED)
    }
}
