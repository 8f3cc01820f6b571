//! Remote hygiene: find and delete files that no longer decrypt.
//!
//! A file becomes undecryptable when it was encrypted under a previous sync
//! password or was corrupted in storage. Deletion is irreversible and only
//! ever runs on an explicit, user-confirmed request.

use crate::crypto::envelope::decrypt;
use crate::sync::remote::RemoteStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// A remote object that failed to decrypt under the current password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndecryptableFile {
    pub file_id: String,
    pub file_name: String,
    /// Unit name recovered from envelope metadata, `None` when the object
    /// was not a parseable envelope at all.
    pub sync_unit: Option<String>,
}

/// Per-file outcome of a bulk deletion.
#[derive(Debug, Clone, Default)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    /// `(file_id, reason)` for every file that was not deleted.
    pub failed: Vec<(String, String)>,
}

impl DeleteReport {
    pub fn all_deleted(&self) -> bool {
        self.failed.is_empty()
    }

    /// Aggregate error message naming how many files were left behind.
    pub fn error(&self) -> Option<String> {
        if self.failed.is_empty() {
            None
        } else {
            Some(format!(
                "{} of {} files could not be deleted",
                self.failed.len(),
                self.deleted.len() + self.failed.len()
            ))
        }
    }
}

/// Scans the remote store for undecryptable files and deletes them on
/// request.
pub struct UndecryptableScanner {
    remote: Arc<dyn RemoteStore>,
}

impl UndecryptableScanner {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Enumerate remote objects and return those that fail to decrypt under
    /// the current password.
    pub async fn list_undecryptable(&self, password: &str) -> Result<Vec<UndecryptableFile>> {
        let objects = self.remote.list_objects().await?;
        let mut undecryptable = Vec::new();

        for object in objects {
            match &object.envelope {
                Some(envelope) => {
                    if decrypt(envelope, password).is_err() {
                        undecryptable.push(UndecryptableFile {
                            file_id: object.file_id,
                            file_name: object.file_name,
                            sync_unit: Some(envelope.sync_unit.clone()),
                        });
                    }
                }
                None => {
                    undecryptable.push(UndecryptableFile {
                        file_id: object.file_id,
                        file_name: object.file_name,
                        sync_unit: None,
                    });
                }
            }
        }

        info!(count = undecryptable.len(), "undecryptable scan finished");
        Ok(undecryptable)
    }

    /// Delete the given files. Failures are collected per file; the run
    /// always continues to the end of the list.
    pub async fn delete_files(&self, file_ids: &[String]) -> Result<DeleteReport> {
        let mut report = DeleteReport::default();

        for file_id in file_ids {
            match self.remote.delete_object(file_id).await {
                Ok(()) => report.deleted.push(file_id.clone()),
                Err(e) => {
                    warn!(file_id = %file_id, error = %e, "delete failed");
                    report.failed.push((file_id.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
