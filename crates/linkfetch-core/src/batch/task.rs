//! One download task: fetch, check status, persist.

use std::path::PathBuf;

use crate::fetch::{FetchError, FetchRequest, Fetcher};
use crate::links::DownloadItem;
use crate::storage::{Storage, StorageError};

/// Why an item produced no file.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("server returned HTTP {status}")]
    HttpStatus { status: u32 },
    #[error("write failed: {0}")]
    Storage(#[from] StorageError),
}

/// What a successful task wrote.
#[derive(Debug, Clone)]
pub struct TaskSuccess {
    pub path: PathBuf,
    pub bytes: u64,
    pub status_code: u32,
}

pub(super) fn run_task<F, S>(
    fetcher: &F,
    storage: &S,
    item: &DownloadItem,
    fail_on_http_error: bool,
) -> Result<TaskSuccess, TaskError>
where
    F: Fetcher + ?Sized,
    S: Storage + ?Sized,
{
    let response = fetcher.fetch(&FetchRequest::get(&item.source))?;
    if !response.success {
        if fail_on_http_error {
            return Err(TaskError::HttpStatus {
                status: response.status_code,
            });
        }
        tracing::debug!(
            url = %item.source,
            status = response.status_code,
            "saving error response body"
        );
    }
    let path = storage.persist(&item.destination_name, &response.body)?;
    Ok(TaskSuccess {
        path,
        bytes: response.body.len() as u64,
        status_code: response.status_code,
    })
}
