//! JSON-file event store
//!
//! One file for the shared global collection and one file per user. A user
//! collection is replaced by writing a sibling temp file, flushing it and
//! renaming it over the target, so readers never see a half-written file.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use application::{error::ApplicationError, ports::EventStorePort};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{CalendarEvent, DomainError, UserId, decode_events, encode_events};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::StorageConfig;

/// [`EventStorePort`] backed by JSON files under a data directory
#[derive(Debug, Clone)]
pub struct JsonEventStore {
    config: StorageConfig,
}

impl JsonEventStore {
    pub const fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Store rooted at `data_dir` with the default file layout
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(StorageConfig::rooted_at(data_dir))
    }

    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Read and decode a collection; missing or blank files are `None`
    async fn read_collection(path: &Path) -> Result<Option<Vec<CalendarEvent>>, ApplicationError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Event store absent");
                return Ok(None);
            },
            Err(e) => {
                return Err(ApplicationError::Storage(format!(
                    "{}: {e}",
                    path.display()
                )));
            },
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!(path = %path.display(), "Event store empty");
            return Ok(None);
        }

        decode_events(&bytes).map(Some).map_err(|e| {
            let detail = match e {
                DomainError::Parse(msg) => msg,
                other => other.to_string(),
            };
            ApplicationError::Parse(format!("{}: {detail}", path.display()))
        })
    }

    /// Write `bytes` to `path` via temp file + rename
    async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ApplicationError> {
        let storage_err =
            |e: std::io::Error| ApplicationError::Storage(format!("{}: {e}", path.display()));

        let dir = path.parent().ok_or_else(|| {
            ApplicationError::Storage(format!("{}: no parent directory", path.display()))
        })?;
        fs::create_dir_all(dir).await.map_err(storage_err)?;

        let file_name = path
            .file_name()
            .map_or_else(|| "events".to_string(), |n| n.to_string_lossy().into_owned());
        let tmp_path = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        let written = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(
                        path = %tmp_path.display(),
                        error = %cleanup,
                        "Failed to remove temp file"
                    );
                }
            }
            return Err(storage_err(e));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStorePort for JsonEventStore {
    #[instrument(skip(self))]
    async fn load_global_events(&self) -> Result<Option<Vec<CalendarEvent>>, ApplicationError> {
        Self::read_collection(&self.config.global_events_path()).await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn load_user_events(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Vec<CalendarEvent>>, ApplicationError> {
        Self::read_collection(&self.config.user_events_path(user_id)).await
    }

    #[instrument(skip(self, events), fields(user_id = %user_id, count = events.len()))]
    async fn replace_user_events(
        &self,
        user_id: &UserId,
        events: &[CalendarEvent],
    ) -> Result<(), ApplicationError> {
        let bytes = encode_events(events)?;
        let path = self.config.user_events_path(user_id);
        Self::write_atomic(&path, &bytes).await?;
        debug!(path = %path.display(), "User event store replaced");
        Ok(())
    }

    async fn user_events_modified_at(
        &self,
        user_id: &UserId,
    ) -> Result<Option<DateTime<Utc>>, ApplicationError> {
        let path = self.config.user_events_path(user_id);
        match fs::metadata(&path).await {
            Ok(meta) => meta
                .modified()
                .map(|t| Some(DateTime::<Utc>::from(t)))
                .map_err(|e| ApplicationError::Storage(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApplicationError::Storage(format!("{}: {e}", path.display()))),
        }
    }
}
