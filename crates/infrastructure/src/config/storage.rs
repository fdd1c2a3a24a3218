//! Event store file layout.

use std::path::PathBuf;

use domain::UserId;
use serde::{Deserialize, Serialize};

/// Where the global and per-user event collections live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of all stores
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File name of the shared global collection inside `data_dir`
    #[serde(default = "default_events_file")]
    pub global_events_file: String,

    /// Directory holding one sub-directory per user, relative to `data_dir`
    #[serde(default = "default_users_dir")]
    pub users_dir: String,

    /// File name of a user's collection inside their directory
    #[serde(default = "default_events_file")]
    pub user_events_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_events_file() -> String {
    "events_db.json".to_string()
}

fn default_users_dir() -> String {
    "users".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            global_events_file: default_events_file(),
            users_dir: default_users_dir(),
            user_events_file: default_events_file(),
        }
    }
}

impl StorageConfig {
    /// Storage rooted at `data_dir` with default file names
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn global_events_path(&self) -> PathBuf {
        self.data_dir.join(&self.global_events_file)
    }

    pub fn user_events_path(&self, user_id: &UserId) -> PathBuf {
        self.data_dir
            .join(&self.users_dir)
            .join(user_id.as_str())
            .join(&self.user_events_file)
    }
}
