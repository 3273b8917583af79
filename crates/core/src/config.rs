//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid reading
//! process-wide environment variables during request handling, which can lead
//! to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::constants::{DEFAULT_DATA_DIR, MAPPING_FILE_NAME, VITALS_FILE_NAME};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at the given data directory.
    ///
    /// The directory does not need to exist yet; storage services create it
    /// on first write.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the patient identity mapping file.
    pub fn mapping_file(&self) -> PathBuf {
        self.data_dir.join(MAPPING_FILE_NAME)
    }

    /// Path of the append-only vitals readings file.
    pub fn vitals_file(&self) -> PathBuf {
        self.data_dir.join(VITALS_FILE_NAME)
    }
}

/// Resolve the data directory from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, the default directory is used.
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}
