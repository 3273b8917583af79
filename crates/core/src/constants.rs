//! Constants used throughout the OBS core crate.
//!
//! This module contains filename and column-layout constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Filename for the patient identity mapping file.
pub const MAPPING_FILE_NAME: &str = "patient_mapping.csv";

/// Filename for the append-only vitals readings file.
pub const VITALS_FILE_NAME: &str = "vitals.csv";

/// Default directory for observation data storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "obs_data";

/// Column set of the identity mapping file, in storage order.
pub const MAPPING_COLUMNS: [&str; 3] = ["patient_id", "patient_name", "dob"];

/// Column set of the vitals readings file, in storage order.
///
/// Consumers of this format must treat absent or empty cells as unknown,
/// never as zero.
pub const VITALS_COLUMNS: [&str; 10] = [
    "patient_id",
    "timestamp",
    "news2_score",
    "bp_systolic",
    "bp_diastolic",
    "heart_rate",
    "respiratory_rate",
    "temperature",
    "oxygen_sats",
    "loc",
];
