//! # OBS Core
//!
//! Core business logic for the OBS vitals tracking system.
//!
//! This crate contains the two pieces with real invariants:
//! - Threshold classification and early-warning score aggregation
//!   ([`thresholds`], [`scoring`])
//! - Patient identity resolution and the append-only reading store
//!   ([`identity`], [`store`])
//!
//! Everything here is synchronous and single-writer: a classify → score →
//! resolve → append sequence runs to completion before the next begins.
//! Identity allocation is read-then-append, so a serving layer embedding this
//! crate must serialise writers itself.
//!
//! **No API concerns**: HTTP servers, CLI parsing and presentation belong in
//! the `obs-run` and `obs-cli` binaries.

pub mod config;
pub mod constants;
pub mod error;
pub mod identity;
pub mod reading;
pub mod scoring;
pub mod store;
pub mod thresholds;

mod flat_file;

pub use config::{data_dir_from_env_value, CoreConfig};
pub use error::{ObsError, ObsResult};
pub use identity::{IdentityService, PatientIdentity};
pub use reading::{BloodPressure, Consciousness, VitalKind, VitalReading, VitalSample};
pub use scoring::{
    AlertResult, Assessment, BloodPressureAlerts, MessageCatalog, ReadingAlerts, SeverityMap,
    VitalsAssessor,
};
pub use store::{HistoryRecord, ReadingStore};
pub use thresholds::{AlertLevel, Band, Interval, ThresholdTable};
