//! The append-only reading store.
//!
//! Readings are flattened into a fixed column set and appended to a single
//! vitals file; rows are never mutated or deleted. Queries filter by patient
//! identifier and preserve append order — insertion order is the only
//! ordering guarantee, so backfilled data stays as-inserted rather than
//! re-sorted by timestamp.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/vitals.csv
//!   patient_id,timestamp,news2_score,bp_systolic,bp_diastolic,
//!   heart_rate,respiratory_rate,temperature,oxygen_sats,loc
//! ```

use crate::config::CoreConfig;
use crate::constants::VITALS_COLUMNS;
use crate::error::ObsResult;
use crate::flat_file;
use crate::reading::{Consciousness, VitalReading};
use chrono::Utc;
use obs_types::PatientId;
use std::sync::Arc;

/// One flattened reading row.
///
/// Every vital field is optional on the read side: an absent or empty cell
/// means unknown, never zero.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryRecord {
    pub patient_id: PatientId,
    pub timestamp: String,
    pub news2_score: Option<u16>,
    pub bp_systolic: Option<u16>,
    pub bp_diastolic: Option<u16>,
    pub heart_rate: Option<u16>,
    pub respiratory_rate: Option<u16>,
    pub temperature: Option<f64>,
    pub oxygen_sats: Option<u8>,
    pub loc: Option<Consciousness>,
}

/// Service owning the append-only reading sequence.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    cfg: Arc<CoreConfig>,
}

impl ReadingStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Flattens and appends one reading, stamping the timestamp at append
    /// time and the precomputed score.
    ///
    /// The record is durable once this returns: any subsequent [`query`]
    /// will see it.
    ///
    /// [`query`]: ReadingStore::query
    pub fn append(
        &self,
        patient_id: PatientId,
        news2_score: u16,
        reading: &VitalReading,
    ) -> ObsResult<HistoryRecord> {
        let record = HistoryRecord {
            patient_id,
            timestamp: Utc::now().to_rfc3339(),
            news2_score: Some(news2_score),
            bp_systolic: Some(reading.blood_pressure.systolic),
            bp_diastolic: Some(reading.blood_pressure.diastolic),
            heart_rate: Some(reading.heart_rate),
            respiratory_rate: Some(reading.respiratory_rate),
            temperature: Some(reading.temperature),
            oxygen_sats: Some(reading.oxygen_saturation),
            loc: Some(reading.consciousness),
        };

        flat_file::append_row(&self.cfg.vitals_file(), &VITALS_COLUMNS, &record)?;

        Ok(record)
    }

    /// Returns every record for the patient, in append order.
    ///
    /// Querying before any record exists returns an empty sequence.
    pub fn query(&self, patient_id: PatientId) -> ObsResult<Vec<HistoryRecord>> {
        let rows: Vec<HistoryRecord> =
            flat_file::read_rows(&self.cfg.vitals_file(), &VITALS_COLUMNS)?;
        Ok(rows
            .into_iter()
            .filter(|record| record.patient_id == patient_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::BloodPressure;
    use std::fs;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ReadingStore {
        ReadingStore::new(Arc::new(CoreConfig::new(dir.path().to_path_buf())))
    }

    fn reading(systolic: u16, heart_rate: u16) -> VitalReading {
        VitalReading::new(
            BloodPressure {
                systolic,
                diastolic: 80,
            },
            heart_rate,
            16,
            37.0,
            98,
            Consciousness::Yes,
        )
        .expect("test reading should be in range")
    }

    fn id(n: &str) -> PatientId {
        n.parse().expect("test id should parse")
    }

    #[test]
    fn query_on_empty_store_returns_no_records() {
        let dir = TempDir::new().expect("temp dir");
        let records = store(&dir).query(id("1")).expect("query should succeed");
        assert!(records.is_empty());
    }

    #[test]
    fn append_then_query_round_trips_all_fields() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);

        store.append(id("1"), 2, &reading(105, 120)).unwrap();

        let records = store.query(id("1")).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.news2_score, Some(2));
        assert_eq!(record.bp_systolic, Some(105));
        assert_eq!(record.bp_diastolic, Some(80));
        assert_eq!(record.heart_rate, Some(120));
        assert_eq!(record.respiratory_rate, Some(16));
        assert_eq!(record.temperature, Some(37.0));
        assert_eq!(record.oxygen_sats, Some(98));
        assert_eq!(record.loc, Some(Consciousness::Yes));
        assert!(!record.timestamp.is_empty());
    }

    #[test]
    fn query_filters_by_patient_and_preserves_append_order() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);

        store.append(id("1"), 0, &reading(120, 75)).unwrap();
        store.append(id("2"), 0, &reading(130, 80)).unwrap();
        store.append(id("1"), 1, &reading(105, 75)).unwrap();

        let records = store.query(id("1")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bp_systolic, Some(120));
        assert_eq!(records[1].bp_systolic, Some(105));

        let other = store.query(id("2")).unwrap();
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn vitals_header_is_self_healed_without_losing_rows() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);

        store.append(id("1"), 0, &reading(120, 75)).unwrap();

        // Strip the header, simulating a file written by an older tool.
        let path = dir.path().join("vitals.csv");
        let contents = fs::read_to_string(&path).unwrap();
        let without_header: String = contents.lines().skip(1).collect::<Vec<_>>().join("\n");
        fs::write(&path, format!("{without_header}\n")).unwrap();

        let records = store.query(id("1")).unwrap();
        assert_eq!(records.len(), 1, "data row should survive the repair");
        assert_eq!(records[0].bp_systolic, Some(120));

        let healed = fs::read_to_string(&path).unwrap();
        assert!(healed.starts_with("patient_id,timestamp,news2_score,"));
    }

    #[test]
    fn timestamps_do_not_decrease_across_appends() {
        let dir = TempDir::new().expect("temp dir");
        let store = store(&dir);

        let first = store.append(id("1"), 0, &reading(120, 75)).unwrap();
        let second = store.append(id("1"), 0, &reading(121, 76)).unwrap();
        assert!(second.timestamp >= first.timestamp);
    }
}
