//! Patient identity resolution.
//!
//! Maps a normalised (name, date-of-birth) pair to a stable integer patient
//! identifier. Identity rows live in a single mapping file and are
//! append-only; an identity is immutable once created. Identifier allocation
//! is `max existing + 1`, so the id space stays dense and monotonic as long
//! as all allocation goes through [`IdentityService::resolve`].
//!
//! Resolution is a read-then-append sequence and is **not** safe for
//! unsynchronised concurrent writers; the serving layer must serialise calls.

use crate::config::CoreConfig;
use crate::constants::MAPPING_COLUMNS;
use crate::error::ObsResult;
use crate::flat_file;
use obs_types::{DateOfBirth, PatientId, PatientName};
use std::sync::Arc;

/// One identity row in the mapping file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PatientIdentity {
    pub patient_id: PatientId,
    pub patient_name: PatientName,
    pub dob: DateOfBirth,
}

/// Service for resolving and allocating patient identifiers.
#[derive(Debug, Clone)]
pub struct IdentityService {
    cfg: Arc<CoreConfig>,
}

impl IdentityService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Returns the identifier for the pair, allocating a new one on no match.
    ///
    /// Matching is an exact comparison of the normalised pair, so repeated
    /// submissions under the same identity always return the same id, and
    /// patients sharing a name but not a birth date get distinct ids.
    pub fn resolve(&self, name: &PatientName, dob: &DateOfBirth) -> ObsResult<PatientId> {
        let identities = self.load()?;

        if let Some(existing) = Self::match_identity(&identities, name, dob) {
            return Ok(existing);
        }

        let new_id = identities
            .iter()
            .map(|identity| identity.patient_id)
            .max()
            .map(|id| id.next())
            .unwrap_or_else(PatientId::first);

        let record = PatientIdentity {
            patient_id: new_id,
            patient_name: name.clone(),
            dob: *dob,
        };
        flat_file::append_row(&self.cfg.mapping_file(), &MAPPING_COLUMNS, &record)?;
        tracing::info!(patient_id = %new_id, "allocated new patient identity");

        Ok(new_id)
    }

    /// Looks the pair up without ever allocating.
    pub fn find(&self, name: &PatientName, dob: &DateOfBirth) -> ObsResult<Option<PatientId>> {
        let identities = self.load()?;
        Ok(Self::match_identity(&identities, name, dob))
    }

    fn match_identity(
        identities: &[PatientIdentity],
        name: &PatientName,
        dob: &DateOfBirth,
    ) -> Option<PatientId> {
        identities
            .iter()
            .find(|identity| identity.patient_name == *name && identity.dob == *dob)
            .map(|identity| identity.patient_id)
    }

    fn load(&self) -> ObsResult<Vec<PatientIdentity>> {
        flat_file::read_rows(&self.cfg.mapping_file(), &MAPPING_COLUMNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> IdentityService {
        IdentityService::new(Arc::new(CoreConfig::new(dir.path().to_path_buf())))
    }

    fn name(s: &str) -> PatientName {
        PatientName::new(s).expect("test name should be valid")
    }

    fn dob(s: &str) -> DateOfBirth {
        DateOfBirth::parse(s).expect("test dob should be valid")
    }

    #[test]
    fn first_identity_gets_id_one() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let id = service
            .resolve(&name("Jane Doe"), &dob("01/01/90"))
            .expect("resolve should succeed");
        assert_eq!(id.to_string(), "1");
    }

    #[test]
    fn distinct_identities_get_sequential_ids() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let first = service.resolve(&name("Jane Doe"), &dob("01/01/90")).unwrap();
        let second = service.resolve(&name("John Doe"), &dob("02/02/85")).unwrap();
        assert_eq!(first.to_string(), "1");
        assert_eq!(second.to_string(), "2");
    }

    #[test]
    fn resolve_is_idempotent_for_the_same_pair() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let first = service.resolve(&name("Jane Doe"), &dob("01/01/90")).unwrap();
        let again = service.resolve(&name("Jane Doe"), &dob("01/01/90")).unwrap();
        assert_eq!(first, again);

        let rows = fs::read_to_string(dir.path().join("patient_mapping.csv")).unwrap();
        assert_eq!(rows.lines().count(), 2, "header plus exactly one identity");
    }

    #[test]
    fn same_name_different_dob_is_a_different_patient() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let first = service.resolve(&name("Jane Doe"), &dob("01/01/90")).unwrap();
        let second = service.resolve(&name("Jane Doe"), &dob("02/01/90")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn name_matching_is_case_insensitive() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        let upper = service.resolve(&name("JANE DOE"), &dob("01/01/90")).unwrap();
        let lower = service.resolve(&name("jane doe"), &dob("01/01/90")).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn find_never_allocates() {
        let dir = TempDir::new().expect("temp dir");
        let service = service(&dir);

        assert_eq!(service.find(&name("Jane Doe"), &dob("01/01/90")).unwrap(), None);

        let id = service.resolve(&name("Jane Doe"), &dob("01/01/90")).unwrap();
        assert_eq!(
            service.find(&name("Jane Doe"), &dob("01/01/90")).unwrap(),
            Some(id)
        );
    }

    #[test]
    fn mapping_header_is_self_healed() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("patient_mapping.csv"), "1,jane doe,01/01/90\n").unwrap();

        let service = service(&dir);
        let id = service.resolve(&name("Jane Doe"), &dob("01/01/90")).unwrap();
        assert_eq!(id.to_string(), "1", "healed row should still match");

        let contents = fs::read_to_string(dir.path().join("patient_mapping.csv")).unwrap();
        assert!(contents.starts_with("patient_id,patient_name,dob\n"));
    }

    #[test]
    fn malformed_dob_fails_before_any_write() {
        let dir = TempDir::new().expect("temp dir");
        let _service = service(&dir);

        // The fixed dd/mm/yy format is enforced at the type boundary, so no
        // identity operation can even be attempted with a malformed dob.
        let err = DateOfBirth::parse("1990-01-01").expect_err("ISO date should be rejected");
        assert!(err.to_string().contains("dd/mm/yy"));
        assert!(
            !dir.path().join("patient_mapping.csv").exists(),
            "no mapping file should be created"
        );
    }
}
