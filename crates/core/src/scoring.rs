//! Severity scoring and reading assessment.
//!
//! The aggregate early-warning score is the sum of per-vital severities over
//! the scored vitals. Diastolic blood pressure is classified for display and
//! alerting but is **never** summed — only the systolic sub-value
//! contributes. That asymmetry is a domain rule inherited from the clinical
//! scale, not an oversight.

use crate::error::{ObsError, ObsResult};
use crate::reading::{VitalKind, VitalReading, VitalSample};
use crate::thresholds::{AlertLevel, ThresholdTable};
use std::collections::BTreeMap;

/// Severity points per alert level.
///
/// Levels absent from the map (`Alert`, `High Alert`) are unscored: they may
/// appear in display paths, but reaching one in a scored path is a
/// configuration defect and fails loudly rather than contributing zero.
#[derive(Debug, Clone)]
pub struct SeverityMap(BTreeMap<AlertLevel, u8>);

impl SeverityMap {
    pub fn new(scores: BTreeMap<AlertLevel, u8>) -> Self {
        Self(scores)
    }

    pub fn score(&self, level: AlertLevel) -> Option<u8> {
        self.0.get(&level).copied()
    }
}

impl Default for SeverityMap {
    fn default() -> Self {
        Self(BTreeMap::from([
            (AlertLevel::Normal, 0),
            (AlertLevel::MildAlert, 1),
            (AlertLevel::ModerateAlert, 2),
            (AlertLevel::SevereAlert, 3),
        ]))
    }
}

/// Canonical human-readable message per alert level.
#[derive(Debug, Clone)]
pub struct MessageCatalog(BTreeMap<AlertLevel, String>);

impl MessageCatalog {
    pub fn new(messages: BTreeMap<AlertLevel, String>) -> Self {
        Self(messages)
    }

    /// The message for a level, or a generic fallback embedding the level
    /// name when the catalog has no entry for it.
    pub fn message_for(&self, level: AlertLevel) -> String {
        match self.0.get(&level) {
            Some(message) => message.clone(),
            None => format!("⚠️ Unknown level: {level}"),
        }
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self(BTreeMap::from([
            (AlertLevel::Normal, "Normal".to_string()),
            (
                AlertLevel::MildAlert,
                "⚠️ Mild Alert! → Continue monitoring".to_string(),
            ),
            (
                AlertLevel::ModerateAlert,
                "⚠️⚠️ Moderate Alert!! → Consider escalation".to_string(),
            ),
            (
                AlertLevel::SevereAlert,
                "⚠️⚠️⚠️ Severe Alert!!! → Seek emergency help".to_string(),
            ),
            (AlertLevel::Alert, "⚠️ Clinically abnormal".to_string()),
            (AlertLevel::HighAlert, "⚠️ Clinically abnormal".to_string()),
        ]))
    }
}

/// The classification outcome for a single vital value.
///
/// `score` is `None` for levels outside the severity map, signalling
/// "abnormal but not scored".
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertResult {
    pub value: serde_json::Value,
    pub level: AlertLevel,
    pub score: Option<u8>,
    pub message: String,
}

/// Per-vital alert results for one reading, with blood pressure contributing
/// two entries under one parent key.
///
/// Field names serialise to the human-readable vital keys used at the input
/// boundary.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReadingAlerts {
    #[serde(rename = "Blood pressure")]
    pub blood_pressure: BloodPressureAlerts,
    #[serde(rename = "Heart rate")]
    pub heart_rate: AlertResult,
    #[serde(rename = "Respiratory rate")]
    pub respiratory_rate: AlertResult,
    #[serde(rename = "Temperature")]
    pub temperature: AlertResult,
    #[serde(rename = "Oxygen saturations")]
    pub oxygen_saturations: AlertResult,
    #[serde(rename = "Level of consciousness (fully awake and responsive?)")]
    pub consciousness: AlertResult,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BloodPressureAlerts {
    pub systolic: AlertResult,
    pub diastolic: AlertResult,
}

/// A fully assessed reading: per-vital alerts plus the aggregate score.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Assessment {
    pub alerts: ReadingAlerts,
    pub total_score: u16,
}

/// Classifies readings and aggregates the composite early-warning score.
///
/// Holds the clinical configuration as immutable values injected at
/// construction, so alternate scales can be substituted in tests.
#[derive(Debug, Clone)]
pub struct VitalsAssessor {
    thresholds: ThresholdTable,
    severities: SeverityMap,
    messages: MessageCatalog,
}

impl VitalsAssessor {
    pub fn new(thresholds: ThresholdTable, severities: SeverityMap, messages: MessageCatalog) -> Self {
        Self {
            thresholds,
            severities,
            messages,
        }
    }

    /// The assessor with the NEWS2-style defaults the system ships with.
    pub fn news2() -> Self {
        Self::new(
            ThresholdTable::news2(),
            SeverityMap::default(),
            MessageCatalog::default(),
        )
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// The aggregate score for a reading.
    ///
    /// Diastolic is skipped before scoring; every other sample is classified
    /// and its severity added.
    ///
    /// # Errors
    ///
    /// Returns `ObsError::UnscoredLevel` if a scored vital classifies into a
    /// level with no severity score — a configuration defect, never a silent
    /// zero contribution.
    pub fn total_score(&self, reading: &VitalReading) -> ObsResult<u16> {
        let mut total: u16 = 0;
        for sample in reading.samples() {
            let kind = sample.kind();
            if kind == VitalKind::BpDiastolic {
                continue;
            }
            let level = self.thresholds.classify(&sample)?;
            let score = self
                .severities
                .score(level)
                .ok_or(ObsError::UnscoredLevel { vital: kind, level })?;
            total += u16::from(score);
        }
        Ok(total)
    }

    /// Classifies every sample for presentation and computes the total.
    pub fn assess(&self, reading: &VitalReading) -> ObsResult<Assessment> {
        let samples = reading.samples();
        let [systolic, diastolic, heart_rate, respiratory_rate, temperature, oxygen_saturations, consciousness] =
            samples;

        let alerts = ReadingAlerts {
            blood_pressure: BloodPressureAlerts {
                systolic: self.alert_result(&systolic)?,
                diastolic: self.alert_result(&diastolic)?,
            },
            heart_rate: self.alert_result(&heart_rate)?,
            respiratory_rate: self.alert_result(&respiratory_rate)?,
            temperature: self.alert_result(&temperature)?,
            oxygen_saturations: self.alert_result(&oxygen_saturations)?,
            consciousness: self.alert_result(&consciousness)?,
        };

        let total_score = self.total_score(reading)?;

        Ok(Assessment {
            alerts,
            total_score,
        })
    }

    fn alert_result(&self, sample: &VitalSample) -> ObsResult<AlertResult> {
        let level = self.thresholds.classify(sample)?;
        Ok(AlertResult {
            value: sample.json_value(),
            level,
            score: self.severities.score(level),
            message: self.messages.message_for(level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{BloodPressure, Consciousness};
    use crate::thresholds::{Band, Interval};

    fn reading(
        systolic: u16,
        diastolic: u16,
        heart_rate: u16,
        respiratory_rate: u16,
        temperature: f64,
        oxygen_saturation: u8,
        consciousness: Consciousness,
    ) -> VitalReading {
        VitalReading::new(
            BloodPressure {
                systolic,
                diastolic,
            },
            heart_rate,
            respiratory_rate,
            temperature,
            oxygen_saturation,
            consciousness,
        )
        .expect("test reading should be in range")
    }

    #[test]
    fn all_normal_reading_scores_zero() {
        let assessor = VitalsAssessor::news2();
        let r = reading(120, 80, 75, 16, 37.0, 98, Consciousness::Yes);
        assert_eq!(assessor.total_score(&r).unwrap(), 0);
    }

    #[test]
    fn severities_sum_across_vitals() {
        let assessor = VitalsAssessor::news2();
        // systolic 105 -> Mild (1), HR 120 -> Moderate (2), RR 25 -> Severe (3),
        // temp 38.5 -> Mild (1), SpO2 93 -> Moderate (2), conscious -> 0.
        let r = reading(105, 80, 120, 25, 38.5, 93, Consciousness::Yes);
        assert_eq!(assessor.total_score(&r).unwrap(), 9);
    }

    #[test]
    fn unresponsive_patient_adds_three() {
        let assessor = VitalsAssessor::news2();
        let r = reading(120, 80, 75, 16, 37.0, 98, Consciousness::NoUnsure);
        assert_eq!(assessor.total_score(&r).unwrap(), 3);
    }

    #[test]
    fn diastolic_never_contributes_to_the_total() {
        let assessor = VitalsAssessor::news2();
        let normal_diastolic = reading(120, 80, 75, 16, 37.0, 98, Consciousness::Yes);
        let high_alert_diastolic = reading(120, 115, 75, 16, 37.0, 98, Consciousness::Yes);
        assert_eq!(
            assessor.total_score(&normal_diastolic).unwrap(),
            assessor.total_score(&high_alert_diastolic).unwrap()
        );
    }

    #[test]
    fn assess_reports_diastolic_as_unscored() {
        let assessor = VitalsAssessor::news2();
        let r = reading(120, 115, 75, 16, 37.0, 98, Consciousness::Yes);
        let assessment = assessor.assess(&r).unwrap();

        let diastolic = &assessment.alerts.blood_pressure.diastolic;
        assert_eq!(diastolic.level, AlertLevel::HighAlert);
        assert_eq!(diastolic.score, None);
        assert_eq!(diastolic.message, "⚠️ Clinically abnormal");

        let systolic = &assessment.alerts.blood_pressure.systolic;
        assert_eq!(systolic.level, AlertLevel::Normal);
        assert_eq!(systolic.score, Some(0));
        assert_eq!(assessment.total_score, 0);
    }

    #[test]
    fn unscored_level_in_a_scored_path_fails_loudly() {
        use crate::reading::VitalKind;

        // A scale where every numeric vital lands in the display-only Alert
        // tier; the first scored vital must then fail, not contribute zero.
        let mut bands = std::collections::BTreeMap::new();
        for kind in [
            VitalKind::BpSystolic,
            VitalKind::BpDiastolic,
            VitalKind::HeartRate,
            VitalKind::RespiratoryRate,
            VitalKind::Temperature,
            VitalKind::OxygenSats,
        ] {
            bands.insert(
                kind,
                vec![Band::new(AlertLevel::Alert, vec![Interval::at_least(0.0)])],
            );
        }

        let assessor = VitalsAssessor::new(
            ThresholdTable::new(bands),
            SeverityMap::default(),
            MessageCatalog::default(),
        );

        let r = reading(120, 80, 70, 16, 37.0, 98, Consciousness::Yes);
        let err = assessor
            .total_score(&r)
            .expect_err("unscored level must not contribute silently");
        assert!(matches!(
            err,
            ObsError::UnscoredLevel {
                vital: VitalKind::BpSystolic,
                level: AlertLevel::Alert,
            }
        ));
        assert!(!err.is_validation());
    }

    #[test]
    fn message_catalog_falls_back_for_missing_levels() {
        let catalog = MessageCatalog::new(std::collections::BTreeMap::new());
        assert_eq!(
            catalog.message_for(AlertLevel::HighAlert),
            "⚠️ Unknown level: High Alert"
        );
    }
}
