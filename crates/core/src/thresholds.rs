//! Clinical threshold bands and the classifier.
//!
//! A [`ThresholdTable`] maps each vital to an ordered list of named bands.
//! Classification scans the bands in declared order and returns the first
//! band whose interval(s) contain the value. Some of the inherited clinical
//! ranges overlap or leave gaps between adjacent bands; declaration order is
//! the tie-break for overlaps, and a value falling in a gap classifies as
//! `Normal` with a diagnostic rather than failing the reading. These quirks
//! are part of the behavioural contract and are exercised by tests — do not
//! "fix" the ranges without a clinical review.
//!
//! The table is an immutable value injected at construction, so tests and
//! future callers can substitute alternate clinical scales.

use crate::error::{ObsError, ObsResult};
use crate::reading::{Consciousness, VitalKind, VitalSample};
use std::collections::BTreeMap;

/// A named clinical severity tier.
///
/// `Alert` and `HighAlert` are display-only tiers used by the diastolic
/// bands; they carry no severity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertLevel {
    Normal,
    MildAlert,
    ModerateAlert,
    SevereAlert,
    Alert,
    HighAlert,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "Normal",
            AlertLevel::MildAlert => "Mild Alert",
            AlertLevel::ModerateAlert => "Moderate Alert",
            AlertLevel::SevereAlert => "Severe Alert",
            AlertLevel::Alert => "Alert",
            AlertLevel::HighAlert => "High Alert",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for AlertLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// An inclusive numeric interval, open-ended where a bound is `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Interval {
    pub const fn closed(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// A severity tier with the interval(s) it covers for one vital.
///
/// A band may cover a disjoint union of intervals, e.g. "too low or too
/// high" both classifying as `Severe Alert`.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub level: AlertLevel,
    pub intervals: Vec<Interval>,
}

impl Band {
    pub fn new(level: AlertLevel, intervals: Vec<Interval>) -> Self {
        Self { level, intervals }
    }

    fn contains(&self, value: f64) -> bool {
        self.intervals.iter().any(|interval| interval.contains(value))
    }
}

/// Ordered threshold bands per vital.
///
/// Band order within a vital is the declaration order and is significant.
/// The consciousness vital is categorical and never consults the table.
#[derive(Debug, Clone)]
pub struct ThresholdTable {
    bands: BTreeMap<VitalKind, Vec<Band>>,
}

impl ThresholdTable {
    pub fn new(bands: BTreeMap<VitalKind, Vec<Band>>) -> Self {
        Self { bands }
    }

    /// The NEWS2-style table the system ships with.
    pub fn news2() -> Self {
        use AlertLevel::*;

        let mut bands = BTreeMap::new();
        bands.insert(
            VitalKind::BpSystolic,
            vec![
                Band::new(Normal, vec![Interval::closed(111.0, 219.0)]),
                Band::new(MildAlert, vec![Interval::closed(101.0, 110.0)]),
                Band::new(ModerateAlert, vec![Interval::closed(91.0, 100.0)]),
                Band::new(
                    SevereAlert,
                    vec![Interval::at_most(90.0), Interval::at_least(220.0)],
                ),
            ],
        );
        bands.insert(
            VitalKind::BpDiastolic,
            vec![
                Band::new(Normal, vec![Interval::closed(60.0, 90.0)]),
                Band::new(
                    Alert,
                    vec![Interval::closed(50.0, 59.0), Interval::closed(91.0, 109.0)],
                ),
                Band::new(
                    HighAlert,
                    vec![Interval::at_most(49.0), Interval::at_least(110.0)],
                ),
            ],
        );
        bands.insert(
            VitalKind::HeartRate,
            vec![
                Band::new(Normal, vec![Interval::closed(51.0, 90.0)]),
                Band::new(MildAlert, vec![Interval::closed(41.0, 50.0)]),
                Band::new(ModerateAlert, vec![Interval::closed(111.0, 130.0)]),
                Band::new(
                    SevereAlert,
                    vec![Interval::at_most(40.0), Interval::at_least(131.0)],
                ),
            ],
        );
        bands.insert(
            VitalKind::RespiratoryRate,
            vec![
                Band::new(Normal, vec![Interval::closed(12.0, 20.0)]),
                Band::new(MildAlert, vec![Interval::closed(21.0, 24.0)]),
                Band::new(ModerateAlert, vec![Interval::closed(9.0, 11.0)]),
                Band::new(
                    SevereAlert,
                    vec![Interval::at_most(8.0), Interval::at_least(25.0)],
                ),
            ],
        );
        bands.insert(
            VitalKind::Temperature,
            vec![
                Band::new(Normal, vec![Interval::closed(36.1, 38.0)]),
                Band::new(
                    MildAlert,
                    vec![Interval::closed(35.1, 36.0), Interval::closed(38.1, 39.0)],
                ),
                Band::new(ModerateAlert, vec![Interval::at_least(39.1)]),
                Band::new(SevereAlert, vec![Interval::at_most(35.0)]),
            ],
        );
        bands.insert(
            VitalKind::OxygenSats,
            vec![
                Band::new(Normal, vec![Interval::at_least(96.0)]),
                Band::new(MildAlert, vec![Interval::closed(94.0, 95.0)]),
                Band::new(ModerateAlert, vec![Interval::closed(92.0, 93.0)]),
                Band::new(SevereAlert, vec![Interval::at_most(91.0)]),
            ],
        );

        Self::new(bands)
    }

    /// Classifies one tagged sample into its alert level.
    ///
    /// The consciousness vital is categorical and bypasses the interval scan
    /// entirely. For every other vital the bands are scanned in declared
    /// order and the first containing band wins.
    ///
    /// # Errors
    ///
    /// Returns `ObsError::UnknownVital` if the table has no entry for the
    /// sample's vital — a configuration defect, not a user error.
    pub fn classify(&self, sample: &VitalSample) -> ObsResult<AlertLevel> {
        let (kind, value) = match *sample {
            VitalSample::Consciousness(loc) => {
                return Ok(match loc {
                    Consciousness::Yes => AlertLevel::Normal,
                    Consciousness::NoUnsure => AlertLevel::SevereAlert,
                });
            }
            VitalSample::Systolic(v) => (VitalKind::BpSystolic, f64::from(v)),
            VitalSample::Diastolic(v) => (VitalKind::BpDiastolic, f64::from(v)),
            VitalSample::HeartRate(v) => (VitalKind::HeartRate, f64::from(v)),
            VitalSample::RespiratoryRate(v) => (VitalKind::RespiratoryRate, f64::from(v)),
            VitalSample::Temperature(v) => (VitalKind::Temperature, v),
            VitalSample::OxygenSats(v) => (VitalKind::OxygenSats, f64::from(v)),
        };

        let bands = self.bands.get(&kind).ok_or(ObsError::UnknownVital(kind))?;

        for band in bands {
            if band.contains(value) {
                return Ok(band.level);
            }
        }

        // A gap between bands. Recover with Normal rather than losing the
        // whole reading over one unmatched vital.
        tracing::warn!(vital = %kind, value, "no alert band matched value; defaulting to Normal");
        Ok(AlertLevel::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ThresholdTable {
        ThresholdTable::news2()
    }

    #[test]
    fn systolic_90_is_severe() {
        let level = table().classify(&VitalSample::Systolic(90)).unwrap();
        assert_eq!(level, AlertLevel::SevereAlert);
    }

    #[test]
    fn systolic_120_is_normal() {
        let level = table().classify(&VitalSample::Systolic(120)).unwrap();
        assert_eq!(level, AlertLevel::Normal);
    }

    #[test]
    fn systolic_220_is_severe_via_upper_interval() {
        let level = table().classify(&VitalSample::Systolic(220)).unwrap();
        assert_eq!(level, AlertLevel::SevereAlert);
    }

    #[test]
    fn temperature_35_is_severe() {
        let level = table().classify(&VitalSample::Temperature(35.0)).unwrap();
        assert_eq!(level, AlertLevel::SevereAlert);
    }

    #[test]
    fn temperature_gap_value_defaults_to_normal() {
        // 36.05 falls between Mild Alert (..=36.0) and Normal (36.1..); the
        // inherited table leaves this gap and the classifier must recover.
        let level = table().classify(&VitalSample::Temperature(36.05)).unwrap();
        assert_eq!(level, AlertLevel::Normal);
    }

    #[test]
    fn consciousness_bypasses_the_table() {
        let yes = table()
            .classify(&VitalSample::Consciousness(Consciousness::Yes))
            .unwrap();
        let no = table()
            .classify(&VitalSample::Consciousness(Consciousness::NoUnsure))
            .unwrap();
        assert_eq!(yes, AlertLevel::Normal);
        assert_eq!(no, AlertLevel::SevereAlert);
    }

    #[test]
    fn diastolic_extremes_reach_display_only_tiers() {
        let t = table();
        assert_eq!(
            t.classify(&VitalSample::Diastolic(55)).unwrap(),
            AlertLevel::Alert
        );
        assert_eq!(
            t.classify(&VitalSample::Diastolic(115)).unwrap(),
            AlertLevel::HighAlert
        );
        assert_eq!(
            t.classify(&VitalSample::Diastolic(45)).unwrap(),
            AlertLevel::HighAlert
        );
    }

    #[test]
    fn declared_order_breaks_overlaps() {
        // A deliberately overlapping table: both bands contain 10, the first
        // declared band must win.
        let mut bands = BTreeMap::new();
        bands.insert(
            VitalKind::HeartRate,
            vec![
                Band::new(AlertLevel::MildAlert, vec![Interval::closed(0.0, 20.0)]),
                Band::new(AlertLevel::SevereAlert, vec![Interval::closed(5.0, 15.0)]),
            ],
        );
        let t = ThresholdTable::new(bands);
        assert_eq!(
            t.classify(&VitalSample::HeartRate(10)).unwrap(),
            AlertLevel::MildAlert
        );
    }

    #[test]
    fn missing_vital_entry_is_a_configuration_error() {
        let t = ThresholdTable::new(BTreeMap::new());
        let err = t
            .classify(&VitalSample::HeartRate(70))
            .expect_err("empty table should fail");
        assert!(matches!(err, ObsError::UnknownVital(VitalKind::HeartRate)));
        assert!(!err.is_validation());
    }
}
