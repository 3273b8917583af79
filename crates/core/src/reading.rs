//! The structured vital-sign reading model.
//!
//! A [`VitalReading`] always carries the six required vitals; presence is
//! enforced at the type level rather than by runtime key checks. Blood
//! pressure is the one paired vital and expands into two tagged samples for
//! classification, which is how the rest of the core avoids "is this value
//! nested?" tests at runtime.

use crate::error::{ObsError, ObsResult};

/// The vitals the core knows how to classify, keyed the way they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VitalKind {
    BpSystolic,
    BpDiastolic,
    HeartRate,
    RespiratoryRate,
    Temperature,
    OxygenSats,
    Consciousness,
}

impl VitalKind {
    /// Storage column name for this vital in the flattened record.
    pub fn column(&self) -> &'static str {
        match self {
            VitalKind::BpSystolic => "bp_systolic",
            VitalKind::BpDiastolic => "bp_diastolic",
            VitalKind::HeartRate => "heart_rate",
            VitalKind::RespiratoryRate => "respiratory_rate",
            VitalKind::Temperature => "temperature",
            VitalKind::OxygenSats => "oxygen_sats",
            VitalKind::Consciousness => "loc",
        }
    }

    /// Human-readable label used in alerts and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            VitalKind::BpSystolic => "Blood pressure (systolic)",
            VitalKind::BpDiastolic => "Blood pressure (diastolic)",
            VitalKind::HeartRate => "Heart rate",
            VitalKind::RespiratoryRate => "Respiratory rate",
            VitalKind::Temperature => "Temperature",
            VitalKind::OxygenSats => "Oxygen saturations",
            VitalKind::Consciousness => "Level of consciousness",
        }
    }
}

impl std::fmt::Display for VitalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Level of consciousness: fully awake and responsive, or not.
///
/// The canonical string forms are `"Yes"` and `"No/Unsure"`, which is how the
/// value is stored and exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consciousness {
    Yes,
    NoUnsure,
}

impl Consciousness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Consciousness::Yes => "Yes",
            Consciousness::NoUnsure => "No/Unsure",
        }
    }
}

impl std::fmt::Display for Consciousness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Consciousness {
    type Err = ObsError;

    /// Accepts the interactive short forms as well as the canonical strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" => Ok(Consciousness::Yes),
            "no" | "n" | "unsure" | "no/unsure" => Ok(Consciousness::NoUnsure),
            _ => Err(ObsError::InvalidInput(
                "level of consciousness must be yes, no, or unsure".into(),
            )),
        }
    }
}

impl serde::Serialize for Consciousness {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Consciousness {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A paired blood-pressure measurement in mmHg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BloodPressure {
    pub systolic: u16,
    pub diastolic: u16,
}

/// One complete set of the six required vitals.
#[derive(Debug, Clone, PartialEq)]
pub struct VitalReading {
    pub blood_pressure: BloodPressure,
    pub heart_rate: u16,
    pub respiratory_rate: u16,
    pub temperature: f64,
    pub oxygen_saturation: u8,
    pub consciousness: Consciousness,
}

// Plausibility bounds for measured values. A value outside these is a data
// entry mistake, not a clinical finding.
const SYSTOLIC_RANGE: (u16, u16) = (50, 250);
const DIASTOLIC_RANGE: (u16, u16) = (30, 150);
const HEART_RATE_RANGE: (u16, u16) = (30, 220);
const RESPIRATORY_RATE_RANGE: (u16, u16) = (5, 60);
const TEMPERATURE_RANGE: (f64, f64) = (30.0, 45.0);
const OXYGEN_SATS_RANGE: (u8, u8) = (50, 100);

fn check_range<T>(vital: VitalKind, value: T, range: (T, T)) -> ObsResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    let (min, max) = range;
    if value < min || value > max {
        return Err(ObsError::InvalidInput(format!(
            "{vital} must be between {min} and {max}"
        )));
    }
    Ok(())
}

impl VitalReading {
    /// Builds a reading, rejecting values outside plausible measurement
    /// ranges. The error names the vital and its acceptable range so callers
    /// can re-prompt.
    pub fn new(
        blood_pressure: BloodPressure,
        heart_rate: u16,
        respiratory_rate: u16,
        temperature: f64,
        oxygen_saturation: u8,
        consciousness: Consciousness,
    ) -> ObsResult<Self> {
        check_range(VitalKind::BpSystolic, blood_pressure.systolic, SYSTOLIC_RANGE)?;
        check_range(
            VitalKind::BpDiastolic,
            blood_pressure.diastolic,
            DIASTOLIC_RANGE,
        )?;
        check_range(VitalKind::HeartRate, heart_rate, HEART_RATE_RANGE)?;
        check_range(
            VitalKind::RespiratoryRate,
            respiratory_rate,
            RESPIRATORY_RATE_RANGE,
        )?;
        check_range(VitalKind::Temperature, temperature, TEMPERATURE_RANGE)?;
        check_range(VitalKind::OxygenSats, oxygen_saturation, OXYGEN_SATS_RANGE)?;

        Ok(Self {
            blood_pressure,
            heart_rate,
            respiratory_rate,
            temperature,
            oxygen_saturation,
            consciousness,
        })
    }

    /// Expands the reading into per-vital tagged samples, with blood pressure
    /// contributing its two sub-values.
    pub fn samples(&self) -> [VitalSample; 7] {
        [
            VitalSample::Systolic(self.blood_pressure.systolic),
            VitalSample::Diastolic(self.blood_pressure.diastolic),
            VitalSample::HeartRate(self.heart_rate),
            VitalSample::RespiratoryRate(self.respiratory_rate),
            VitalSample::Temperature(self.temperature),
            VitalSample::OxygenSats(self.oxygen_saturation),
            VitalSample::Consciousness(self.consciousness),
        ]
    }
}

/// One measured value tagged with the vital it belongs to.
///
/// Classification dispatches on this tag instead of inspecting value shapes
/// at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VitalSample {
    Systolic(u16),
    Diastolic(u16),
    HeartRate(u16),
    RespiratoryRate(u16),
    Temperature(f64),
    OxygenSats(u8),
    Consciousness(Consciousness),
}

impl VitalSample {
    pub fn kind(&self) -> VitalKind {
        match self {
            VitalSample::Systolic(_) => VitalKind::BpSystolic,
            VitalSample::Diastolic(_) => VitalKind::BpDiastolic,
            VitalSample::HeartRate(_) => VitalKind::HeartRate,
            VitalSample::RespiratoryRate(_) => VitalKind::RespiratoryRate,
            VitalSample::Temperature(_) => VitalKind::Temperature,
            VitalSample::OxygenSats(_) => VitalKind::OxygenSats,
            VitalSample::Consciousness(_) => VitalKind::Consciousness,
        }
    }

    /// The value as JSON for presentation output. Numeric vitals stay
    /// numbers; consciousness stays its canonical string.
    pub fn json_value(&self) -> serde_json::Value {
        match *self {
            VitalSample::Systolic(v)
            | VitalSample::Diastolic(v)
            | VitalSample::HeartRate(v)
            | VitalSample::RespiratoryRate(v) => serde_json::json!(v),
            VitalSample::Temperature(v) => serde_json::json!(v),
            VitalSample::OxygenSats(v) => serde_json::json!(v),
            VitalSample::Consciousness(c) => serde_json::json!(c.as_str()),
        }
    }
}
