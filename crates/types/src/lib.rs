use chrono::NaiveDate;

/// Errors that can occur when normalising a patient name.
#[derive(Debug, thiserror::Error)]
pub enum NameError {
    /// The input name was empty or contained only whitespace
    #[error("patient name cannot be empty")]
    Empty,
}

/// A patient name normalised for identity matching.
///
/// This type wraps a `String` that has been trimmed of surrounding whitespace
/// and lower-cased, so that `"JANE DOE"` and `" jane doe "` compare equal.
/// Identity resolution depends on this normalisation happening in exactly one
/// place, which is why the raw string is not constructible from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientName(String);

impl PatientName {
    /// Creates a new `PatientName` from the given input.
    ///
    /// The input is trimmed and lower-cased. If the trimmed result is empty,
    /// an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, NameError> {
        let normalised = input.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(normalised))
    }

    /// Returns the normalised name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PatientName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for PatientName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing a date of birth.
#[derive(Debug, thiserror::Error)]
pub enum DobError {
    /// The input did not match the expected dd/mm/yy format
    #[error("date of birth must be in dd/mm/yy format (e.g. 26/11/00)")]
    Format,
}

/// A date of birth in the fixed dd/mm/yy storage format.
///
/// Parsing is strict: anything that does not match `%d/%m/%y` is rejected
/// rather than coerced. The canonical rendering used for storage and identity
/// matching is always re-derived from the parsed date, so `1/1/90` and
/// `01/01/90` resolve to the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateOfBirth(NaiveDate);

impl DateOfBirth {
    const FORMAT: &'static str = "%d/%m/%y";

    /// Parses a date of birth from its dd/mm/yy text form.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DobError> {
        let trimmed = input.as_ref().trim();
        NaiveDate::parse_from_str(trimmed, Self::FORMAT)
            .map(Self)
            .map_err(|_| DobError::Format)
    }

    /// Returns the underlying calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for DateOfBirth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl std::str::FromStr for DateOfBirth {
    type Err = DobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for DateOfBirth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for DateOfBirth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateOfBirth::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing a patient identifier.
#[derive(Debug, thiserror::Error)]
pub enum PatientIdError {
    /// The input was not a positive integer
    #[error("patient id must be a positive integer")]
    Invalid,
}

/// A stable patient identifier.
///
/// Identifiers are positive integers allocated monotonically from 1, but are
/// exchanged and stored in their string form. The numeric representation is
/// kept internally so that "the next id" is `max + 1` rather than a string
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatientId(u32);

impl PatientId {
    /// The first identifier ever allocated.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the identifier that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the numeric value of the identifier.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PatientId {
    type Err = PatientIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u32 = s.trim().parse().map_err(|_| PatientIdError::Invalid)?;
        if n == 0 {
            return Err(PatientIdError::Invalid);
        }
        Ok(Self(n))
    }
}

impl serde::Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_name_is_trimmed_and_lowercased() {
        let name = PatientName::new("  Jane DOE ").expect("name should be valid");
        assert_eq!(name.as_str(), "jane doe");
    }

    #[test]
    fn patient_names_differing_only_in_case_compare_equal() {
        let upper = PatientName::new("JANE DOE").unwrap();
        let lower = PatientName::new("jane doe").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn empty_patient_name_is_rejected() {
        let err = PatientName::new("   ").expect_err("whitespace-only name should fail");
        assert!(matches!(err, NameError::Empty));
    }

    #[test]
    fn dob_parses_and_renders_canonically() {
        let dob = DateOfBirth::parse("1/1/90").expect("dob should parse");
        assert_eq!(dob.to_string(), "01/01/90");
    }

    #[test]
    fn dob_rejects_wrong_format() {
        for bad in ["1990-01-01", "01-01-90", "01/01/1990", "not a date", ""] {
            assert!(
                DateOfBirth::parse(bad).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn dob_round_trips_through_display() {
        let dob = DateOfBirth::parse("26/11/00").unwrap();
        let again = DateOfBirth::parse(dob.to_string()).unwrap();
        assert_eq!(dob, again);
    }

    #[test]
    fn patient_id_starts_at_one_and_increments() {
        let first = PatientId::first();
        assert_eq!(first.to_string(), "1");
        assert_eq!(first.next().to_string(), "2");
    }

    #[test]
    fn patient_id_parses_from_string_form() {
        let id: PatientId = "17".parse().expect("id should parse");
        assert_eq!(id.as_u32(), 17);
    }

    #[test]
    fn patient_id_rejects_zero_and_garbage() {
        assert!("0".parse::<PatientId>().is_err());
        assert!("-1".parse::<PatientId>().is_err());
        assert!("abc".parse::<PatientId>().is_err());
    }
}
