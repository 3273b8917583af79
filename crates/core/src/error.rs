use crate::reading::VitalKind;
use crate::thresholds::AlertLevel;

#[derive(Debug, thiserror::Error)]
pub enum ObsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid name: {0}")]
    Name(#[from] obs_types::NameError),
    #[error("invalid date of birth: {0}")]
    Dob(#[from] obs_types::DobError),
    #[error("invalid patient id: {0}")]
    PatientId(#[from] obs_types::PatientIdError),

    #[error("no thresholds configured for {0}")]
    UnknownVital(VitalKind),
    #[error("{level} carries no severity score but was reached in a scored path for {vital}")]
    UnscoredLevel { vital: VitalKind, level: AlertLevel },

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read store file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write store file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read CSV data: {0}")]
    CsvRead(csv::Error),
    #[error("failed to write CSV data: {0}")]
    CsvWrite(csv::Error),
}

impl ObsError {
    /// True for errors caused by bad caller input, which callers should
    /// re-prompt or map to a client error. Everything else is a defect or a
    /// storage failure and should be logged rather than shown as a user
    /// mistake.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ObsError::InvalidInput(_)
                | ObsError::Name(_)
                | ObsError::Dob(_)
                | ObsError::PatientId(_)
        )
    }
}

pub type ObsResult<T> = std::result::Result<T, ObsError>;
