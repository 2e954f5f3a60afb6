use prima_types::{MonthError, PatientId, TextError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no examination records found for patient {0}")]
    PatientNotFound(PatientId),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),
    #[error("invalid month: {0}")]
    Month(#[from] MonthError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
