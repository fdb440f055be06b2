use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StudyError {
    #[error("Invalid reading plan: {0}")]
    InvalidPlan(String),

    #[error("Surah {0} is outside 1..=114")]
    InvalidSurah(u16),
}

pub type Result<T> = std::result::Result<T, StudyError>;
