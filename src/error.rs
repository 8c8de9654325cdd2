use chrono::NaiveDate;
use thiserror::Error;

/// Application-level error carrying the process exit code.
///
/// Exit codes:
/// - `2` input, IO or schema problems
/// - `3` no usable data
/// - `4` invalid record (negative count, unusable date, count overflow)
/// - `5` rendering or export failures
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Fatal outcomes of a normalization call.
///
/// Neither variant carries a partial series: the call either returns the full
/// weekly series or one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("No records remain for region `{region}` after filtering.")]
    EmptyInput { region: String },

    #[error("Invalid record for `{region}` on {date}: negative count {count}.")]
    InvalidRecord {
        region: String,
        date: NaiveDate,
        count: i64,
    },

    #[error("Record for `{region}` on {date} has no representable week-ending date.")]
    DateOutOfRange { region: String, date: NaiveDate },

    #[error("Raw count for `{region}` in the week ending {week_ending} exceeds {max}.", max = u64::MAX)]
    CountOverflow { region: String, week_ending: NaiveDate },
}

impl NormalizeError {
    pub fn exit_code(&self) -> u8 {
        match self {
            NormalizeError::EmptyInput { .. } => 3,
            NormalizeError::InvalidRecord { .. }
            | NormalizeError::DateOutOfRange { .. }
            | NormalizeError::CountOverflow { .. } => 4,
        }
    }
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
