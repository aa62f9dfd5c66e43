//! Domain error types.

/// Top-level error type for equiscore.
///
/// Provider and data errors are always scoped to a single symbol so a batch
/// scan can skip the failing symbol and keep going.
#[derive(Debug, thiserror::Error)]
pub enum EquiscoreError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("provider error for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {points} points, need {minimum}")]
    InsufficientData {
        symbol: String,
        points: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EquiscoreError> for std::process::ExitCode {
    fn from(err: &EquiscoreError) -> Self {
        let code: u8 = match err {
            EquiscoreError::Io(_) => 1,
            EquiscoreError::ConfigParse { .. }
            | EquiscoreError::ConfigMissing { .. }
            | EquiscoreError::ConfigInvalid { .. } => 2,
            EquiscoreError::Database { .. } | EquiscoreError::DatabaseQuery { .. } => 3,
            EquiscoreError::Provider { .. } => 4,
            EquiscoreError::NoData { .. } | EquiscoreError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
