//! Domain error types.

/// Top-level error type for idxquant.
#[derive(Debug, thiserror::Error)]
pub enum IdxQuantError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("not enough data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("audit log error: {reason}")]
    Audit { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<&IdxQuantError> for std::process::ExitCode {
    fn from(err: &IdxQuantError) -> Self {
        let code: u8 = match err {
            IdxQuantError::ConfigParse { .. } | IdxQuantError::ConfigInvalid { .. } => 2,
            IdxQuantError::Data { .. } => 3,
            IdxQuantError::NoData { .. } | IdxQuantError::InsufficientData { .. } => 5,
            IdxQuantError::Audit { .. } | IdxQuantError::Json(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}
