//! Domain error types.

/// Top-level error type for options-trader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("missing column: {column}")]
    MissingColumn { column: String },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("{provider} error: {reason}")]
    Provider { provider: String, reason: String },

    #[error("fit error: {reason}")]
    Fit { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn provider(provider: &str, reason: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    pub fn fit(reason: impl Into<String>) -> Self {
        Self::Fit {
            reason: reason.into(),
        }
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::Configuration { .. }
            | TraderError::ConfigParse { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Provider { .. } => 3,
            TraderError::MissingColumn { .. } => 4,
            TraderError::Fit { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_the_column() {
        let err = TraderError::MissingColumn {
            column: "strike".into(),
        };
        assert_eq!(err.to_string(), "missing column: strike");
    }

    #[test]
    fn provider_helper_formats_reason() {
        let err = TraderError::provider("quantconnect", "HTTP 401 Unauthorized");
        assert_eq!(err.to_string(), "quantconnect error: HTTP 401 Unauthorized");
    }

    #[test]
    fn exit_codes_are_distinct_per_category() {
        use std::process::ExitCode;

        let cases = [
            (TraderError::Io(std::io::Error::other("boom")), ExitCode::from(1)),
            (
                TraderError::Configuration {
                    reason: "no credentials".into(),
                },
                ExitCode::from(2),
            ),
            (TraderError::provider("yahoo", "bad json"), ExitCode::from(3)),
            (
                TraderError::MissingColumn {
                    column: "bid".into(),
                },
                ExitCode::from(4),
            ),
            (TraderError::fit("empty training set"), ExitCode::from(5)),
        ];

        for (err, expected) in &cases {
            assert_eq!(ExitCode::from(err), *expected, "for {err}");
        }
    }
}
