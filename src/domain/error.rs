//! Domain error types.

/// Top-level error type for vaultforge.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("invalid vault configuration: {reason}")]
    Validation { reason: String },

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("price provider error: {reason}")]
    Provider { reason: String },

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

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VaultError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn provider(reason: impl Into<String>) -> Self {
        Self::Provider {
            reason: reason.into(),
        }
    }
}

impl From<&VaultError> for std::process::ExitCode {
    fn from(err: &VaultError) -> Self {
        let code: u8 = match err {
            VaultError::Io(_) => 1,
            VaultError::ConfigParse { .. }
            | VaultError::ConfigMissing { .. }
            | VaultError::ConfigInvalid { .. } => 2,
            VaultError::Parse { .. } | VaultError::Validation { .. } | VaultError::Json(_) => 4,
            VaultError::Provider { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
