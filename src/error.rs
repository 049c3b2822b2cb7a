use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrRedirectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record {record}: {reason}")]
    InvalidRecord { record: String, reason: String },

    #[error("Failed to fetch artifact ({}): {reason}", status_label(.status))]
    FetchFailed { status: Option<u16>, reason: String },

    #[error("Key unavailable: {0} is not set")]
    KeyUnavailable(&'static str),

    #[error("Malformed artifact: {0}")]
    MalformedArtifact(String),

    #[error("Authentication failure")]
    AuthenticationFailure,

    #[error("Corrupt user table: {0}")]
    CorruptTable(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("No URLs configured for user: {0}")]
    NoUrlsConfigured(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("QR code error: {0}")]
    QrCode(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

/// Coarse grouping of errors for what the end user gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The hash is unknown or has nowhere to go. Safe to report verbatim.
    NotFound,
    /// The artifact could not be loaded, decrypted or parsed.
    Unreadable,
    /// Missing or invalid configuration.
    Configuration,
    /// Build-time packaging or tooling failure.
    Build,
}

impl QrRedirectError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::UserNotFound(_) | Self::NoUrlsConfigured(_) => FailureClass::NotFound,
            Self::FetchFailed { .. }
            | Self::MalformedArtifact(_)
            | Self::AuthenticationFailure
            | Self::CorruptTable(_) => FailureClass::Unreadable,
            Self::KeyUnavailable(_) | Self::Config(_) | Self::TomlSer(_) | Self::TomlDe(_) => {
                FailureClass::Configuration
            }
            Self::InvalidRecord { .. } | Self::Io(_) | Self::Json(_) | Self::QrCode(_) => {
                FailureClass::Build
            }
        }
    }

    /// Text shown to whoever scanned the code.
    ///
    /// Decryption failures share one message so a prober cannot tell a bad
    /// encoding from a bad tag.
    pub fn user_message(&self) -> String {
        match self {
            Self::UserNotFound(_) => "User not found".to_string(),
            Self::NoUrlsConfigured(_) => "No URLs configured for this user".to_string(),
            Self::MalformedArtifact(_) | Self::AuthenticationFailure => {
                "Could not load or decrypt data".to_string()
            }
            Self::FetchFailed { .. } | Self::CorruptTable(_) => {
                format!("Could not load or decrypt data: {self}")
            }
            other => other.to_string(),
        }
    }

    /// Text for the error-level log line. Unreadable failures log only the
    /// generic message; their detail belongs at debug level.
    pub fn diagnostic(&self) -> String {
        match self.class() {
            FailureClass::Unreadable => self.user_message(),
            _ => self.to_string(),
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no status".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, QrRedirectError>;
