use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::core::models::KdfParams;
use crate::error::{QrRedirectError, Result};
use crate::storage::format::{
    DEFAULT_ARTIFACT_PATH, DEFAULT_INPUT_PATH, DEFAULT_ITERATIONS, MIN_ITERATIONS,
};

pub const BUILD_SECRET_VAR: &str = "ENCRYPTION_SECRET";
pub const CLIENT_KEY_VAR: &str = "CLIENT_KEY";

const MAX_FETCH_RETRIES: u32 = 3;
const MAX_FETCH_TIMEOUT_SECS: u64 = 300;

/// How the artifact is protected. Packager and resolver must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// AES-256-GCM under a key derived from the build secret.
    #[default]
    Sealed,
    /// XOR with the client-visible key. No confidentiality against anyone
    /// who can read the client build.
    Obfuscated,
}

impl Scheme {
    pub fn key_var(self) -> &'static str {
        match self {
            Scheme::Sealed => BUILD_SECRET_VAR,
            Scheme::Obfuscated => CLIENT_KEY_VAR,
        }
    }

    /// The key this scheme runs on. Never falls back to a default.
    pub fn key_from(self, secrets: &Secrets) -> Result<SecretString> {
        let key = match self {
            Scheme::Sealed => secrets.build_secret.as_ref(),
            Scheme::Obfuscated => secrets.client_key.as_ref(),
        };
        key.cloned()
            .ok_or(QrRedirectError::KeyUnavailable(self.key_var()))
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Sealed => write!(f, "sealed"),
            Scheme::Obfuscated => write!(f, "obfuscated"),
        }
    }
}

/// Key material, kept out of the config file.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub build_secret: Option<SecretString>,
    pub client_key: Option<SecretString>,
}

impl Secrets {
    pub fn new(build_secret: Option<String>, client_key: Option<String>) -> Result<Self> {
        let secrets = Self {
            build_secret: non_empty(build_secret),
            client_key: non_empty(client_key),
        };
        if let (Some(build), Some(client)) = (&secrets.build_secret, &secrets.client_key) {
            if build.expose_secret() == client.expose_secret() {
                return Err(QrRedirectError::Config(format!(
                    "{BUILD_SECRET_VAR} and {CLIENT_KEY_VAR} must be different values"
                )));
            }
        }
        Ok(secrets)
    }

    pub fn from_env() -> Result<Self> {
        Self::new(
            std::env::var(BUILD_SECRET_VAR).ok(),
            std::env::var(CLIENT_KEY_VAR).ok(),
        )
    }
}

fn non_empty(value: Option<String>) -> Option<SecretString> {
    value.filter(|v| !v.is_empty()).map(SecretString::from)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Filesystem path or `http(s)://` URL the resolver fetches.
    pub artifact_location: String,
    pub base_url: String,
    pub qr_dir: PathBuf,
    pub qr_min_size: u32,
    pub scheme: Scheme,
    pub kdf_iterations: u32,
    pub fetch_timeout_secs: u64,
    pub fetch_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            artifact_location: DEFAULT_ARTIFACT_PATH.to_string(),
            base_url: "http://localhost:3000".to_string(),
            qr_dir: PathBuf::from("qr-codes"),
            qr_min_size: 512,
            scheme: Scheme::Sealed,
            kdf_iterations: DEFAULT_ITERATIONS,
            fetch_timeout_secs: 10,
            fetch_retries: 1,
        }
    }
}

impl AppConfig {
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            iterations: self.kdf_iterations,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations < MIN_ITERATIONS {
            return Err(QrRedirectError::Config(format!(
                "kdf_iterations must be at least {MIN_ITERATIONS}, got {}",
                self.kdf_iterations
            )));
        }
        if self.fetch_timeout_secs == 0 || self.fetch_timeout_secs > MAX_FETCH_TIMEOUT_SECS {
            return Err(QrRedirectError::Config(format!(
                "fetch_timeout_secs must be between 1 and {MAX_FETCH_TIMEOUT_SECS}"
            )));
        }
        if self.fetch_retries > MAX_FETCH_RETRIES {
            return Err(QrRedirectError::Config(format!(
                "fetch_retries cannot exceed {MAX_FETCH_RETRIES}"
            )));
        }
        Ok(())
    }

    /// Load from the platform config dir, or defaults when there is none.
    pub fn load() -> Result<Self> {
        let path = config_file_path();
        let config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            AppConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Err(QrRedirectError::Config(format!(
                "Config file not found: {}",
                path.display()
            )))
        }
    }

    /// Write to `path`, or to the platform config dir.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(path)
    }
}

fn config_file_path() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", "qr-redirect") {
        dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("qr-redirect.toml")
    }
}
