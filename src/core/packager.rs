use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::{AppConfig, Scheme, Secrets};
use crate::core::models::{KdfParams, UserTable};
use crate::crypto::{aead, xor};
use crate::error::Result;
use crate::storage::artifact_file;

/// Outcome of one packaging run.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageReport {
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub records: usize,
    pub hashes: Vec<String>,
}

/// Build-time step: validate, serialize, protect and publish the user table.
pub struct Packager {
    scheme: Scheme,
    key: SecretString,
    kdf_params: KdfParams,
}

impl Packager {
    /// Fails with `KeyUnavailable` when the scheme's key is not configured.
    pub fn new(config: &AppConfig, secrets: &Secrets) -> Result<Self> {
        let key = config.scheme.key_from(secrets)?;
        Ok(Self {
            scheme: config.scheme,
            key,
            kdf_params: config.kdf_params(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn load_table(&self, path: &Path) -> Result<UserTable> {
        let table = artifact_file::read_table(path)?;
        info!(records = table.len(), path = %path.display(), "loaded user table");
        Ok(table)
    }

    /// Serialize and protect `table` without writing anything.
    pub fn seal(&self, table: &UserTable) -> Result<String> {
        table.validate()?;
        let plaintext = Zeroizing::new(table.to_canonical_json()?);
        debug!(scheme = %self.scheme, bytes = plaintext.len(), "serialized table");
        match self.scheme {
            Scheme::Sealed => aead::encrypt(&plaintext, &self.key, &self.kdf_params),
            Scheme::Obfuscated => xor::obfuscate(&plaintext, &self.key),
        }
    }

    /// Validate and publish `table` at `output_path`. Nothing is written
    /// when validation fails.
    pub fn package(&self, table: &UserTable, output_path: &Path) -> Result<PackageReport> {
        let artifact = self.seal(table)?;
        let bytes_written = artifact_file::write_artifact(output_path, &artifact)?;

        let hashes: Vec<String> = table.records.iter().map(|r| r.hash.clone()).collect();
        info!(
            scheme = %self.scheme,
            records = table.len(),
            bytes = bytes_written,
            output = %output_path.display(),
            "packaged user table"
        );
        debug!(hashes = %hashes.join(", "), "published hashes");

        Ok(PackageReport {
            output_path: output_path.to_path_buf(),
            bytes_written,
            records: table.len(),
            hashes,
        })
    }
}
