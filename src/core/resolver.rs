use std::fmt;

use rand::Rng;
use secrecy::SecretString;
use tracing::{debug, info};

use crate::config::{AppConfig, Scheme, Secrets};
use crate::core::models::{KdfParams, UserTable};
use crate::crypto::{aead, xor};
use crate::error::{QrRedirectError, Result};
use crate::fetch::ArtifactSource;

/// Steps of one resolution, traversed once and in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Decrypting,
    Parsing,
    Lookup,
    Selecting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Decrypting => "decrypting",
            Stage::Parsing => "parsing",
            Stage::Lookup => "lookup",
            Stage::Selecting => "selecting",
        };
        f.write_str(name)
    }
}

/// Where to send the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub url: String,
    pub name: String,
}

/// Turns a hash token into a redirect target from a single artifact fetch.
///
/// Nothing is cached between calls; every resolution fetches and decrypts
/// again.
pub struct Resolver {
    scheme: Scheme,
    key: SecretString,
    kdf_params: KdfParams,
    source: Box<dyn ArtifactSource>,
}

impl Resolver {
    /// Fails with `KeyUnavailable` when the scheme's key is not configured.
    pub fn new(
        config: &AppConfig,
        secrets: &Secrets,
        source: Box<dyn ArtifactSource>,
    ) -> Result<Self> {
        let key = config.scheme.key_from(secrets)?;
        Ok(Self {
            scheme: config.scheme,
            key,
            kdf_params: config.kdf_params(),
            source,
        })
    }

    pub fn resolve(&self, hash: &str) -> Result<Redirect> {
        self.resolve_with_rng(hash, &mut rand::thread_rng())
    }

    pub fn resolve_with_rng<R: Rng>(&self, hash: &str, rng: &mut R) -> Result<Redirect> {
        enter(Stage::Fetching);
        let artifact = self.source.fetch()?;

        enter(Stage::Decrypting);
        let plaintext = self.recover(&artifact)?;

        enter(Stage::Parsing);
        let table = UserTable::from_json(&plaintext)?;

        enter(Stage::Lookup);
        let record = table
            .find(hash)
            .ok_or_else(|| QrRedirectError::UserNotFound(hash.to_string()))?;

        enter(Stage::Selecting);
        let url = select_url(&record.valid_urls(), rng)
            .ok_or_else(|| QrRedirectError::NoUrlsConfigured(hash.to_string()))?;

        info!(source = %self.source.describe(), "resolved redirect");
        Ok(Redirect {
            url: url.to_string(),
            name: record.name.clone(),
        })
    }

    fn recover(&self, artifact: &str) -> Result<String> {
        match self.scheme {
            Scheme::Sealed => aead::decrypt(artifact, &self.key, &self.kdf_params),
            Scheme::Obfuscated => xor::deobfuscate(artifact, &self.key),
        }
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "resolver stage");
}

/// Uniform pick over `urls`; `None` when there is nothing to pick.
pub fn select_url<'a, R: Rng>(urls: &[&'a str], rng: &mut R) -> Option<&'a str> {
    if urls.is_empty() {
        return None;
    }
    Some(urls[rng.gen_range(0..urls.len())])
}
