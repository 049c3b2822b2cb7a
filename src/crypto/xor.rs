//! Client-key XOR obfuscation.
//!
//! This is obfuscation only. The key is embedded in client-visible build
//! output, there is no integrity check, and anyone holding the artifact and
//! the key can read the table. It never shares key material with
//! [`crate::crypto::aead`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};

use crate::config::CLIENT_KEY_VAR;
use crate::error::{QrRedirectError, Result};

/// XOR `bytes` with a repeating `key`. Applying it twice with the same key
/// gives back the input. An empty key is rejected.
pub fn xor_transform(bytes: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.is_empty() {
        return Err(QrRedirectError::KeyUnavailable(CLIENT_KEY_VAR));
    }
    Ok(bytes
        .iter()
        .zip(key.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect())
}

pub fn obfuscate(plaintext: &str, key: &SecretString) -> Result<String> {
    let data = xor_transform(plaintext.as_bytes(), key.expose_secret().as_bytes())?;
    Ok(STANDARD.encode(data))
}

pub fn deobfuscate(artifact: &str, key: &SecretString) -> Result<String> {
    let key = key.expose_secret().as_bytes();
    if key.is_empty() {
        return Err(QrRedirectError::KeyUnavailable(CLIENT_KEY_VAR));
    }
    let data = STANDARD
        .decode(artifact.trim())
        .map_err(|e| QrRedirectError::MalformedArtifact(e.to_string()))?;
    String::from_utf8(xor_transform(&data, key)?)
        .map_err(|_| QrRedirectError::CorruptTable("deobfuscated data is not UTF-8".to_string()))
}
