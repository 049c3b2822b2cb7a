use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};

use crate::core::models::KdfParams;
use crate::crypto::kdf;
use crate::error::{QrRedirectError, Result};
use crate::storage::format::{HEADER_LENGTH, NONCE_LENGTH, SALT_LENGTH, TAG_LENGTH};

/// AES-256-GCM with a 16-byte nonce and a 16-byte tag.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypt `plaintext` under `secret` and return the base64 artifact text.
pub fn encrypt(plaintext: &str, secret: &SecretString, params: &KdfParams) -> Result<String> {
    let data = encrypt_to_bytes(plaintext.as_bytes(), secret, params)?;
    Ok(STANDARD.encode(data))
}

/// Decode and decrypt artifact text produced by [`encrypt`].
pub fn decrypt(artifact: &str, secret: &SecretString, params: &KdfParams) -> Result<String> {
    let data = STANDARD
        .decode(artifact.trim())
        .map_err(|e| QrRedirectError::MalformedArtifact(e.to_string()))?;
    let plaintext = decrypt_bytes(&data, secret, params)?;
    String::from_utf8(plaintext)
        .map_err(|_| QrRedirectError::MalformedArtifact("plaintext is not UTF-8".to_string()))
}

/// Raw `salt || nonce || tag || ciphertext`, before base64.
pub fn encrypt_to_bytes(
    plaintext: &[u8],
    secret: &SecretString,
    params: &KdfParams,
) -> Result<Vec<u8>> {
    let salt = kdf::generate_salt(SALT_LENGTH);
    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let key = kdf::derive_key(secret.expose_secret(), &salt, params);
    let cipher = Aes256Gcm16::new_from_slice(key.expose_secret())
        .map_err(|e| QrRedirectError::Config(format!("cipher key: {e}")))?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(&nonce_bytes), b"", &mut buffer)
        .map_err(|_| QrRedirectError::Config("plaintext too large to encrypt".to_string()))?;

    let mut data = Vec::with_capacity(HEADER_LENGTH + buffer.len());
    data.extend_from_slice(&salt);
    data.extend_from_slice(&nonce_bytes);
    data.extend_from_slice(&tag);
    data.extend_from_slice(&buffer);
    Ok(data)
}

pub fn decrypt_bytes(data: &[u8], secret: &SecretString, params: &KdfParams) -> Result<Vec<u8>> {
    if data.len() < HEADER_LENGTH {
        return Err(QrRedirectError::MalformedArtifact(format!(
            "artifact is {} bytes, expected at least {HEADER_LENGTH}",
            data.len()
        )));
    }

    let (salt, rest) = data.split_at(SALT_LENGTH);
    let (nonce, rest) = rest.split_at(NONCE_LENGTH);
    let (tag, ciphertext) = rest.split_at(TAG_LENGTH);

    let key = kdf::derive_key(secret.expose_secret(), salt, params);
    let cipher = Aes256Gcm16::new_from_slice(key.expose_secret())
        .map_err(|e| QrRedirectError::Config(format!("cipher key: {e}")))?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| QrRedirectError::AuthenticationFailure)?;

    Ok(buffer)
}
