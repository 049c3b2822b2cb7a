use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use secrecy::SecretBox;
use sha2::Sha256;

use crate::core::models::KdfParams;
use crate::storage::format::KEY_LENGTH;

pub fn generate_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// PBKDF2-HMAC-SHA256 over the secret and salt, producing a 32-byte key.
pub fn derive_key(secret: &str, salt: &[u8], params: &KdfParams) -> SecretBox<Vec<u8>> {
    let mut key = vec![0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, params.iterations, &mut key);
    SecretBox::new(Box::new(key))
}
