//! Byte layout of the published artifact:
//! `salt || nonce || tag || ciphertext`, base64-encoded as one string.

/// Length of the PBKDF2 salt in bytes.
pub const SALT_LENGTH: usize = 64;

/// Length of the AES-GCM nonce in bytes.
pub const NONCE_LENGTH: usize = 16;

/// Length of the AES-GCM authentication tag in bytes.
pub const TAG_LENGTH: usize = 16;

/// Length of the derived AES-256 key in bytes.
pub const KEY_LENGTH: usize = 32;

/// Everything in front of the ciphertext.
pub const HEADER_LENGTH: usize = SALT_LENGTH + NONCE_LENGTH + TAG_LENGTH;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Configuration refuses anything weaker than this.
pub const MIN_ITERATIONS: u32 = 100_000;

pub const DEFAULT_INPUT_PATH: &str = "data/users.json";

pub const DEFAULT_ARTIFACT_PATH: &str = "public/data.enc";
