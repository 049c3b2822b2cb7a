pub mod aead;
pub mod kdf;
pub mod xor;
