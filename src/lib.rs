#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod crypto;
pub mod error;
pub mod fetch;
pub mod qr;
pub mod storage;
