pub mod artifact_file;
pub mod format;
