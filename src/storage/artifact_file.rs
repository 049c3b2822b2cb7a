use std::fs;
use std::io::Write;
use std::path::Path;

use crate::core::models::UserTable;
use crate::error::{QrRedirectError, Result};

/// Read the plaintext user table from its JSON source file.
pub fn read_table(path: &Path) -> Result<UserTable> {
    let content = fs::read_to_string(path).map_err(|e| {
        QrRedirectError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let table: UserTable = serde_json::from_str(&content)?;
    Ok(table)
}

/// Publish artifact text at `path`, creating the directory if needed.
/// Returns the number of bytes written.
pub fn write_artifact(path: &Path, artifact: &str) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    atomic_write(path, artifact.as_bytes())?;
    Ok(artifact.len())
}

/// temp → fsync → rename, so readers never see a partial artifact.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let temp_path = parent.join(format!(".qr_redirect_tmp_{}", std::process::id()));

    let result = (|| -> Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("public").join("data.enc");

        let written = write_artifact(&path, "abc=").unwrap();
        assert_eq!(written, 4);
        assert_eq!(fs::read_to_string(&path).unwrap(), "abc=");
    }

    #[test]
    fn test_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.enc");

        write_artifact(&path, "old").unwrap();
        write_artifact(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".qr_redirect_tmp_"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_read_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(
            &path,
            r#"[{"hash":"a1","name":"Alice","urls":["https://a.test"]}]"#,
        )
        .unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].urls, vec!["https://a.test".to_string()]);
    }

    #[test]
    fn test_read_missing_table() {
        let dir = TempDir::new().unwrap();
        let result = read_table(&dir.path().join("users.json"));
        assert!(matches!(result, Err(QrRedirectError::Config(_))));
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(read_table(&path), Err(QrRedirectError::Json(_))));
    }
}
