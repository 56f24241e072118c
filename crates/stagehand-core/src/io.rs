use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write the promotion record (or any serializable value) to `path` as
/// pretty JSON ending in a newline.
///
/// Missing parent directories are created. The JSON goes to a temp file
/// beside `path` that is then renamed over it, so a later pipeline step
/// reading the record sees either the previous one or the new one in full.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => {
            std::fs::create_dir_all(p)?;
            p
        }
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(&data)?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn record_is_pretty_and_newline_terminated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("promotion.json");
        write_json(&path, &serde_json::json!({"version": "3"})).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("}\n"));
        assert!(content.contains("\"version\": \"3\""));
    }

    #[test]
    fn record_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/ci/promotion.json");
        write_json(&path, &serde_json::json!({})).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn record_replaces_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("promotion.json");
        std::fs::write(&path, b"stale").unwrap();
        write_json(&path, &serde_json::json!({"version": "4"})).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.contains("\"4\""));
    }
}
