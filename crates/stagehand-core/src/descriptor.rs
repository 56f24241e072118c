use crate::error::{Result, StagehandError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata an upstream training step leaves behind for the promotion step.
///
/// Only `run_id` and `model_name` are read; any other keys in the file are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDescriptor {
    pub run_id: String,
    pub model_name: String,
}

impl RunDescriptor {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StagehandError::NotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::parse(path, &data)
    }

    fn parse(path: &Path, data: &str) -> Result<Self> {
        let parse_err = |reason: String| StagehandError::Parse {
            path: path.to_path_buf(),
            reason,
        };

        // serde accepts a positional array for a struct; only objects are valid here.
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|e| parse_err(e.to_string()))?;
        if !value.is_object() {
            return Err(parse_err("expected a JSON object".to_string()));
        }
        let descriptor: RunDescriptor =
            serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;

        if descriptor.run_id.trim().is_empty() {
            return Err(parse_err("`run_id` is empty".to_string()));
        }
        if descriptor.model_name.trim().is_empty() {
            return Err(parse_err("`model_name` is empty".to_string()));
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("run_information.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_valid_descriptor() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"run_id": "abc123", "model_name": "model"}"#);
        let d = RunDescriptor::load(&path).unwrap();
        assert_eq!(d.run_id, "abc123");
        assert_eq!(d.model_name, "model");
    }

    #[test]
    fn ignores_extra_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"{"run_id": "abc123", "artifact_path": "model", "model_name": "delivery_time_pred_model"}"#,
        );
        let d = RunDescriptor::load(&path).unwrap();
        assert_eq!(d.model_name, "delivery_time_pred_model");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = RunDescriptor::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StagehandError::NotFound(_)));
    }

    #[test]
    fn missing_run_id_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"model_name": "model"}"#);
        let err = RunDescriptor::load(&path).unwrap_err();
        match err {
            StagehandError::Parse { reason, .. } => assert!(reason.contains("run_id")),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn missing_model_name_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"run_id": "abc123"}"#);
        let err = RunDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, StagehandError::Parse { .. }));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "{not json");
        let err = RunDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, StagehandError::Parse { .. }));
    }

    #[test]
    fn non_object_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"["abc123", "model"]"#);
        let err = RunDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, StagehandError::Parse { .. }));
    }

    #[test]
    fn non_string_run_id_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"run_id": 42, "model_name": "model"}"#);
        let err = RunDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, StagehandError::Parse { .. }));
    }

    #[test]
    fn blank_model_name_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, r#"{"run_id": "abc123", "model_name": "  "}"#);
        let err = RunDescriptor::load(&path).unwrap_err();
        match err {
            StagehandError::Parse { reason, .. } => assert!(reason.contains("model_name")),
            other => panic!("expected Parse, got {other:?}"),
        }
    }
}
