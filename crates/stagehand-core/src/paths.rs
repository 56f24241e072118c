use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "stagehand.yaml";
pub const RUN_INFO_FILE: &str = "run_information.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path against the project root. Absolute paths pass
/// through unchanged.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_root() {
        let root = Path::new("/work/project");
        assert_eq!(
            resolve(root, Path::new(RUN_INFO_FILE)),
            PathBuf::from("/work/project/run_information.json")
        );
    }

    #[test]
    fn absolute_paths_pass_through() {
        let root = Path::new("/work/project");
        assert_eq!(
            resolve(root, Path::new("/tmp/run.json")),
            PathBuf::from("/tmp/run.json")
        );
    }
}
