//! Configuration file lookup.

use std::path::{Path, PathBuf};

/// Find `config_name` by walking up from `start`.
///
/// Absolute names are returned as is when they exist.
///
/// # Example
/// ```text
/// /home/user/icons/brand/   ← start
/// /home/user/svgtint.toml   ← found!
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("svgtint.toml"), "").unwrap();

        let found = find_config_file(Path::new("svgtint.toml"), &nested).unwrap();
        assert_eq!(found, dir.path().join("svgtint.toml"));
    }

    #[test]
    fn test_nearest_wins() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("svgtint.toml"), "").unwrap();
        fs::write(nested.join("svgtint.toml"), "").unwrap();

        let found = find_config_file(Path::new("svgtint.toml"), &nested).unwrap();
        assert_eq!(found, nested.join("svgtint.toml"));
    }

    #[test]
    fn test_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_file(&path, dir.path()), None);
        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(&path, Path::new("/")), Some(path));
    }

    #[test]
    fn test_directory_is_not_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("svgtint.toml")).unwrap();
        let found = find_config_file(Path::new("svgtint.toml"), dir.path());
        assert_ne!(found, Some(dir.path().join("svgtint.toml")));
    }
}
