use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "issue-mirror.config.yaml";

/// Get the global config directory (~/.config/issue-mirror or $XDG_CONFIG_HOME/issue-mirror)
pub fn get_global_config_dir() -> PathBuf {
    let base = if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config")
    } else {
        PathBuf::from(".config")
    };
    base.join("issue-mirror")
}

pub fn global_config_path() -> PathBuf {
    get_global_config_dir().join("config.yaml")
}

/// Walk up from start_dir looking for issue-mirror.config.yaml
pub fn find_local_config(start_dir: Option<&Path>) -> Option<PathBuf> {
    let start = match start_dir {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().ok()?,
    };

    let mut dir = start.as_path();

    loop {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        match dir.parent() {
            Some(parent) if parent != dir => dir = parent,
            _ => break,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_local_config_with_temp_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "asana:\n  workspace: Acme\n").unwrap();

        let found = find_local_config(Some(tmp.path()));
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_local_config_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "asana:\n  workspace: Acme\n").unwrap();

        let subdir = tmp.path().join("ops").join("sync");
        std::fs::create_dir_all(&subdir).unwrap();

        let found = find_local_config(Some(&subdir));
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_local_config_ignores_directories() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(find_local_config(Some(tmp.path())).is_none());
    }

    #[test]
    fn test_global_config_path() {
        let path = global_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("issue-mirror"));
        assert!(path_str.ends_with("config.yaml"));
    }
}
