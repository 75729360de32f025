use std::fmt;
use std::path::PathBuf;

/// Problems that stop a run before any API is contacted
#[derive(Debug)]
pub enum ConfigError {
    /// `--config` (or a located file) is not a regular file
    NotFound(PathBuf),
    /// The file is not valid YAML for `MirrorConfig`
    Parse { path: PathBuf, message: String },
    /// The file exists but could not be read
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Every problem found in the effective settings
    ValidationError(Vec<String>),
    /// A required token variable is unset or blank
    MissingCredential(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "No issue-mirror config at {}", path.display())
            }
            ConfigError::Parse { path, message } => {
                write!(f, "Invalid issue-mirror config in {}: {message}", path.display())
            }
            ConfigError::Io { path, source } => {
                write!(f, "Could not read {}: {source}", path.display())
            }
            ConfigError::ValidationError(errors) => {
                writeln!(f, "issue-mirror settings are incomplete:")?;
                for err in errors {
                    writeln!(f, "  - {err}")?;
                }
                Ok(())
            }
            ConfigError::MissingCredential(var) => write!(
                f,
                "{var} is not set. Export a personal access token as {var} before running issue-mirror"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ConfigError {
    pub(crate) fn parse(path: &std::path::Path, err: serde_yaml::Error) -> Self {
        ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
