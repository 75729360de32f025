pub mod error;
pub mod loader;
pub mod paths;

pub use error::ConfigError;
pub use loader::{
    apply_env_overrides, load_config, load_credentials, read_config, read_config_with_env,
    validate_config, LoadedConfig,
};
pub use paths::{find_local_config, get_global_config_dir, global_config_path, CONFIG_FILE_NAME};
