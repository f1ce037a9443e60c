//! Configuration system for the Dataforge orchestration engine.
//!
//! Provides TOML-based configuration with:
//! - Pipeline executor policy (`[pipeline]`): context keying, duplicate-key
//!   handling, pre-flight validation, reference syntax
//! - Logging settings (`[logging]`)
//! - Config file layering (user config dir + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    save_config, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
