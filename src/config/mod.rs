// Configuration management module
// TOML settings plus the interactive setup flow

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, DEFAULT_EMBEDDING_DIMENSION, EmbeddingConfig, RetrievalConfig,
    SynthesisConfig,
};

/// Per-user configuration directory, e.g. `~/.config/prosedur-asistan`
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::DirectoryError)?;
    Ok(base.join("prosedur-asistan"))
}
