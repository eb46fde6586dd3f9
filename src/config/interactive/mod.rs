#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, EmbeddingConfig, get_config_dir};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!(
        "{}",
        style("🔧 Prosedür Asistanı Configuration Setup")
            .bold()
            .cyan()
    );
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Server Configuration").bold().yellow());
    eprintln!("Configure the local model server used for embeddings and answers.");
    eprintln!();

    configure_embedding(&mut config.embedding)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_server_connection(&config.embedding)? {
        eprintln!("{}", style("✓ Embedding server reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to the embedding server").yellow()
        );
        eprintln!("You can continue, but make sure the server is running before uploading.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Embedding Server:").bold().yellow());
    eprintln!("  Host: {}", style(&config.embedding.host).cyan());
    eprintln!("  Port: {}", style(config.embedding.port).cyan());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    eprintln!(
        "  Dimension: {}",
        style(config.embedding.embedding_dimension).cyan()
    );
    eprintln!("  Batch Size: {}", style(config.embedding.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Answer Model:").bold().yellow());
    eprintln!("  Model: {}", style(&config.synthesis.model).cyan());
    eprintln!("  Max Tokens: {}", style(config.synthesis.max_tokens).cyan());

    eprintln!();
    eprintln!("{}", style("Chunking:").bold().yellow());
    eprintln!(
        "  Window: {} words",
        style(config.chunking.window_size).cyan()
    );
    eprintln!("  Overlap: {} words", style(config.chunking.overlap).cyan());

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!("  Top-K: {}", style(config.retrieval.top_k).cyan());
    eprintln!(
        "  Min Similarity: {}",
        style(config.retrieval.min_similarity).cyan()
    );

    eprintln!();
    match config.embedding.server_url() {
        Ok(url) => eprintln!("  Server URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Server URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    match Config::load(&config_dir) {
        Ok(config) => {
            if config.config_file_path().exists() {
                eprintln!("{}", style("Found existing configuration.").green());
            } else {
                eprintln!(
                    "{}",
                    style("No existing configuration found. Using defaults.").yellow()
                );
            }
            Ok(config)
        }
        Err(_) => {
            eprintln!(
                "{}",
                style("Existing configuration is invalid. Starting from defaults.").yellow()
            );
            Ok(Config {
                embedding: EmbeddingConfig::default(),
                synthesis: super::SynthesisConfig::default(),
                chunking: crate::chunking::ChunkingConfig::default(),
                retrieval: super::RetrievalConfig::default(),
                base_dir: config_dir,
            })
        }
    }
}

fn configure_embedding(embedding: &mut EmbeddingConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == embedding.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Server protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Server host")
        .default(embedding.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = EmbeddingConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..EmbeddingConfig::default()
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Server port")
        .default(embedding.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(embedding.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(embedding.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (64..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 64 and 4096")
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(embedding.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    embedding.set_protocol(protocol)?;
    embedding.set_host(host)?;
    embedding.set_port(port)?;
    embedding.set_model(model)?;
    embedding.set_embedding_dimension(dimension)?;
    embedding.set_batch_size(batch_size)?;

    Ok(())
}

fn test_server_connection(embedding: &EmbeddingConfig) -> Result<bool> {
    let url = format!(
        "{}://{}:{}/api/version",
        embedding.protocol, embedding.host, embedding.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}
