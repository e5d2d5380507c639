//! Configuration loader for Parley.
//!
//! Reads `config.toml` from `--config` or the data directory (`~/.parley/`
//! in production), deserializes it into [`AppConfig`], then applies
//! environment overrides.

use std::path::{Path, PathBuf};

use anyhow::Context;

use parley_types::config::AppConfig;
use parley_types::llm::ProviderType;

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
/// 3. `./.parley` when no home directory can be determined
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

/// Load configuration and apply environment overrides.
///
/// - `explicit` set: the file must exist and parse.
/// - `explicit` unset and `{data_dir}/config.toml` missing: defaults.
/// - Any file that exists but fails to parse is an error.
pub async fn load_config(explicit: Option<&Path>, data_dir: &Path) -> anyhow::Result<AppConfig> {
    let mut config = match explicit {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            parse_config(&content, path)?
        }
        None => {
            let path = data_dir.join(CONFIG_FILE);
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => parse_config(&content, &path)?,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to read config file {}", path.display()));
                }
            }
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn parse_config(content: &str, path: &Path) -> anyhow::Result<AppConfig> {
    toml::from_str(content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Apply `OLLAMA_HOST`, `PARLEY_HOST` and `PARLEY_PORT`.
///
/// `OLLAMA_HOST` only fills `llm.base_url` for the Ollama provider and only
/// when the file left it unset. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if config.llm.provider == ProviderType::Ollama && config.llm.base_url.is_none() {
        if let Some(host) = get("OLLAMA_HOST") {
            config.llm.base_url = Some(host);
        }
    }

    if let Some(host) = get("PARLEY_HOST") {
        config.server.host = host;
    }

    if let Some(port) = get("PARLEY_PORT") {
        config.server.port = port
            .trim()
            .parse()
            .with_context(|| format!("PARLEY_PORT is not a valid port: '{port}'"))?;
    }

    Ok(())
}
