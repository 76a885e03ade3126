use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::AmorisConfig};

const CONFIG_FILENAME: &str = "amoris.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<AmorisConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `$AMORIS_CONFIG` (explicit path)
/// 2. `./amoris.toml` (project-local)
/// 3. `~/.config/amoris/amoris.toml` (user-global)
///
/// Returns `AmorisConfig::default()` if no config file is found.
pub fn discover_and_load() -> AmorisConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(config) => return config,
            Err(e) => warn!(path = %path.display(), error = %e, "ignoring unreadable config"),
        }
    }
    AmorisConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("AMORIS_CONFIG") {
        let path = PathBuf::from(explicit);
        if path.is_file() {
            return Some(path);
        }
    }

    let local = PathBuf::from(CONFIG_FILENAME);
    if local.is_file() {
        return Some(local);
    }

    if let Ok(home) = std::env::var("HOME") {
        let global = PathBuf::from(home)
            .join(".config")
            .join("amoris")
            .join(CONFIG_FILENAME);
        if global.is_file() {
            return Some(global);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_reads_and_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[gateway]\nport = 9000\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.bind, "127.0.0.1");
    }

    #[test]
    fn load_config_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "gateway = [broken").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn load_config_missing_file_errors() {
        assert!(load_config(Path::new("/definitely/not/here.toml")).is_err());
    }
}
