//! Configuration schema (loaded from lockboard.toml).
//!
//! Every field has a default so a missing or partial config file still
//! produces a working configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub remote: RemoteConfig,
    pub session: SessionConfig,
}

/// Coordinates of the remote blob: one fixed file in one fixed repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Content API base URL.
    pub api_base: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Path of the encrypted document inside the repository.
    pub path: String,
    /// Commit message used for every write.
    pub commit_message: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".into(),
            owner: "lockboard".into(),
            repo: "board-data".into(),
            path: "data/board.enc".into(),
            commit_message: "Update board data".into(),
        }
    }
}

/// Session-scoped persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the unlock credential is cached between UI reloads.
    /// `None` disables persistence (credential lives in memory only).
    pub credential_cache: Option<PathBuf>,
}

impl BoardConfig {
    /// Load config from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[remote]
api_base = "https://git.example.com/api/v3"
owner = "zohar"
repo = "board-v2"
path = "data/board.enc"
commit_message = "sync"

[session]
credential_cache = "/tmp/lockboard-session.json"
"#;
        let config: BoardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.remote.api_base, "https://git.example.com/api/v3");
        assert_eq!(config.remote.owner, "zohar");
        assert_eq!(config.remote.commit_message, "sync");
        assert_eq!(
            config.session.credential_cache,
            Some(PathBuf::from("/tmp/lockboard-session.json"))
        );
    }

    #[test]
    fn parse_defaults() {
        let config: BoardConfig = toml::from_str("").unwrap();
        assert_eq!(config.remote.api_base, "https://api.github.com");
        assert_eq!(config.remote.path, "data/board.enc");
        assert!(config.session.credential_cache.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let config: BoardConfig = toml::from_str("[remote]\nowner = \"me\"\n").unwrap();
        assert_eq!(config.remote.owner, "me");
        assert_eq!(config.remote.repo, "board-data");
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BoardConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.remote.api_base, "https://api.github.com");
    }

    #[test]
    fn serialize_roundtrip() {
        let config = BoardConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: BoardConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.remote.owner, parsed.remote.owner);
        assert_eq!(config.remote.path, parsed.remote.path);
    }
}
