//! Static configuration, loaded once at startup from a TOML file.

use base64::Engine;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("parsing {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: Vec<String>,

    #[serde(default)]
    pub zones: Vec<ZoneConfig>,

    #[serde(default)]
    pub keys: Vec<KeyConfig>,

    #[serde(default = "default_max_udp_payload")]
    pub max_udp_payload: usize,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Bound on CNAME/DNAME chasing within one answer; see
    /// [`crate::db::types::MAX_CHASE_DEPTH`] for the default this
    /// overrides.
    #[serde(default = "default_chase_depth")]
    pub chase_depth: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    pub origin: String,
    pub file: PathBuf,
    #[serde(default)]
    pub allow_transfer: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    pub name: String,
    /// Base64 in the file, decoded once at load time via
    /// [`KeyConfig::secret_bytes`].
    pub secret: String,
}

impl KeyConfig {
    pub fn secret_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.secret)
    }
}

fn default_listen() -> Vec<String> {
    vec!["0.0.0.0:53".to_string()]
}

fn default_max_udp_payload() -> usize {
    4096
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_chase_depth() -> usize {
    crate::db::types::MAX_CHASE_DEPTH
}

impl Config {
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let text = r#"
            listen = ["127.0.0.1:5353"]

            [[zones]]
            origin = "example.com"
            file = "example.com.zone"
        "#;
        let cfg: Config = toml::from_str(text).unwrap();
        assert_eq!(cfg.listen, vec!["127.0.0.1:5353"]);
        assert_eq!(cfg.zones.len(), 1);
        assert_eq!(cfg.zones[0].origin, "example.com");
        assert_eq!(cfg.max_udp_payload, 4096);
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.listen, default_listen());
        assert!(cfg.zones.is_empty());
        assert_eq!(cfg.log_filter, "info");
    }
}
