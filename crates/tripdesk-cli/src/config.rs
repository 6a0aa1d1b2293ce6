use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Context {
    pub server_url: String,
    /// Agency sent as `X-Agency-Id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub current_context: Option<String>,
    #[serde(default)]
    pub contexts: BTreeMap<String, Context>,
}

/// Where requests go and for which agency.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub server_url: String,
    pub agency: Option<i64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".tripdesk").join("config.yaml"))
    }

    pub fn get_current_context(&self) -> Option<(&String, &Context)> {
        self.current_context
            .as_ref()
            .and_then(|name| self.contexts.get(name).map(|ctx| (name, ctx)))
    }

    /// Flags win over the current context; the server falls back to localhost.
    pub fn resolve(&self, server_url: Option<String>, agency: Option<i64>) -> Target {
        let current = self.get_current_context().map(|(_, ctx)| ctx);
        Target {
            server_url: server_url
                .or_else(|| current.map(|c| c.server_url.clone()))
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            agency: agency.or_else(|| current.and_then(|c| c.agency)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let mut config = Config::default();
        config.contexts.insert(
            "prod".to_string(),
            Context {
                server_url: "https://api.tripdesk.io/".to_string(),
                agency: Some(12),
            },
        );
        config.current_context = Some("prod".to_string());
        config
    }

    #[test]
    fn test_resolve_defaults_to_localhost() {
        let target = Config::default().resolve(None, None);
        assert_eq!(target.server_url, DEFAULT_SERVER_URL);
        assert_eq!(target.agency, None);
    }

    #[test]
    fn test_resolve_uses_current_context() {
        let target = sample().resolve(None, None);
        assert_eq!(target.server_url, "https://api.tripdesk.io");
        assert_eq!(target.agency, Some(12));
    }

    #[test]
    fn test_flags_override_context() {
        let target = sample().resolve(Some("http://127.0.0.1:9000".to_string()), Some(3));
        assert_eq!(target.server_url, "http://127.0.0.1:9000");
        assert_eq!(target.agency, Some(3));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        sample().save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.current_context.as_deref(), Some("prod"));
        assert_eq!(loaded.contexts["prod"].agency, Some(12));
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yaml")).unwrap();
        assert!(config.contexts.is_empty());
        assert!(config.current_context.is_none());
    }
}
