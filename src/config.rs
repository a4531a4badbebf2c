use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::render::RenderOptions;
use crate::storage::{
    CommandCredential, ConnectionParams, CredentialSource, EnvCredential, StaticCredential,
};

/// Environment variables that override the store section
pub const ENV_DATA_DIR: &str = "GRAPH_EDITOR_DATA_DIR";
pub const ENV_DATABASE: &str = "GRAPH_EDITOR_DATABASE";
pub const ENV_USER: &str = "GRAPH_EDITOR_USER";
pub const ENV_APP_NAME: &str = "GRAPH_EDITOR_APP_NAME";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GraphEditorConfig {
    pub store: StoreConfig,
    pub credential: CredentialConfig,
    pub server: ServerConfig,
    pub render: RenderOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub database: String,
    pub app_name: String,
    pub user: String,
    pub pool_min: usize,
    pub pool_max: usize,
    pub credential_max_age_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let params = ConnectionParams::default();
        Self {
            data_dir: params.data_dir,
            database: params.database,
            app_name: params.app_name,
            user: params.user,
            pool_min: params.pool_min,
            pool_max: params.pool_max,
            credential_max_age_secs: params.max_credential_age.as_secs(),
        }
    }
}

impl StoreConfig {
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            data_dir: self.data_dir.clone(),
            database: self.database.clone(),
            app_name: self.app_name.clone(),
            user: self.user.clone(),
            pool_min: self.pool_min,
            pool_max: self.pool_max,
            max_credential_age: Duration::from_secs(self.credential_max_age_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum CredentialConfig {
    Static { token: String },
    Env { var: String },
    Command { command: Vec<String> },
}

impl Default for CredentialConfig {
    fn default() -> Self {
        CredentialConfig::Static {
            token: "local".to_string(),
        }
    }
}

impl CredentialConfig {
    pub fn build(&self) -> anyhow::Result<Box<dyn CredentialSource>> {
        Ok(match self {
            CredentialConfig::Static { token } => Box::new(StaticCredential::new(token.clone())),
            CredentialConfig::Env { var } => Box::new(EnvCredential::new(var.clone())),
            CredentialConfig::Command { command } => Box::new(CommandCredential::from_argv(command)?),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8501 }
    }
}

impl GraphEditorConfig {
    /// Override store settings from environment variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.store.database = database;
        }
        if let Some(user) = lookup(ENV_USER) {
            self.store.user = user;
        }
        if let Some(app_name) = lookup(ENV_APP_NAME) {
            self.store.app_name = app_name;
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("graph-editor.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<GraphEditorConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: GraphEditorConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

/// File config (or defaults) with environment overrides applied
pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<GraphEditorConfig> {
    let mut config = load_config(path)?.unwrap_or_default();
    config.apply_env(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    Ok(config)
}

pub fn write_config(path: &Path, config: &GraphEditorConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: GraphEditorConfig = toml::from_str(
            r#"
            [store]
            user = "jane.doe"

            [credential]
            source = "command"
            command = ["databricks", "auth", "token"]
            "#,
        )
        .unwrap();

        assert_eq!(config.store.user, "jane.doe");
        assert_eq!(config.store.pool_max, 10);
        assert_eq!(config.store.credential_max_age_secs, 900);
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.render.height, 1000);
        assert_eq!(
            config.credential,
            CredentialConfig::Command {
                command: vec!["databricks".into(), "auth".into(), "token".into()]
            }
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = GraphEditorConfig::default();
        let env: HashMap<&str, &str> = HashMap::from([(ENV_USER, "ops-bot"), (ENV_DATA_DIR, "/tmp/graphs")]);
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.user, "ops-bot");
        assert_eq!(config.store.data_dir, PathBuf::from("/tmp/graphs"));
        assert_eq!(config.store.app_name, "graph_editor");
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph-editor.toml");
        let config = GraphEditorConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_connection_params() {
        let params = StoreConfig::default().connection_params();
        assert_eq!(params.max_credential_age, Duration::from_secs(900));
        assert_eq!(params.namespace().unwrap().as_str(), "graph_editor_schema_");
    }
}
