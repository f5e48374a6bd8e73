use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub provider: ProviderConfig,

    pub cache: CacheConfig,

    pub seed: SeedConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/pokedex.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,

    pub user_agent: String,

    /// Highest id `random_identifier` may draw (inclusive)
    pub max_pokemon_id: i32,

    /// How far into the paginated listing a search scans
    pub list_limit: u32,

    pub list_batch_size: u32,

    /// Members of a type listing resolved during search
    pub type_member_limit: usize,

    /// How long successful responses are reused; 0 disables reuse
    pub response_cache_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2".to_string(),
            request_timeout_seconds: 30,
            user_agent: concat!("pokedex/", env!("CARGO_PKG_VERSION")).to_string(),
            max_pokemon_id: 1025,
            list_limit: 1300,
            list_batch_size: 100,
            type_member_limit: 20,
            response_cache_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of the Pokémon-of-the-day pointer
    pub daily_ttl_hours: i64,

    /// Upper bound per store search criterion
    pub search_result_limit: u64,

    pub reaper_enabled: bool,

    pub reaper_cron: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            daily_ttl_hours: 24,
            search_result_limit: 20,
            reaper_enabled: true,
            reaper_cron: "0 */15 * * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub batch_size: usize,

    pub delay_ms: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("POKEDEX_DATABASE_URL") {
            self.general.database_path = url;
        }

        if let Ok(port) = std::env::var("POKEDEX_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid POKEDEX_PORT: {port}"))?;
        }

        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("pokedex").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".pokedex").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.trim().is_empty() {
            anyhow::bail!("Provider base URL cannot be empty");
        }

        if self.provider.list_batch_size == 0 {
            anyhow::bail!("Provider list batch size must be > 0");
        }

        if self.provider.max_pokemon_id < 1 {
            anyhow::bail!("Provider max Pokemon id must be >= 1");
        }

        if self.cache.daily_ttl_hours <= 0 {
            anyhow::bail!("Daily cache TTL must be > 0 hours");
        }

        if self.seed.batch_size == 0 {
            anyhow::bail!("Seed batch size must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.base_url, "https://pokeapi.co/api/v2");
        assert_eq!(config.provider.max_pokemon_id, 1025);
        assert_eq!(config.provider.list_batch_size, 100);
        assert_eq!(config.cache.daily_ttl_hours, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[provider]"));
        assert!(toml_str.contains("[cache]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [provider]
            max_pokemon_id = 151
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.provider.max_pokemon_id, 151);

        assert_eq!(config.provider.list_limit, 1300);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.provider.list_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.daily_ttl_hours = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.provider.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
