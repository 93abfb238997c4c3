//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WAYPOST_*, `__` separates nested keys)
//! 2. TOML config file (if WAYPOST_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The loaded record is immutable; the router, lifecycle manager and
//! interceptor each take it at construction.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WAYPOST_*)
/// 2. TOML config file (if WAYPOST_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite region store.
    ///
    /// Set via WAYPOST_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the hosting application (scheme, host, port).
    ///
    /// Requests with this origin are served from the shell region, and
    /// manifest paths are resolved against it.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via WAYPOST_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How many times the host retries a failed install before giving up.
    #[serde(default = "default_install_attempts")]
    pub install_attempts: u32,

    /// Root-relative paths pre-populated into the shell region on install.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Root-relative path served from the shell region when the network is down.
    #[serde(default = "default_offline_document")]
    pub offline_document: Option<String>,

    #[serde(default)]
    pub regions: RegionsConfig,

    #[serde(default)]
    pub routing: RoutingConfig,
}

/// Names and bounds of the cache regions.
///
/// Each name carries a version suffix; bumping it orphans the old region,
/// which is deleted on the next activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionsConfig {
    /// App shell region: same-origin documents and the dynamic script loader.
    #[serde(default = "default_shell_region")]
    pub shell: String,

    /// Size-bounded region for static assets and map tiles.
    #[serde(default = "default_tiles_region")]
    pub tiles: String,

    /// Network-first API responses.
    #[serde(default = "default_api_region")]
    pub api: String,

    /// Maximum number of entries kept in the tile region.
    #[serde(default = "default_tile_limit")]
    pub tile_limit: usize,
}

/// Host and path patterns consumed by the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Exact hostname of the dynamic script loader.
    #[serde(default = "default_script_host")]
    pub script_host: String,

    /// Path prefix of the dynamic script loader.
    #[serde(default = "default_script_path_prefix")]
    pub script_path_prefix: String,

    /// Hostname fragment identifying static asset hosts.
    #[serde(default = "default_static_host_fragment")]
    pub static_host_fragment: String,

    /// Hostname fragment identifying API hosts.
    #[serde(default = "default_api_host_fragment")]
    pub api_host_fragment: String,

    /// Path fragment that marks an API-host request as a tile.
    #[serde(default = "default_tile_path_fragment")]
    pub tile_path_fragment: String,

    /// Path fragment excluded from the tile rule on API hosts.
    #[serde(default = "default_api_path_fragment")]
    pub api_path_fragment: String,

    /// Exact hostname of the exchange-rate API.
    #[serde(default = "default_exchange_host")]
    pub exchange_host: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./waypost-regions.sqlite")
}

fn default_app_origin() -> String {
    "http://localhost:8080".into()
}

fn default_user_agent() -> String {
    "waypost/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_install_attempts() -> u32 {
    3
}

fn default_manifest() -> Vec<String> {
    vec!["/app/".into(), "/app/index.html".into()]
}

fn default_offline_document() -> Option<String> {
    Some("/app/index.html".into())
}

fn default_shell_region() -> String {
    "app-shell-v4".into()
}

fn default_tiles_region() -> String {
    "map-tiles-v1".into()
}

fn default_api_region() -> String {
    "api-v1".into()
}

fn default_tile_limit() -> usize {
    200
}

fn default_script_host() -> String {
    "maps.googleapis.com".into()
}

fn default_script_path_prefix() -> String {
    "/maps/api/js".into()
}

fn default_static_host_fragment() -> String {
    "gstatic.com".into()
}

fn default_api_host_fragment() -> String {
    "googleapis.com".into()
}

fn default_tile_path_fragment() -> String {
    "/maps/".into()
}

fn default_api_path_fragment() -> String {
    "/maps/api/".into()
}

fn default_exchange_host() -> String {
    "open.er-api.com".into()
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            shell: default_shell_region(),
            tiles: default_tiles_region(),
            api: default_api_region(),
            tile_limit: default_tile_limit(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            script_host: default_script_host(),
            script_path_prefix: default_script_path_prefix(),
            static_host_fragment: default_static_host_fragment(),
            api_host_fragment: default_api_host_fragment(),
            tile_path_fragment: default_tile_path_fragment(),
            api_path_fragment: default_api_path_fragment(),
            exchange_host: default_exchange_host(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            app_origin: default_app_origin(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            install_attempts: default_install_attempts(),
            manifest: default_manifest(),
            offline_document: default_offline_document(),
            regions: RegionsConfig::default(),
            routing: RoutingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The application origin parsed as a URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `app_origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.app_origin)
            .map_err(|e| ConfigError::Invalid { field: "app_origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid {
                field: "app_origin".into(),
                reason: format!("unsupported scheme: {other}"),
            }),
        }
    }

    /// The set of region names that survive activation.
    pub fn region_set(&self) -> Vec<String> {
        vec![self.regions.shell.clone(), self.regions.tiles.clone(), self.regions.api.clone()]
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WAYPOST_`
    /// 2. TOML file from `WAYPOST_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WAYPOST_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WAYPOST_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./waypost-regions.sqlite"));
        assert_eq!(config.user_agent, "waypost/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.manifest, vec!["/app/".to_string(), "/app/index.html".to_string()]);
        assert_eq!(config.offline_document.as_deref(), Some("/app/index.html"));
        assert_eq!(config.regions.tile_limit, 200);
        assert_eq!(config.routing.script_path_prefix, "/maps/api/js");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_region_set() {
        let config = AppConfig::default();
        assert_eq!(config.region_set(), vec!["app-shell-v4", "map-tiles-v1", "api-v1"]);
    }

    #[test]
    fn test_origin_url_rejects_other_schemes() {
        let config = AppConfig { app_origin: "ftp://example.com".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_load_layers_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "waypost.toml",
                r#"
                app_origin = "https://trip.example"

                [regions]
                tiles = "map-tiles-v2"
                tile_limit = 50
                "#,
            )?;
            jail.set_env("WAYPOST_CONFIG_FILE", "waypost.toml");
            jail.set_env("WAYPOST_REGIONS__API", "api-v9");
            jail.set_env("WAYPOST_TIMEOUT_MS", "5000");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.app_origin, "https://trip.example");
            assert_eq!(config.regions.tiles, "map-tiles-v2");
            assert_eq!(config.regions.tile_limit, 50);
            assert_eq!(config.regions.api, "api-v9");
            assert_eq!(config.regions.shell, "app-shell-v4");
            assert_eq!(config.timeout_ms, 5000);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("WAYPOST_REGIONS__TILE_LIMIT", "0");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "regions.tile_limit"));
            Ok(())
        });
    }
}
