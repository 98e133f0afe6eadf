//! Configuration file loader.
//!
//! This module loads the two kinds of configuration wrf-runner works with:
//! - the WPS run configuration (`.json`, `.yaml` or `.yml`), validated into a
//!   [`ValidatedWpsConfig`]
//! - the system configuration (`.toml`) locating the WPS and WRF installs

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::ValidatedWpsConfig;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use wr_protocol::config_models::{SystemConfig, WpsConfig};

/// Environment variable naming the WPS directory when the system config
/// does not.
pub const WPS_PATH_ENV: &str = "WPS_PATH";

/// Environment variable naming the WRF run directory when the system config
/// does not.
pub const WRF_PATH_ENV: &str = "WRF_PATH";

/// Loads and validates a WPS run configuration.
///
/// The format is chosen by file extension.
///
/// # Arguments
///
/// * `path` - Path to a `.json`, `.yaml` or `.yml` file
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file cannot be read
/// - The extension is not supported
/// - The content does not parse or misses required fields
/// - The configuration breaks a validation rule
///
/// # Example
///
/// ```rust,no_run
/// use wr_core::config::loader::load_wps_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_wps_config(Path::new("wps.yaml")).await?;
/// println!("Loaded {} domains", config.domain_count());
/// # Ok(())
/// # }
/// ```
pub async fn load_wps_config(path: &Path) -> ConfigResult<ValidatedWpsConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let config = parse_wps_config(path, &content)?;
    ValidatedWpsConfig::new(config)
}

/// Parses WPS configuration text. `path` selects the format and is used in
/// error messages.
pub fn parse_wps_config(path: &Path, content: &str) -> ConfigResult<WpsConfig> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => serde_json::from_str(content).map_err(|source| ConfigError::JsonParse {
            path: path.to_path_buf(),
            source,
        }),
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Loads the system configuration.
///
/// With no path, or a path that does not exist, the default configuration is
/// used. `WPS_PATH` and `WRF_PATH` fill `wps_path` and `wrf_path` when the
/// file leaves them unset.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub async fn load_system_config(path: Option<&Path>) -> ConfigResult<SystemConfig> {
    let config = match path {
        Some(path) if path.exists() => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::FileRead {
                    path: path.to_path_buf(),
                    source,
                })?;

            toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => SystemConfig::default(),
    };

    let config = apply_env_fallback(config, std::env::var_os(WPS_PATH_ENV));
    Ok(apply_wrf_env_fallback(config, std::env::var_os(WRF_PATH_ENV)))
}

fn env_path(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|value| !value.is_empty()).map(PathBuf::from)
}

/// Fills `wps_path` from `env_value` when unset.
pub fn apply_env_fallback(mut config: SystemConfig, env_value: Option<OsString>) -> SystemConfig {
    if config.wps_path.is_none() {
        config.wps_path = env_path(env_value);
    }
    config
}

/// Fills `wrf_path` from `env_value` when unset.
pub fn apply_wrf_env_fallback(
    mut config: SystemConfig,
    env_value: Option<OsString>,
) -> SystemConfig {
    if config.wrf_path.is_none() {
        config.wrf_path = env_path(env_value);
    }
    config
}

/// Picks the WPS directory: an explicit override first, then the system
/// configuration.
///
/// # Errors
///
/// Returns `ConfigError::MissingWpsPath` if neither names a directory.
pub fn resolve_wps_path(
    config: &SystemConfig,
    override_path: Option<&Path>,
) -> ConfigResult<PathBuf> {
    override_path
        .map(Path::to_path_buf)
        .or_else(|| config.wps_path.clone())
        .ok_or(ConfigError::MissingWpsPath)
}

/// Picks the WRF run directory, like [`resolve_wps_path`].
///
/// # Errors
///
/// Returns `ConfigError::MissingWrfPath` if neither names a directory.
pub fn resolve_wrf_path(
    config: &SystemConfig,
    override_path: Option<&Path>,
) -> ConfigResult<PathBuf> {
    override_path
        .map(Path::to_path_buf)
        .or_else(|| config.wrf_path.clone())
        .ok_or(ConfigError::MissingWrfPath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const JSON_CONFIG: &str = r#"{
        "domains": [
            {
                "parent_id": 1, "parent_ratio": 1, "parent_start": [1, 1],
                "size": [74, 61], "step_size": [30000, 30000]
            },
            {"parent_id": 1, "parent_ratio": 3, "parent_start": [31, 17], "size": [112, 97]}
        ],
        "projection": {
            "type": "lambert", "ref_location": [34.83, -81.03],
            "truelat": [30.0, 60.0], "stand_lot": -98.0
        },
        "data_path": "/data/geog",
        "start_date": "2016-01-01 00:00:00",
        "end_date": "2016-01-01 12:00:00",
        "interval": 21600,
        "prefix": "FILE"
    }"#;

    /// Test loading a complete JSON configuration.
    #[tokio::test]
    async fn test_load_wps_config_json() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("wps.json");
        fs::write(&path, JSON_CONFIG).expect("Failed to write config");

        let config = load_wps_config(&path).await.expect("Failed to load config");

        assert_eq!(config.domain_count(), 2);
        assert_eq!(config.interval_count(), 3);
        assert_eq!(config.config().projection.stand_lon, -98.0);
        assert_eq!(config.config().prefix, "FILE");
    }

    /// Test loading the same configuration written as YAML.
    #[tokio::test]
    async fn test_load_wps_config_yaml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("wps.yml");
        let yaml = r#"
domains:
  - parent_id: 1
    parent_ratio: 1
    parent_start: [1, 1]
    size: [74, 61]
    step_size: [30000, 30000]
projection:
  type: lambert
  ref_location: [34.83, -81.03]
  truelat: [30.0, 60.0]
  stand_lon: -98.0
data_path: /data/geog
start_date: "2016-01-01_00:00:00"
end_date: "2016-01-02_00:00:00"
interval: 21600
prefix: FILE
"#;
        fs::write(&path, yaml).expect("Failed to write config");

        let config = load_wps_config(&path).await.expect("Failed to load config");
        assert_eq!(config.domain_count(), 1);
        assert_eq!(config.interval_count(), 5);
    }

    #[tokio::test]
    async fn test_load_wps_config_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let result = load_wps_config(&dir.path().join("absent.json")).await;

        if let Err(ConfigError::FileRead { path, .. }) = result {
            assert!(path.ends_with("absent.json"));
        } else {
            panic!("Expected FileRead error");
        }
    }

    #[tokio::test]
    async fn test_load_wps_config_invalid_json() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("wps.json");
        fs::write(&path, "{\"domains\": [").expect("Failed to write config");

        let result = load_wps_config(&path).await;
        assert!(result.is_err(), "Should fail on invalid JSON");

        if let Err(ConfigError::JsonParse { path, .. }) = result {
            assert!(path.ends_with("wps.json"));
        } else {
            panic!("Expected JsonParse error");
        }
    }

    #[tokio::test]
    async fn test_load_wps_config_invalid_yaml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("wps.yaml");
        fs::write(&path, "domains: [\n  invalid: [yaml").expect("Failed to write config");

        let result = load_wps_config(&path).await;

        if let Err(ConfigError::YamlParse { path, .. }) = result {
            assert!(path.ends_with("wps.yaml"));
        } else {
            panic!("Expected YamlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_wps_config_unsupported_extension() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("wps.ini");
        fs::write(&path, JSON_CONFIG).expect("Failed to write config");

        let result = load_wps_config(&path).await;
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    /// Validation runs as part of loading.
    #[tokio::test]
    async fn test_load_wps_config_validates() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("wps.json");
        let broken = JSON_CONFIG.replace("\"interval\": 21600", "\"interval\": 0");
        fs::write(&path, broken).expect("Failed to write config");

        let result = load_wps_config(&path).await;
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[tokio::test]
    async fn test_load_system_config_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("system.toml");
        fs::write(
            &path,
            concat!(
                "wps_path = \"/opt/WPS\"\nlog_dir = \"/tmp/logs\"\n",
                "launcher = [\"mpirun\", \"-n\", \"1\"]\n",
            ),
        )
        .expect("Failed to write config");

        let config = load_system_config(Some(&path)).await.expect("Failed to load config");
        assert_eq!(config.wps_path, Some(PathBuf::from("/opt/WPS")));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(config.launcher, vec!["mpirun", "-n", "1"]);
    }

    #[tokio::test]
    async fn test_load_system_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("system.toml");
        fs::write(&path, "wps_path = [invalid toml").expect("Failed to write config");

        let result = load_system_config(Some(&path)).await;

        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("system.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[test]
    fn test_env_fallback_only_fills_unset_path() {
        let from_env =
            apply_env_fallback(SystemConfig::default(), Some(OsString::from("/env/WPS")));
        assert_eq!(from_env.wps_path, Some(PathBuf::from("/env/WPS")));

        let configured = SystemConfig {
            wps_path: Some(PathBuf::from("/opt/WPS")),
            ..SystemConfig::default()
        };
        let kept = apply_env_fallback(configured, Some(OsString::from("/env/WPS")));
        assert_eq!(kept.wps_path, Some(PathBuf::from("/opt/WPS")));

        let empty = apply_env_fallback(SystemConfig::default(), Some(OsString::new()));
        assert_eq!(empty.wps_path, None);
    }

    #[test]
    fn test_wrf_env_fallback_and_resolution() {
        let from_env =
            apply_wrf_env_fallback(SystemConfig::default(), Some(OsString::from("/env/WRF")));
        assert_eq!(from_env.wrf_path, Some(PathBuf::from("/env/WRF")));
        assert_eq!(from_env.wps_path, None);

        assert_eq!(resolve_wrf_path(&from_env, None).unwrap(), PathBuf::from("/env/WRF"));
        assert_eq!(
            resolve_wrf_path(&from_env, Some(Path::new("WRF"))).unwrap(),
            PathBuf::from("WRF")
        );
        assert!(matches!(
            resolve_wrf_path(&SystemConfig::default(), None),
            Err(ConfigError::MissingWrfPath)
        ));
    }

    #[test]
    fn test_resolve_wps_path() {
        let config = SystemConfig {
            wps_path: Some(PathBuf::from("/opt/WPS")),
            ..SystemConfig::default()
        };

        assert_eq!(resolve_wps_path(&config, None).unwrap(), PathBuf::from("/opt/WPS"));
        assert_eq!(
            resolve_wps_path(&config, Some(Path::new("/other"))).unwrap(),
            PathBuf::from("/other")
        );
        assert!(matches!(
            resolve_wps_path(&SystemConfig::default(), None),
            Err(ConfigError::MissingWpsPath)
        ));
    }
}
