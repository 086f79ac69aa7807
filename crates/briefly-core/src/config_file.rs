use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub backend: Option<BackendConfig>,
    pub fetch: Option<FetchConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub num_workers: Option<usize>,
    pub queue_capacity: Option<usize>,
}

/// Platform config directory path: `<config_dir>/briefly/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("briefly").join("config.toml"))
}

/// Load config by cascading CWD `.briefly.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".briefly.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Load an explicitly requested config file. Unlike [`load_from_path`],
/// a missing or malformed file is an error.
pub fn load_required(path: &Path) -> Result<ConfigFile, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (base_backend, over_backend) = (
        base.backend.unwrap_or_default(),
        overlay.backend.unwrap_or_default(),
    );
    let (base_fetch, over_fetch) = (
        base.fetch.unwrap_or_default(),
        overlay.fetch.unwrap_or_default(),
    );
    let (base_server, over_server) = (
        base.server.unwrap_or_default(),
        overlay.server.unwrap_or_default(),
    );

    ConfigFile {
        backend: Some(BackendConfig {
            endpoint: over_backend.endpoint.or(base_backend.endpoint),
            model: over_backend.model.or(base_backend.model),
            api_token: over_backend.api_token.or(base_backend.api_token),
            timeout_secs: over_backend.timeout_secs.or(base_backend.timeout_secs),
        }),
        fetch: Some(FetchConfig {
            user_agent: over_fetch.user_agent.or(base_fetch.user_agent),
            timeout_secs: over_fetch.timeout_secs.or(base_fetch.timeout_secs),
        }),
        server: Some(ServerConfig {
            bind: over_server.bind.or(base_server.bind),
            num_workers: over_server.num_workers.or(base_server.num_workers),
            queue_capacity: over_server.queue_capacity.or(base_server.queue_capacity),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let toml_str = "[backend]\nendpoint = \"http://localhost:8080/summarize\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let backend = parsed.backend.unwrap();
        assert_eq!(
            backend.endpoint.as_deref(),
            Some("http://localhost:8080/summarize")
        );
        assert!(backend.model.is_none());
        assert!(parsed.server.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            backend: Some(BackendConfig {
                model: Some("base/model".into()),
                timeout_secs: Some(60),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            backend: Some(BackendConfig {
                model: Some("overlay/model".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        let backend = merged.backend.unwrap();
        assert_eq!(backend.model.as_deref(), Some("overlay/model"));
        assert_eq!(backend.timeout_secs, Some(60));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            server: Some(ServerConfig {
                bind: Some("127.0.0.1:9000".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.server.unwrap().bind.as_deref(),
            Some("127.0.0.1:9000")
        );
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nnum_workers = 4\nqueue_capacity = 32\n").unwrap();

        let config = load_from_path(&path).unwrap();
        let server = config.server.unwrap();
        assert_eq!(server.num_workers, Some(4));
        assert_eq!(server.queue_capacity, Some(32));
    }

    #[test]
    fn load_from_path_missing_or_invalid_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("absent.toml")).is_none());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[server\nbind = ").unwrap();
        assert!(load_from_path(&bad).is_none());
    }

    #[test]
    fn load_required_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_required(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.starts_with("Failed to read config"));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[fetch]\ntimeout_secs = \"soon\"\n").unwrap();
        let err = load_required(&bad).unwrap_err();
        assert!(err.starts_with("Failed to parse config"));
    }

    #[test]
    fn round_trip_toml() {
        let config = ConfigFile {
            fetch: Some(FetchConfig {
                user_agent: Some("briefly-test".into()),
                timeout_secs: Some(5),
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.fetch.unwrap().user_agent.as_deref(),
            Some("briefly-test")
        );
    }
}
