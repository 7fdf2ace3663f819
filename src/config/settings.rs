//! Configuration settings for the Jimeng MCP server.

use super::credentials::{mask, Credentials};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub image: ImageSettings,
    pub video: VideoSettings,
    pub credentials: CredentialSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Fallback dotenv file consulted when credentials are not in the environment.
    pub env_file: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            env_file: "~/.jimeng-ai-mcp/.env".to_string(),
        }
    }
}

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the visual API.
    pub endpoint: String,
    /// Service name used in the signing scope.
    pub service: String,
    /// API version sent with every action.
    pub version: String,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://visual.volcengineapi.com".to_string(),
            service: "cv".to_string(),
            version: "2022-08-31".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Text-to-image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Model key for image generation.
    pub req_key: String,
    pub region: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            req_key: "jimeng_high_aigc_general_v21_L".to_string(),
            region: "cn-north-1".to_string(),
        }
    }
}

/// Text-to-video settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Model key for video generation.
    pub req_key: String,
    pub region: String,
    /// Delay between status queries in synchronous mode.
    pub poll_interval_secs: u64,
    /// Total wait budget for synchronous mode.
    pub max_wait_secs: u64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            req_key: "jimeng_vgfm_t2v_l20".to_string(),
            region: "cn-north-1".to_string(),
            poll_interval_secs: 5,
            max_wait_secs: 300,
        }
    }
}

impl VideoSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

/// Credentials stored in the config file. Environment variables take precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredentialSettings {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jimeng-mcp")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded fallback dotenv path.
    pub fn env_file(&self) -> PathBuf {
        Self::expand_path(&self.general.env_file)
    }

    /// Resolve credentials from the process environment and the config file.
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::resolve(&self.credentials, |name| std::env::var(name).ok())
    }

    /// Copy of the settings with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.credentials.access_key = copy.credentials.access_key.as_deref().map(mask);
        copy.credentials.secret_key = copy.credentials.secret_key.as_ref().map(|_| "****".to_string());
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.video.req_key, "jimeng_vgfm_t2v_l20");
        assert_eq!(settings.video.max_wait_secs, 300);
        assert_eq!(settings.api.endpoint, "https://visual.volcengineapi.com");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[video]\nmax_wait_secs = 30\n\n[credentials]\naccess_key = \"ak\"").unwrap();

        let settings = Settings::load_from(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(settings.video.max_wait_secs, 30);
        assert_eq!(settings.video.poll_interval_secs, 5);
        assert_eq!(settings.image.region, "cn-north-1");
        assert_eq!(settings.credentials.access_key.as_deref(), Some("ak"));
        assert!(settings.credentials.secret_key.is_none());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[video\nmax_wait_secs = ").unwrap();
        assert!(Settings::load_from(Some(&file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let video = VideoSettings {
            poll_interval_secs: 0,
            ..VideoSettings::default()
        };
        assert_eq!(video.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_redacted_hides_secret() {
        let mut settings = Settings::default();
        settings.credentials.secret_key = Some("very-secret".to_string());
        let shown = toml::to_string_pretty(&settings.redacted()).unwrap();
        assert!(!shown.contains("very-secret"));
    }
}
