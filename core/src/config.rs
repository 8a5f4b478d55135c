use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use url::Url;

use crate::cli::Cli;

/// Where and how to reach the posts API.
#[derive(Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Runtime configuration resolved from file, env and CLI.
#[derive(Clone, Debug)]
pub struct Config {
    pub api: ApiSettings,
    /// Signed-in user name, if any.
    pub user: Option<String>,
    /// Whether verbose logging is enabled.
    pub logging_enabled: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    api: FileApi,
    #[serde(default)]
    session: FileSession,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Deserialize)]
struct FileApi {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

#[derive(Deserialize, Default)]
struct FileSession {
    #[serde(default)]
    user: Option<String>,
}

#[derive(Deserialize)]
struct FileLogging {
    #[serde(default = "default_logging")]
    enabled: bool,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_logging() -> bool {
    true
}

impl Default for FileApi {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for FileLogging {
    fn default() -> Self {
        Self {
            enabled: default_logging(),
        }
    }
}

impl Config {
    /// Resolve configuration from CLI, environment variables, config file and defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut file_cfg = FileConfig::default();

        // config file path precedence: CLI -> ENV -> default
        let config_path = cli
            .config
            .clone()
            .or_else(|| std::env::var("HOMEFEED_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(default_config_path);

        if let Ok(bytes) = fs::read(&config_path) {
            let contents = String::from_utf8_lossy(&bytes);
            file_cfg = toml::from_str(&contents)
                .with_context(|| format!("invalid config file {}", config_path.display()))?;
        }

        let mut base_url = file_cfg.api.base_url;
        let mut token = file_cfg.api.token;
        let mut user = file_cfg.session.user;
        let mut logging = file_cfg.logging.enabled;

        // environment overrides
        if let Ok(u) = std::env::var("HOMEFEED_API_URL") {
            base_url = u;
        }
        if let Ok(t) = std::env::var("HOMEFEED_TOKEN") {
            token = Some(t);
        }
        if let Ok(u) = std::env::var("HOMEFEED_USER") {
            user = Some(u);
        }
        if let Ok(l) = std::env::var("HOMEFEED_LOGGING") {
            if let Ok(l) = l.parse::<bool>() {
                logging = l;
            }
        }

        // CLI overrides
        if let Some(u) = &cli.api_url {
            base_url = u.clone();
        }
        if let Some(t) = &cli.token {
            token = Some(t.clone());
        }
        if let Some(u) = &cli.user {
            user = Some(u.clone());
        }
        if let Some(l) = cli.logging {
            logging = l;
        }

        let url = Url::parse(&base_url).context("invalid_api_url")?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("unsupported_api_scheme: {}", url.scheme());
        }
        if file_cfg.api.timeout_secs == 0 {
            anyhow::bail!("invalid_timeout");
        }

        Ok(Self {
            api: ApiSettings {
                base_url,
                token: token.filter(|t| !t.is_empty()),
                timeout: Duration::from_secs(file_cfg.api.timeout_secs),
            },
            user: user.filter(|u| !u.is_empty()),
            logging_enabled: logging,
        })
    }

    /// Default tracing filter directive; `RUST_LOG` overrides it.
    pub fn log_directive(&self) -> &'static str {
        if self.logging_enabled {
            "info"
        } else {
            "warn"
        }
    }
}

/// Default location of the config file for the current platform.
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("org", "homefeed", "homefeed")
        .map(|dirs| dirs.config_dir().join("homefeed.toml"))
        .unwrap_or_else(|| PathBuf::from("homefeed.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn clear_env() {
        for key in [
            "HOMEFEED_CONFIG",
            "HOMEFEED_API_URL",
            "HOMEFEED_TOKEN",
            "HOMEFEED_USER",
            "HOMEFEED_LOGGING",
        ] {
            std::env::remove_var(key);
        }
    }

    fn write_cfg(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("homefeed.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    #[serial]
    fn valid_config_parses() {
        clear_env();
        let (_dir, path) = write_cfg(
            "[api]\nbase_url=\"https://blog.test/api\"\ntoken=\"abc\"\ntimeout_secs=5\n[session]\nuser=\"ada\"\n[logging]\nenabled=false\n",
        );
        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.api.base_url, "https://blog.test/api");
        assert_eq!(cfg.api.token.as_deref(), Some("abc"));
        assert_eq!(cfg.api.timeout, Duration::from_secs(5));
        assert_eq!(cfg.user.as_deref(), Some("ada"));
        assert!(!cfg.logging_enabled);
        assert_eq!(cfg.log_directive(), "warn");
    }

    #[test]
    #[serial]
    fn missing_keys_defaults() {
        clear_env();
        let (_dir, path) = write_cfg("");
        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:5000/api");
        assert_eq!(cfg.api.token, None);
        assert_eq!(cfg.api.timeout, Duration::from_secs(30));
        assert_eq!(cfg.user, None);
        assert!(cfg.logging_enabled);
        assert_eq!(cfg.log_directive(), "info");
        assert!(tracing_subscriber::EnvFilter::try_new(cfg.log_directive()).is_ok());
    }

    #[test]
    #[serial]
    fn invalid_url_fails() {
        clear_env();
        let (_dir, path) = write_cfg("[api]\nbase_url=\"not a url\"\n");
        let cli = Cli {
            config: Some(path.clone()),
            ..Default::default()
        };
        assert!(Config::load(&cli).is_err());
        let cli = Cli {
            config: Some(path),
            api_url: Some("ftp://blog.test".into()),
            ..Default::default()
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    #[serial]
    fn zero_timeout_fails() {
        clear_env();
        let (_dir, path) = write_cfg("[api]\ntimeout_secs=0\n");
        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    #[serial]
    fn precedence_cli_env_file() {
        clear_env();
        let (_dir, path) = write_cfg("[api]\nbase_url=\"http://file.test\"\n[session]\nuser=\"file\"\n");
        std::env::set_var("HOMEFEED_API_URL", "http://env.test");
        std::env::set_var("HOMEFEED_USER", "env");
        let cli = Cli {
            config: Some(path),
            api_url: Some("http://cli.test".into()),
            ..Default::default()
        };
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.api.base_url, "http://cli.test");
        assert_eq!(cfg.user.as_deref(), Some("env"));
        clear_env();
    }

    #[test]
    #[serial]
    fn config_path_from_env() {
        clear_env();
        let (_dir, path) = write_cfg("[session]\nuser=\"from-env-path\"\n");
        std::env::set_var("HOMEFEED_CONFIG", &path);
        let cfg = Config::load(&Cli::default()).unwrap();
        assert_eq!(cfg.user.as_deref(), Some("from-env-path"));
        clear_env();
    }

    #[test]
    #[serial]
    fn empty_token_is_none_and_debug_redacts() {
        clear_env();
        let (_dir, path) = write_cfg("[api]\ntoken=\"\"\n");
        let cli = Cli {
            config: Some(path.clone()),
            ..Default::default()
        };
        assert_eq!(Config::load(&cli).unwrap().api.token, None);
        let cli = Cli {
            config: Some(path),
            token: Some("secret-token".into()),
            ..Default::default()
        };
        let cfg = Config::load(&cli).unwrap();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("<redacted>"));
    }
}
