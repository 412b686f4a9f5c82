//! Configuration for Verisure API consumers.
//!
//! A single TOML file merged with `VERISURE_*` environment variables,
//! password resolution (env var, plaintext, keyring), and translation to
//! `verisure_api` types. The resolved installation id can be written back
//! so the next run skips discovery.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use verisure_api::{DEFAULT_ENDPOINTS, EndpointSet, TlsMode, TransportConfig, VerisureClient};

const KEYRING_SERVICE: &str = "verisure";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for {}", .username.as_deref().unwrap_or("<no username>"))]
    NoCredentials { username: Option<String> },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] verisure_api::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Account e-mail used to log in.
    pub username: Option<String>,

    /// Password (plaintext — prefer `password_env` or the keyring).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Installation id cached from a previous login.
    pub giid: Option<String>,

    /// Candidate API endpoints, tried in order.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            password_env: None,
            giid: None,
            endpoints: default_endpoints(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_endpoints() -> Vec<String> {
    DEFAULT_ENDPOINTS.iter().map(|&u| u.to_owned()).collect()
}
fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "verisure", "verisure").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("verisure");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!("loading config from {}", path.display());

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VERISURE_"))
        .extract()?;

    config.validate()?;
    Ok(config)
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to API types ────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be greater than zero".into(),
            });
        }
        self.endpoint_set().map(|_| ())
    }

    pub fn endpoint_set(&self) -> Result<EndpointSet, ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::Validation {
                field: "endpoints".into(),
                reason: "at least one endpoint is required".into(),
            });
        }
        EndpointSet::parse(&self.endpoints).map_err(|e| ConfigError::Validation {
            field: "endpoints".into(),
            reason: e.to_string(),
        })
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig::default()
            .with_tls(tls)
            .with_timeout(Duration::from_secs(self.timeout))
    }

    /// Build a client, seeded with the cached giid when there is one.
    pub fn client(&self) -> Result<VerisureClient, ConfigError> {
        let endpoints = self.endpoint_set()?;
        let transport = self.transport();
        let client = match self.giid {
            Some(ref giid) => VerisureClient::with_giid(endpoints, &transport, giid.clone())?,
            None => VerisureClient::new(endpoints, &transport)?,
        };
        Ok(client)
    }

    /// Resolve username and password.
    ///
    /// Password sources, first match wins: the variable named by
    /// `password_env`, plaintext `password`, the system keyring entry for
    /// the username.
    pub fn credentials(&self) -> Result<(String, SecretString), ConfigError> {
        let username = self
            .username
            .clone()
            .ok_or(ConfigError::NoCredentials { username: None })?;

        // 1. Env var
        if let Some(ref env_name) = self.password_env {
            if let Ok(pw) = std::env::var(env_name) {
                return Ok((username, SecretString::from(pw)));
            }
        }

        // 2. Plaintext in config
        if let Some(ref pw) = self.password {
            return Ok((username, SecretString::from(pw.clone())));
        }

        // 3. Keyring
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &username) {
            if let Ok(pw) = entry.get_password() {
                return Ok((username, SecretString::from(pw)));
            }
        }

        Err(ConfigError::NoCredentials {
            username: Some(username),
        })
    }

    /// Remember the installation id a client resolved.
    pub fn remember_giid(&mut self, client: &VerisureClient) -> bool {
        match client.giid() {
            Some(giid) if self.giid.as_deref() != Some(giid) => {
                self.giid = Some(giid.to_owned());
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("missing.toml")).unwrap();
            assert_eq!(cfg, Config::default());
            assert_eq!(cfg.endpoints, DEFAULT_ENDPOINTS);
            assert_eq!(cfg.transport().timeout, Duration::from_secs(30));
            Ok(())
        });
    }

    #[test]
    fn file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "verisure.toml",
                r#"
                    username = "file@example.com"
                    giid = "111"
                    endpoints = ["https://a.example.com/xbn/2", "https://b.example.com/xbn/2"]
                    timeout = 10
                "#,
            )?;
            jail.set_env("VERISURE_USERNAME", "env@example.com");

            let cfg = load_config_from(Path::new("verisure.toml")).unwrap();
            assert_eq!(cfg.username.as_deref(), Some("env@example.com"));
            assert_eq!(cfg.giid.as_deref(), Some("111"));
            assert_eq!(cfg.timeout, 10);

            let endpoints = cfg.endpoint_set().unwrap();
            let hosts: Vec<_> = endpoints.iter().filter_map(url::Url::host_str).collect();
            assert_eq!(hosts, ["a.example.com", "b.example.com"]);
            Ok(())
        });
    }

    #[test]
    fn rejects_zero_timeout_and_empty_endpoints() {
        Jail::expect_with(|jail| {
            jail.create_file("zero.toml", "timeout = 0")?;
            assert!(matches!(
                load_config_from(Path::new("zero.toml")),
                Err(ConfigError::Validation { ref field, .. }) if field == "timeout"
            ));

            jail.create_file("empty.toml", "endpoints = []")?;
            assert!(matches!(
                load_config_from(Path::new("empty.toml")),
                Err(ConfigError::Validation { ref field, .. }) if field == "endpoints"
            ));

            jail.create_file("bad.toml", r#"endpoints = ["not a url"]"#)?;
            assert!(matches!(
                load_config_from(Path::new("bad.toml")),
                Err(ConfigError::Validation { ref field, .. }) if field == "endpoints"
            ));
            Ok(())
        });
    }

    #[test]
    fn password_env_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("MY_VERISURE_PW", "from-env");
            let cfg = Config {
                username: Some("owner@example.com".into()),
                password: Some("from-file".into()),
                password_env: Some("MY_VERISURE_PW".into()),
                ..Config::default()
            };

            let (user, pw) = cfg.credentials().unwrap();
            assert_eq!(user, "owner@example.com");
            assert_eq!(pw.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn plaintext_password_used_when_env_unset() {
        let cfg = Config {
            username: Some("owner@example.com".into()),
            password: Some("from-file".into()),
            password_env: Some("VERISURE_TEST_UNSET_VARIABLE".into()),
            ..Config::default()
        };

        let (_, pw) = cfg.credentials().unwrap();
        assert_eq!(pw.expose_secret(), "from-file");
    }

    #[test]
    fn missing_username_is_no_credentials() {
        let cfg = Config {
            password: Some("pw".into()),
            ..Config::default()
        };
        assert!(matches!(
            cfg.credentials(),
            Err(ConfigError::NoCredentials { username: None })
        ));
    }

    #[test]
    fn transport_tls_selection() {
        let insecure = Config {
            insecure: true,
            ca_cert: Some("/etc/ca.pem".into()),
            ..Config::default()
        };
        assert!(matches!(insecure.transport().tls, TlsMode::DangerAcceptInvalid));

        let custom = Config {
            ca_cert: Some("/etc/ca.pem".into()),
            ..Config::default()
        };
        assert!(matches!(custom.transport().tls, TlsMode::CustomCa(ref p) if p == Path::new("/etc/ca.pem")));

        assert!(matches!(Config::default().transport().tls, TlsMode::System));
    }

    #[test]
    fn cached_giid_seeds_client() {
        let cfg = Config {
            giid: Some("987654".into()),
            ..Config::default()
        };
        let client = cfg.client().unwrap();
        assert_eq!(client.giid(), Some("987654"));
        assert!(client.base_url().is_none());

        let mut fresh = Config::default();
        assert!(fresh.remember_giid(&client));
        assert_eq!(fresh.giid.as_deref(), Some("987654"));
        assert!(!fresh.remember_giid(&client));
    }

    #[test]
    fn save_then_load_keeps_values() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested").join("config.toml");
            let cfg = Config {
                username: Some("owner@example.com".into()),
                giid: Some("ABC123".into()),
                timeout: 12,
                ..Config::default()
            };

            save_config_to(&cfg, &path).unwrap();
            let loaded = load_config_from(&path).unwrap();
            assert_eq!(loaded, cfg);
            Ok(())
        });
    }
}
