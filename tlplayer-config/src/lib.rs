//! Loader for the `tlplayer.yaml` configuration with environment overlays.
//!
//! Sources are merged in the order they are added, then `TLPLAYER__SECTION__KEY`
//! environment variables win over files. String values may reference `${VAR}`
//! placeholders, which are expanded (recursively, up to a fixed depth) before the
//! merged tree is turned into [`TlplayerConfig`]. Every section is optional.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tlplayer_common::LogFormat;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Largest page the upstream search endpoint will return.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct TlplayerConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Directory served for every path that is not an API route.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TwitterConfig {
    #[serde(default = "default_twitter_base_url")]
    pub base_url: String,
    /// JSON secret record holding the API key pair and optional tokens.
    #[serde(default = "default_secrets_path")]
    pub secrets_path: PathBuf,
    /// `count` hint sent with every search request.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Pages fetched per search before giving up on an empty result.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            base_url: default_twitter_base_url(),
            secrets_path: default_secrets_path(),
            page_size: default_page_size(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Local sinks only: a rolling file under `dir` plus optional `stderr`. Remote
/// syslog `host`/`port` keys from older configs are accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub emit_stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::default(),
            emit_stderr: true,
            filter: default_filter(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
fn default_twitter_base_url() -> String {
    "https://api.twitter.com".into()
}
fn default_secrets_path() -> PathBuf {
    PathBuf::from("token.json")
}
fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}
fn default_max_attempts() -> usize {
    3
}
fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "info".into()
}

impl TlplayerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.twitter.page_size) {
            return Err(ConfigError::Message(format!(
                "twitter.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.twitter.page_size
            )));
        }
        if self.twitter.max_attempts == 0 {
            return Err(ConfigError::Message(
                "twitter.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (files + env overrides).
pub struct TlplayerConfigLoader {
    files: Vec<(PathBuf, bool)>,
    inline: Vec<String>,
}

impl Default for TlplayerConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TlplayerConfigLoader {
    /// Start empty; `TLPLAYER__` environment overrides are always applied last.
    ///
    /// ```
    /// use tlplayer_config::TlplayerConfigLoader;
    ///
    /// let config = TlplayerConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.twitter.max_attempts, 3);
    /// assert_eq!(config.twitter.page_size, 100);
    /// ```
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    ///
    /// ```
    /// use tlplayer_config::TlplayerConfigLoader;
    ///
    /// let cfg = TlplayerConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// server:
    ///   bind: "0.0.0.0:8080"
    /// twitter:
    ///   page_size: 50
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.server.bind.port(), 8080);
    /// assert_eq!(cfg.twitter.page_size, 50);
    /// assert_eq!(cfg.twitter.base_url, "https://api.twitter.com");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize.
    pub fn load(self) -> Result<TlplayerConfig, ConfigError> {
        let mut builder = Config::builder();
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("TLPLAYER")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: TlplayerConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_secrets_path_from_env() {
        temp_env::with_var("TLP_SECRETS", Some("/etc/tlplayer/token.json"), || {
            let mut v = json!({ "twitter": { "secrets_path": "${TLP_SECRETS}" } });
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!({ "twitter": { "secrets_path": "/etc/tlplayer/token.json" } })
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!(["X=${FOO}", 42, true, null]);
                expand_env_in_value(&mut v);
                assert_eq!(v, json!(["X=start-mid-qux-end", 42, true, null]));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn defaults_apply_to_empty_document() {
        let cfg = TlplayerConfig::default();
        assert_eq!(cfg.server.bind, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(cfg.server.static_dir, PathBuf::from("static"));
        assert_eq!(cfg.twitter.secrets_path, PathBuf::from("token.json"));
        assert_eq!(cfg.logging.format, LogFormat::Text);
        assert!(cfg.logging.emit_stderr);
    }

    #[test]
    fn rejects_oversized_page() {
        let mut cfg = TlplayerConfig::default();
        cfg.twitter.page_size = 101;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_attempt_budget() {
        let mut cfg = TlplayerConfig::default();
        cfg.twitter.max_attempts = 0;
        assert!(cfg.validate().is_err());
    }
}
