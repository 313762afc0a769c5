//! Loader for fieldpull run configuration with YAML + environment overlays.
//!
//! A run is described by one `fieldpull.yaml` file naming the target host,
//! the admin credential, and the export options. `FIELDPULL_`-prefixed
//! environment variables override file values, and `${VAR}` placeholders
//! inside string values are expanded before deserialisation, so secrets can
//! stay out of the file entirely.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Top-level run configuration.
#[derive(Debug, Deserialize)]
pub struct FieldpullConfig {
    pub target: TargetConfig,
    pub credential: CredentialConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Where the target installation lives.
#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    /// Hostname (no scheme), e.g. `staging.example.org`.
    pub host: String,
    /// Path prefix for sub-directory installs, e.g. `/blog`.
    #[serde(default)]
    pub route_prefix: Option<String>,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub scheme: Scheme,
    /// PEM file with an extra root certificate to trust, for staging hosts
    /// with self-signed chains.
    #[serde(default)]
    pub trust_anchor: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

/// Admin login used for the run.
#[derive(Debug, Deserialize)]
pub struct CredentialConfig {
    pub identifier: String,
    pub secret: String,
}

/// What to export and how to rewrite it.
#[derive(Debug, Default, Deserialize)]
pub struct ExportConfig {
    /// Export the raw field-group data as JSON instead of PHP source.
    #[serde(default)]
    pub structured: bool,
    #[serde(default)]
    pub addons: AddonConfig,
    /// Extra boolean PHP expression AND-ed into the registration guard.
    #[serde(default)]
    pub extra_condition: Option<String>,
}

/// Add-on include directives to activate in the exported source.
#[derive(Debug, Default, Deserialize)]
pub struct AddonConfig {
    #[serde(default)]
    pub repeater: bool,
    #[serde(default)]
    pub gallery: bool,
    #[serde(default)]
    pub flexible_content: bool,
    #[serde(default)]
    pub options_page: bool,
}

// Expansion runs over the merged JSON tree so `${VAR}` works in any string,
// including nested arrays/objects. Depth-capped to terminate on cycles.
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

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct FieldpullConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FieldpullConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldpullConfigLoader {
    /// Start with the defaults: `FIELDPULL_` env overrides are always active.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("FIELDPULL").separator("__"));
        Self { builder }
    }

    /// Attach a config file; the `config` crate infers the format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet (tests and CLI overrides).
    ///
    /// ```
    /// use fieldpull_config::{FieldpullConfigLoader, Scheme};
    ///
    /// let cfg = FieldpullConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// target:
    ///   host: "staging.example.org"
    /// credential:
    ///   identifier: "admin"
    ///   secret: "example"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.target.host, "staging.example.org");
    /// assert_eq!(cfg.target.transport.scheme, Scheme::Http);
    /// assert!(!cfg.export.structured);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<FieldpullConfig, ConfigError> {
        let cfg = self.builder.build()?;

        // Merge to a JSON tree first so env expansion sees every string.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: FieldpullConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
