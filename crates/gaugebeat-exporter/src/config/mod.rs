//! Exporter config loader (strict parsing, env overrides).
//!
//! Resolution order: built-in defaults, then the YAML file (if any), then
//! `GAUGEBEAT_*` environment variables. Validation runs once on the result.

pub mod schema;

use std::fs;
use std::path::Path;

use gaugebeat_core::error::{GaugebeatError, Result};

pub use schema::{ExporterConfig, ExporterSection, MetricConfig};

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "GAUGEBEAT_CONFIG";
/// File picked up from the working directory when `GAUGEBEAT_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "gaugebeat.yaml";

const LABEL_ENV_PREFIX: &str = "GAUGEBEAT_LABEL_";

/// Load from the process environment.
pub fn load() -> Result<ExporterConfig> {
    load_with_env(std::env::vars())
}

/// Load using an explicit set of environment variables.
pub fn load_with_env<I>(vars: I) -> Result<ExporterConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Vec<(String, String)> = vars.into_iter().collect();
    let explicit = vars
        .iter()
        .find(|(k, _)| k == CONFIG_PATH_ENV)
        .map(|(_, v)| v.clone());

    let mut cfg = match explicit {
        Some(path) => parse_str(&read(&path)?)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => parse_str(&read(DEFAULT_CONFIG_PATH)?)?,
        None => ExporterConfig::default(),
    };
    apply_env(&mut cfg, vars)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    load_from_str(&read(path)?)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `GAUGEBEAT_*` overrides on top of `cfg`. Unrelated variables are ignored.
pub fn apply_env<I>(cfg: &mut ExporterConfig, vars: I) -> Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        match key.as_str() {
            "GAUGEBEAT_PORT" => cfg.exporter.port = parse_num(&key, &value)?,
            "GAUGEBEAT_LISTEN_HOST" => cfg.exporter.listen_host = value.trim().to_string(),
            "GAUGEBEAT_INTERVAL_SECONDS" => {
                cfg.exporter.interval_seconds = parse_num(&key, &value)?
            }
            "GAUGEBEAT_PRECISION" => cfg.exporter.precision = parse_num(&key, &value)?,
            _ => {
                if let Some(label) = key.strip_prefix(LABEL_ENV_PREFIX) {
                    let values: Vec<String> = value
                        .split(',')
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect();
                    tracing::debug!(
                        label = %label.to_ascii_lowercase(),
                        count = values.len(),
                        "label universe overridden from env"
                    );
                    cfg.labels.insert(label.to_ascii_lowercase(), values);
                }
            }
        }
    }
    Ok(())
}

fn read(path: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| GaugebeatError::BadConfig(format!("read config {path} failed: {e}")))
}

fn parse_str(s: &str) -> Result<ExporterConfig> {
    serde_yaml::from_str(s).map_err(|e| GaugebeatError::BadConfig(format!("invalid yaml: {e}")))
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GaugebeatError::BadConfig(format!("{key} must be a number, got {value:?}")))
}
