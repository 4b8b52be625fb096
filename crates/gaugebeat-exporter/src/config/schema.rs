use std::collections::{BTreeMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use serde::Deserialize;
use gaugebeat_core::error::{GaugebeatError, Result};
use gaugebeat_core::model::is_valid_label_key;
use gaugebeat_core::{MetricDefinition, ValueRange};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    /// Label key -> every value that key takes (the label universe).
    #[serde(default = "default_labels")]
    pub labels: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricConfig>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            exporter: ExporterSection::default(),
            labels: default_labels(),
            metrics: default_metrics(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GaugebeatError::UnsupportedVersion(self.version));
        }
        self.exporter.validate()?;

        for (key, values) in &self.labels {
            if !is_valid_label_key(key) {
                return Err(GaugebeatError::BadConfig(format!("labels: invalid label key {key:?}")));
            }
            if values.is_empty() {
                return Err(GaugebeatError::BadConfig(format!("labels.{key} must not be empty")));
            }
            if values.iter().any(|v| v.is_empty()) {
                return Err(GaugebeatError::BadConfig(format!(
                    "labels.{key} contains an empty value"
                )));
            }
        }

        if self.metrics.is_empty() {
            return Err(GaugebeatError::BadConfig("metrics must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for m in &self.metrics {
            if !seen.insert(m.name.as_str()) {
                return Err(GaugebeatError::BadConfig(format!("duplicate metric name: {}", m.name)));
            }
            for key in &m.labels {
                if !self.labels.contains_key(key) {
                    return Err(GaugebeatError::BadConfig(format!(
                        "metric {} uses label {key:?} which has no configured values",
                        m.name
                    )));
                }
            }
        }
        self.definitions()?;
        Ok(())
    }

    /// Build immutable definitions for every configured metric.
    pub fn definitions(&self) -> Result<Vec<Arc<MetricDefinition>>> {
        self.metrics
            .iter()
            .map(|m| {
                let range = ValueRange::new(m.min, m.max)
                    .map_err(|e| GaugebeatError::BadConfig(format!("metric {}: {e}", m.name)))?;
                MetricDefinition::new(m.name.clone(), m.help.clone(), m.labels.clone(), range)
                    .map(Arc::new)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen_host")]
    pub listen_host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// Decimal places kept by the uniform sampler.
    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            port: default_port(),
            interval_seconds: default_interval_seconds(),
            precision: default_precision(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.port == 0 {
            return Err(GaugebeatError::BadConfig("exporter.port must not be 0".into()));
        }
        if !(1..=86_400).contains(&self.interval_seconds) {
            return Err(GaugebeatError::BadConfig(
                "exporter.interval_seconds must be between 1 and 86400".into(),
            ));
        }
        if self.precision > 10 {
            return Err(GaugebeatError::BadConfig(
                "exporter.precision must be at most 10".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.listen_host.parse().map_err(|_| {
            GaugebeatError::BadConfig(format!(
                "exporter.listen_host must be an IP address: {}",
                self.listen_host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricConfig {
    pub name: String,
    #[serde(default)]
    pub help: String,
    #[serde(default = "default_metric_labels")]
    pub labels: Vec<String>,
    pub min: f64,
    pub max: f64,
}

impl MetricConfig {
    fn weather(name: &str, help: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            labels: default_metric_labels(),
            min,
            max,
        }
    }
}

fn default_listen_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_interval_seconds() -> u64 {
    20
}
fn default_precision() -> u32 {
    2
}
fn default_metric_labels() -> Vec<String> {
    vec!["city".into()]
}

fn default_labels() -> BTreeMap<String, Vec<String>> {
    let mut m = BTreeMap::new();
    m.insert(
        "city".to_string(),
        vec!["Astana".into(), "Almaty".into(), "Aktau".into()],
    );
    m
}

const WEATHER_GAUGES: [(&str, &str, f64, f64); 10] = [
    ("weather_temperature_celsius", "Current temperature in Celsius", -10.0, 35.0),
    ("weather_humidity_percent", "Current humidity percentage", 20.0, 100.0),
    ("weather_wind_speed_mps", "Wind speed in meters per second", 0.0, 15.0),
    ("weather_pressure_hpa", "Atmospheric pressure in hPa", 990.0, 1040.0),
    ("weather_rainfall_mm", "Rainfall in millimeters", 0.0, 10.0),
    ("weather_uv_index", "UV index level", 0.0, 12.0),
    ("weather_air_quality_index", "Air quality index (AQI)", 10.0, 150.0),
    ("weather_visibility_km", "Visibility in kilometers", 1.0, 10.0),
    ("weather_feels_like_celsius", "Feels-like temperature in Celsius", -10.0, 35.0),
    ("weather_condition_score", "Overall weather comfort score", 0.0, 100.0),
];

fn default_metrics() -> Vec<MetricConfig> {
    WEATHER_GAUGES
        .iter()
        .map(|&(name, help, min, max)| MetricConfig::weather(name, help, min, max))
        .collect()
}
