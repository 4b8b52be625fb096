//! Metric definitions and labeled series identity.
//!
//! A `MetricDefinition` is created once at startup and never changes. A
//! `LabeledSeries` pairs a definition with one concrete tuple of label values,
//! ordered like the definition's label keys.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{GaugebeatError, Result};

/// Closed numeric range `[min, max]` a metric's samples are drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(GaugebeatError::BadConfig(format!(
                "range bounds must be finite (min={min}, max={max})"
            )));
        }
        if min > max {
            return Err(GaugebeatError::BadConfig(format!(
                "range min must not exceed max (min={min}, max={max})"
            )));
        }
        if !(max - min).is_finite() {
            return Err(GaugebeatError::BadConfig(format!(
                "range width must be finite (min={min}, max={max})"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Immutable description of one gauge family.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    name: String,
    help: String,
    label_keys: Vec<String>,
    range: ValueRange,
}

impl MetricDefinition {
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        label_keys: Vec<String>,
        range: ValueRange,
    ) -> Result<Self> {
        let name = name.into();
        if !is_valid_metric_name(&name) {
            return Err(GaugebeatError::BadConfig(format!("invalid metric name: {name:?}")));
        }
        for (i, k) in label_keys.iter().enumerate() {
            if !is_valid_label_key(k) {
                return Err(GaugebeatError::BadConfig(format!(
                    "metric {name}: invalid label key {k:?}"
                )));
            }
            if label_keys[..i].contains(k) {
                return Err(GaugebeatError::BadConfig(format!(
                    "metric {name}: duplicate label key {k:?}"
                )));
            }
        }
        Ok(Self { name, help: help.into(), label_keys, range })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_keys(&self) -> &[String] {
        &self.label_keys
    }

    pub fn range(&self) -> ValueRange {
        self.range
    }
}

/// One concrete time series: a metric plus its label values.
#[derive(Debug, Clone)]
pub struct LabeledSeries {
    def: Arc<MetricDefinition>,
    label_values: Vec<String>,
}

impl LabeledSeries {
    /// Label values must line up one-to-one with the definition's label keys.
    pub fn new(def: Arc<MetricDefinition>, label_values: Vec<String>) -> Result<Self> {
        if label_values.len() != def.label_keys().len() {
            return Err(GaugebeatError::UnknownSeries(format!(
                "{}: expected {} label values, got {}",
                def.name(),
                def.label_keys().len(),
                label_values.len()
            )));
        }
        Ok(Self { def, label_values })
    }

    pub fn metric(&self) -> &str {
        self.def.name()
    }

    pub fn definition(&self) -> &Arc<MetricDefinition> {
        &self.def
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// `(key, value)` pairs in label-key order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.def
            .label_keys()
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }
}

impl PartialEq for LabeledSeries {
    fn eq(&self, other: &Self) -> bool {
        self.metric() == other.metric() && self.label_values == other.label_values
    }
}

impl Eq for LabeledSeries {}

impl fmt::Display for LabeledSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric())?;
        if self.label_values.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (k, v)) in self.labels().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v:?}")?;
        }
        f.write_str("}")
    }
}

/// Every combination of label values for `keys`, drawn from `universe`.
///
/// Combinations are produced in lexicographic order of the key positions, so
/// the first key varies slowest. A metric without label keys yields a single
/// empty combination.
pub fn label_combinations(
    keys: &[String],
    universe: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<Vec<String>>> {
    let mut out: Vec<Vec<String>> = vec![Vec::new()];
    for key in keys {
        let values = universe
            .get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                GaugebeatError::BadConfig(format!("no values configured for label {key:?}"))
            })?;

        let mut next = Vec::with_capacity(out.len() * values.len());
        for prefix in &out {
            for v in values {
                let mut combo = prefix.clone();
                combo.push(v.clone());
                next.push(combo);
            }
        }
        out = next;
    }
    Ok(out)
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn is_valid_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, excluding the reserved `__` prefix.
pub fn is_valid_label_key(s: &str) -> bool {
    if s.starts_with("__") {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
