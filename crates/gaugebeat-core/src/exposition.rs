//! Snapshot types and the Prometheus text exposition encoder (format 0.0.4).
//!
//! Each family renders a `# HELP` / `# TYPE` preamble followed by one line per
//! series. Families without samples render nothing, so an empty snapshot
//! encodes to an empty body.

use std::fmt::Write;

/// Content type served alongside `encode` output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// One series' value at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label_values: Vec<String>,
    pub value: f64,
}

/// All current samples of one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySnapshot {
    pub name: String,
    pub help: String,
    pub label_keys: Vec<String>,
    pub samples: Vec<Sample>,
}

/// Point-in-time copy of a registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub families: Vec<FamilySnapshot>,
}

impl Snapshot {
    /// Total number of series carrying a value.
    pub fn series_count(&self) -> usize {
        self.families.iter().map(|f| f.samples.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series_count() == 0
    }

    /// Look up one series' value.
    pub fn value(&self, metric: &str, label_values: &[&str]) -> Option<f64> {
        let fam = self.families.iter().find(|f| f.name == metric)?;
        fam.samples
            .iter()
            .find(|s| {
                s.label_values
                    .iter()
                    .map(String::as_str)
                    .eq(label_values.iter().copied())
            })
            .map(|s| s.value)
    }
}

/// Escape a label value (`\`, `"`, newline).
pub fn escape_label_value(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escape help text (`\`, newline).
pub fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Shortest round-trip float form; integral values keep a `.0`.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else {
        format!("{v:?}")
    }
}

/// Render a snapshot in text exposition format.
pub fn encode(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for fam in &snapshot.families {
        encode_family(fam, &mut out);
    }
    out
}

fn encode_family(fam: &FamilySnapshot, out: &mut String) {
    if fam.samples.is_empty() {
        return;
    }
    let _ = writeln!(out, "# HELP {} {}", fam.name, escape_help(&fam.help));
    let _ = writeln!(out, "# TYPE {} gauge", fam.name);
    for s in &fam.samples {
        let label_str = fam
            .label_keys
            .iter()
            .zip(&s.label_values)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
            .collect::<Vec<_>>()
            .join(",");
        if label_str.is_empty() {
            let _ = writeln!(out, "{} {}", fam.name, format_value(s.value));
        } else {
            let _ = writeln!(out, "{}{{{}}} {}", fam.name, label_str, format_value(s.value));
        }
    }
}
