#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use gaugebeat_exporter::config::{self, ExporterConfig};

fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
exporter:
  port: 8000
  intervall_seconds: 5 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config_uses_source_defaults() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.exporter.port, 8000);
    assert_eq!(cfg.exporter.interval_seconds, 20);
    assert_eq!(cfg.exporter.precision, 2);
    assert_eq!(cfg.labels["city"], vec!["Astana", "Almaty", "Aktau"]);
    assert_eq!(cfg.metrics.len(), 10);

    let defs = cfg.definitions().unwrap();
    let temp = defs.iter().find(|d| d.name() == "weather_temperature_celsius").unwrap();
    assert_eq!(temp.range().min, -10.0);
    assert_eq!(temp.range().max, 35.0);
    assert_eq!(temp.label_keys(), ["city".to_string()]);
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.kind().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn rejects_bad_metric_sets() {
    let dup = r#"
version: 1
metrics:
  - { name: m, min: 0, max: 1 }
  - { name: m, min: 0, max: 1 }
"#;
    assert_eq!(config::load_from_str(dup).expect_err("dup").kind().as_str(), "BAD_CONFIG");

    let inverted = r#"
version: 1
metrics:
  - { name: m, min: 5, max: 1 }
"#;
    assert_eq!(config::load_from_str(inverted).expect_err("range").kind().as_str(), "BAD_CONFIG");

    let too_wide = r#"
version: 1
metrics:
  - { name: wide, min: -1.0e308, max: 1.0e308 }
  - { name: ok_metric, min: 0, max: 1 }
"#;
    assert_eq!(config::load_from_str(too_wide).expect_err("width").kind().as_str(), "BAD_CONFIG");

    let missing_label = r#"
version: 1
metrics:
  - { name: m, labels: [region], min: 0, max: 1 }
"#;
    let err = config::load_from_str(missing_label).expect_err("label");
    assert_eq!(err.kind().as_str(), "BAD_CONFIG");

    let bad_name = r#"
version: 1
metrics:
  - { name: "9lives", min: 0, max: 1 }
"#;
    assert_eq!(config::load_from_str(bad_name).expect_err("name").kind().as_str(), "BAD_CONFIG");
}

#[test]
fn rejects_out_of_range_exporter_section() {
    let zero_interval = "version: 1\nexporter: { interval_seconds: 0 }\n";
    assert!(config::load_from_str(zero_interval).is_err());

    let bad_host = "version: 1\nexporter: { listen_host: localhost }\n";
    assert!(config::load_from_str(bad_host).is_err());
}

#[test]
fn custom_universe_and_metrics() {
    let ok = r#"
version: 1
exporter:
  listen_host: "127.0.0.1"
  port: 9100
labels:
  city: [Paris]
  zone: [north, south]
metrics:
  - name: grid_load_ratio
    help: Grid load
    labels: [city, zone]
    min: 0
    max: 1
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.exporter.listen_addr().unwrap().to_string(), "127.0.0.1:9100");
    assert_eq!(cfg.metrics[0].labels, vec!["city", "zone"]);
}

#[test]
fn env_overrides_apply_on_top_of_defaults() {
    let cfg = config::load_with_env(env(&[
        ("GAUGEBEAT_PORT", "9200"),
        ("GAUGEBEAT_INTERVAL_SECONDS", "5"),
        ("GAUGEBEAT_LABEL_CITY", "Shymkent, Taraz"),
        ("PATH", "/usr/bin"),
    ]))
    .expect("must load");

    assert_eq!(cfg.exporter.port, 9200);
    assert_eq!(cfg.exporter.interval_seconds, 5);
    assert_eq!(cfg.labels["city"], vec!["Shymkent", "Taraz"]);
}

#[test]
fn env_override_parse_failure_is_bad_config() {
    let mut cfg = ExporterConfig::default();
    let err = config::apply_env(&mut cfg, env(&[("GAUGEBEAT_PORT", "eighty")]))
        .expect_err("must fail");
    assert_eq!(err.kind().as_str(), "BAD_CONFIG");
}

#[test]
fn env_override_cannot_empty_a_label() {
    let err = config::load_with_env(env(&[("GAUGEBEAT_LABEL_CITY", " , ")]))
        .expect_err("must fail");
    assert_eq!(err.kind().as_str(), "BAD_CONFIG");
}

#[test]
fn missing_config_file_is_bad_config() {
    let err = config::load_with_env(env(&[("GAUGEBEAT_CONFIG", "/nonexistent/gaugebeat.yaml")]))
        .expect_err("must fail");
    assert_eq!(err.kind().as_str(), "BAD_CONFIG");
}
