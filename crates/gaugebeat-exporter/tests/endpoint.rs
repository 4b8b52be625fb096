#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use gaugebeat_core::LabeledSeries;
use gaugebeat_exporter::app_state::AppState;
use gaugebeat_exporter::config;
use gaugebeat_exporter::ops;
use gaugebeat_exporter::sampler::{FnSampler, UniformSampler};
use gaugebeat_exporter::server;

const TWO_BY_TWO: &str = r#"
version: 1
labels:
  city: [Astana, Almaty]
metrics:
  - name: weather_temperature_celsius
    help: Current temperature in Celsius
    min: -10
    max: 35
  - name: weather_humidity_percent
    help: Current humidity percentage
    min: 20
    max: 100
"#;

fn state(yaml: &str) -> AppState {
    AppState::new(config::load_from_str(yaml).unwrap()).unwrap()
}

async fn body_of(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn data_lines(body: &str) -> Vec<&str> {
    body.lines().filter(|l| !l.starts_with('#') && !l.is_empty()).collect()
}

#[tokio::test]
async fn empty_registry_serves_empty_body() {
    let st = state(TWO_BY_TWO);
    let resp = ops::metrics(State(st)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[axum::http::header::CONTENT_TYPE],
        "text/plain; version=0.0.4; charset=utf-8"
    );
    assert_eq!(body_of(resp).await, "");
}

#[tokio::test]
async fn exact_line_for_a_set_series() {
    let st = state(TWO_BY_TWO);
    let registry = st.registry();
    let def = registry.definition("weather_temperature_celsius").unwrap();
    let series = LabeledSeries::new(def, vec!["Astana".into()]).unwrap();
    registry.set(&series, 21.5).unwrap();

    let body = body_of(ops::metrics(State(st)).await).await;
    assert!(body.lines().any(|l| l == r#"weather_temperature_celsius{city="Astana"} 21.5"#));
    assert!(body.contains("# HELP weather_temperature_celsius Current temperature in Celsius\n"));
    assert!(body.contains("# TYPE weather_temperature_celsius gauge\n"));
    assert!(!body.contains("weather_humidity_percent"));
}

#[tokio::test]
async fn one_tick_two_metrics_two_labels_gives_four_lines() {
    let st = state(TWO_BY_TWO);
    st.publish_loop(Arc::new(UniformSampler::default())).tick().await;

    let body = body_of(ops::metrics(State(st.clone())).await).await;
    let lines = data_lines(&body);
    assert_eq!(lines.len(), 4, "{body}");

    for line in lines {
        let (series, value) = line.rsplit_once(' ').unwrap();
        let value: f64 = value.parse().unwrap();
        let (min, max) = if series.starts_with("weather_temperature_celsius{") {
            (-10.0, 35.0)
        } else {
            assert!(series.starts_with("weather_humidity_percent{"), "{series}");
            (20.0, 100.0)
        };
        assert!((min..=max).contains(&value), "{line}");
    }

    // series of one metric are contiguous
    let names: Vec<&str> = data_lines(&body)
        .into_iter()
        .map(|l| l.split('{').next().unwrap())
        .collect();
    let switches = names.windows(2).filter(|w| w[0] != w[1]).count();
    assert_eq!(switches, 1);

    // reads without an intervening tick are identical
    let again = body_of(ops::metrics(State(st)).await).await;
    assert_eq!(body, again);
}

#[tokio::test]
async fn readiness_follows_first_tick_and_draining() {
    let st = state(TWO_BY_TWO);
    let status = |r: axum::response::Response| r.status();

    assert_eq!(status(ops::healthz().await.into_response()), StatusCode::OK);
    assert_eq!(
        status(ops::readyz(State(st.clone())).await.into_response()),
        StatusCode::SERVICE_UNAVAILABLE
    );

    st.publish_loop(Arc::new(UniformSampler::default())).tick().await;
    assert_eq!(status(ops::readyz(State(st.clone())).await.into_response()), StatusCode::OK);

    st.set_draining();
    assert_eq!(
        status(ops::readyz(State(st)).await.into_response()),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn served_over_http_until_cancelled() {
    let st = state(TWO_BY_TWO);
    let listener = server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server::serve(
        listener,
        st.clone(),
        Arc::new(UniformSampler::default()),
        shutdown.clone(),
    ));

    while !st.is_ready() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_string(&mut raw))
        .await
        .expect("response in time")
        .unwrap();

    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    let (_, body) = raw.split_once("\r\n\r\n").unwrap();
    assert_eq!(data_lines(body).len(), 4);

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("serve stops after cancel")
        .unwrap();
    assert!(result.is_ok(), "{result:?}");
    assert!(st.is_draining());
}

#[tokio::test]
async fn port_in_use_is_a_bind_error() {
    let held = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = held.local_addr().unwrap();

    let err = server::bind(addr).await.expect_err("port already taken");
    assert_eq!(err.kind().as_str(), "BIND");
    assert!(err.to_string().contains(&addr.to_string()), "{err}");
}

#[tokio::test]
async fn crashed_publish_loop_stops_serving_with_error() {
    let st = state(TWO_BY_TWO);
    let listener = server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let sampler = FnSampler::new(|_: &LabeledSeries| -> gaugebeat_core::Result<f64> {
        panic!("sensor driver crashed")
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        server::serve(listener, st.clone(), Arc::new(sampler), CancellationToken::new()),
    )
    .await
    .expect("serve returns once the loop dies")
    .expect_err("crash must surface");

    assert_eq!(err.kind().as_str(), "INTERNAL");
    assert!(st.is_draining());
}
