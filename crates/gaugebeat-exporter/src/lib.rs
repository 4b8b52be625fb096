//! gaugebeat exporter library entry.
//!
//! Wires the config loader, metric registry, sample generators, publish loop,
//! and HTTP endpoints. Consumed by the binary (`main.rs`) and integration tests.

pub mod app_state;
pub mod config;
pub mod ops;
pub mod publisher;
pub mod registry;
pub mod router;
pub mod sampler;
pub mod server;
