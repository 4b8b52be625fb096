//! gaugebeat core: metric model, series identity, and the text exposition encoder.
//!
//! This crate defines the data contracts shared by the exporter and its tests.
//! It carries no runtime or transport dependencies.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here; every fallible path
//! surfaces as `GaugebeatError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;
pub mod model;

/// Shared result type.
pub use error::{ErrorKind, GaugebeatError, Result};
pub use model::{LabeledSeries, MetricDefinition, ValueRange};
