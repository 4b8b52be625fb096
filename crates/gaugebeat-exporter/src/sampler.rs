//! Sample generators.
//!
//! The publish loop only knows the `SampleGenerator` capability; the random
//! source below is the default, anything deterministic or externally sourced
//! plugs in the same way.

use async_trait::async_trait;
use rand::distr::{Distribution, Uniform};

use gaugebeat_core::error::{GaugebeatError, Result};
use gaugebeat_core::LabeledSeries;

/// Produces the next value for a series. Calls are independent.
#[async_trait]
pub trait SampleGenerator: Send + Sync {
    fn name(&self) -> &'static str;
    async fn produce(&self, series: &LabeledSeries) -> Result<f64>;
}

/// Uniform value inside the metric's closed range, rounded to `precision` decimals.
#[derive(Debug, Clone, Copy)]
pub struct UniformSampler {
    precision: u32,
}

impl UniformSampler {
    pub fn new(precision: u32) -> Self {
        Self { precision }
    }
}

impl Default for UniformSampler {
    fn default() -> Self {
        Self::new(2)
    }
}

#[async_trait]
impl SampleGenerator for UniformSampler {
    fn name(&self) -> &'static str {
        "uniform"
    }

    async fn produce(&self, series: &LabeledSeries) -> Result<f64> {
        let range = series.definition().range();
        let dist = Uniform::new_inclusive(range.min, range.max).map_err(|e| {
            GaugebeatError::GeneratorFailure {
                series: series.to_string(),
                reason: format!("cannot sample [{}, {}]: {e}", range.min, range.max),
            }
        })?;
        let raw = dist.sample(&mut rand::rng());
        Ok(round_to(raw, self.precision).clamp(range.min, range.max))
    }
}

/// Closure-backed generator.
pub struct FnSampler<F> {
    f: F,
}

impl<F> FnSampler<F>
where
    F: Fn(&LabeledSeries) -> Result<f64> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> SampleGenerator for FnSampler<F>
where
    F: Fn(&LabeledSeries) -> Result<f64> + Send + Sync,
{
    fn name(&self) -> &'static str {
        "fn"
    }

    async fn produce(&self, series: &LabeledSeries) -> Result<f64> {
        (self.f)(series)
    }
}

/// Round to `precision` decimals. Values too large to scale are returned as is.
pub fn round_to(v: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    let scaled = v * scale;
    if !scaled.is_finite() {
        return v;
    }
    scaled.round() / scale
}
