//! Periodic publish loop.
//!
//! Each tick samples every registered series concurrently and writes the
//! results into the registry. A failing series is logged and skipped for that
//! tick; it never stops the loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use gaugebeat_core::error::{ErrorKind, GaugebeatError};

use crate::registry::MetricRegistry;
use crate::sampler::SampleGenerator;

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub updated: usize,
    pub failed: usize,
}

pub struct PublishLoop {
    registry: Arc<MetricRegistry>,
    sampler: Arc<dyn SampleGenerator>,
    interval: Duration,
    ticks: Arc<AtomicU64>,
}

impl PublishLoop {
    pub fn new(
        registry: Arc<MetricRegistry>,
        sampler: Arc<dyn SampleGenerator>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            sampler,
            interval,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Share an externally owned completed-tick counter (readiness uses it).
    pub fn with_tick_counter(mut self, ticks: Arc<AtomicU64>) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of ticks completed so far.
    pub fn completed_ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Sample and store every registered series once.
    pub async fn tick(&self) -> TickReport {
        let mut futs = FuturesUnordered::new();
        for series in self.registry.series() {
            let sampler = Arc::clone(&self.sampler);
            futs.push(async move {
                let res = sampler.produce(&series).await;
                (series, res)
            });
        }

        let mut report = TickReport::default();
        while let Some((series, res)) = futs.next().await {
            match res.and_then(|v| self.registry.set(&series, v)) {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    report.failed += 1;
                    log_series_error(&series.to_string(), &e);
                }
            }
        }

        self.ticks.fetch_add(1, Ordering::AcqRel);
        report
    }

    /// Tick immediately, then every `interval` until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            sampler = self.sampler.name(),
            "publish loop started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            let report = tokio::select! {
                _ = shutdown.cancelled() => break,
                r = self.tick() => r,
            };

            if report.failed > 0 {
                tracing::warn!(
                    updated = report.updated,
                    failed = report.failed,
                    "tick completed with failures"
                );
            } else {
                tracing::debug!(updated = report.updated, "tick completed");
            }
        }

        tracing::info!(ticks = self.completed_ticks(), "publish loop stopped");
    }
}

fn log_series_error(series: &str, e: &GaugebeatError) {
    let kind = e.kind();
    match kind {
        ErrorKind::UnknownSeries => {
            tracing::error!(
                %series,
                kind = kind.as_str(),
                error = %e,
                "series not registered, skipped"
            )
        }
        _ => tracing::warn!(
            %series,
            kind = kind.as_str(),
            error = %e,
            "sample dropped for this tick"
        ),
    }
}
