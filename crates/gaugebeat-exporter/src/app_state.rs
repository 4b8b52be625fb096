//! Shared application state for the exporter.
//!
//! Built once at startup from a validated config and handed to both the
//! publish loop and the HTTP handlers. There is no ambient global state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gaugebeat_core::error::Result;

use crate::config::ExporterConfig;
use crate::publisher::PublishLoop;
use crate::registry::MetricRegistry;
use crate::sampler::SampleGenerator;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    registry: Arc<MetricRegistry>,
    ticks: Arc<AtomicU64>,
    draining: AtomicBool,
}

impl AppState {
    /// Register every configured metric x label combination.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        let defs = cfg.definitions()?;
        let registry = MetricRegistry::with_universe(&defs, &cfg.labels)?;

        tracing::info!(
            metrics = defs.len(),
            series = registry.series().len(),
            "metric registry initialised"
        );

        Ok(Self::with_registry(cfg, Arc::new(registry)))
    }

    pub fn with_registry(cfg: ExporterConfig, registry: Arc<MetricRegistry>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                ticks: Arc::new(AtomicU64::new(0)),
                draining: AtomicBool::new(false),
            }),
        }
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.inner.registry)
    }

    /// Publish loop wired to this state's registry and tick counter.
    pub fn publish_loop(&self, sampler: Arc<dyn SampleGenerator>) -> PublishLoop {
        let interval = Duration::from_secs(self.inner.cfg.exporter.interval_seconds);
        PublishLoop::new(self.registry(), sampler, interval)
            .with_tick_counter(Arc::clone(&self.inner.ticks))
    }

    /// Ready once the first tick has completed.
    pub fn is_ready(&self) -> bool {
        self.inner.ticks.load(Ordering::Acquire) > 0
    }

    pub fn set_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
    }

    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }
}
