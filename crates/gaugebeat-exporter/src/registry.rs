//! Thread-safe gauge registry.
//!
//! Every series is registered at startup and owns one `AtomicU64` holding the
//! `f64` bit pattern of its latest value, so a reader sees either the old or
//! the new value of a series, never a mix. NaN is never accepted by `set`,
//! which lets the NaN bit pattern mark "registered, not yet sampled".
//!
//! Families live in a `DashMap` keyed by metric name; series within a family
//! are keyed by their label values. Snapshots copy atomics only and never
//! take a write lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use gaugebeat_core::error::{GaugebeatError, Result};
use gaugebeat_core::exposition::{FamilySnapshot, Sample, Snapshot};
use gaugebeat_core::model::label_combinations;
use gaugebeat_core::{LabeledSeries, MetricDefinition};

const UNSET: u64 = 0x7ff8_0000_0000_0000; // f64::NAN

struct Family {
    def: Arc<MetricDefinition>,
    order: usize,
    series: DashMap<Vec<String>, AtomicU64>,
}

#[derive(Default)]
pub struct MetricRegistry {
    families: DashMap<String, Family>,
    next_order: AtomicUsize,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every definition crossed with every label combination from `universe`.
    pub fn with_universe(
        defs: &[Arc<MetricDefinition>],
        universe: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self> {
        let registry = Self::new();
        for def in defs {
            registry.register(Arc::clone(def))?;
            for values in label_combinations(def.label_keys(), universe)? {
                registry.register_series(def.name(), values)?;
            }
        }
        Ok(registry)
    }

    /// Add a metric family. Names are unique.
    pub fn register(&self, def: Arc<MetricDefinition>) -> Result<()> {
        let name = def.name().to_string();
        match self.families.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(GaugebeatError::BadConfig(format!(
                "metric already registered: {}",
                e.key()
            ))),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let order = self.next_order.fetch_add(1, Ordering::Relaxed);
                e.insert(Family { def, order, series: DashMap::new() });
                Ok(())
            }
        }
    }

    /// Add one series to an already registered family. Re-registering is a no-op.
    pub fn register_series(
        &self,
        metric: &str,
        label_values: Vec<String>,
    ) -> Result<LabeledSeries> {
        let fam = self.families.get(metric).ok_or_else(|| {
            GaugebeatError::UnknownSeries(format!("metric not registered: {metric}"))
        })?;
        let series = LabeledSeries::new(Arc::clone(&fam.def), label_values)?;
        fam.series
            .entry(series.label_values().to_vec())
            .or_insert_with(|| AtomicU64::new(UNSET));
        Ok(series)
    }

    pub fn definition(&self, metric: &str) -> Option<Arc<MetricDefinition>> {
        self.families.get(metric).map(|f| Arc::clone(&f.def))
    }

    /// All registered series, grouped by family in registration order.
    pub fn series(&self) -> Vec<LabeledSeries> {
        let mut fams: Vec<(usize, Vec<LabeledSeries>)> = self
            .families
            .iter()
            .map(|f| {
                let mut keys: Vec<Vec<String>> = f.series.iter().map(|s| s.key().clone()).collect();
                keys.sort();
                let list = keys
                    .into_iter()
                    .filter_map(|k| LabeledSeries::new(Arc::clone(&f.def), k).ok())
                    .collect();
                (f.order, list)
            })
            .collect();
        fams.sort_by_key(|(order, _)| *order);
        fams.into_iter().flat_map(|(_, list)| list).collect()
    }

    /// Overwrite the value of one series.
    pub fn set(&self, series: &LabeledSeries, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(GaugebeatError::InvalidValue { series: series.to_string(), value });
        }
        let fam = self
            .families
            .get(series.metric())
            .filter(|f| *f.def == **series.definition())
            .ok_or_else(|| GaugebeatError::UnknownSeries(series.to_string()))?;
        let slot = fam
            .series
            .get(series.label_values())
            .ok_or_else(|| GaugebeatError::UnknownSeries(series.to_string()))?;
        slot.store(value.to_bits(), Ordering::Release);
        Ok(())
    }

    /// Current value, if the series has been set at least once.
    pub fn get(&self, series: &LabeledSeries) -> Option<f64> {
        let fam = self.families.get(series.metric())?;
        let slot = fam.series.get(series.label_values())?;
        load(&slot)
    }

    /// Copy of every series that carries a value.
    pub fn snapshot(&self) -> Snapshot {
        let mut families: Vec<(usize, FamilySnapshot)> = self
            .families
            .iter()
            .map(|f| {
                let mut samples: Vec<Sample> = f
                    .series
                    .iter()
                    .filter_map(|s| {
                        load(s.value()).map(|value| Sample { label_values: s.key().clone(), value })
                    })
                    .collect();
                samples.sort_by(|a, b| a.label_values.cmp(&b.label_values));
                (
                    f.order,
                    FamilySnapshot {
                        name: f.def.name().to_string(),
                        help: f.def.help().to_string(),
                        label_keys: f.def.label_keys().to_vec(),
                        samples,
                    },
                )
            })
            .collect();
        families.sort_by_key(|(order, _)| *order);
        Snapshot { families: families.into_iter().map(|(_, f)| f).collect() }
    }
}

fn load(slot: &AtomicU64) -> Option<f64> {
    let v = f64::from_bits(slot.load(Ordering::Acquire));
    if v.is_nan() { None } else { Some(v) }
}
