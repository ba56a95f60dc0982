//! Metric and dimension metadata from the backend.
//!
//! The builder entry point works from this catalog: which metrics exist,
//! which dimensions each supports, and which dimensions are time dimensions
//! (and therefore need a grain).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A dimension as described by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionMeta {
    pub name: String,

    /// Dimension type as reported by the backend, e.g. `CATEGORICAL` or
    /// `TIME`.
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl DimensionMeta {
    pub fn is_time(&self) -> bool {
        self.kind.eq_ignore_ascii_case("time")
    }
}

/// A metric as described by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricMeta {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub dimensions: Vec<DimensionMeta>,
}

/// The metrics available through the active connection.
#[derive(Debug, Clone, Default)]
pub struct MetricsCatalog {
    metrics: Vec<MetricMeta>,
}

impl MetricsCatalog {
    pub fn new(metrics: Vec<MetricMeta>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &[MetricMeta] {
        &self.metrics
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&MetricMeta> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Dimensions shared by every metric in `names`; the set a combined
    /// query can group by.
    pub fn shared_dimensions(&self, names: &[&str]) -> BTreeSet<String> {
        let mut iter = names
            .iter()
            .filter_map(|name| self.metric(name))
            .map(|metric| {
                metric
                    .dimensions
                    .iter()
                    .map(|d| d.name.clone())
                    .collect::<BTreeSet<_>>()
            });
        let Some(first) = iter.next() else {
            return BTreeSet::new();
        };
        iter.fold(first, |acc, next| acc.intersection(&next).cloned().collect())
    }

    pub fn is_time_dimension(&self, name: &str) -> bool {
        self.metrics
            .iter()
            .flat_map(|m| m.dimensions.iter())
            .any(|d| d.name == name && d.is_time())
    }
}
