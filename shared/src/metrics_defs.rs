//! Metric definitions shared by every crate that reports through the
//! `metrics` facade.
//!
//! Each crate declares its metrics as [`MetricDef`] constants and records them
//! with the [`counter!`] and [`histogram!`] macros, so names live in one
//! place.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

impl MetricDef {
    /// Registers the description with the installed recorder.
    pub fn describe(&self) {
        match self.metric_type {
            MetricType::Counter => metrics::describe_counter!(self.name, self.description),
            MetricType::Gauge => metrics::describe_gauge!(self.name, self.description),
            MetricType::Histogram => metrics::describe_histogram!(self.name, self.description),
        }
    }
}

/// Describes every metric in `defs`, rejecting duplicate names.
pub fn describe_all(defs: &[MetricDef]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for def in defs {
        if !seen.insert(def.name) {
            return Err(format!("metric {} is defined twice", def.name));
        }
        def.describe();
    }
    Ok(())
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
}
