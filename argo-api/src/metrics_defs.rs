//! Metrics definitions for the gateway API.

use shared::metrics_defs::{MetricDef, MetricType};

pub const ARGO_LOGIN: MetricDef = MetricDef {
    name: "argo.login",
    metric_type: MetricType::Counter,
    description: "Number of login exchanges performed against ArgoCD instances",
};

pub const ARGO_DELETE_DURATION: MetricDef = MetricDef {
    name: "argo.delete.duration",
    metric_type: MetricType::Histogram,
    description: "Time to run an application and project deletion in seconds",
};

pub const ARGO_DELETE_POLL_ATTEMPTS: MetricDef = MetricDef {
    name: "argo.delete.poll_attempts",
    metric_type: MetricType::Histogram,
    description: "Number of polls made while waiting for an application to disappear",
};

pub const ARGO_DELETE_PENDING: MetricDef = MetricDef {
    name: "argo.delete.pending",
    metric_type: MetricType::Counter,
    description: "Number of deletions that gave up with the application pending delete",
};

pub const ARGO_SYNC_APPS: MetricDef = MetricDef {
    name: "argo.sync.apps",
    metric_type: MetricType::Counter,
    description: "Number of applications a sync was triggered for",
};

pub const ALL_METRICS: &[MetricDef] = &[
    ARGO_LOGIN,
    ARGO_DELETE_DURATION,
    ARGO_DELETE_POLL_ATTEMPTS,
    ARGO_DELETE_PENDING,
    ARGO_SYNC_APPS,
];
