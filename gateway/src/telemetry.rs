//! Process-wide logging, error reporting and metrics setup.

use crate::config::{CommonConfig, MetricsConfig};
use argo_api::metrics_defs::ALL_METRICS;
use metrics_exporter_statsd::StatsdBuilder;
use shared::metrics_defs::describe_all;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const METRICS_PREFIX: &str = "argo_gateway";

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
    #[error("failed to initialize metrics exporter: {0}")]
    MetricsInit(String),
}

/// Keeps the Sentry client alive; events are flushed when dropped.
pub struct TelemetryGuard {
    _sentry: Option<sentry::ClientInitGuard>,
}

pub fn init(config: &CommonConfig) -> Result<TelemetryGuard, TelemetryError> {
    let logging = config.logging.as_ref();

    let sentry = logging
        .and_then(|logging| logging.sentry_dsn.as_deref())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        });

    let level = logging.map_or("info", |logging| logging.level.as_str());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Sentry layer is a no-op without an initialized client
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    if let Some(metrics) = &config.metrics {
        init_metrics(metrics)?;
    }

    Ok(TelemetryGuard { _sentry: sentry })
}

fn init_metrics(config: &MetricsConfig) -> Result<(), TelemetryError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    describe_all(ALL_METRICS).map_err(TelemetryError::MetricsInit)?;

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Reporting metrics to statsd"
    );
    Ok(())
}
