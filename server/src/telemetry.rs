//! Logging and trace export.
//!
//! Console logging is always on. Spans and log events are also exported over
//! OTLP when a collector endpoint is configured and reachable.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Keeps the OTLP providers alive; flushes them on shutdown.
#[derive(Default)]
pub struct Telemetry {
    providers: Option<(SdkTracerProvider, SdkLoggerProvider)>,
}

impl Telemetry {
    pub fn shutdown(self) {
        if let Some((traces, logs)) = self.providers {
            if let Err(e) = traces.shutdown() {
                tracing::warn!(error = %e, "Failed to flush traces");
            }
            if let Err(e) = logs.shutdown() {
                tracing::warn!(error = %e, "Failed to flush logs");
            }
        }
    }
}

/// Filter from `RUST_LOG` when set, else from `LOG_LEVEL`. Returns a notice to
/// log once the subscriber is up when `LOG_LEVEL` had to be ignored.
fn env_filter(log_level: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return (filter, None);
    }
    match log_level.map(str::to_ascii_lowercase) {
        Some(level) if LOG_LEVELS.contains(&level.as_str()) => (EnvFilter::new(level), None),
        Some(level) => (
            EnvFilter::new("info"),
            Some(format!(
                "LOG_LEVEL '{level}' is not one of {}, using info",
                LOG_LEVELS.join("|")
            )),
        ),
        None => (
            EnvFilter::new("info"),
            Some("LOG_LEVEL not set, using info".to_string()),
        ),
    }
}

/// Quick TCP check so an absent collector does not stall every export.
fn collector_reachable(endpoint: &str) -> bool {
    let host_port = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');

    host_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
        .unwrap_or(false)
}

pub fn init(config: &Config) -> anyhow::Result<Telemetry> {
    let fmt_layer = tracing_subscriber::fmt::layer();
    let (env_filter, notice) = env_filter(config.log_level.as_deref());

    let endpoint = config
        .otel_endpoint
        .as_deref()
        .filter(|endpoint| collector_reachable(endpoint));

    let telemetry = if let Some(endpoint) = endpoint {
        let resource = opentelemetry_sdk::Resource::builder()
            .with_service_name(config.otel_service_name.clone())
            .build();

        let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;
        let trace_provider = SdkTracerProvider::builder()
            .with_batch_exporter(trace_exporter)
            .with_resource(resource.clone())
            .build();
        let tracer = trace_provider.tracer("cacahuete-server");
        opentelemetry::global::set_tracer_provider(trace_provider.clone());

        let log_exporter = opentelemetry_otlp::LogExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;
        let log_provider = SdkLoggerProvider::builder()
            .with_batch_exporter(log_exporter)
            .with_resource(resource)
            .build();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .with(OpenTelemetryTracingBridge::new(&log_provider))
            .try_init()?;

        tracing::info!(
            "OpenTelemetry enabled, exporting traces and logs to {} as {}",
            endpoint,
            config.otel_service_name
        );
        Telemetry {
            providers: Some((trace_provider, log_provider)),
        }
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        match &config.otel_endpoint {
            Some(endpoint) => tracing::info!(
                "OpenTelemetry endpoint {} not reachable, using console logging only",
                endpoint
            ),
            None => tracing::debug!(
                "OTEL_EXPORTER_OTLP_ENDPOINT not set, using console logging only"
            ),
        }
        Telemetry::default()
    };

    if let Some(notice) = notice {
        tracing::info!("{notice}");
    }
    Ok(telemetry)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RUST_LOG is not set under `cargo test` unless the developer sets it.
    fn filter_for(level: Option<&str>) -> Option<String> {
        if std::env::var_os("RUST_LOG").is_some() {
            return None;
        }
        Some(env_filter(level).0.to_string())
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        if let Some(filter) = filter_for(Some("DEBUG")) {
            assert_eq!(filter, "debug");
        }
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let (filter, notice) = env_filter(Some("chatty"));
        assert_eq!(filter.to_string(), "info");
        assert!(notice.unwrap().contains("chatty"));
    }

    #[test]
    fn test_unreachable_collector() {
        assert!(!collector_reachable("http://"));
        assert!(!collector_reachable("not a host"));
    }
}
