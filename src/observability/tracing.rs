use anyhow::{Context, Error, Result};
use once_cell::sync::OnceCell;
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracer, SdkTracerProvider},
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

use super::structured_log::StructuredLogLayer;

const SERVICE_NAME: &str = "tagmap-worker";

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// OTLP エクスポートの設定。
#[derive(Debug, Clone, Default)]
pub struct TracingSettings {
    pub otlp_endpoint: Option<String>,
    pub sampling_ratio: f64,
}

/// Tracing サブスクライバを一度だけ初期化する。
///
/// エンドポイントがあれば OTLP レイヤーを追加する。無い場合、もしくは
/// エクスポーターの構築に失敗した場合は StructuredLogLayer を使う。
///
/// # Errors
/// サブスクライバの初期化に失敗した場合はエラーを返す。
pub fn init(settings: &TracingSettings) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false).json();

        let tracer = settings
            .otlp_endpoint
            .as_deref()
            .map(|endpoint| init_tracer(endpoint, settings.sampling_ratio));

        match tracer {
            Some(Ok(tracer)) => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(tracing_opentelemetry::layer().with_tracer(tracer))
                    .try_init()
                    .map_err(|e: TryInitError| Error::msg(e.to_string()))?;
                info!(
                    otel_enabled = true,
                    service = SERVICE_NAME,
                    sampling_ratio = settings.sampling_ratio,
                    "tracing initialized with OpenTelemetry"
                );
            }
            fallback => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(StructuredLogLayer)
                    .try_init()
                    .map_err(|e: TryInitError| Error::msg(e.to_string()))?;
                if let Some(Err(e)) = fallback {
                    info!(otel_enabled = false, error = %e, "OTLP exporter unavailable");
                }
                info!(otel_enabled = false, service = SERVICE_NAME, "tracing initialized");
            }
        }

        Ok::<(), Error>(())
    })?;
    Ok(())
}

/// OTLP (gRPC) エクスポーター付きのトレーサーを作る。
fn init_tracer(endpoint: &str, sampling_ratio: f64) -> Result<SdkTracer> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to build OTLP span exporter")?;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build();

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::TraceIdRatioBased(sampling_ratio.clamp(0.0, 1.0)))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .build();

    let tracer = tracer_provider.tracer(SERVICE_NAME);
    global::set_tracer_provider(tracer_provider);

    Ok(tracer)
}
