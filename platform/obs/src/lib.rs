//! Tracing setup for the HR suite binaries.

use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{self as sdk, Resource};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceCell<()> = OnceCell::new();

const SERVICE_NAME: &str = "hr-suite";
const DEFAULT_FILTER: &str = "info,tower_http=warn,sqlx=warn,sea_orm=warn";
const ENDPOINT_KEYS: [&str; 2] = ["OTLP_ENDPOINT", "OTEL_EXPORTER_OTLP_ENDPOINT"];

/// Resolved logging settings. Build with [`ObsConfig::from_env`] so that
/// `RUST_LOG` and the OTLP endpoint variables are honoured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObsConfig {
    pub service_name: &'static str,
    pub filter: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME,
            filter: DEFAULT_FILTER.to_string(),
            otlp_endpoint: None,
        }
    }
}

impl ObsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset. `OTLP_ENDPOINT` wins over the standard
    /// `OTEL_EXPORTER_OTLP_ENDPOINT`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            service_name: SERVICE_NAME,
            filter: get("RUST_LOG").unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            otlp_endpoint: ENDPOINT_KEYS.iter().find_map(|key| get(*key)),
        }
    }
}

/// Install the fmt subscriber, plus an OTLP span exporter when an endpoint is
/// configured. Calling this twice is a no-op.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(&config.filter)?;
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false));

    match &config.otlp_endpoint {
        Some(endpoint) => {
            let tracer = otlp_tracer(config.service_name, endpoint)?;
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()?;
        }
        None => registry.try_init()?,
    }

    INIT.set(())
        .map_err(|_| anyhow!("tracing already initialized"))?;
    tracing::debug!(
        service = config.service_name,
        filter = %config.filter,
        otlp = config.otlp_endpoint.is_some(),
        "tracing initialized"
    );
    Ok(())
}

fn otlp_tracer(service_name: &'static str, endpoint: &str) -> Result<sdk::trace::SdkTracer> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .build()?;
    let provider = sdk::trace::SdkTracerProvider::builder()
        .with_resource(Resource::builder().with_service_name(service_name).build())
        .with_batch_exporter(exporter)
        .build();
    Ok(provider.tracer(service_name))
}
