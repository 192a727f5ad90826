//! entitlement-gate server
//!
//! Startup order: configuration, logging, database, plan catalog, usage
//! ledger, HTTP. A catalog without its default plan aborts startup before the
//! listener is bound.

use std::process::ExitCode;
use std::sync::Arc;

use axum::http::HeaderValue;
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use entitlement_gate::adapters::http::{api_router, EntitlementAppState};
use entitlement_gate::adapters::postgres::{
    PostgresOrganizationReader, PostgresPlanSource, PostgresSubscriptionStore,
};
use entitlement_gate::adapters::{
    InMemoryUsageLedger, PostgresUsageLedger, RedisUsageLedger, YamlPlanSource,
};
use entitlement_gate::application::{
    load_catalog, EntitlementResolver, EntitlementService, FeatureGate,
};
use entitlement_gate::config::{AppConfig, LedgerBackend, RedisConfig, ServerConfig};
use entitlement_gate::ports::{PlanSource, UsageLedger};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.server);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "entitlement-gate failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(server: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| server.log_level.as_str().into());

    if server.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config: AppConfig) -> Result<(), BoxError> {
    config.validate()?;
    let addr = config.server.socket_addr()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    tracing::info!("Connected to PostgreSQL");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let plan_source: Box<dyn PlanSource> = match &config.entitlements.catalog_path {
        Some(path) => Box::new(YamlPlanSource::new(path.clone())),
        None => Box::new(PostgresPlanSource::new(pool.clone())),
    };
    let catalog = Arc::new(load_catalog(plan_source.as_ref(), &config.entitlements.default_plan).await?);

    let ledger = usage_ledger(&config, &pool).await?;
    let subscriptions = Arc::new(PostgresSubscriptionStore::new(pool.clone()));
    let organizations = Arc::new(PostgresOrganizationReader::new(pool.clone()));

    let resolver = EntitlementResolver::new(catalog, subscriptions, organizations);
    let gate = FeatureGate::new(ledger, config.entitlements.window_policy()?);
    let service = Arc::new(EntitlementService::new(resolver, gate));

    let app = api_router(EntitlementAppState::new(service))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server))
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "entitlement-gate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn usage_ledger(config: &AppConfig, pool: &PgPool) -> Result<Arc<dyn UsageLedger>, BoxError> {
    let ledger: Arc<dyn UsageLedger> = match config.entitlements.ledger_backend {
        LedgerBackend::Postgres => Arc::new(PostgresUsageLedger::new(pool.clone())),
        LedgerBackend::Redis => {
            let redis = config.redis.as_ref().ok_or("redis section missing")?;
            Arc::new(RedisUsageLedger::new(redis_connection(redis).await?))
        }
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory usage ledger; counts are lost on restart");
            Arc::new(InMemoryUsageLedger::new())
        }
    };
    tracing::info!(backend = ?config.entitlements.ledger_backend, "Usage ledger ready");
    Ok(ledger)
}

async fn redis_connection(
    config: &RedisConfig,
) -> Result<redis::aio::MultiplexedConnection, BoxError> {
    let client = redis::Client::open(config.url.as_str())?;
    let conn = tokio::time::timeout(config.timeout(), client.get_multiplexed_tokio_connection())
        .await
        .map_err(|_| "timed out connecting to Redis")??;
    Ok(conn)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = server
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    if origins.is_empty() {
        CorsLayer::new()
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
