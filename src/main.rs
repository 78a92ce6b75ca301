use std::sync::Arc;

use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use boxoffice::app::{self, AppState};
use boxoffice::config::{run_migrations, AppConfig, Config, LogFormat, StoreBackend};
use boxoffice::gateways::GatewayRegistry;
use boxoffice::middleware::{hash_api_key, AdminKeyStore, RequestId};
use boxoffice::transactions::{
    CapacityRevalidator, HttpCapacityRevalidator, InMemoryTransactionRepository,
    LoggingCapacityRevalidator, MySqlTransactionRepository, TransactionRepository,
};

fn init_tracing(app: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("boxoffice={},actix_web=info", app.log_level))
    });
    let registry = tracing_subscriber::registry().with(filter);

    match app.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-admin-key") {
        let key = args
            .get(2)
            .context("usage: boxoffice hash-admin-key <api-key>")?;
        println!("{}", hash_api_key(key)?);
        return Ok(());
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.app);
    config.validate().context("Configuration validation failed")?;

    tracing::info!(env = %config.app.env, "Starting boxoffice");

    let repository: Arc<dyn TransactionRepository> = match config.store.backend {
        StoreBackend::MySql => {
            let database = config
                .store
                .database
                .as_ref()
                .context("DATABASE_URL is required for the mysql backend")?;
            let pool = database
                .create_pool()
                .await
                .context("Failed to create database pool")?;
            run_migrations(&pool).await?;

            tracing::info!(
                max_connections = database.max_connections,
                "Database pool initialized"
            );
            Arc::new(MySqlTransactionRepository::new(pool))
        }
        StoreBackend::Memory => {
            if config.is_production() {
                anyhow::bail!("STORE_BACKEND=memory is not allowed in production");
            }
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(InMemoryTransactionRepository::new())
        }
    };

    let capacity: Arc<dyn CapacityRevalidator> =
        match HttpCapacityRevalidator::from_config(&config.capacity)? {
            Some(http) => Arc::new(http),
            None => {
                tracing::warn!("CAPACITY_REVALIDATE_URL not set; revalidation is log-only");
                Arc::new(LoggingCapacityRevalidator)
            }
        };

    let admin_keys = AdminKeyStore::new(config.security.admin_api_keys.clone())?;
    if admin_keys.is_empty() {
        tracing::warn!("ADMIN_API_KEYS is empty; every admin request will be rejected");
    }

    let state = AppState::new(
        repository,
        capacity,
        GatewayRegistry::from_config(&config.gateways),
        admin_keys,
        config.security.webhook_rate_limit_per_minute,
        config.security.admin_allowed_origin.clone(),
    );

    let bind_address = config.server.bind_address();
    tracing::info!(address = %bind_address, workers = config.server.workers, "Binding HTTP server");

    HttpServer::new(move || {
        App::new()
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .configure(|cfg| app::configure(cfg, &state))
    })
    .workers(config.server.workers)
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
