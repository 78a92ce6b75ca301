use actix_cors::Cors;
use actix_web::{
    http::header::{self, HeaderName},
    middleware::DefaultHeaders,
    web,
};
use std::sync::Arc;

use crate::middleware::{json_config, AdminAuth, AdminKeyStore, RateLimiter};
use crate::modules::gateways::GatewayRegistry;
use crate::modules::transactions::controllers::{
    admin_controller, transaction_controller, webhook_controller,
};
use crate::modules::transactions::{CapacityRevalidator, TransactionRepository, TransactionService};
use crate::modules::{health, installments};

/// Shared state handed to every worker's `App`
#[derive(Clone)]
pub struct AppState {
    pub transactions: web::Data<TransactionService>,
    pub gateways: web::Data<GatewayRegistry>,
    pub admin_keys: Arc<AdminKeyStore>,
    /// One quota shared by all workers
    pub webhook_limiter: RateLimiter,
    pub admin_allowed_origin: Option<String>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn TransactionRepository>,
        capacity: Arc<dyn CapacityRevalidator>,
        gateways: GatewayRegistry,
        admin_keys: AdminKeyStore,
        webhook_rate_limit_per_minute: u32,
        admin_allowed_origin: Option<String>,
    ) -> Self {
        Self {
            transactions: web::Data::new(TransactionService::new(repository, capacity)),
            gateways: web::Data::new(gateways),
            admin_keys: Arc::new(admin_keys),
            webhook_limiter: RateLimiter::new(webhook_rate_limit_per_minute),
            admin_allowed_origin,
        }
    }
}

fn noindex() -> DefaultHeaders {
    DefaultHeaders::new().add(("X-Robots-Tag", "noindex"))
}

fn admin_cors(allowed_origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            HeaderName::from_static("x-admin-id"),
            HeaderName::from_static("x-api-key"),
        ])
        .max_age(3600);

    match allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        // Same-origin only
        None => cors,
    }
}

/// Mount every route with its scope middleware
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(state.transactions.clone())
        .app_data(state.gateways.clone())
        .app_data(json_config())
        .configure(health::configure)
        .configure(installments::controllers::configure)
        .configure(transaction_controller::configure)
        .service(
            web::scope("/api/admin/transactions")
                .wrap(AdminAuth::new(state.admin_keys.clone()))
                .wrap(noindex())
                .wrap(admin_cors(state.admin_allowed_origin.as_deref()))
                .configure(admin_controller::configure),
        )
        .service(
            web::scope("/api/webhooks")
                .wrap(state.webhook_limiter.clone())
                .wrap(noindex())
                .configure(webhook_controller::configure),
        );
}
