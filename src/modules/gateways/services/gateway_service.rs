use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use super::gateway_trait::{GatewayKind, PaymentGateway};
use super::mercadopago::MercadoPagoGateway;
use super::webpay::WebpayGateway;
use crate::config::GatewayConfig;
use crate::core::{AppError, Result};

/// Lookup of configured gateways by route name
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<GatewayKind, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every gateway the config carries a secret for
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MercadoPagoGateway::new(
            config.mercadopago_webhook_secret.clone(),
            config.mercadopago_signature_tolerance_secs,
        )));
        registry.register(Arc::new(WebpayGateway::new(
            config.webpay_webhook_secret.clone(),
        )));
        registry
    }

    /// Register a gateway
    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        info!(gateway = %gateway.kind(), "Registered payment gateway");
        self.gateways.insert(gateway.kind(), gateway);
    }

    /// Get a gateway by its path segment, 404 when unknown
    pub fn get(&self, name: &str) -> Result<Arc<dyn PaymentGateway>> {
        let kind = GatewayKind::from_str(name)?;
        self.gateways.get(&kind).cloned().ok_or_else(|| {
            AppError::not_found(format!("Payment gateway '{}' is not configured", name))
        })
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}
