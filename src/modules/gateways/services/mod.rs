pub mod gateway_service;
pub mod gateway_trait;
pub mod mercadopago;
pub mod signature;
pub mod webpay;

pub use gateway_service::GatewayRegistry;
pub use gateway_trait::{
    GatewayKind, GatewayNotification, PaymentGateway, PaymentVerdict, WebhookHeaders,
};
pub use mercadopago::MercadoPagoGateway;
pub use signature::{sign_hmac_sha256, verify_hmac_sha256};
pub use webpay::WebpayGateway;
