pub mod services;

pub use services::{
    GatewayKind, GatewayNotification, GatewayRegistry, MercadoPagoGateway, PaymentGateway,
    PaymentVerdict, WebhookHeaders, WebpayGateway,
};
