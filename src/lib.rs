//! boxoffice: installment plans and the ticket transaction lifecycle
//!
//! Exposes the installment plan calculator, the ticket transaction state
//! machine driven by admin review and MercadoPago / Webpay webhooks, and the
//! actix-web wiring that serves them.

pub mod app;
pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used modules
pub use modules::gateways;
pub use modules::installments;
pub use modules::transactions;
