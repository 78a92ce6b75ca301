pub mod capacity_revalidator;
pub mod transaction_service;

pub use capacity_revalidator::{
    CapacityRevalidator, HttpCapacityRevalidator, LoggingCapacityRevalidator,
};
pub use transaction_service::{GatewayDisposition, TransactionService};
