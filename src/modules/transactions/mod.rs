pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    CreateTransactionRequest, PaymentStatus, PaymentType, TicketDeliveryMode,
    TicketDeliveryStatus, TicketItem, TicketTransaction, TransactionDetails,
};
pub use repositories::{
    InMemoryTransactionRepository, MySqlTransactionRepository, TransactionRepository,
};
pub use services::{
    CapacityRevalidator, GatewayDisposition, HttpCapacityRevalidator,
    LoggingCapacityRevalidator, TransactionService,
};
