pub mod gateways;
pub mod health;
pub mod installments;
pub mod transactions;
