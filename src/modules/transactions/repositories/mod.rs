pub mod memory;
pub mod mysql;
pub mod transaction_repository;

pub use memory::InMemoryTransactionRepository;
pub use mysql::MySqlTransactionRepository;
pub use transaction_repository::TransactionRepository;
