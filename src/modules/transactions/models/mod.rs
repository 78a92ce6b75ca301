pub mod ticket_transaction;
pub mod transaction_details;

pub use ticket_transaction::{
    CreateTransactionRequest, InstallmentPlanRequest, PaymentStatus, PaymentType, TicketDeliveryMode,
    TicketDeliveryStatus, TicketItem, TicketTransaction, Transition,
};
pub use transaction_details::{TransactionDetails, TransitionOutcome};
