pub mod admin_controller;
pub mod transaction_controller;
pub mod webhook_controller;
