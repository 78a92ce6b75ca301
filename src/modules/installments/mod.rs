pub mod controllers;
pub mod models;
pub mod services;

pub use controllers::preview_plan;
pub use models::{
    InstallmentPlan, InstallmentSettlement, InstallmentStatus, PaymentInstallment, PlanError,
};
pub use services::InstallmentCalculator;
