pub mod installment_plan;
pub mod payment_installment;

pub use installment_plan::{InstallmentPlan, PlanError, PlannedInstallment};
pub use payment_installment::{InstallmentSettlement, InstallmentStatus, PaymentInstallment};
