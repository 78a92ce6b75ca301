use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::modules::installments::models::{InstallmentPlan, PlanError, PlannedInstallment};

/// Scale of every scheduled amount
const AMOUNT_SCALE: u32 = 2;

/// Longest schedule accepted, in months
pub const MAX_INSTALLMENTS: i32 = 600;

/// Calculator for reservation + monthly installment plans
pub struct InstallmentCalculator;

impl InstallmentCalculator {
    /// Compute a down payment plus `installments_count` monthly payments.
    ///
    /// Every installment but the last is the remaining amount divided by the
    /// count, floored to cents. The last one takes whatever is left, so the
    /// schedule always sums to `total_amount - reservation_amount` exactly.
    ///
    /// Installment `i` is due `i - 1` calendar months after `start_date`; when
    /// the target month is shorter the day is clipped to its last day.
    ///
    /// # Arguments
    /// * `total_amount` - Full ticket price, must be positive, at most 2 decimals
    /// * `reservation_amount` - Upfront payment, `0 <= reservation < total`
    /// * `installments_count` - Number of monthly payments, 1 to `MAX_INSTALLMENTS`
    /// * `start_date` - Due date of the first installment
    pub fn calculate_plan(
        total_amount: Decimal,
        reservation_amount: Decimal,
        installments_count: i32,
        start_date: NaiveDate,
    ) -> Result<InstallmentPlan, PlanError> {
        if total_amount <= Decimal::ZERO {
            return Err(PlanError::InvalidTotalAmount);
        }
        if reservation_amount < Decimal::ZERO {
            return Err(PlanError::InvalidReservationAmount);
        }
        if reservation_amount >= total_amount {
            return Err(PlanError::ReservationExceedsTotal);
        }
        if installments_count <= 0 {
            return Err(PlanError::InvalidInstallmentsCount);
        }
        if total_amount.normalize().scale() > AMOUNT_SCALE
            || reservation_amount.normalize().scale() > AMOUNT_SCALE
        {
            return Err(PlanError::InvalidAmountScale(AMOUNT_SCALE));
        }
        if installments_count > MAX_INSTALLMENTS {
            return Err(PlanError::TooManyInstallments(MAX_INSTALLMENTS));
        }

        let remaining_amount = total_amount - reservation_amount;
        let raw_monthly = remaining_amount / Decimal::from(installments_count);
        let rounded_monthly =
            raw_monthly.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToNegativeInfinity);

        let mut installments = Vec::new();
        let mut distributed = Decimal::ZERO;

        for installment_number in 1..=installments_count {
            let amount = if installment_number == installments_count {
                // Last installment absorbs the flooring slack
                (remaining_amount - distributed)
                    .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
            } else {
                distributed += rounded_monthly;
                rounded_monthly
            };

            installments.push(PlannedInstallment {
                installment_number,
                amount,
                due_date: Self::due_date(start_date, installment_number)?,
            });
        }

        debug!(
            total = %total_amount,
            reservation = %reservation_amount,
            count = installments_count,
            monthly = %rounded_monthly,
            "Calculated installment plan"
        );

        Ok(InstallmentPlan {
            total_amount,
            reservation_amount,
            remaining_amount,
            monthly_amount: raw_monthly
                .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero),
            installments,
        })
    }

    fn due_date(start_date: NaiveDate, installment_number: i32) -> Result<NaiveDate, PlanError> {
        let offset = u32::try_from(installment_number - 1)
            .map_err(|_| PlanError::DueDateOutOfRange(installment_number))?;

        start_date
            .checked_add_months(Months::new(offset))
            .ok_or(PlanError::DueDateOutOfRange(installment_number))
    }
}
