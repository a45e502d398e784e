use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::salary_slip::SalarySlip;
use crate::payroll::calculator;
use crate::store::{EmployeeRepository, EmployeeTransaction};

/// Caller-defined pay cycle token such as `2025-11`.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct PayPeriod(String);

impl PayPeriod {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("Pay period is required.".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRunSummary {
    /// Slips created by this run.
    #[schema(example = 148)]
    pub processed_count: usize,
    #[schema(example = 150)]
    pub total_employees: usize,
    /// Sum of net pay over the slips created by this run.
    #[schema(example = 7_500_000.0)]
    pub total_payout: f64,
}

/// Generates the default slip for every employee without one for `pay_period`.
///
/// The whole run happens in one store transaction: either every newly
/// eligible employee gets a slip or none does. Re-running a period only
/// picks up employees added since.
#[instrument(
    skip(employees, pay_period, requester),
    fields(pay_period = %pay_period, requested_by = %requester.employee_id)
)]
pub async fn run_payroll(
    employees: &dyn EmployeeRepository,
    pay_period: &PayPeriod,
    requester: &AuthUser,
) -> AppResult<PayrollRunSummary> {
    requester.require_hr_or_admin()?;

    let mut tx = employees.begin().await.map_err(into_transaction_failure)?;

    match process_period(tx.as_mut(), pay_period, Utc::now()).await {
        Ok(summary) => {
            tx.commit().await.map_err(into_transaction_failure)?;
            info!(
                processed = summary.processed_count,
                total = summary.total_employees,
                "Payroll run committed"
            );
            Ok(summary)
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(error = %rollback_error, "Rollback after failed payroll run failed");
            }
            Err(e)
        }
    }
}

async fn process_period(
    tx: &mut dyn EmployeeTransaction,
    pay_period: &PayPeriod,
    generated_on: DateTime<Utc>,
) -> AppResult<PayrollRunSummary> {
    let employees = tx.lock_all().await.map_err(into_transaction_failure)?;
    if employees.is_empty() {
        return Err(AppError::NoEmployees);
    }

    let total_employees = employees.len();
    let mut processed_count = 0;
    let mut total_payout = 0.0;

    for mut employee in employees {
        if employee.has_slip_for(pay_period.as_str()) {
            debug!(employee_id = %employee.employee_id, "Already has a slip, skipping");
            continue;
        }

        let basic_salary = employee.compensation.basic_salary;
        let slip = SalarySlip::new(
            pay_period.as_str(),
            basic_salary,
            calculator::default_allowances(basic_salary),
            calculator::default_deductions(basic_salary),
            generated_on,
        );
        let net_pay = slip.net_pay();

        employee.append_slip(slip)?;
        tx.save(&employee).await.map_err(into_transaction_failure)?;

        processed_count += 1;
        total_payout += net_pay;
    }

    Ok(PayrollRunSummary {
        processed_count,
        total_employees,
        total_payout,
    })
}

fn into_transaction_failure(error: AppError) -> AppError {
    match error {
        AppError::TransactionFailure(_) => error,
        other => AppError::TransactionFailure(other.to_string()),
    }
}
