use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::payroll::runner::{self, PayPeriod, PayrollRunSummary};
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunPayrollReq {
    #[schema(example = "2025-11")]
    #[serde(default)]
    pub pay_period: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RunPayrollResponse {
    pub success: bool,
    #[schema(example = "Payroll successfully processed for 2025-11.")]
    pub message: String,
    pub data: PayrollRunSummary,
}

#[utoipa::path(
    post,
    path = "/api/payroll/run",
    request_body = RunPayrollReq,
    responses(
        (status = 200, description = "Slips generated for every employee without one", body = RunPayrollResponse),
        (status = 400, description = "Pay period missing"),
        (status = 401),
        (status = 403),
        (status = 404, description = "No employees found to process payroll"),
        (status = 500, description = "Run aborted, nothing was written")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
#[instrument(name = "payroll_run", skip(auth, state, payload))]
pub async fn run_payroll(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<RunPayrollReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let pay_period = PayPeriod::parse(payload.pay_period.as_deref().unwrap_or_default())?;

    let summary = runner::run_payroll(state.employees.as_ref(), &pay_period, &auth).await?;

    Ok(HttpResponse::Ok().json(RunPayrollResponse {
        success: true,
        message: format!("Payroll successfully processed for {pay_period}."),
        data: summary,
    }))
}
