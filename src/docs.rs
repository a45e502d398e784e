use crate::api::chatbot::{ChatQueryReq, ChatReplyResponse};
use crate::api::job_profile::{
    EmployeeProfile, JobProfileResponse, JobProfileUpdatedResponse, UpdateJobProfileReq,
};
use crate::api::payroll::{RunPayrollReq, RunPayrollResponse};
use crate::api::promotion::{PromotionReq, PromotionResponse, PromotionResult};
use crate::api::salary_slip::{
    AllSlipsResponse, SlipListResponse, SlipResponse, SlipUpdatedResponse, UpdateSlipReq,
};
use crate::model::employee::{Compensation, JobProfile, LeaveBalance, PersonalInfo};
use crate::model::salary_slip::{PayComponent, SalarySlip};
use crate::models::{AuthResponse, LoginReqDto, RegisterReq, UserSummary};
use crate::payroll::runner::PayrollRunSummary;
use crate::payroll::slips::EmployeeSlip;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Payroll API",
        version = "1.0.0",
        description = r#"
## Employee HR & Payroll Service

Keeps employee records and their salary slip history.

### Features
- **Payroll runs**
  - Generate one salary slip per employee for a pay period, all or nothing
  - Re-running a period only picks up employees without a slip
- **Salary slips**
  - Employees read their own slips; HR and admins read and correct anyone's
- **Job profile & promotion**
  - View and update designation, department and reporting manager
  - Apply promotions to designation, pay scale and basic salary
- **HR assistant**
  - Answers an employee's questions from their profile and leave balance

### Security
Everything except register and login needs a **JWT Bearer** token.
Payroll runs, slip corrections, profile updates and promotions need the
**hr** or **admin** role.

### Response Format
- camelCase JSON
- Errors are `{ "success": false, "message": "..." }`
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::payroll::run_payroll,

        crate::api::salary_slip::my_slips,
        crate::api::salary_slip::all_slips,
        crate::api::salary_slip::employee_slips,
        crate::api::salary_slip::get_slip,
        crate::api::salary_slip::update_slip,

        crate::api::job_profile::get_job_profile,
        crate::api::job_profile::update_job_profile,

        crate::api::promotion::promote,

        crate::api::chatbot::query
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            UserSummary,
            AuthResponse,
            RunPayrollReq,
            RunPayrollResponse,
            PayrollRunSummary,
            PayComponent,
            SalarySlip,
            EmployeeSlip,
            UpdateSlipReq,
            SlipListResponse,
            AllSlipsResponse,
            SlipResponse,
            SlipUpdatedResponse,
            PersonalInfo,
            JobProfile,
            Compensation,
            LeaveBalance,
            EmployeeProfile,
            UpdateJobProfileReq,
            JobProfileResponse,
            JobProfileUpdatedResponse,
            PromotionReq,
            PromotionResult,
            PromotionResponse,
            ChatQueryReq,
            ChatReplyResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and caller identity"),
        (name = "Payroll", description = "Batch payroll runs"),
        (name = "Salary Slip", description = "Salary slip queries and corrections"),
        (name = "Job Profile", description = "Employee job profile APIs"),
        (name = "Promotion", description = "Promotion workflow"),
        (name = "Chatbot", description = "HR assistant answering from the caller's record"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/me",
            "/api/payroll/run",
            "/api/salary-slip/my-slips",
            "/api/salary-slip/all-slips",
            "/api/salary-slip/{employee_id}",
            "/api/salary-slip/{employee_id}/{slip_id}",
            "/api/job-profile/{employee_id}",
            "/api/promotion/{employee_id}",
            "/api/chatbot/query",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        let schemes = doc.components.map(|c| c.security_schemes).unwrap_or_default();
        assert!(schemes.contains_key("bearer_auth"));
    }
}
