use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::employee::{Compensation, JobProfile, PersonalInfo};
use crate::state::AppState;
use crate::store::modify_employee;

/// Omitted fields keep their current value.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobProfileReq {
    #[schema(example = "Finance")]
    pub department: Option<String>,
    #[schema(example = "Team Lead")]
    pub designation: Option<String>,
    #[schema(example = "Jane Smith")]
    pub reporting_manager: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    pub personal_info: PersonalInfo,
    pub job_profile: JobProfile,
    pub compensation: Compensation,
}

#[derive(Serialize, ToSchema)]
pub struct JobProfileResponse {
    pub success: bool,
    pub data: EmployeeProfile,
}

#[derive(Serialize, ToSchema)]
pub struct JobProfileUpdatedResponse {
    pub success: bool,
    #[schema(example = "Job profile updated successfully")]
    pub message: String,
    pub data: JobProfile,
}

#[utoipa::path(
    get,
    path = "/api/job-profile/{employee_id}",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Profile found", body = JobProfileResponse),
        (status = 403),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Job Profile"
)]
pub async fn get_job_profile(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(&employee_id)?;

    let employee = state
        .employees
        .find_by_employee_id(&employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(JobProfileResponse {
        success: true,
        data: EmployeeProfile {
            employee_id: employee.employee_id,
            personal_info: employee.personal_info,
            job_profile: employee.job_profile,
            compensation: employee.compensation,
        },
    }))
}

#[utoipa::path(
    put,
    path = "/api/job-profile/{employee_id}",
    request_body = UpdateJobProfileReq,
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Job profile updated", body = JobProfileUpdatedResponse),
        (status = 403),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Job Profile"
)]
pub async fn update_job_profile(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateJobProfileReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();
    let UpdateJobProfileReq {
        department,
        designation,
        reporting_manager,
    } = body.into_inner();

    let job_profile = modify_employee(state.employees.as_ref(), &employee_id, move |employee| {
        let profile = &mut employee.job_profile;
        if department.is_some() {
            profile.department = department;
        }
        if designation.is_some() {
            profile.designation = designation;
        }
        if reporting_manager.is_some() {
            profile.reporting_manager = reporting_manager;
        }
        Ok(profile.clone())
    })
    .await?;

    info!(employee_id = %employee_id, updated_by = %auth.employee_id, "Job profile updated");

    Ok(HttpResponse::Ok().json(JobProfileUpdatedResponse {
        success: true,
        message: "Job profile updated successfully".to_string(),
        data: job_profile,
    }))
}
