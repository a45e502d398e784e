use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "s3cret!")]
    pub password: String,
    /// `employee`, `hr` or `admin`; defaults to `employee`.
    #[schema(example = "employee")]
    pub role: Option<String>,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Software Engineer")]
    pub designation: Option<String>,
    #[schema(example = "IT Services")]
    pub department: Option<String>,
    #[schema(example = "Level 5")]
    pub pay_scale: Option<String>,
    #[schema(example = 50000.0)]
    pub basic_salary: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginReqDto {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "s3cret!")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: u64,
    pub employee_id: String,
    #[schema(example = "employee")]
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Employee ID the user signs in with.
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
}
