use std::str::FromStr;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        auth::{AuthUser, authenticate},
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{AppError, AppResult},
    model::{
        employee::{Compensation, Employee, PersonalInfo, new_job_profile},
        role::Role,
        user::NewUser,
    },
    models::{AuthResponse, LoginReqDto, RegisterReq, UserSummary},
    state::AppState,
    store::UserRepository,
    utils::{employee_id_cache, employee_id_filter},
};

const MIN_PASSWORD_LEN: usize = 6;

/// Ok(true)  => employee ID AVAILABLE
/// Ok(false) => employee ID TAKEN
pub async fn is_employee_id_available(
    employee_id: &str,
    users: &dyn UserRepository,
) -> AppResult<bool> {
    // Cuckoo filter: fast negative.
    if !employee_id_filter::might_exist(employee_id) {
        return Ok(true);
    }

    // Moka cache: fast positive.
    if employee_id_cache::is_taken(employee_id).await {
        return Ok(false);
    }

    if users.find_user(employee_id).await?.is_some() {
        employee_id_cache::mark_taken(employee_id).await;
        return Ok(false);
    }
    Ok(true)
}

/// HR and admin accounts are created by an authenticated admin. The very
/// first account of an empty store may take any role.
async fn authorize_role(
    role: Role,
    req: &HttpRequest,
    users: &dyn UserRepository,
    config: &Config,
) -> AppResult<()> {
    if !role.is_hr_or_admin() {
        return Ok(());
    }
    if !users.has_users().await? {
        warn!(role = %role, "Bootstrapping first account with an elevated role");
        return Ok(());
    }

    let header = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
    let caller = authenticate(header, &config.jwt_secret).map_err(|_| AppError::NotAuthorized)?;
    if caller.role != Role::Admin {
        warn!(requested_by = %caller.employee_id, role = %role, "Elevated registration refused");
        return Err(AppError::NotAuthorized);
    }
    info!(created_by = %caller.employee_id, role = %role, "Elevated account registered by admin");
    Ok(())
}

fn required<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Registration input after validation, with the role resolved.
struct Registration {
    user: NewUser,
    employee: Employee,
}

fn validate_registration(
    req: RegisterReq,
    password_hash: impl FnOnce(&str) -> AppResult<String>,
) -> AppResult<Registration> {
    let employee_id = required(&req.employee_id, "Employee ID")?.to_string();
    let first_name = required(&req.first_name, "First name")?.to_string();
    let last_name = required(&req.last_name, "Last name")?.to_string();
    let email = required(&req.email, "Email")?.to_lowercase();

    if !email.contains('@') {
        return Err(AppError::Validation("Please provide a valid email".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role = match req.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => Role::from_str(raw)
            .map_err(|_| AppError::Validation(format!("Invalid role: {raw}")))?,
        None => Role::default(),
    };

    let basic_salary = req.basic_salary.unwrap_or_default();
    if !basic_salary.is_finite() || basic_salary < 0.0 {
        return Err(AppError::Validation(
            "Basic salary must be a non-negative number".to_string(),
        ));
    }

    let employee = Employee::new(
        employee_id.clone(),
        0,
        PersonalInfo {
            first_name,
            last_name,
            email,
            phone: None,
            address: None,
            date_of_birth: None,
        },
        new_job_profile(blank_to_none(req.designation), blank_to_none(req.department)),
        Compensation {
            pay_scale: blank_to_none(req.pay_scale),
            basic_salary,
            allowances: Vec::new(),
        },
    );

    Ok(Registration {
        user: NewUser {
            employee_id,
            password_hash: password_hash(&req.password)?,
            role,
        },
        employee,
    })
}

/// Duplicate registration data is a client error, not a conflict.
fn duplicate_as_bad_request(error: AppError) -> AppError {
    match error {
        AppError::Conflict(message) => AppError::Validation(message),
        other => other,
    }
}

fn auth_response(
    message: &str,
    token: String,
    user_id: u64,
    employee_id: String,
    role: Role,
) -> AuthResponse {
    AuthResponse {
        success: true,
        message: message.to_string(),
        token,
        user: UserSummary {
            id: user_id,
            employee_id,
            role: role.to_string(),
        },
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User and employee profile created", body = AuthResponse),
        (status = 400, description = "Invalid input, or employee ID or email already registered"),
        (status = 403, description = "HR or admin role requested without an admin token")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_register",
    skip(req, state, config, body),
    fields(employee_id = %body.employee_id)
)]
pub async fn register(
    req: HttpRequest,
    body: web::Json<RegisterReq>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Register request received");

    let Registration { user, employee } = validate_registration(body.into_inner(), hash_password)?;

    if !is_employee_id_available(&user.employee_id, state.users.as_ref()).await? {
        return Err(
            AppError::Validation("User with this Employee ID already exists".to_string()).into(),
        );
    }
    if state.users.email_in_use(&employee.personal_info.email).await? {
        return Err(
            AppError::Validation("User with this email already exists".to_string()).into(),
        );
    }
    authorize_role(user.role, &req, state.users.as_ref(), &config).await?;

    let created = state
        .users
        .create_account(user, employee)
        .await
        .map_err(duplicate_as_bad_request)?;

    employee_id_filter::insert(&created.employee_id);
    employee_id_cache::mark_taken(&created.employee_id).await;
    debug!(user_id = created.id, "Account created");

    let token = generate_access_token(
        created.id,
        &created.employee_id,
        created.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;

    info!(role = %created.role, "User registered");
    Ok(HttpResponse::Created().json(auth_response(
        "User registered successfully",
        token,
        created.id,
        created.employee_id,
        created.role,
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid employee ID or password")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(state, config, body),
    fields(employee_id = %body.employee_id)
)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    let invalid = || AppError::Unauthorized("Invalid employee ID or password".to_string());

    let employee_id = body.employee_id.trim();
    if employee_id.is_empty() || body.password.is_empty() {
        return Err(invalid().into());
    }

    let user = match state.users.find_user(employee_id).await? {
        Some(user) => user,
        None => {
            info!("Invalid credentials: user not found");
            return Err(invalid().into());
        }
    };

    if !verify_password(&body.password, &user.password_hash) {
        info!("Invalid credentials: password mismatch");
        return Err(invalid().into());
    }

    let token = generate_access_token(
        user.id,
        &user.employee_id,
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;

    info!("Login successful");
    Ok(HttpResponse::Ok().json(auth_response(
        "Login successful",
        token,
        user.id,
        user.employee_id,
        user.role,
    )))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated caller"),
        (status = 401)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "userId": auth.user_id,
            "role": auth.role.to_string(),
            "employeeId": auth.employee_id,
        }
    }))
}
