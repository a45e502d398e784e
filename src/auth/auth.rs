use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;

/// The authenticated caller, passed explicitly into every payroll operation.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub employee_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> AppResult<()> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(AppError::NotAuthorized)
        }
    }

    /// HR/admin may act on anyone; an employee only on their own record.
    pub fn require_self_or_hr(&self, employee_id: &str) -> AppResult<()> {
        if self.role.is_hr_or_admin() || self.employee_id == employee_id {
            Ok(())
        } else {
            Err(AppError::NotAuthorized)
        }
    }
}

/// Resolves the caller from an `Authorization: Bearer <token>` header value.
pub fn authenticate(header: Option<&str>, secret: &str) -> AppResult<AuthUser> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token provided".to_string()))?;

    let claims = verify_token(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Token verification failed");
        AppError::Unauthorized("Not authorized, token failed".to_string())
    })?;

    let role = Role::from_id(claims.role)
        .ok_or_else(|| AppError::Unauthorized("Invalid role".to_string()))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        employee_id: claims.sub,
        role,
    })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(AppError::Internal("Config missing".to_string()))),
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        ready(authenticate(header, &config.jwt_secret))
    }
}
