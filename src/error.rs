use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use once_cell::sync::OnceCell;
use serde_json::json;

/// Result type used by the store, payroll core and handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Whether 500 responses carry the internal error text. Hidden until set.
static EXPOSE_DETAILS: OnceCell<bool> = OnceCell::new();

/// Set once at startup from `Config::is_production`.
pub fn expose_internal_details(expose: bool) {
    if EXPOSE_DETAILS.set(expose).is_err() {
        tracing::warn!("Error detail exposure was already configured");
    }
}

/// JSON body errors answered with the standard error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

/// Path segment errors answered with the standard error body.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed input, reported verbatim.
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but role or ownership check failed.
    #[error("Not authorized to perform this action")]
    NotAuthorized,

    #[error("{0}")]
    NotFound(String),

    /// A payroll run found nothing to process.
    #[error("No employees found to process payroll")]
    NoEmployees,

    #[error("{0}")]
    Conflict(String),

    /// The batch scope failed to load, persist or commit.
    #[error("Payroll processing failed: {0}")]
    TransactionFailure(String),

    /// A downstream service failed or is not set up. The message is shown as is.
    #[error("{0}")]
    ExternalService(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn internal(context: &str, error: impl std::fmt::Display) -> Self {
        AppError::Internal(format!("{context}: {error}"))
    }

    /// Message exposed to the caller.
    fn public_message(&self, expose_details: bool) -> String {
        match self {
            AppError::TransactionFailure(_) | AppError::Internal(_) if !expose_details => {
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotAuthorized => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NoEmployees => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TransactionFailure(_)
            | AppError::ExternalService(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        HttpResponse::build(status).json(json!({
            "success": false,
            "message": self.public_message(EXPOSE_DETAILS.get().copied().unwrap_or(false)),
        }))
    }
}
