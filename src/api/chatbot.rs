use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::chatbot::ChatContext;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct ChatQueryReq {
    #[schema(example = "How many casual leave days do I have left?")]
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatReplyResponse {
    pub success: bool,
    #[schema(example = "You have 12 casual leave days available.")]
    pub reply: String,
}

/// Answers the caller's question from their own profile and leave balance.
#[utoipa::path(
    post,
    path = "/api/chatbot/query",
    request_body = ChatQueryReq,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReplyResponse),
        (status = 400, description = "Query is required."),
        (status = 401),
        (status = 404, description = "Employee profile not found."),
        (status = 500, description = "Assistant not configured or unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Chatbot"
)]
#[instrument(name = "chatbot_query", skip_all, fields(employee_id = %auth.employee_id))]
pub async fn query(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<ChatQueryReq>,
) -> actix_web::Result<impl Responder> {
    let query = body
        .into_inner()
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Query is required.".to_string()))?;

    let employee = state
        .employees
        .find_by_employee_id(&auth.employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee profile not found."))?;
    let system_prompt = ChatContext::from(&employee).system_prompt();

    let chat = state.chat.as_ref().ok_or_else(|| {
        error!("Chat assistant is not configured");
        AppError::ExternalService("Chatbot service is not configured.".to_string())
    })?;

    let reply = chat.reply(&system_prompt, &query).await.map_err(|e| {
        error!(error = %e, "Chat assistant call failed");
        AppError::ExternalService(
            "Sorry, I am unable to process your request right now.".to_string(),
        )
    })?;

    info!("Chat query answered");
    Ok(HttpResponse::Ok().json(ChatReplyResponse {
        success: true,
        reply,
    }))
}
