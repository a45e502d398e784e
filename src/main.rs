use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod auth;
mod chatbot;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod payroll;
mod routes;
mod state;
mod store;
mod utils;

use config::Config;
use db::init_state;

use crate::chatbot::gemini::GeminiClient;
use crate::docs::ApiDoc;
use crate::utils::employee_id_filter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "EHRMS API is running successfully."
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env().map_err(|e| {
        eprintln!("Invalid configuration: {e:#}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(if config.is_production() {
            Level::INFO
        } else {
            Level::DEBUG
        })
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(env = %config.app_env, "Server starting...");
    error::expose_internal_details(!config.is_production());

    let mut state = init_state(&config).await.map_err(|e| {
        error!(error = %e, "Failed to initialise store");
        std::io::Error::other(e.to_string())
    })?;

    match &config.gemini_api_key {
        Some(api_key) => {
            let client = GeminiClient::new(
                config.gemini_base_url.as_str(),
                config.gemini_model.as_str(),
                api_key.as_str(),
                Duration::from_secs(config.chat_timeout_secs),
            )
            .map_err(|e| {
                error!(error = %e, "Failed to build chat client");
                std::io::Error::other(e.to_string())
            })?;
            state = state.with_chat(Arc::new(client));
        }
        None => warn!("GEMINI_API_KEY is not set, chat assistant disabled"),
    }

    let users_for_filter_warmup = state.users.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) =
            employee_id_filter::warmup_employee_id_filter(users_for_filter_warmup.as_ref(), 500)
                .await
        {
            error!(error = %e, "Failed to warm up employee ID filter");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches JS/CSS assets
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(state.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(error::json_config())
            .app_data(error::path_config())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
