use crate::{
    api::{chatbot, job_profile, payroll, promotion, salary_slip},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;
use tracing::warn;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = 60_000 / u64::from(requests_per_min.max(1));
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            warn!(requests_per_min, "Invalid rate limit, using governor defaults");
            GovernorConfig::default()
        });
    Arc::new(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes, plus `me` behind the token check
    cfg.service(
        web::scope(&format!("{}/auth", config.api_prefix))
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/me")
                    .wrap(from_fn(auth_middleware))
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/payroll")
                    // /payroll/run
                    .service(web::resource("/run").route(web::post().to(payroll::run_payroll))),
            )
            .service(
                web::scope("/salary-slip")
                    // fixed segments before /{employee_id}
                    .service(
                        web::resource("/my-slips").route(web::get().to(salary_slip::my_slips)),
                    )
                    .service(
                        web::resource("/all-slips").route(web::get().to(salary_slip::all_slips)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(salary_slip::employee_slips)),
                    )
                    // /salary-slip/{employee_id}/{slip_id}
                    .service(
                        web::resource("/{employee_id}/{slip_id}")
                            .route(web::get().to(salary_slip::get_slip))
                            .route(web::put().to(salary_slip::update_slip)),
                    ),
            )
            .service(
                web::resource("/job-profile/{employee_id}")
                    .route(web::get().to(job_profile::get_job_profile))
                    .route(web::put().to(job_profile::update_job_profile)),
            )
            .service(
                web::resource("/promotion/{employee_id}")
                    .route(web::post().to(promotion::promote)),
            )
            .service(web::resource("/chatbot/query").route(web::post().to(chatbot::query))),
    );
}
