use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::employee::{Compensation, JobProfile};
use crate::state::AppState;
use crate::store::modify_employee;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromotionReq {
    #[schema(example = "Senior Developer")]
    pub new_designation: Option<String>,
    #[schema(example = "Level 7")]
    pub new_pay_scale: Option<String>,
    #[schema(example = 65000.0)]
    pub new_basic_salary: Option<f64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromotionResult {
    pub job_profile: JobProfile,
    pub compensation: Compensation,
}

#[derive(Serialize, ToSchema)]
pub struct PromotionResponse {
    pub success: bool,
    #[schema(example = "Promotion processed successfully")]
    pub message: String,
    pub data: PromotionResult,
}

struct Promotion {
    designation: String,
    pay_scale: String,
    basic_salary: f64,
}

impl PromotionReq {
    fn validate(self) -> Result<Promotion, AppError> {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        match (
            non_blank(self.new_designation),
            non_blank(self.new_pay_scale),
            self.new_basic_salary.filter(|salary| salary.is_finite() && *salary > 0.0),
        ) {
            (Some(designation), Some(pay_scale), Some(basic_salary)) => Ok(Promotion {
                designation,
                pay_scale,
                basic_salary,
            }),
            _ => Err(AppError::Validation(
                "Please provide new designation, pay scale, and basic salary".to_string(),
            )),
        }
    }
}

/// Applies a new designation and compensation. Slips already generated keep
/// the salary they were computed from.
#[utoipa::path(
    post,
    path = "/api/promotion/{employee_id}",
    request_body = PromotionReq,
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Promotion applied", body = PromotionResponse),
        (status = 400, description = "Designation, pay scale or basic salary missing"),
        (status = 403),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotion"
)]
#[instrument(
    name = "promotion",
    skip(auth, state, path, body),
    fields(employee_id = %path.as_str())
)]
pub async fn promote(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PromotionReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let promotion = body.into_inner().validate()?;

    let basic_salary = promotion.basic_salary;
    let employee_id = path.into_inner();
    let result = modify_employee(state.employees.as_ref(), &employee_id, move |employee| {
        employee.job_profile.designation = Some(promotion.designation);
        employee.compensation.pay_scale = Some(promotion.pay_scale);
        employee.compensation.basic_salary = promotion.basic_salary;

        Ok(PromotionResult {
            job_profile: employee.job_profile.clone(),
            compensation: employee.compensation.clone(),
        })
    })
    .await?;

    info!(promoted_by = %auth.employee_id, basic_salary, "Promotion processed");

    Ok(HttpResponse::Ok().json(PromotionResponse {
        success: true,
        message: "Promotion processed successfully".to_string(),
        data: result,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, middleware::from_fn, test, web::Data};
    use chrono::Utc;
    use serde_json::{Value, json};

    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::auth::middleware::auth_middleware;
    use crate::config::Config;
    use crate::error::json_config;
    use crate::model::employee::fixtures::employee;
    use crate::model::role::Role;
    use crate::model::salary_slip::SalarySlip;
    use crate::payroll::calculator;
    use crate::store::memory::InMemoryStore;
    use crate::store::EmployeeRepository;

    fn bearer(role: Role, employee_id: &str) -> (&'static str, String) {
        let config = Config::for_tests();
        let token = generate_access_token(1, employee_id, role, &config.jwt_secret, 60)
            .unwrap_or_default();
        ("Authorization", format!("Bearer {token}"))
    }

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        let mut e1 = employee("E1", 50_000.0);
        let slip = SalarySlip::new(
            "2025-11",
            50_000.0,
            calculator::default_allowances(50_000.0),
            calculator::default_deductions(50_000.0),
            Utc::now(),
        );
        assert!(e1.append_slip(slip).is_ok());
        assert!(store.insert_employee(e1).await.is_ok());
        Arc::new(store)
    }

    macro_rules! app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new(Config::for_tests()))
                    .app_data(json_config())
                    .app_data(Data::new(AppState::new($store.clone(), $store.clone())))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .route("/promotion/{employee_id}", web::post().to(promote)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn promotion_changes_compensation_but_not_existing_slips() {
        let store = seeded_store().await;
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/promotion/E1")
            .insert_header(bearer(Role::Hr, "HR-1"))
            .set_json(json!({
                "newDesignation": "Senior Developer",
                "newPayScale": "Level 7",
                "newBasicSalary": 65000.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Promotion processed successfully");
        assert_eq!(body["data"]["jobProfile"]["designation"], "Senior Developer");
        assert_eq!(body["data"]["compensation"]["payScale"], "Level 7");
        assert_eq!(body["data"]["compensation"]["basicSalary"], 65_000.0);

        let stored = store.find_by_employee_id("E1").await.ok().flatten();
        let stored = stored.unwrap_or_else(|| unreachable!());
        assert_eq!(stored.compensation.basic_salary, 65_000.0);
        let slip = &stored.slips().as_slice()[0];
        assert_eq!(slip.basic_salary(), 50_000.0);
        assert!((slip.net_pay() - 52_500.0).abs() < 1e-6);
    }

    #[actix_web::test]
    async fn incomplete_promotion_is_rejected() {
        let store = seeded_store().await;
        let app = app!(store);

        for payload in [
            json!({ "newDesignation": "Lead", "newPayScale": "L7" }),
            json!({ "newDesignation": " ", "newPayScale": "L7", "newBasicSalary": 1.0 }),
            json!({ "newDesignation": "Lead", "newPayScale": "L7", "newBasicSalary": 0.0 }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/promotion/E1")
                .insert_header(bearer(Role::Admin, "A-1"))
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(
                body["message"],
                "Please provide new designation, pay scale, and basic salary"
            );
        }
    }

    #[actix_web::test]
    async fn promotion_is_hr_only() {
        let store = seeded_store().await;
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/promotion/E1")
            .insert_header(bearer(Role::Employee, "E1"))
            .set_json(json!({
                "newDesignation": "CTO",
                "newPayScale": "Level 99",
                "newBasicSalary": 1000000.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let store = seeded_store().await;
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/promotion/E404")
            .insert_header(bearer(Role::Hr, "HR-1"))
            .set_json(json!({
                "newDesignation": "Lead",
                "newPayScale": "L7",
                "newBasicSalary": 70000.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
