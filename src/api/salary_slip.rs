use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::salary_slip::{PayComponent, SalarySlip, SlipChanges};
use crate::payroll::slips::{self, EmployeeSlip};
use crate::state::AppState;

/// Slip correction; omitted or `null` fields keep their current value.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlipReq {
    #[schema(example = 52000.0)]
    pub basic_salary: Option<f64>,
    pub allowances: Option<Vec<PayComponent>>,
    pub deductions: Option<Vec<PayComponent>>,
}

impl From<UpdateSlipReq> for SlipChanges {
    fn from(req: UpdateSlipReq) -> Self {
        SlipChanges {
            basic_salary: req.basic_salary,
            allowances: req.allowances,
            deductions: req.deductions,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SlipListResponse {
    pub success: bool,
    pub slips: Vec<SalarySlip>,
}

#[derive(Serialize, ToSchema)]
pub struct AllSlipsResponse {
    pub success: bool,
    pub slips: Vec<EmployeeSlip>,
}

#[derive(Serialize, ToSchema)]
pub struct SlipResponse {
    pub success: bool,
    pub slip: SalarySlip,
}

#[derive(Serialize, ToSchema)]
pub struct SlipUpdatedResponse {
    pub success: bool,
    #[schema(example = "Salary slip updated successfully")]
    pub message: String,
    pub data: SalarySlip,
}

#[utoipa::path(
    get,
    path = "/api/salary-slip/my-slips",
    responses(
        (status = 200, description = "Caller's own slips", body = SlipListResponse),
        (status = 401),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Slip"
)]
pub async fn my_slips(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id.clone();
    let slips = slips::slips_for_employee(state.employees.as_ref(), &employee_id, &auth).await?;

    Ok(HttpResponse::Ok().json(SlipListResponse {
        success: true,
        slips,
    }))
}

#[utoipa::path(
    get,
    path = "/api/salary-slip/all-slips",
    responses(
        (status = 200, description = "Every slip, most recent first", body = AllSlipsResponse),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Slip"
)]
pub async fn all_slips(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let slips = slips::all_slips(state.employees.as_ref(), &auth).await?;

    Ok(HttpResponse::Ok().json(AllSlipsResponse {
        success: true,
        slips,
    }))
}

#[utoipa::path(
    get,
    path = "/api/salary-slip/{employee_id}",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "The employee's slips", body = SlipListResponse),
        (status = 403),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Slip"
)]
pub async fn employee_slips(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let slips = slips::slips_for_employee(state.employees.as_ref(), &employee_id, &auth).await?;

    Ok(HttpResponse::Ok().json(SlipListResponse {
        success: true,
        slips,
    }))
}

#[utoipa::path(
    get,
    path = "/api/salary-slip/{employee_id}/{slip_id}",
    params(
        ("employee_id", description = "Employee ID"),
        ("slip_id", description = "Salary slip ID")
    ),
    responses(
        (status = 200, description = "Slip found", body = SlipResponse),
        (status = 403),
        (status = 404, description = "Employee or salary slip not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Slip"
)]
pub async fn get_slip(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, slip_id) = path.into_inner();
    let slip = slips::slip_details(state.employees.as_ref(), &employee_id, &slip_id, &auth).await?;

    Ok(HttpResponse::Ok().json(SlipResponse {
        success: true,
        slip,
    }))
}

#[utoipa::path(
    put,
    path = "/api/salary-slip/{employee_id}/{slip_id}",
    request_body = UpdateSlipReq,
    params(
        ("employee_id", description = "Employee ID"),
        ("slip_id", description = "Salary slip ID")
    ),
    responses(
        (status = 200, description = "Slip updated, net pay recomputed", body = SlipUpdatedResponse),
        (status = 403),
        (status = 404, description = "Employee or salary slip not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Slip"
)]
pub async fn update_slip(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateSlipReq>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, slip_id) = path.into_inner();
    let changes = SlipChanges::from(body.into_inner());

    let slip = slips::update_slip(
        state.employees.as_ref(),
        &employee_id,
        &slip_id,
        changes,
        &auth,
    )
    .await?;

    Ok(HttpResponse::Ok().json(SlipUpdatedResponse {
        success: true,
        message: "Salary slip updated successfully".to_string(),
        data: slip,
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
    use crate::payroll::calculator;
    use crate::store::memory::InMemoryStore;

    fn bearer(role: Role, employee_id: &str) -> (&'static str, String) {
        let config = Config::for_tests();
        let token = generate_access_token(1, employee_id, role, &config.jwt_secret, 60)
            .unwrap_or_default();
        ("Authorization", format!("Bearer {token}"))
    }

    /// E1 and E2 each hold one 2025-11 slip; returns E2's slip id.
    async fn seeded_state() -> (AppState, String) {
        let store = InMemoryStore::new();
        let mut e1 = employee("E1", 50_000.0);
        let mut e2 = employee("E2", 50_000.0);
        for e in [&mut e1, &mut e2] {
            let slip = SalarySlip::new(
                "2025-11",
                50_000.0,
                calculator::default_allowances(50_000.0),
                calculator::default_deductions(50_000.0),
                Utc::now(),
            );
            assert!(e.append_slip(slip).is_ok());
        }
        let e2_slip = e2.slips().as_slice()[0].id().to_string();
        assert!(store.insert_employee(e1).await.is_ok());
        assert!(store.insert_employee(e2).await.is_ok());

        let store = Arc::new(store);
        (AppState::new(store.clone(), store), e2_slip)
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new(Config::for_tests()))
                    .app_data(json_config())
                    .app_data(Data::new($state))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .service(
                                web::scope("/salary-slip")
                                    .route("/my-slips", web::get().to(my_slips))
                                    .route("/all-slips", web::get().to(all_slips))
                                    .route("/{employee_id}", web::get().to(employee_slips))
                                    .service(
                                        web::resource("/{employee_id}/{slip_id}")
                                            .route(web::get().to(get_slip))
                                            .route(web::put().to(update_slip)),
                                    ),
                            ),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn employee_cannot_read_another_employees_slip() {
        let (state, e2_slip) = seeded_state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/api/salary-slip/E2/{e2_slip}"))
            .insert_header(bearer(Role::Employee, "E1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Not authorized to perform this action");
    }

    #[actix_web::test]
    async fn hr_and_owner_can_read_the_slip() {
        let (state, e2_slip) = seeded_state().await;
        let app = app!(state);

        for (role, caller) in [(Role::Hr, "HR-1"), (Role::Admin, "A-1"), (Role::Employee, "E2")] {
            let req = test::TestRequest::get()
                .uri(&format!("/api/salary-slip/E2/{e2_slip}"))
                .insert_header(bearer(role, caller))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{caller}");

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["slip"]["payPeriod"], "2025-11");
            assert_eq!(body["slip"]["netPay"], 52_500.0);
        }
    }

    #[actix_web::test]
    async fn my_slips_resolves_caller_from_token() {
        let (state, _) = seeded_state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/salary-slip/my-slips")
            .insert_header(bearer(Role::Employee, "E1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["slips"].as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn all_slips_is_hr_only() {
        let (state, _) = seeded_state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/salary-slip/all-slips")
            .insert_header(bearer(Role::Employee, "E1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/salary-slip/all-slips")
            .insert_header(bearer(Role::Hr, "HR-1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["slips"].as_array().map(Vec::len), Some(2));
        assert!(body["slips"][0]["employeeId"].is_string());
        assert!(body["slips"][0]["slip"]["id"].is_string());
    }

    #[actix_web::test]
    async fn put_recomputes_net_pay_and_keeps_absent_fields() {
        let (state, e2_slip) = seeded_state().await;
        let app = app!(state);

        let req = test::TestRequest::put()
            .uri(&format!("/api/salary-slip/E2/{e2_slip}"))
            .insert_header(bearer(Role::Hr, "HR-1"))
            .set_json(json!({
                "allowances": [{ "name": "Bonus", "amount": 1000.0 }],
                "deductions": []
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Salary slip updated successfully");
        assert_eq!(body["data"]["basicSalary"], 50_000.0);
        assert_eq!(body["data"]["netPay"], 51_000.0);
        assert_eq!(body["data"]["deductions"], json!([]));
    }

    #[actix_web::test]
    async fn put_by_owner_is_forbidden() {
        let (state, e2_slip) = seeded_state().await;
        let app = app!(state);

        let req = test::TestRequest::put()
            .uri(&format!("/api/salary-slip/E2/{e2_slip}"))
            .insert_header(bearer(Role::Employee, "E2"))
            .set_json(json!({ "basicSalary": 1.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn unknown_slip_is_not_found() {
        let (state, _) = seeded_state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/salary-slip/E1/does-not-exist")
            .insert_header(bearer(Role::Hr, "HR-1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Salary slip not found");
    }

    #[actix_web::test]
    async fn malformed_correction_gets_the_error_body() {
        let (state, e2_slip) = seeded_state().await;
        let app = app!(state);

        let req = test::TestRequest::put()
            .uri(&format!("/api/salary-slip/E2/{e2_slip}"))
            .insert_header(bearer(Role::Hr, "HR-1"))
            .set_json(json!({ "basicSalary": "abc" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }
}
