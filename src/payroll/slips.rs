use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::employee::Employee;
use crate::model::salary_slip::{SalarySlip, SlipChanges};
use crate::store::{EmployeeRepository, modify_employee};

/// A slip together with the employee it belongs to, for HR-wide listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSlip {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "IT Services", nullable = true)]
    pub department: Option<String>,
    pub slip: SalarySlip,
}

async fn load_employee(
    employees: &dyn EmployeeRepository,
    employee_id: &str,
) -> AppResult<Employee> {
    employees
        .find_by_employee_id(employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

/// All slips of one employee, oldest first. No slips yet is an empty list.
pub async fn slips_for_employee(
    employees: &dyn EmployeeRepository,
    employee_id: &str,
    requester: &AuthUser,
) -> AppResult<Vec<SalarySlip>> {
    requester.require_self_or_hr(employee_id)?;

    let employee = load_employee(employees, employee_id).await?;
    Ok(employee.slips().as_slice().to_vec())
}

/// Every slip of every employee, most recently generated first.
pub async fn all_slips(
    employees: &dyn EmployeeRepository,
    requester: &AuthUser,
) -> AppResult<Vec<EmployeeSlip>> {
    requester.require_hr_or_admin()?;

    let mut slips: Vec<EmployeeSlip> = employees
        .find_all()
        .await?
        .into_iter()
        .flat_map(|employee| {
            let name = employee.full_name();
            let department = employee.job_profile.department.clone();
            let employee_id = employee.employee_id.clone();
            employee
                .slips()
                .iter()
                .map(|slip| EmployeeSlip {
                    employee_id: employee_id.clone(),
                    name: name.clone(),
                    department: department.clone(),
                    slip: slip.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    slips.sort_by(|left, right| right.slip.generated_on().cmp(&left.slip.generated_on()));
    Ok(slips)
}

pub async fn slip_details(
    employees: &dyn EmployeeRepository,
    employee_id: &str,
    slip_id: &str,
    requester: &AuthUser,
) -> AppResult<SalarySlip> {
    requester.require_self_or_hr(employee_id)?;

    let employee = load_employee(employees, employee_id).await?;
    employee
        .slips()
        .get(slip_id)
        .cloned()
        .ok_or_else(|| AppError::not_found("Salary slip not found"))
}

/// Corrects an existing slip; absent fields keep their value and net pay
/// is recomputed from the result.
pub async fn update_slip(
    employees: &dyn EmployeeRepository,
    employee_id: &str,
    slip_id: &str,
    changes: SlipChanges,
    requester: &AuthUser,
) -> AppResult<SalarySlip> {
    requester.require_hr_or_admin()?;

    let updated = modify_employee(employees, employee_id, move |employee| {
        let slip = employee
            .slip_mut(slip_id)
            .ok_or_else(|| AppError::not_found("Salary slip not found"))?;
        slip.apply(changes);
        Ok(slip.clone())
    })
    .await?;

    info!(
        employee_id,
        slip_id,
        updated_by = %requester.employee_id,
        net_pay = updated.net_pay(),
        "Salary slip updated"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::model::employee::fixtures::employee;
    use crate::model::role::Role;
    use crate::model::salary_slip::PayComponent;
    use crate::payroll::calculator;
    use crate::payroll::runner::{PayPeriod, run_payroll};
    use crate::store::EmployeeTransaction;
    use crate::store::memory::InMemoryStore;

    fn user(role: Role, employee_id: &str) -> AuthUser {
        AuthUser {
            user_id: 9,
            employee_id: employee_id.to_string(),
            role,
        }
    }

    fn default_slip(period: &str, basic: f64, generated_on: chrono::DateTime<Utc>) -> SalarySlip {
        SalarySlip::new(
            period,
            basic,
            calculator::default_allowances(basic),
            calculator::default_deductions(basic),
            generated_on,
        )
    }

    /// E1 has slips for 2025-10 and 2025-11; E2 has 2025-11; E3 has none.
    async fn seeded() -> (InMemoryStore, String) {
        let store = InMemoryStore::new();
        let now = Utc::now();

        let mut e1 = employee("E1", 50_000.0);
        assert!(e1.append_slip(default_slip("2025-10", 50_000.0, now - Duration::days(30))).is_ok());
        let latest = default_slip("2025-11", 50_000.0, now - Duration::days(1));
        let latest_id = latest.id().to_string();
        assert!(e1.append_slip(latest).is_ok());

        let mut e2 = employee("E2", 20_000.0);
        assert!(e2.append_slip(default_slip("2025-11", 20_000.0, now)).is_ok());

        for e in [e1, e2, employee("E3", 10_000.0)] {
            assert!(store.insert_employee(e).await.is_ok());
        }
        (store, latest_id)
    }

    #[actix_web::test]
    async fn employee_reads_own_slips_only() {
        let (store, _) = seeded().await;
        let me = user(Role::Employee, "E1");

        let mine = slips_for_employee(&store, "E1", &me).await;
        assert_eq!(mine.map(|s| s.len()).ok(), Some(2));

        let theirs = slips_for_employee(&store, "E2", &me).await;
        assert!(matches!(theirs, Err(AppError::NotAuthorized)));
    }

    #[actix_web::test]
    async fn no_slips_is_an_empty_list() {
        let (store, _) = seeded().await;
        let result = slips_for_employee(&store, "E3", &user(Role::Hr, "H1")).await;
        assert_eq!(result.map(|s| s.is_empty()).ok(), Some(true));
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let (store, _) = seeded().await;
        let result = slips_for_employee(&store, "E404", &user(Role::Admin, "A1")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn all_slips_are_flattened_newest_first() {
        let (store, _) = seeded().await;

        let listed = all_slips(&store, &user(Role::Hr, "H1")).await.unwrap_or_default();
        let order: Vec<(String, String)> = listed
            .iter()
            .map(|s| (s.employee_id.clone(), s.slip.pay_period().to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("E2".to_string(), "2025-11".to_string()),
                ("E1".to_string(), "2025-11".to_string()),
                ("E1".to_string(), "2025-10".to_string()),
            ]
        );
        assert_eq!(listed[0].name, "FirstE2 Tester");
        assert_eq!(listed[0].department.as_deref(), Some("IT Services"));

        let denied = all_slips(&store, &user(Role::Employee, "E1")).await;
        assert!(matches!(denied, Err(AppError::NotAuthorized)));
    }

    #[actix_web::test]
    async fn slip_details_misses_are_not_found() {
        let (store, latest_id) = seeded().await;
        let hr = user(Role::Hr, "H1");

        let found = slip_details(&store, "E1", &latest_id, &hr).await;
        assert_eq!(found.map(|s| s.pay_period().to_string()).ok().as_deref(), Some("2025-11"));

        let wrong_owner = slip_details(&store, "E2", &latest_id, &hr).await;
        assert!(matches!(wrong_owner, Err(AppError::NotFound(_))));

        let missing_employee = slip_details(&store, "E404", &latest_id, &hr).await;
        assert!(matches!(missing_employee, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn update_recomputes_from_new_lists() {
        let (store, latest_id) = seeded().await;
        let changes = SlipChanges {
            allowances: Some(vec![PayComponent::new("Bonus", 1_000.0)]),
            deductions: Some(Vec::new()),
            ..SlipChanges::default()
        };

        let updated = update_slip(&store, "E1", &latest_id, changes, &user(Role::Hr, "H1")).await;
        let updated = updated.unwrap_or_else(|_| unreachable!());
        assert!((updated.net_pay() - 51_000.0).abs() < 1e-6);
        assert_eq!(updated.basic_salary(), 50_000.0);

        let stored = slip_details(&store, "E1", &latest_id, &user(Role::Admin, "A1")).await;
        assert_eq!(stored.ok(), Some(updated));
    }

    #[actix_web::test]
    async fn update_can_zero_the_basic_salary() {
        let (store, latest_id) = seeded().await;
        let changes = SlipChanges {
            basic_salary: Some(0.0),
            ..SlipChanges::default()
        };

        let updated = update_slip(&store, "E1", &latest_id, changes, &user(Role::Admin, "A1")).await;
        let updated = updated.unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.basic_salary(), 0.0);
        // Allowance and tax lines still reflect the original 50000 basic.
        assert!((updated.net_pay() - 2_500.0).abs() < 1e-6);
    }

    #[actix_web::test]
    async fn update_is_hr_only_and_requires_existing_slip() {
        let (store, latest_id) = seeded().await;

        let by_owner = update_slip(
            &store,
            "E1",
            &latest_id,
            SlipChanges::default(),
            &user(Role::Employee, "E1"),
        )
        .await;
        assert!(matches!(by_owner, Err(AppError::NotAuthorized)));

        let missing = update_slip(
            &store,
            "E1",
            "no-such-slip",
            SlipChanges::default(),
            &user(Role::Hr, "H1"),
        )
        .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn every_stored_slip_satisfies_net_pay_invariant() {
        let (store, latest_id) = seeded().await;
        let changes = SlipChanges {
            basic_salary: Some(42_000.0),
            deductions: Some(vec![PayComponent::new("PF", 1_234.5)]),
            ..SlipChanges::default()
        };
        assert!(update_slip(&store, "E1", &latest_id, changes, &user(Role::Hr, "H1")).await.is_ok());

        for employee in store.find_all().await.unwrap_or_default() {
            for slip in employee.slips().iter() {
                let expected =
                    calculator::net_pay(slip.basic_salary(), slip.allowances(), slip.deductions());
                assert!((slip.net_pay() - expected).abs() < 1e-6);
            }
        }
    }

    /// Commits a 2025-12 payroll run the first time an employee is read or
    /// a write scope is opened, as another request would.
    struct RunDuringUpdate {
        inner: InMemoryStore,
        ran: AtomicBool,
    }

    impl RunDuringUpdate {
        async fn run_once(&self) {
            if !self.ran.swap(true, Ordering::SeqCst) {
                let period = PayPeriod::parse("2025-12").unwrap_or_else(|_| unreachable!());
                let summary = run_payroll(&self.inner, &period, &user(Role::Hr, "H2")).await;
                assert_eq!(summary.map(|s| s.processed_count).ok(), Some(3));
            }
        }
    }

    #[async_trait]
    impl EmployeeRepository for RunDuringUpdate {
        async fn find_all(&self) -> AppResult<Vec<Employee>> {
            self.inner.find_all().await
        }

        async fn find_by_employee_id(&self, employee_id: &str) -> AppResult<Option<Employee>> {
            let snapshot = self.inner.find_by_employee_id(employee_id).await;
            self.run_once().await;
            snapshot
        }

        async fn begin(&self) -> AppResult<Box<dyn EmployeeTransaction>> {
            self.run_once().await;
            self.inner.begin().await
        }
    }

    #[actix_web::test]
    async fn correction_keeps_slips_from_a_run_committed_meanwhile() {
        let (inner, latest_id) = seeded().await;
        let store = RunDuringUpdate {
            inner: inner.clone(),
            ran: AtomicBool::new(false),
        };
        let changes = SlipChanges {
            deductions: Some(Vec::new()),
            ..SlipChanges::default()
        };

        let updated = update_slip(&store, "E1", &latest_id, changes, &user(Role::Hr, "H1")).await;
        let net_pay = updated.map(|s| s.net_pay()).unwrap_or_default();
        assert!((net_pay - 55_000.0).abs() < 1e-6);

        let periods: Vec<String> = slips_for_employee(&inner, "E1", &user(Role::Hr, "H1"))
            .await
            .unwrap_or_default()
            .iter()
            .map(|s| s.pay_period().to_string())
            .collect();
        assert_eq!(periods, vec!["2025-10", "2025-11", "2025-12"]);

        let corrected = slip_details(&inner, "E1", &latest_id, &user(Role::Hr, "H1")).await;
        assert!(corrected.map(|s| s.deductions().is_empty()).unwrap_or(false));
    }
}
