use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::MySqlArguments;
use sqlx::types::Json;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::model::employee::{Compensation, Employee, JobProfile, LeaveBalance, PersonalInfo};
use crate::model::role::Role;
use crate::model::salary_slip::{PayComponent, SalarySlips};
use crate::model::user::{NewUser, User};
use crate::store::{EmployeeRepository, EmployeeTransaction, UserRepository};

const SELECT_EMPLOYEES: &str = r#"
    SELECT
        employee_id, user_id,
        first_name, last_name, email, phone, address, date_of_birth,
        designation, department, reporting_manager, join_date,
        pay_scale, basic_salary, allowances,
        casual_leave, sick_leave,
        salary_slips
    FROM employees
"#;

/// MySQL duplicate-key SQLSTATE.
const DUPLICATE_KEY: &str = "23000";

#[derive(FromRow)]
struct EmployeeRow {
    employee_id: String,
    user_id: u64,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    date_of_birth: Option<NaiveDate>,
    designation: Option<String>,
    department: Option<String>,
    reporting_manager: Option<String>,
    join_date: NaiveDate,
    pay_scale: Option<String>,
    basic_salary: f64,
    allowances: Json<Vec<PayComponent>>,
    casual_leave: u32,
    sick_leave: u32,
    salary_slips: Json<SalarySlips>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee::new(
            row.employee_id,
            row.user_id,
            PersonalInfo {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone: row.phone,
                address: row.address,
                date_of_birth: row.date_of_birth,
            },
            JobProfile {
                designation: row.designation,
                department: row.department,
                reporting_manager: row.reporting_manager,
                join_date: row.join_date,
            },
            Compensation {
                pay_scale: row.pay_scale,
                basic_salary: row.basic_salary,
                allowances: row.allowances.0,
            },
        )
        .with_leave_balance(LeaveBalance {
            casual_leave: row.casual_leave,
            sick_leave: row.sick_leave,
        })
        .with_slips(row.salary_slips.0)
    }
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    employee_id: String,
    password: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        let role = Role::from_str(&row.role)
            .map_err(|_| AppError::Internal(format!("unknown role '{}'", row.role)))?;
        Ok(User {
            id: row.id,
            employee_id: row.employee_id,
            password_hash: row.password,
            role,
        })
    }
}

/// Full-aggregate write; the slip history travels as one JSON document.
fn update_employee(employee: &Employee) -> sqlx::query::Query<'_, MySql, MySqlArguments> {
    sqlx::query(
        r#"
        UPDATE employees SET
            first_name = ?, last_name = ?, email = ?, phone = ?, address = ?, date_of_birth = ?,
            designation = ?, department = ?, reporting_manager = ?, join_date = ?,
            pay_scale = ?, basic_salary = ?, allowances = ?,
            casual_leave = ?, sick_leave = ?,
            salary_slips = ?,
            updated_at = NOW()
        WHERE employee_id = ?
        "#,
    )
    .bind(&employee.personal_info.first_name)
    .bind(&employee.personal_info.last_name)
    .bind(&employee.personal_info.email)
    .bind(&employee.personal_info.phone)
    .bind(&employee.personal_info.address)
    .bind(employee.personal_info.date_of_birth)
    .bind(&employee.job_profile.designation)
    .bind(&employee.job_profile.department)
    .bind(&employee.job_profile.reporting_manager)
    .bind(employee.job_profile.join_date)
    .bind(&employee.compensation.pay_scale)
    .bind(employee.compensation.basic_salary)
    .bind(Json(&employee.compensation.allowances))
    .bind(employee.leave_balance.casual_leave)
    .bind(employee.leave_balance.sick_leave)
    .bind(Json(employee.slips()))
    .bind(&employee.employee_id)
}

fn is_duplicate_key(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(DUPLICATE_KEY))
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for MySqlStore {
    async fn find_all(&self) -> AppResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(&format!("{SELECT_EMPLOYEES} ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::internal("failed to list employees", e))?;

        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn find_by_employee_id(&self, employee_id: &str) -> AppResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "{SELECT_EMPLOYEES} WHERE employee_id = ?"
        ))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal("failed to fetch employee", e))?;

        Ok(row.map(Employee::from))
    }

    async fn begin(&self) -> AppResult<Box<dyn EmployeeTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::internal("failed to begin transaction", e))?;
        Ok(Box::new(MySqlTransaction { tx }))
    }
}

struct MySqlTransaction {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl EmployeeTransaction for MySqlTransaction {
    async fn lock_all(&mut self) -> AppResult<Vec<Employee>> {
        // Row locks make a concurrent run for the same period wait for this
        // one and then see its slips.
        let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
            "{SELECT_EMPLOYEES} ORDER BY id FOR UPDATE"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| AppError::internal("failed to lock employees", e))?;

        debug!(count = rows.len(), "Locked employee rows");
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn lock_one(&mut self, employee_id: &str) -> AppResult<Option<Employee>> {
        // A payroll run holding this row commits first; its slips are then
        // part of what this scope reads and writes back.
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "{SELECT_EMPLOYEES} WHERE employee_id = ? FOR UPDATE"
        ))
        .bind(employee_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::internal("failed to lock employee", e))?;

        Ok(row.map(Employee::from))
    }

    async fn save(&mut self, employee: &Employee) -> AppResult<()> {
        update_employee(employee)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| AppError::internal("failed to save employee", e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::internal("failed to commit transaction", e))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::internal("failed to roll back transaction", e))
    }
}

#[async_trait]
impl UserRepository for MySqlStore {
    async fn create_account(&self, user: NewUser, employee: Employee) -> AppResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::internal("failed to begin transaction", e))?;

        let user_id = sqlx::query("INSERT INTO users (employee_id, password, role) VALUES (?, ?, ?)")
            .bind(&user.employee_id)
            .bind(&user.password_hash)
            .bind(user.role.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::Conflict("User with this Employee ID already exists".to_string())
                } else {
                    AppError::internal("failed to insert user", e)
                }
            })?
            .last_insert_id();

        sqlx::query(
            r#"
            INSERT INTO employees
                (employee_id, user_id, first_name, last_name, email, phone, address, date_of_birth,
                 designation, department, reporting_manager, join_date,
                 pay_scale, basic_salary, allowances, casual_leave, sick_leave, salary_slips)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(user_id)
        .bind(&employee.personal_info.first_name)
        .bind(&employee.personal_info.last_name)
        .bind(&employee.personal_info.email)
        .bind(&employee.personal_info.phone)
        .bind(&employee.personal_info.address)
        .bind(employee.personal_info.date_of_birth)
        .bind(&employee.job_profile.designation)
        .bind(&employee.job_profile.department)
        .bind(&employee.job_profile.reporting_manager)
        .bind(employee.job_profile.join_date)
        .bind(&employee.compensation.pay_scale)
        .bind(employee.compensation.basic_salary)
        .bind(Json(&employee.compensation.allowances))
        .bind(employee.leave_balance.casual_leave)
        .bind(employee.leave_balance.sick_leave)
        .bind(Json(employee.slips()))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict("User with this email already exists".to_string())
            } else {
                AppError::internal("failed to insert employee", e)
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::internal("failed to commit registration", e))?;

        Ok(User {
            id: user_id,
            employee_id: user.employee_id,
            password_hash: user.password_hash,
            role: user.role,
        })
    }

    async fn find_user(&self, employee_id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, employee_id, password, role FROM users WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal("failed to fetch user", e))?;

        row.map(User::try_from).transpose()
    }

    async fn email_in_use(&self, email: &str) -> AppResult<bool> {
        // EXISTS comes back as BIGINT, not TINYINT(1).
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE email = ? LIMIT 1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::internal("failed to check email", e))?;

        Ok(exists != 0)
    }

    async fn has_users(&self) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM users LIMIT 1)")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::internal("failed to count users", e))?;

        Ok(exists != 0)
    }

    async fn list_employee_ids(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT employee_id FROM users")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::internal("failed to list employee ids", e))
    }
}
