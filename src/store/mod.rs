//! Persistence ports for employee aggregates and login credentials.
//!
//! Two backends implement them: [`mysql::MySqlStore`] for deployments and
//! [`memory::InMemoryStore`] for local runs without a database and for tests.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::model::employee::Employee;
use crate::model::user::{NewUser, User};

/// Employee aggregate access.
///
/// Reads are snapshots. Writes go through an [`EmployeeTransaction`]: a
/// save rewrites the whole aggregate, embedded salary slips included.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Snapshot of every employee, in store order.
    async fn find_all(&self) -> AppResult<Vec<Employee>>;

    async fn find_by_employee_id(&self, employee_id: &str) -> AppResult<Option<Employee>>;

    /// Opens a scope whose writes become visible together on commit.
    async fn begin(&self) -> AppResult<Box<dyn EmployeeTransaction>>;
}

/// A multi-employee write scope. Dropping it without `commit` discards
/// every write made through it.
#[async_trait]
pub trait EmployeeTransaction: Send {
    /// Loads every employee and holds them against concurrent scopes
    /// until this one ends.
    async fn lock_all(&mut self) -> AppResult<Vec<Employee>>;

    /// Loads one employee and holds it until this scope ends.
    async fn lock_one(&mut self, employee_id: &str) -> AppResult<Option<Employee>>;

    async fn save(&mut self, employee: &Employee) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Locks one employee, applies `change` and commits.
///
/// A missing employee is `NotFound("Employee not found")`. If `change` or the
/// save fails, the scope is rolled back and nothing is written.
pub async fn modify_employee<T, F>(
    employees: &dyn EmployeeRepository,
    employee_id: &str,
    change: F,
) -> AppResult<T>
where
    T: Send,
    F: FnOnce(&mut Employee) -> AppResult<T> + Send,
{
    let mut tx = employees.begin().await?;

    let outcome = match tx.lock_one(employee_id).await {
        Ok(Some(mut employee)) => match change(&mut employee) {
            Ok(value) => tx.save(&employee).await.map(|()| value),
            Err(e) => Err(e),
        },
        Ok(None) => Err(AppError::not_found("Employee not found")),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(error = %rollback_error, employee_id, "Rollback of employee update failed");
            }
            Err(e)
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the login record and its employee profile together.
    async fn create_account(&self, user: NewUser, employee: Employee) -> AppResult<User>;

    async fn find_user(&self, employee_id: &str) -> AppResult<Option<User>>;

    async fn email_in_use(&self, email: &str) -> AppResult<bool>;

    async fn has_users(&self) -> AppResult<bool>;

    /// Every registered employee ID, used to warm the registration filter.
    async fn list_employee_ids(&self) -> AppResult<Vec<String>>;
}
