use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, AppResult};
use crate::model::employee::Employee;
use crate::model::user::{NewUser, User};
use crate::store::{EmployeeRepository, EmployeeTransaction, UserRepository};

#[derive(Debug, Default)]
struct MemoryState {
    employees: Vec<Employee>,
    users: Vec<User>,
    next_user_id: u64,
}

impl MemoryState {
    fn position(&self, employee_id: &str) -> Option<usize> {
        self.employees
            .iter()
            .position(|employee| employee.employee_id == employee_id)
    }
}

/// Insertion-ordered store behind one async mutex.
///
/// A transaction owns the mutex for its whole lifetime, so batch scopes are
/// serialized and readers never observe a half-applied run.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an employee directly, bypassing registration.
    #[cfg(test)]
    pub async fn insert_employee(&self, employee: Employee) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.position(&employee.employee_id).is_some() {
            return Err(AppError::Conflict(format!(
                "Employee {} already exists",
                employee.employee_id
            )));
        }
        state.employees.push(employee);
        Ok(())
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryStore {
    async fn find_all(&self) -> AppResult<Vec<Employee>> {
        Ok(self.state.lock().await.employees.clone())
    }

    async fn find_by_employee_id(&self, employee_id: &str) -> AppResult<Option<Employee>> {
        let state = self.state.lock().await;
        Ok(state
            .position(employee_id)
            .map(|position| state.employees[position].clone()))
    }

    async fn begin(&self) -> AppResult<Box<dyn EmployeeTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.employees.clone();
        Ok(Box::new(InMemoryTransaction { guard, staged }))
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Vec<Employee>,
}

#[async_trait]
impl EmployeeTransaction for InMemoryTransaction {
    async fn lock_all(&mut self) -> AppResult<Vec<Employee>> {
        Ok(self.staged.clone())
    }

    async fn lock_one(&mut self, employee_id: &str) -> AppResult<Option<Employee>> {
        Ok(self
            .staged
            .iter()
            .find(|staged| staged.employee_id == employee_id)
            .cloned())
    }

    async fn save(&mut self, employee: &Employee) -> AppResult<()> {
        let staged = self
            .staged
            .iter_mut()
            .find(|staged| staged.employee_id == employee.employee_id)
            .ok_or_else(|| AppError::not_found("Employee not found"))?;
        *staged = employee.clone();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let InMemoryTransaction { mut guard, staged } = *self;
        guard.employees = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_account(&self, user: NewUser, mut employee: Employee) -> AppResult<User> {
        let mut state = self.state.lock().await;

        if state.users.iter().any(|u| u.employee_id == user.employee_id)
            || state.position(&employee.employee_id).is_some()
        {
            return Err(AppError::Conflict(
                "User with this Employee ID already exists".to_string(),
            ));
        }
        let email = employee.personal_info.email.as_str();
        if state.employees.iter().any(|e| e.personal_info.email == email) {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        state.next_user_id += 1;
        let created = User {
            id: state.next_user_id,
            employee_id: user.employee_id,
            password_hash: user.password_hash,
            role: user.role,
        };
        employee.user_id = created.id;

        state.users.push(created.clone());
        state.employees.push(employee);
        Ok(created)
    }

    async fn find_user(&self, employee_id: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|user| user.employee_id == employee_id)
            .cloned())
    }

    async fn email_in_use(&self, email: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .employees
            .iter()
            .any(|employee| employee.personal_info.email == email))
    }

    async fn has_users(&self) -> AppResult<bool> {
        Ok(!self.state.lock().await.users.is_empty())
    }

    async fn list_employee_ids(&self) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().map(|u| u.employee_id.clone()).collect())
    }
}
