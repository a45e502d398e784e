use crate::model::role::Role;

/// Login credential linked to an employee record by `employee_id`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub employee_id: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub employee_id: String,
    pub password_hash: String,
    pub role: Role,
}
