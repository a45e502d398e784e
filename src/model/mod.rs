pub mod employee;
pub mod role;
pub mod salary_slip;
pub mod user;
