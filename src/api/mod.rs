pub mod chatbot;
pub mod job_profile;
pub mod payroll;
pub mod promotion;
pub mod salary_slip;
