//! HR assistant: answers an employee's question from their own record.
//!
//! The language model sits behind [`ChatClient`]; [`gemini::GeminiClient`]
//! is the deployed implementation.

pub mod gemini;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::model::employee::Employee;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Answers `query` under the given system instruction.
    async fn reply(&self, system_prompt: &str, query: &str) -> AppResult<String>;
}

/// The slice of an employee record the assistant may talk about.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatContext {
    pub name: String,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub casual_leave: u32,
    pub sick_leave: u32,
}

impl From<&Employee> for ChatContext {
    fn from(employee: &Employee) -> Self {
        Self {
            name: employee.full_name(),
            designation: employee.job_profile.designation.clone(),
            department: employee.job_profile.department.clone(),
            casual_leave: employee.leave_balance.casual_leave,
            sick_leave: employee.leave_balance.sick_leave,
        }
    }
}

impl ChatContext {
    pub fn system_prompt(&self) -> String {
        let or_unknown = |value: &Option<String>| {
            value.clone().unwrap_or_else(|| "Not specified".to_string())
        };

        format!(
            "You are a professional HR assistant chatbot for a government organization.\n\
             You must be polite, concise, and helpful.\n\
             You will answer questions based only on the employee context provided below.\n\
             If the answer is not in the context, politely say you don't have that information.\n\
             \n\
             Employee Context:\n\
             - Name: {}\n\
             - Designation: {}\n\
             - Department: {}\n\
             - Available Casual Leave: {} days\n\
             - Available Sick Leave: {} days\n",
            self.name,
            or_unknown(&self.designation),
            or_unknown(&self.department),
            self.casual_leave,
            self.sick_leave,
        )
    }
}
