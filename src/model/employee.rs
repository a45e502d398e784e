use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::model::salary_slip::{PayComponent, SalarySlip, SalarySlips};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,
    #[schema(nullable = true)]
    pub address: Option<String>,
    #[schema(example = "1990-04-12", value_type = String, format = "date", nullable = true)]
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobProfile {
    #[schema(example = "Senior Developer", nullable = true)]
    pub designation: Option<String>,
    #[schema(example = "IT Services", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "Jane Smith", nullable = true)]
    pub reporting_manager: Option<String>,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub join_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Compensation {
    #[schema(example = "Level 10", nullable = true)]
    pub pay_scale: Option<String>,
    #[schema(example = 50000.0)]
    pub basic_salary: f64,
    pub allowances: Vec<PayComponent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    #[schema(example = 12)]
    pub casual_leave: u32,
    #[schema(example = 5)]
    pub sick_leave: u32,
}

impl Default for LeaveBalance {
    fn default() -> Self {
        Self {
            casual_leave: 12,
            sick_leave: 5,
        }
    }
}

/// Employee aggregate: HR data plus the embedded salary slip history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_id: String,
    /// Login credential record this employee signs in with.
    pub user_id: u64,
    pub personal_info: PersonalInfo,
    pub job_profile: JobProfile,
    pub compensation: Compensation,
    pub leave_balance: LeaveBalance,
    salary_slips: SalarySlips,
}

impl Employee {
    pub fn new(
        employee_id: impl Into<String>,
        user_id: u64,
        personal_info: PersonalInfo,
        job_profile: JobProfile,
        compensation: Compensation,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            user_id,
            personal_info,
            job_profile,
            compensation,
            leave_balance: LeaveBalance::default(),
            salary_slips: SalarySlips::default(),
        }
    }

    pub fn with_leave_balance(mut self, leave_balance: LeaveBalance) -> Self {
        self.leave_balance = leave_balance;
        self
    }

    pub fn with_slips(mut self, salary_slips: SalarySlips) -> Self {
        self.salary_slips = salary_slips;
        self
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.personal_info.first_name, self.personal_info.last_name
        )
    }

    pub fn slips(&self) -> &SalarySlips {
        &self.salary_slips
    }

    pub fn slip_mut(&mut self, slip_id: &str) -> Option<&mut SalarySlip> {
        self.salary_slips.get_mut(slip_id)
    }

    pub fn has_slip_for(&self, pay_period: &str) -> bool {
        self.salary_slips.has_period(pay_period)
    }

    pub fn append_slip(&mut self, slip: SalarySlip) -> AppResult<()> {
        self.salary_slips.push(slip)
    }
}

/// Registration input for the job profile; join date defaults to today.
pub fn new_job_profile(designation: Option<String>, department: Option<String>) -> JobProfile {
    JobProfile {
        designation,
        department,
        reporting_manager: None,
        join_date: Utc::now().date_naive(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn employee(employee_id: &str, basic_salary: f64) -> Employee {
        Employee::new(
            employee_id,
            0,
            PersonalInfo {
                first_name: format!("First{employee_id}"),
                last_name: "Tester".to_string(),
                email: format!("{}@company.com", employee_id.to_lowercase()),
                phone: None,
                address: None,
                date_of_birth: None,
            },
            new_job_profile(Some("Engineer".to_string()), Some("IT Services".to_string())),
            Compensation {
                pay_scale: Some("Level 5".to_string()),
                basic_salary,
                allowances: Vec::new(),
            },
        )
    }
}
