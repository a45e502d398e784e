use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::payroll::calculator;

/// A named line on a slip or in standing compensation, e.g. "HRA" or "Tax".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayComponent {
    #[schema(example = "Special Allowance")]
    pub name: String,
    #[schema(example = 5000.0)]
    pub amount: f64,
}

impl PayComponent {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Field-level changes to an existing slip. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct SlipChanges {
    pub basic_salary: Option<f64>,
    pub allowances: Option<Vec<PayComponent>>,
    pub deductions: Option<Vec<PayComponent>>,
}

/// One employee's pay for one pay period.
///
/// Fields are private so `net_pay` can only change together with its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "5f0c3b8e-8a43-4c4e-9d0e-2b7d8a5b1c11",
    "payPeriod": "2025-11",
    "basicSalary": 50000.0,
    "allowances": [{ "name": "Special Allowance", "amount": 5000.0 }],
    "deductions": [{ "name": "Tax", "amount": 2500.0 }],
    "netPay": 52500.0,
    "generatedOn": "2025-11-30T10:00:00Z"
}))]
pub struct SalarySlip {
    id: String,
    pay_period: String,
    basic_salary: f64,
    allowances: Vec<PayComponent>,
    deductions: Vec<PayComponent>,
    net_pay: f64,
    #[schema(value_type = String, format = "date-time")]
    generated_on: DateTime<Utc>,
}

impl SalarySlip {
    pub fn new(
        pay_period: impl Into<String>,
        basic_salary: f64,
        allowances: Vec<PayComponent>,
        deductions: Vec<PayComponent>,
        generated_on: DateTime<Utc>,
    ) -> Self {
        let net_pay = calculator::net_pay(basic_salary, &allowances, &deductions);
        Self {
            id: Uuid::new_v4().to_string(),
            pay_period: pay_period.into(),
            basic_salary,
            allowances,
            deductions,
            net_pay,
            generated_on,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pay_period(&self) -> &str {
        &self.pay_period
    }

    pub fn basic_salary(&self) -> f64 {
        self.basic_salary
    }

    pub fn allowances(&self) -> &[PayComponent] {
        &self.allowances
    }

    pub fn deductions(&self) -> &[PayComponent] {
        &self.deductions
    }

    pub fn net_pay(&self) -> f64 {
        self.net_pay
    }

    pub fn generated_on(&self) -> DateTime<Utc> {
        self.generated_on
    }

    /// Overwrites the supplied fields and recomputes net pay.
    pub fn apply(&mut self, changes: SlipChanges) {
        if let Some(basic_salary) = changes.basic_salary {
            self.basic_salary = basic_salary;
        }
        if let Some(allowances) = changes.allowances {
            self.allowances = allowances;
        }
        if let Some(deductions) = changes.deductions {
            self.deductions = deductions;
        }
        self.net_pay = calculator::net_pay(self.basic_salary, &self.allowances, &self.deductions);
    }
}

/// The ordered slip history embedded in an employee record.
///
/// Slips are addressed by id through a position index; they have no identity
/// outside the owning employee. At most one slip exists per pay period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<SalarySlip>", into = "Vec<SalarySlip>")]
pub struct SalarySlips {
    slips: Vec<SalarySlip>,
    by_id: HashMap<String, usize>,
}

impl SalarySlips {
    pub fn len(&self) -> usize {
        self.slips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slips.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalarySlip> {
        self.slips.iter()
    }

    pub fn as_slice(&self) -> &[SalarySlip] {
        &self.slips
    }

    pub fn has_period(&self, pay_period: &str) -> bool {
        self.slips.iter().any(|slip| slip.pay_period == pay_period)
    }

    pub fn get(&self, slip_id: &str) -> Option<&SalarySlip> {
        self.by_id.get(slip_id).map(|&position| &self.slips[position])
    }

    pub fn get_mut(&mut self, slip_id: &str) -> Option<&mut SalarySlip> {
        match self.by_id.get(slip_id) {
            Some(&position) => self.slips.get_mut(position),
            None => None,
        }
    }

    pub fn push(&mut self, slip: SalarySlip) -> AppResult<()> {
        if self.has_period(&slip.pay_period) {
            return Err(AppError::Conflict(format!(
                "A salary slip for {} already exists",
                slip.pay_period
            )));
        }
        if self.by_id.contains_key(&slip.id) {
            return Err(AppError::Conflict(format!(
                "Salary slip {} already exists",
                slip.id
            )));
        }

        self.by_id.insert(slip.id.clone(), self.slips.len());
        self.slips.push(slip);
        Ok(())
    }
}

impl From<Vec<SalarySlip>> for SalarySlips {
    fn from(slips: Vec<SalarySlip>) -> Self {
        let by_id = slips
            .iter()
            .enumerate()
            .map(|(position, slip)| (slip.id.clone(), position))
            .collect();
        Self { slips, by_id }
    }
}

impl From<SalarySlips> for Vec<SalarySlip> {
    fn from(collection: SalarySlips) -> Self {
        collection.slips
    }
}
