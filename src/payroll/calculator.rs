//! Net pay arithmetic and the default batch-run slip policy.
//!
//! Amounts are not validated: negative lines are summed like any other.

use crate::model::salary_slip::PayComponent;

pub const SPECIAL_ALLOWANCE: &str = "Special Allowance";
pub const SPECIAL_ALLOWANCE_RATE: f64 = 0.10;

pub const TAX: &str = "Tax";
pub const TAX_RATE: f64 = 0.05;

pub fn total(components: &[PayComponent]) -> f64 {
    components.iter().map(|component| component.amount).sum()
}

pub fn net_pay(basic_salary: f64, allowances: &[PayComponent], deductions: &[PayComponent]) -> f64 {
    basic_salary + total(allowances) - total(deductions)
}

pub fn default_allowances(basic_salary: f64) -> Vec<PayComponent> {
    vec![PayComponent::new(
        SPECIAL_ALLOWANCE,
        basic_salary * SPECIAL_ALLOWANCE_RATE,
    )]
}

pub fn default_deductions(basic_salary: f64) -> Vec<PayComponent> {
    vec![PayComponent::new(TAX, basic_salary * TAX_RATE)]
}
