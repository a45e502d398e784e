use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use once_cell::sync::Lazy;
use std::sync::{PoisonError, RwLock};

use crate::store::UserRepository;

/// Expected number of registered employees and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMPLOYEE_ID_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(employee_id: &str) -> String {
    employee_id.trim().to_lowercase()
}

/// `false` means the ID is definitely unregistered; `true` may be a false positive.
pub fn might_exist(employee_id: &str) -> bool {
    let employee_id = normalize(employee_id);
    EMPLOYEE_ID_FILTER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(&employee_id)
}

pub fn insert(employee_id: &str) {
    let employee_id = normalize(employee_id);
    EMPLOYEE_ID_FILTER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .add(&employee_id);
}

/// Loads every registered employee ID into the filter, in batches.
pub async fn warmup_employee_id_filter(users: &dyn UserRepository, batch_size: usize) -> Result<()> {
    let employee_ids = users
        .list_employee_ids()
        .await
        .map_err(|e| anyhow!("employee id fetch failed: {}", e))?;

    let total = employee_ids.len();
    for chunk in employee_ids.chunks(batch_size.max(1)) {
        let batch: Vec<String> = chunk.iter().map(|id| normalize(id)).collect();
        insert_batch(&batch);
    }

    tracing::info!(total, "Employee ID filter warmup complete");
    Ok(())
}

fn insert_batch(employee_ids: &[String]) {
    let mut filter = EMPLOYEE_ID_FILTER
        .write()
        .unwrap_or_else(PoisonError::into_inner);

    for employee_id in employee_ids {
        filter.add(employee_id);
    }
}
