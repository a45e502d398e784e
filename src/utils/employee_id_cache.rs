use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

/// Employee IDs known to be registered. Only taken IDs are stored.
pub static EMPLOYEE_ID_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn mark_taken(employee_id: &str) {
    EMPLOYEE_ID_CACHE
        .insert(employee_id.trim().to_lowercase(), true)
        .await;
}

pub async fn is_taken(employee_id: &str) -> bool {
    EMPLOYEE_ID_CACHE
        .get(&employee_id.trim().to_lowercase())
        .await
        .unwrap_or(false)
}
