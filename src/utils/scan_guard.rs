use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::time::Duration;

/// Expected number of badges and false-positive rate of the token filter.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;
const MAX_TRACKED_SCANS: u64 = 50_000;

/// Front line for the QR scanner stream.
///
/// A cuckoo filter answers "definitely not a badge" without touching the store, and a
/// short-lived cache swallows repeated reads of the same badge (scanners fire several
/// times while a badge is held in front of them).
pub struct ScanGuard {
    known_tokens: RwLock<CuckooFilter<String>>,
    recent_scans: Cache<String, ()>,
}

#[inline]
fn key(tenant_id: u64, token: &str) -> String {
    format!("{}:{}", tenant_id, token.trim())
}

impl ScanGuard {
    pub fn new(debounce: Duration) -> Self {
        ScanGuard {
            known_tokens: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            recent_scans: Cache::builder()
                .max_capacity(MAX_TRACKED_SCANS)
                .time_to_live(debounce)
                .build(),
        }
    }

    /// `false` means the token was never issued; `true` may be a false positive.
    pub fn might_be_known(&self, tenant_id: u64, token: &str) -> bool {
        self.known_tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&key(tenant_id, token))
    }

    pub fn register_token(&self, tenant_id: u64, token: &str) {
        self.known_tokens
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .add(&key(tenant_id, token));
    }

    pub fn forget_token(&self, tenant_id: u64, token: &str) {
        self.known_tokens
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key(tenant_id, token));
    }

    /// `true` for the first scan of a badge inside the debounce window.
    pub async fn accept_scan(&self, tenant_id: u64, token: &str) -> bool {
        self.recent_scans
            .entry(key(tenant_id, token))
            .or_insert(())
            .await
            .is_fresh()
    }

    /// Loads every issued badge token into the filter, streaming in batches.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let mut stream =
            sqlx::query_as::<_, (u64, String)>("SELECT tenant_id, qr_token FROM employees").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (tenant_id, token) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

            batch.push(key(tenant_id, &token));
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        tracing::info!(total, "Badge token filter warmup complete");
        Ok(())
    }

    fn insert_batch(&self, keys: &[String]) {
        let mut filter = self.known_tokens.write().unwrap_or_else(|e| e.into_inner());

        for k in keys {
            filter.add(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_token_is_rejected() {
        let guard = ScanGuard::new(Duration::from_secs(60));
        guard.register_token(1, "badge-a");

        assert!(guard.might_be_known(1, "badge-a"));
        assert!(guard.might_be_known(1, "  badge-a  "));
        assert!(!guard.might_be_known(1, "badge-zzz"));
        assert!(!guard.might_be_known(2, "badge-a"));
    }

    #[test]
    fn test_forget_token() {
        let guard = ScanGuard::new(Duration::from_secs(60));
        guard.register_token(1, "badge-b");
        guard.forget_token(1, "badge-b");
        assert!(!guard.might_be_known(1, "badge-b"));
    }

    #[actix_web::test]
    async fn test_repeated_scan_is_debounced() {
        let guard = ScanGuard::new(Duration::from_secs(60));

        assert!(guard.accept_scan(1, "badge-a").await);
        assert!(!guard.accept_scan(1, "badge-a").await);
        assert!(guard.accept_scan(1, "badge-b").await);
        assert!(guard.accept_scan(2, "badge-a").await);
    }

    #[actix_web::test]
    async fn test_scan_accepted_again_after_window() {
        let guard = ScanGuard::new(Duration::from_millis(50));

        assert!(guard.accept_scan(1, "badge-a").await);
        actix_web::rt::time::sleep(Duration::from_millis(120)).await;
        assert!(guard.accept_scan(1, "badge-a").await);
    }
}
