use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProbeError;
use crate::query_cache::QueryCache;

use super::{Probe, ProbeSuccess};

/// Sweeps expired entries from the shared [`QueryCache`], per spec.md
/// §4.3's Maintenance row. Never fails.
pub struct MaintenanceProbe {
    cache: Arc<QueryCache>,
    ttl: Duration,
}

impl MaintenanceProbe {
    pub fn new(cache: Arc<QueryCache>, ttl: Duration) -> Self {
        MaintenanceProbe { cache, ttl }
    }
}

#[async_trait]
impl Probe for MaintenanceProbe {
    async fn execute(&self, _timeout: Duration) -> Result<ProbeSuccess, ProbeError> {
        self.cache.sweep(self.ttl).await;
        Ok(ProbeSuccess::empty())
    }
}
