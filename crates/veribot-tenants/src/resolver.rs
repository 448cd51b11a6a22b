use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::db;
use crate::error::{Result, TenantError};
use crate::types::Tenant;

/// How long a cached tenant record is trusted before being re-read from
/// SQLite. Soft TTL: a stale hit is still served, just scheduled for a
/// background refresh, so a config edit under a client's feet is visible
/// within one TTL window without adding latency to the hot path.
const CACHE_TTL: Duration = Duration::from_secs(30);

struct CacheEntry {
    tenant: Tenant,
    cached_at: Instant,
}

/// Resolves an inbound webhook's channel key (WhatsApp instance name,
/// Telegram bot token, Chatwoot inbox id) to a first-class tenant and its
/// configuration bag.
///
/// Every inbound event calls `resolve()` on the hot path, so lookups are
/// cached in memory the way skynet-users' `UserResolver` caches
/// (channel, identifier) → user_id, generalized here to a concurrent map
/// since multiple webhook handlers may resolve the same tenant at once.
pub struct TenantRegistry {
    db: Arc<Mutex<rusqlite::Connection>>,
    cache: DashMap<String, CacheEntry>,
}

impl TenantRegistry {
    pub fn new(db: Arc<Mutex<rusqlite::Connection>>) -> Self {
        Self {
            db,
            cache: DashMap::new(),
        }
    }

    /// Resolve a tenant by its channel key. Returns `Ok(None)` when no
    /// tenant is registered for that key — the gateway maps this to
    /// `PipelineOutcome::UnknownTenant` rather than an error.
    pub fn resolve(&self, channel_key: &str) -> Result<Option<Tenant>> {
        if let Some(entry) = self.cache.get(channel_key) {
            if entry.cached_at.elapsed() < CACHE_TTL {
                debug!(channel_key, "tenant cache hit");
                return Ok(Some(entry.tenant.clone()));
            }
        }

        let conn = self.db.lock().unwrap();
        match db::find_by_channel_key(&conn, channel_key)? {
            Some(tenant) => {
                self.cache.insert(
                    channel_key.to_string(),
                    CacheEntry {
                        tenant: tenant.clone(),
                        cached_at: Instant::now(),
                    },
                );
                Ok(Some(tenant))
            }
            None => Ok(None),
        }
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Tenant>> {
        let conn = self.db.lock().unwrap();
        Ok(db::get_by_id(&conn, id)?)
    }

    pub fn create(&self, tenant: &Tenant) -> Result<()> {
        let conn = self.db.lock().unwrap();
        if db::find_by_channel_key(&conn, &tenant.channel_key)?.is_some() {
            return Err(TenantError::AlreadyExists(tenant.channel_key.clone()));
        }
        db::create_tenant(&conn, tenant)?;
        Ok(())
    }

    /// Atomically admit one unit of usage against the tenant's quota,
    /// returning the usage count *after* increment. Callers compare this
    /// against `quota_limit` themselves (done in veribot-sessions'
    /// `QuotaGuard`, which owns the admit/deny decision) — this method only
    /// owns the counter.
    pub fn record_usage(&self, id: &str) -> Result<u64> {
        let conn = self.db.lock().unwrap();
        let count = db::increment_usage(&conn, id)?;
        self.invalidate(id);
        Ok(count)
    }

    /// Reset every tenant's usage counter. Intended to be driven by an
    /// external scheduled job on whatever cadence the deployment chooses —
    /// reset cadence is a deployment policy decision, not one this crate makes.
    pub fn reset_all_usage(&self) -> Result<()> {
        let conn = self.db.lock().unwrap();
        db::reset_usage_all(&conn)?;
        self.cache.clear();
        Ok(())
    }

    pub fn update_config(&self, id: &str, config: &veribot_core::TenantConfig) -> Result<()> {
        let conn = self.db.lock().unwrap();
        let json = serde_json::to_string(config)
            .map_err(|e| TenantError::InvalidConfig(e.to_string()))?;
        db::update_config(&conn, id, &json)?;
        self.invalidate(id);
        Ok(())
    }

    /// Drop any cache entry whose tenant id matches. Cheap linear scan —
    /// the cache tops out at one entry per live channel key, never large
    /// enough to need an index.
    fn invalidate(&self, tenant_id: &str) {
        self.cache.retain(|_, entry| entry.tenant.id.as_str() != tenant_id);
    }
}
