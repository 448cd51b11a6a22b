use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rusqlite::Connection;
use tracing::{debug, instrument};
use veribot_tenants::{Tenant, TenantRegistry};

use crate::db;
use crate::error::{Result, SessionError};
use crate::types::ConversationBinding;

/// Thread-safe store for conversation bindings.
///
/// Wraps a single SQLite connection in a `Mutex`, matching skynet-sessions'
/// `SessionManager` — one connection is enough at the scale this gateway
/// targets, and rusqlite's bundled SQLite serializes writes regardless.
pub struct SessionStore {
    db: Mutex<Connection>,
}

impl SessionStore {
    pub fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    #[instrument(skip(self), fields(tenant_id, external_id))]
    pub fn get_or_create(&self, tenant_id: &str, external_id: &str) -> Result<ConversationBinding> {
        let conn = self.db.lock().unwrap();
        Ok(db::get_or_create(&conn, tenant_id, external_id)?)
    }

    pub fn get(&self, tenant_id: &str, external_id: &str) -> Result<Option<ConversationBinding>> {
        let conn = self.db.lock().unwrap();
        Ok(db::find(&conn, tenant_id, external_id)?)
    }

    #[instrument(skip(self), fields(tenant_id, external_id, paused))]
    pub fn set_paused(&self, tenant_id: &str, external_id: &str, paused: bool) -> Result<()> {
        let conn = self.db.lock().unwrap();
        db::set_paused(&conn, tenant_id, external_id, paused)?;
        debug!(paused, "binding pause state updated");
        Ok(())
    }

    pub fn link_chat_session(&self, tenant_id: &str, external_id: &str, chat_session_id: &str) -> Result<()> {
        let conn = self.db.lock().unwrap();
        db::set_chat_session(&conn, tenant_id, external_id, chat_session_id)?;
        Ok(())
    }

    /// Called when a conversation resolves: the binding is detached from its
    /// chat session so a fresh one is created on the next inbound message —
    /// "new conversation after resolution" implemented by simply dropping the
    /// old session id.
    pub fn unlink_chat_session(&self, tenant_id: &str, external_id: &str) -> Result<()> {
        let conn = self.db.lock().unwrap();
        db::clear_chat_session(&conn, tenant_id, external_id)?;
        Ok(())
    }
}

/// Gates inbound-message processing against a tenant's message quota.
///
/// Wraps `TenantRegistry::record_usage`, which performs the atomic
/// read-increment under the connection's own mutex; this type only owns the
/// admit/deny decision so the gateway never has to inline quota arithmetic.
pub struct QuotaGuard {
    tenants: Arc<TenantRegistry>,
}

impl QuotaGuard {
    pub fn new(tenants: Arc<TenantRegistry>) -> Self {
        Self { tenants }
    }

    /// Admit one message against `tenant`'s quota. Returns `Ok(())` when the
    /// tenant has capacity (and records the usage), `Err(QuotaExceeded)`
    /// otherwise — the increment does not happen on denial.
    pub fn admit(&self, tenant: &Tenant) -> Result<()> {
        let Some(limit) = tenant.quota_limit else {
            return Ok(());
        };
        if tenant.usage_count >= limit {
            return Err(SessionError::QuotaExceeded {
                used: tenant.usage_count,
                limit,
            });
        }
        let used = self.tenants.record_usage(tenant.id.as_str())?;
        if used > limit {
            return Err(SessionError::QuotaExceeded { used, limit });
        }
        Ok(())
    }

    pub fn reset_all(&self) -> Result<()> {
        Ok(self.tenants.reset_all_usage()?)
    }
}

/// Per-binding single-writer lock: ensures two concurrent webhook deliveries
/// for the same (tenant, external_id) conversation never run the agent loop
/// at the same time, which would otherwise race on chat history ordering.
/// Grounded on skynet-sessions' single-connection-mutex discipline,
/// generalized to a concurrent map since many distinct conversations should
/// still process in parallel.
#[derive(Default)]
pub struct BindingLocks {
    locks: DashMap<(String, String), Arc<tokio::sync::Mutex<()>>>,
}

impl BindingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, tenant_id: &str, external_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .entry((tenant_id.to_string(), external_id.to_string()))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
