use rusqlite::{Connection, OptionalExtension, Result};
use veribot_core::TenantId;

use crate::types::Tenant;

/// Map a SELECT row (column order from TENANT_SELECT_SQL) to a Tenant.
/// Centralised here so every query in this crate stays consistent.
pub(crate) fn row_to_tenant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tenant> {
    let languages: Vec<String> =
        serde_json::from_str(&row.get::<_, String>(3)?).unwrap_or_default();
    let config = serde_json::from_str(&row.get::<_, String>(6)?).unwrap_or_default();
    Ok(Tenant {
        id: TenantId::from(row.get::<_, String>(0)?),
        channel_key: row.get(1)?,
        name: row.get(2)?,
        preferred_languages: languages,
        quota_limit: row.get(4)?,
        usage_count: row.get::<_, i64>(5)? as u64,
        config,
        created_at: row.get(7)?,
    })
}

const TENANT_SELECT_SQL: &str = "SELECT id, channel_key, name, preferred_languages, \
     quota_limit, usage_count, config_json, created_at FROM tenants";

/// Initialise the tenants table. Safe to call on every startup — CREATE IF
/// NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tenants (
            id                      TEXT PRIMARY KEY NOT NULL,
            channel_key             TEXT NOT NULL,
            name                    TEXT NOT NULL,
            preferred_languages     TEXT NOT NULL DEFAULT '[\"en\"]',
            quota_limit             INTEGER,
            usage_count             INTEGER NOT NULL DEFAULT 0,
            config_json             TEXT NOT NULL DEFAULT '{}',
            created_at              TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_tenants_channel_key
            ON tenants (channel_key);",
    )
}

pub fn find_by_channel_key(conn: &Connection, channel_key: &str) -> Result<Option<Tenant>> {
    let sql = format!("{} WHERE channel_key = ?1", TENANT_SELECT_SQL);
    conn.query_row(&sql, [channel_key], row_to_tenant)
        .optional()
}

pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Tenant>> {
    let sql = format!("{} WHERE id = ?1", TENANT_SELECT_SQL);
    conn.query_row(&sql, [id], row_to_tenant).optional()
}

pub fn create_tenant(conn: &Connection, tenant: &Tenant) -> Result<()> {
    conn.execute(
        "INSERT INTO tenants (id, channel_key, name, preferred_languages, quota_limit, \
         usage_count, config_json, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            tenant.id.as_str(),
            tenant.channel_key,
            tenant.name,
            serde_json::to_string(&tenant.preferred_languages).unwrap(),
            tenant.quota_limit,
            tenant.usage_count as i64,
            serde_json::to_string(&tenant.config).unwrap(),
            tenant.created_at,
        ],
    )?;
    Ok(())
}

/// Atomically bump `usage_count` and return the post-increment value. Called
/// under the same connection mutex the caller already holds, so this is
/// safe without an extra transaction.
pub fn increment_usage(conn: &Connection, id: &str) -> Result<u64> {
    conn.execute(
        "UPDATE tenants SET usage_count = usage_count + 1 WHERE id = ?1",
        [id],
    )?;
    conn.query_row(
        "SELECT usage_count FROM tenants WHERE id = ?1",
        [id],
        |row| row.get::<_, i64>(0),
    )
    .map(|v| v as u64)
}

pub fn reset_usage_all(conn: &Connection) -> Result<()> {
    conn.execute("UPDATE tenants SET usage_count = 0", [])?;
    Ok(())
}

pub fn update_config(conn: &Connection, id: &str, config_json: &str) -> Result<()> {
    conn.execute(
        "UPDATE tenants SET config_json = ?2 WHERE id = ?1",
        rusqlite::params![id, config_json],
    )?;
    Ok(())
}
