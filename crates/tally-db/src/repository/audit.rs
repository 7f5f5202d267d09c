//! # Audit Log Repository
//!
//! Append-only audit trail. Rows are written inside the same database
//! transaction as the action they record, so a rolled-back operation leaves
//! no phantom audit entry.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::AuditLogEntry;

/// Action type labels used throughout the engine.
pub mod actions {
    pub const CHECKOUT: &str = "CHECKOUT";
    pub const HOLD: &str = "HOLD";
    pub const RESUME: &str = "RESUME";
    pub const REFUND: &str = "REFUND";
    pub const EDIT: &str = "EDIT";
    pub const VOID_LINE: &str = "VOID_LINE";
    pub const VOID_ORDER: &str = "VOID_ORDER";
    pub const DELETE_TRANSACTION: &str = "DELETE_TRANSACTION";
    pub const DELETE_ITEM: &str = "DELETE_ITEM";
}

/// Repository for audit trail reads.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Most recent entries first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<AuditLogEntry>> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT id, action, detail, ts, actor FROM audit_log \
             ORDER BY ts DESC, id LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Entries for one action type, most recent first.
    pub async fn by_action(&self, action: &str, limit: u32) -> DbResult<Vec<AuditLogEntry>> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT id, action, detail, ts, actor FROM audit_log \
             WHERE action = ?1 ORDER BY ts DESC, id LIMIT ?2",
        )
        .bind(action)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Connection helper (composed into engine transactions)
// =============================================================================

/// Appends an audit entry inside an existing transaction.
pub(crate) async fn append_with(
    conn: &mut SqliteConnection,
    action: &str,
    detail: &str,
    actor: &str,
    ts: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query("INSERT INTO audit_log (id, action, detail, ts, actor) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(Uuid::new_v4().to_string())
        .bind(action)
        .bind(detail)
        .bind(ts)
        .bind(actor)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
