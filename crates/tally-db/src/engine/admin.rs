//! Administrative deletes: destructive, authorization-gated, audited.
//!
//! Neither operation touches the inventory ledger. Deleting a transaction
//! removes the record without undoing its stock effects (use refund for
//! that); deleting an item is a soft delete so historical lines keep their
//! reference.

use chrono::Utc;
use tracing::warn;

use crate::engine::{Authorizer, ElevatedAction};
use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{audit, item, transaction};
use tally_core::{CoreError, CoreResult, TxnStatus};

/// Deletes a transaction record outright.
///
/// Held orders are refused: they own live reservations and must be resumed
/// (then cleared or completed) instead.
pub async fn delete_transaction(
    db: &Database,
    id: &str,
    authorizer: &dyn Authorizer,
    operator_id: &str,
) -> CoreResult<()> {
    if !authorizer.allow_elevated(operator_id, ElevatedAction::DeleteTransaction) {
        warn!(id = %id, operator = %operator_id, "Delete transaction denied");
        return Err(CoreError::Unauthorized {
            action: ElevatedAction::DeleteTransaction.to_string(),
        });
    }

    let now = Utc::now();
    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let txn = transaction::get_with(&mut tx, id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

    if txn.status == TxnStatus::Held {
        return Err(CoreError::InvalidStatus {
            id: id.to_string(),
            status: txn.status.as_str().to_string(),
        });
    }

    transaction::delete_with(&mut tx, id).await?;
    audit::append_with(&mut tx, audit::actions::DELETE_TRANSACTION, id, operator_id, now).await?;

    tx.commit().await.map_err(DbError::from)?;
    Ok(())
}

/// Soft-deletes a stock item (hides it from sale; history stays intact).
pub async fn delete_item(
    db: &Database,
    item_id: &str,
    authorizer: &dyn Authorizer,
    operator_id: &str,
) -> CoreResult<()> {
    if !authorizer.allow_elevated(operator_id, ElevatedAction::DeleteItem) {
        warn!(item_id = %item_id, operator = %operator_id, "Delete item denied");
        return Err(CoreError::Unauthorized {
            action: ElevatedAction::DeleteItem.to_string(),
        });
    }

    let now = Utc::now();
    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    item::soft_delete_with(&mut tx, item_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound { .. } => CoreError::ItemNotFound(item_id.to_string()),
            other => other.into(),
        })?;
    audit::append_with(&mut tx, audit::actions::DELETE_ITEM, item_id, operator_id, now).await?;

    tx.commit().await.map_err(DbError::from)?;
    Ok(())
}
