//! # Manifest Encoding
//!
//! A transaction's contents travel as a semicolon-separated list of
//! `itemId:qty` pairs, e.g. `"a1b2:2;c3d4:1"`. The format is kept byte-for-
//! byte compatible with the stores it migrated from, so receipts and exports
//! written by older installations still parse.
//!
//! The manifest string is a compatibility surface; per-line price snapshots
//! live in `transaction_lines` rows and are the authoritative record.

use crate::error::ValidationError;

/// Encodes `(item_id, quantity)` pairs into the manifest wire form.
pub fn encode(entries: &[(String, i64)]) -> String {
    entries
        .iter()
        .map(|(id, qty)| format!("{id}:{qty}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Parses a manifest string back into `(item_id, quantity)` pairs.
///
/// Empty input yields an empty manifest. Each entry must be `id:qty` with a
/// positive integer quantity; anything else is an `InvalidFormat` error.
pub fn parse(manifest: &str) -> Result<Vec<(String, i64)>, ValidationError> {
    let manifest = manifest.trim();
    if manifest.is_empty() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for part in manifest.split(';') {
        let (id, qty) = part.split_once(':').ok_or_else(|| invalid(part, "missing ':'"))?;

        if id.is_empty() {
            return Err(invalid(part, "empty item id"));
        }

        let qty: i64 = qty
            .parse()
            .map_err(|_| invalid(part, "quantity is not an integer"))?;
        if qty < 1 {
            return Err(invalid(part, "quantity must be >= 1"));
        }

        entries.push((id.to_string(), qty));
    }
    Ok(entries)
}

fn invalid(entry: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "manifest".to_string(),
        reason: format!("entry '{entry}': {reason}"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
