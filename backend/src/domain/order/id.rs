//! Human-readable order identifiers.

use super::OrderType;

/// Build `{CREATOR}-{PO|SO}-{seq:03}`.
///
/// # Examples
/// ```
/// use cks_backend::domain::{OrderType, format_order_id};
///
/// assert_eq!(format_order_id("CEN-010", OrderType::Service, 15), "CEN-010-SO-015");
/// assert_eq!(format_order_id("WHS-001", OrderType::Product, 1234), "WHS-001-PO-1234");
/// ```
#[must_use]
pub fn format_order_id(creator_code: &str, order_type: OrderType, sequence: i64) -> String {
    format!("{creator_code}-{}-{sequence:03}", order_type.id_infix())
}

/// Creator code embedded in an order id, if the id is well formed.
#[must_use]
pub fn order_id_prefix(order_id: &str) -> Option<&str> {
    let (prefix, sequence) = order_id.rsplit_once('-')?;
    if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (creator, infix) = prefix.rsplit_once('-')?;
    matches!(infix, "PO" | "SO").then_some(creator)
}
