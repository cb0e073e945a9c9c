//! Property-based test generators using proptest.
//!
//! Generated orders only hold values whose CSV cell text parses back to
//! the same value: trimmed text, finite numbers and millisecond dates.
//! Line item names may contain the list separators.

use crate::schemas::line_item;
use proptest::prelude::*;
use tabula_core::{EntityDraft, Value};

/// Strategy for non-blank text without surrounding whitespace. May
/// contain commas and quotes.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 ,\"'.-]{0,12}[A-Za-z0-9]")
        .expect("Invalid regex")
}

/// Strategy for amounts with at most two decimals.
pub fn amount_strategy() -> impl Strategy<Value = f64> {
    (0u32..10_000_000).prop_map(|cents| f64::from(cents) / 100.0)
}

/// Strategy for instants between 1970 and 2100, at millisecond precision.
pub fn date_strategy() -> impl Strategy<Value = i64> {
    0i64..4_102_444_800_000
}

/// Strategy for order status values.
pub fn status_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["pending", "approved", "rejected"])
}

/// Strategy for order priority values.
pub fn priority_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["low", "normal", "high"])
}

/// Strategy for line item names, including `,`, `|` and `\`.
pub fn item_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 ,|\\\\\"'.-]{0,12}[A-Za-z0-9]")
        .expect("Invalid regex")
}

/// Strategy for order line items.
pub fn line_items_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (
            item_name_strategy(),
            1u32..100,
            amount_strategy(),
        )
            .prop_map(|(name, qty, price)| line_item(&name, f64::from(qty), price)),
        0..4,
    )
}

/// Strategy for a shipping record.
pub fn shipping_strategy() -> impl Strategy<Value = Value> {
    (
        prop::string::string_regex("[A-Z][a-z]{2,8}").expect("Invalid regex"),
        0u32..1000,
    )
        .prop_map(|(city, zone)| {
            Value::Record(
                [
                    ("city".to_string(), Value::from(city)),
                    ("zone".to_string(), Value::from(f64::from(zone))),
                ]
                .into_iter()
                .collect(),
            )
        })
}

/// Strategy for an order draft. Only `customer` is always set; the
/// other fields are each left out now and then.
pub fn order_strategy() -> impl Strategy<Value = EntityDraft> {
    (
        text_strategy(),
        prop::option::of(amount_strategy()),
        prop::option::of(status_strategy()),
        prop::option::of(priority_strategy()),
        prop::option::of(any::<bool>()),
        prop::option::of(date_strategy()),
        prop::option::of(line_items_strategy()),
        prop::option::of(shipping_strategy()),
    )
        .prop_map(
            |(customer, amount, status, priority, rush, due, items, shipping)| {
                let mut draft = EntityDraft::new().set("customer", customer);
                if let Some(amount) = amount {
                    draft = draft.set("amount", amount);
                }
                if let Some(status) = status {
                    draft = draft.set("status", status);
                }
                if let Some(priority) = priority {
                    draft = draft.set("priority", priority);
                }
                if let Some(rush) = rush {
                    draft = draft.set("rush", rush);
                }
                if let Some(due) = due {
                    draft = draft.set("due", Value::Date(due));
                }
                if let Some(items) = items {
                    draft = draft.set("items", Value::List(items));
                }
                if let Some(shipping) = shipping {
                    draft = draft.set("shipping", shipping);
                }
                draft
            },
        )
}

/// Strategy for a batch of orders.
pub fn orders_strategy(max: usize) -> impl Strategy<Value = Vec<EntityDraft>> {
    prop::collection::vec(order_strategy(), 0..=max)
}

/// A create call in a generated sequence.
#[derive(Debug, Clone)]
pub struct CreateCall {
    /// Explicit id from a small pool, so collisions are common.
    pub id: Option<String>,
    /// Plate of the vehicle.
    pub plate: String,
}

/// Strategy for a sequence of vehicle create calls.
pub fn create_calls_strategy(max: usize) -> impl Strategy<Value = Vec<CreateCall>> {
    prop::collection::vec(
        (
            prop::option::of(prop::sample::select(vec!["a", "b", "c", "d"])),
            text_strategy(),
        )
            .prop_map(|(id, plate)| CreateCall {
                id: id.map(str::to_string),
                plate,
            }),
        0..=max,
    )
}
