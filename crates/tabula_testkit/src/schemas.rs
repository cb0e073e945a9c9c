//! Sample schemas and draft builders.
//!
//! A small fleet domain: vehicles, shipments assigned to vehicles, and
//! customer orders with line items.

use tabula_core::{EntityDraft, FieldDef, FieldType, ItemField, ScalarType, Schema, Value};

/// Vehicles: `plate` (required, searchable), `driver`, `capacity`.
pub fn vehicles_schema() -> Schema {
    Schema::builder("vehicles")
        .label("Vehicle")
        .field(FieldDef::new("plate", FieldType::Text).required().searchable())
        .field(FieldDef::new("driver", FieldType::Text).searchable())
        .field(FieldDef::new("capacity", FieldType::Number).default_value(1000))
        .build()
        .expect("vehicles schema is valid")
}

/// Shipments referencing vehicles. Removing the vehicle clears
/// `assigned_vehicle_id` and resets `status` to `unassigned`.
pub fn shipments_schema() -> Schema {
    Schema::builder("shipments")
        .label("Shipment")
        .field(FieldDef::new("reference", FieldType::Text).required().searchable())
        .field(FieldDef::new("destination", FieldType::Text).searchable())
        .field(FieldDef::new("weight", FieldType::Number))
        .field(
            FieldDef::new(
                "status",
                FieldType::enumeration(["unassigned", "assigned", "delivered"]),
            )
            .default_value("unassigned"),
        )
        .field(
            FieldDef::new("assigned_vehicle_id", FieldType::reference("vehicles"))
                .on_detach("status", "unassigned"),
        )
        .build()
        .expect("shipments schema is valid")
}

/// Orders with every field type except references.
pub fn orders_schema() -> Schema {
    Schema::builder("orders")
        .label("Order")
        .field(FieldDef::new("customer", FieldType::Text).required().searchable())
        .field(FieldDef::new("amount", FieldType::Number))
        .field(
            FieldDef::new("status", FieldType::enumeration(["pending", "approved", "rejected"]))
                .default_value("pending"),
        )
        .field(
            FieldDef::new("priority", FieldType::enumeration(["low", "normal", "high"]))
                .default_value("normal"),
        )
        .field(FieldDef::new("rush", FieldType::Bool))
        .field(FieldDef::new("due", FieldType::Date))
        .field(FieldDef::new("items", FieldType::list_of(line_item_fields())))
        .field(FieldDef::new("shipping", FieldType::Record))
        .build()
        .expect("orders schema is valid")
}

/// Item fields of an order line: `name`, `qty`, `price`.
pub fn line_item_fields() -> Vec<ItemField> {
    vec![
        ItemField::new("name", ScalarType::Text),
        ItemField::new("qty", ScalarType::Number),
        ItemField::new("price", ScalarType::Number),
    ]
}

/// All sample schemas, referenced collections first.
pub fn fleet_schemas() -> Vec<Schema> {
    vec![vehicles_schema(), shipments_schema(), orders_schema()]
}

/// A vehicle with an explicit id.
pub fn vehicle(id: &str, plate: &str) -> EntityDraft {
    EntityDraft::new().with_id(id).set("plate", plate)
}

/// A shipment with an explicit id, optionally assigned to a vehicle.
pub fn shipment(id: &str, reference: &str, vehicle_id: Option<&str>) -> EntityDraft {
    let draft = EntityDraft::new().with_id(id).set("reference", reference);
    match vehicle_id {
        Some(v) => draft.set("assigned_vehicle_id", v).set("status", "assigned"),
        None => draft,
    }
}

/// An order with the given customer, amount and status.
pub fn order(customer: &str, amount: f64, status: &str) -> EntityDraft {
    EntityDraft::new()
        .set("customer", customer)
        .set("amount", amount)
        .set("status", status)
}

/// One order line item.
pub fn line_item(name: &str, qty: f64, price: f64) -> Value {
    Value::Record(
        [
            ("name".to_string(), Value::from(name)),
            ("qty".to_string(), Value::from(qty)),
            ("price".to_string(), Value::from(price)),
        ]
        .into_iter()
        .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_schemas_are_valid() {
        let schemas = fleet_schemas();
        assert_eq!(schemas.len(), 3);
        assert_eq!(
            shipments_schema().references_to("vehicles").count(),
            1
        );
    }
}
