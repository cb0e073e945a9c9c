//! Generated-input properties of the engine, checked through the
//! `Workspace` API.

use proptest::prelude::*;
use std::collections::HashSet;
use tabula_core::tabular::ExportOptions;
use tabula_core::{CoreError, EntityDraft, EntityId, Value};
use tabula_testkit::prelude::*;

fn ids(rows: &[&tabula_core::Entity]) -> Vec<String> {
    rows.iter().map(|e| e.id().to_string()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ids_stay_unique(calls in create_calls_strategy(24)) {
        let mut fixture = TestWorkspace::fleet();
        let mut created = 0;
        for call in calls {
            let mut draft = EntityDraft::new().set("plate", call.plate);
            draft.id = call.id.map(EntityId::from);
            match fixture.create("vehicles", draft) {
                Ok(_) => created += 1,
                Err(e) => {
                    prop_assert!(matches!(e, CoreError::DuplicateId { .. }), "{}", e);
                }
            }
        }

        let rows = fixture.list("vehicles").unwrap();
        let unique: HashSet<&str> = rows.iter().map(|e| e.id().as_str()).collect();
        prop_assert_eq!(rows.len(), created);
        prop_assert_eq!(unique.len(), created);
    }

    #[test]
    fn removal_never_leaves_dangling_references(
        vehicles in 1usize..6,
        assignments in prop::collection::vec(prop::option::of(0usize..6), 0..12),
        victim in 0usize..6,
    ) {
        let mut fixture = TestWorkspace::fleet();
        for v in 0..vehicles {
            fixture.create("vehicles", vehicle(&format!("v{v}"), "PLATE")).unwrap();
        }
        for (s, target) in assignments.iter().copied().enumerate() {
            let target = target.filter(|t| *t < vehicles).map(|t| format!("v{t}"));
            fixture
                .create("shipments", shipment(&format!("s{s}"), "REF", target.as_deref()))
                .unwrap();
        }
        let victim = format!("v{}", victim % vehicles);
        let before: Vec<Value> = fixture
            .list("shipments")
            .unwrap()
            .iter()
            .map(|e| e.value("assigned_vehicle_id").clone())
            .collect();

        fixture.remove("vehicles", &EntityId::from(victim.as_str())).unwrap();

        let after = fixture.list("shipments").unwrap();
        prop_assert_eq!(after.len(), before.len());
        for (shipment, old) in after.iter().zip(&before) {
            let now = shipment.value("assigned_vehicle_id");
            if old == &Value::from(victim.as_str()) {
                prop_assert_eq!(now, &Value::Null);
                prop_assert_eq!(shipment.value("status"), &Value::from("unassigned"));
            } else {
                prop_assert_eq!(now, old);
            }
        }
    }

    #[test]
    fn sort_toggle_reverses_and_cycles(amounts in prop::collection::hash_set(0u32..10_000, 0..20)) {
        let mut fixture = TestWorkspace::fleet();
        for amount in &amounts {
            fixture.create("orders", order("c", f64::from(*amount), "pending")).unwrap();
        }

        fixture.request_sort("orders", "amount").unwrap();
        let once = ids(&fixture.view("orders").unwrap());
        fixture.request_sort("orders", "amount").unwrap();
        let twice = ids(&fixture.view("orders").unwrap());
        fixture.request_sort("orders", "amount").unwrap();
        let thrice = ids(&fixture.view("orders").unwrap());

        let mut reversed = once.clone();
        reversed.reverse();
        prop_assert_eq!(twice, reversed);
        prop_assert_eq!(thrice, once);
    }

    #[test]
    fn exact_filters_commute(drafts in orders_strategy(20)) {
        let mut forward = TestWorkspace::fleet();
        let mut backward = TestWorkspace::fleet();
        for (i, draft) in drafts.into_iter().enumerate() {
            let draft = draft.with_id(format!("o{i}"));
            forward.create("orders", draft.clone()).unwrap();
            backward.create("orders", draft).unwrap();
        }

        forward.set_exact_filter("orders", "status", "approved").unwrap();
        forward.set_exact_filter("orders", "priority", "high").unwrap();
        backward.set_exact_filter("orders", "priority", "high").unwrap();
        backward.set_exact_filter("orders", "status", "approved").unwrap();

        let expected: Vec<String> = forward
            .list("orders")
            .unwrap()
            .iter()
            .filter(|e| e.text("status") == Some("approved") && e.text("priority") == Some("high"))
            .map(|e| e.id().to_string())
            .collect();
        prop_assert_eq!(ids(&forward.view("orders").unwrap()), expected.clone());
        prop_assert_eq!(ids(&backward.view("orders").unwrap()), expected);
    }

    #[test]
    fn csv_round_trip_preserves_values(drafts in orders_strategy(12), include_id in any::<bool>()) {
        let mut source = TestWorkspace::fleet();
        for draft in drafts {
            source.create("orders", draft).unwrap();
        }
        let csv = source
            .export_csv("orders", &ExportOptions { include_id, columns: None })
            .unwrap();

        let mut target = TestWorkspace::fleet();
        let report = target.import_csv("orders", &csv).unwrap();
        let original = field_values(source.list("orders").unwrap());
        prop_assert_eq!(report.imported, original.len());
        prop_assert_eq!(report.failed, 0);

        let imported = field_values(target.list("orders").unwrap());
        prop_assert!(same_multiset(&original, &imported), "{}", csv);
    }

    #[test]
    fn malformed_rows_are_counted_not_raised(
        good in 0usize..15,
        bad_positions in prop::collection::vec(any::<prop::sample::Index>(), 0..5),
    ) {
        let mut rows: Vec<String> = (0..good).map(|i| format!("Customer {i},{i}")).collect();
        for position in &bad_positions {
            let at = position.index(rows.len() + 1);
            rows.insert(at, ",5".to_string());
        }
        let csv = format!("customer,amount\n{}\n", rows.join("\n"));

        let mut fixture = TestWorkspace::fleet();
        let report = fixture.import_csv("orders", &csv).unwrap();
        prop_assert_eq!(report.imported, good);
        prop_assert_eq!(report.failed, bad_positions.len());
        prop_assert_eq!(fixture.list("orders").unwrap().len(), good);
    }
}

#[test]
fn ten_good_rows_and_two_malformed() {
    let mut csv = String::from("customer,amount,status\n");
    for i in 0..10 {
        csv.push_str(&format!("\"Customer {i}\",{},approved\n", i * 10));
        if i == 4 {
            csv.push_str(",20,approved\n");
        }
    }
    csv.push_str("  ,30,pending\n");

    let mut fixture = TestWorkspace::fleet();
    let report = fixture.import_csv("orders", &csv).unwrap();

    assert_eq!(report.imported, 10);
    assert_eq!(report.failed, 2);
    assert_eq!(fixture.list("orders").unwrap().len(), 10);
    assert_eq!(report.created.len(), 10);
}
