mod common;

use common::{columns, order_customer};
use serde_json::json;
use table_compare::virtual_columns::{InvalidReason, Side, VirtualColumn, validate, validate_combined};

#[test]
fn combined_columns_partition_into_valid_and_invalid() {
    let available = columns(&["First", "Last", "Name"]);
    let candidates = vec![
        VirtualColumn::combined("FullName", Side::Left, ["First", "Last"]),
        VirtualColumn::combined("Name", Side::Left, ["First"]),
        VirtualColumn::combined("Empty", Side::Left, Vec::<String>::new()),
        VirtualColumn::combined("Ghostly", Side::Left, ["First", "Ghost", "Spirit"]),
        VirtualColumn::joined("CustomerName", Side::Left, order_customer(), "Name"),
    ];
    let report = validate_combined(&candidates, &available);
    assert_eq!(report.valid, vec![candidates[0].clone()]);
    let reasons: Vec<InvalidReason> = report.invalid.iter().map(|i| i.reason.clone()).collect();
    assert_eq!(
        reasons,
        vec![
            InvalidReason::CollidesWithColumn,
            InvalidReason::NoSourceColumns,
            InvalidReason::MissingSourceColumns {
                columns: columns(&["Ghost", "Spirit"]),
            },
        ]
    );
    assert!(!report.is_clean());
}

#[test]
fn validate_checks_each_column_against_its_own_side() {
    let left = columns(&["First", "Last", "Customer"]);
    let right = columns(&["FullName", "CustomerName"]);
    let candidates = vec![
        VirtualColumn::combined("FullName", Side::Left, ["First", "Last"]),
        VirtualColumn::combined("FullName", Side::Right, ["First"]),
        VirtualColumn::joined("CustomerName", Side::Left, order_customer(), "Name"),
        VirtualColumn::joined("CustomerName", Side::Right, order_customer(), "Name"),
        VirtualColumn::joined("CustomerCity", Side::Left, order_customer(), " "),
        VirtualColumn::combined("FullName", Side::Left, ["Last"]),
    ];
    let report = validate(&candidates, &left, &right);
    assert_eq!(report.valid.len(), 2);
    assert_eq!(report.valid[0].name(), "FullName");
    assert_eq!(report.valid[1].name(), "CustomerName");
    assert_eq!(report.valid[1].side(), Side::Left);

    let reasons: Vec<InvalidReason> = report.invalid.iter().map(|i| i.reason.clone()).collect();
    assert_eq!(
        reasons,
        vec![
            InvalidReason::CollidesWithColumn,
            InvalidReason::CollidesWithColumn,
            InvalidReason::MissingJoinColumn,
            InvalidReason::DuplicateName,
        ]
    );
}

#[test]
fn no_virtual_columns_is_clean() {
    let report = validate(&[], &columns(&["A"]), &columns(&["B"]));
    assert!(report.is_clean());
    assert!(report.valid.is_empty());
}

#[test]
fn virtual_columns_deserialize_from_tagged_config() {
    let parsed: Vec<VirtualColumn> = serde_json::from_value(json!([
        {"kind": "combined", "name": "FullName", "side": "left", "sourceColumns": ["First", "Last"]},
        {
            "kind": "joined",
            "name": "CustomerName",
            "side": "right",
            "joinColumn": "Name",
            "relationship": {
                "fkSchema": "dbo", "fkTable": "Order", "fkColumn": "Customer",
                "pkSchema": "dbo", "pkTable": "Customer", "pkColumn": "Oid",
                "name": "FK_Order_Customer"
            }
        }
    ]))
    .expect("virtual column config");
    assert_eq!(
        parsed[0],
        VirtualColumn::combined("FullName", Side::Left, ["First", "Last"])
    );
    assert_eq!(
        parsed[1],
        VirtualColumn::joined("CustomerName", Side::Right, order_customer(), "Name")
    );
    assert_eq!(parsed[1].relationship(), Some(&order_customer()));
}

#[test]
fn invalid_entries_report_reason_alongside_column() {
    let report = validate_combined(
        &[VirtualColumn::combined("X", Side::Right, ["Gone"])],
        &columns(&["A"]),
    );
    let value = serde_json::to_value(&report.invalid[0]).expect("serialize");
    assert_eq!(value["reason"], json!("missing-source-columns"));
    assert_eq!(value["columns"], json!(["Gone"]));
    assert_eq!(value["column"]["name"], json!("X"));
    assert_eq!(
        report.invalid[0].reason.to_string(),
        "source column(s) not found: Gone"
    );
}
