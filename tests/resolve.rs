mod common;

use common::{customers, order_customer, row};
use table_compare::data::{CellValue, Page, Row};
use table_compare::join_index::JoinIndexes;
use table_compare::relationship::{Relationship, TableRef};
use table_compare::resolve::{Resolver, resolve};
use table_compare::virtual_columns::{Side, VirtualColumn};

fn customer_indexes() -> JoinIndexes {
    let mut indexes = JoinIndexes::new();
    indexes.insert_page(
        TableRef::new("dbo", "Customer"),
        &Page::new(vec![], customers()),
    );
    indexes
}

fn customer_name(side: Side) -> VirtualColumn {
    VirtualColumn::joined("CustomerName", side, order_customer(), "Name")
}

#[test]
fn joined_column_extracts_id_from_display_label() {
    let indexes = customer_indexes();
    let virtuals = vec![customer_name(Side::Left)];
    let resolver = Resolver::new(Side::Left, &virtuals, &indexes);
    let order = row(&[("Oid", "900"), ("Customer", "Nguyen Van A\n(ID: 42)")]);
    assert_eq!(
        resolver.resolve(&order, "CustomerName"),
        Some(CellValue::from("Nguyễn Văn A"))
    );
}

#[test]
fn joined_column_accepts_inline_label_and_raw_key() {
    let indexes = customer_indexes();
    let virtuals = vec![customer_name(Side::Left)];
    let resolver = Resolver::new(Side::Left, &virtuals, &indexes);
    let inline = row(&[("Customer", "Lê Văn C (ID: 43)")]);
    assert_eq!(
        resolver.resolve(&inline, "CustomerName"),
        Some(CellValue::from("Lê Văn C"))
    );
    let raw = Row::from_pairs([("Customer", CellValue::Integer(41))]);
    assert_eq!(
        resolver.resolve(&raw, "CustomerName"),
        Some(CellValue::from("Trần Thị B"))
    );
}

#[test]
fn joined_lookup_on_target_column_ignores_case_and_keeps_first_row() {
    let relationship = Relationship {
        pk_column: "Code".into(),
        ..order_customer()
    };
    let related = vec![
        row(&[("Oid", "1"), ("Code", "c-01"), ("Name", "First")]),
        row(&[("Oid", "2"), ("Code", "C-01"), ("Name", "Second")]),
    ];
    let mut indexes = JoinIndexes::new();
    indexes.insert_page(TableRef::new("dbo", "Customer"), &Page::new(vec![], related));
    let virtuals = vec![VirtualColumn::joined("CustomerName", Side::Left, relationship, "Name")];
    let resolver = Resolver::new(Side::Left, &virtuals, &indexes);
    // Both codes normalize to the same composite key, so the first row owns it.
    let order = row(&[("Customer", "C-01")]);
    assert_eq!(
        resolver.resolve(&order, "CustomerName"),
        Some(CellValue::from("First"))
    );
}

#[test]
fn unresolvable_joins_become_null() {
    let indexes = customer_indexes();
    let virtuals = vec![customer_name(Side::Left)];
    let resolver = Resolver::new(Side::Left, &virtuals, &indexes);

    let unknown = row(&[("Customer", "999")]);
    assert_eq!(resolver.resolve(&unknown, "CustomerName"), Some(CellValue::Null));

    let no_key = row(&[("Total", "10")]);
    assert_eq!(resolver.resolve(&no_key, "CustomerName"), Some(CellValue::Null));

    let empty_indexes = JoinIndexes::new();
    let no_index = Resolver::new(Side::Left, &virtuals, &empty_indexes);
    assert_eq!(
        no_index.resolve(&row(&[("Customer", "42")]), "CustomerName"),
        Some(CellValue::Null)
    );
}

#[test]
fn primary_key_side_joins_to_first_referencing_row() {
    let orders = vec![
        row(&[("Oid", "900"), ("Customer", "42"), ("Number", "SO-1")]),
        row(&[("Oid", "901"), ("Customer", "42"), ("Number", "SO-2")]),
    ];
    let mut indexes = JoinIndexes::new();
    indexes.insert_page(TableRef::new("dbo", "Order"), &Page::new(vec![], orders));
    let virtuals = vec![VirtualColumn::joined(
        "FirstOrder",
        Side::Right,
        order_customer(),
        "Number",
    )];
    let customer_table = TableRef::new("dbo", "Customer");
    let resolver = Resolver::new(Side::Right, &virtuals, &indexes)
        .with_current_table(Some(&customer_table));
    let customer = row(&[("Oid", "42"), ("Name", "Nguyễn Văn A")]);
    assert_eq!(
        resolver.resolve(&customer, "FirstOrder"),
        Some(CellValue::from("SO-1"))
    );
}

#[test]
fn combined_column_skips_blank_sources() {
    let indexes = JoinIndexes::new();
    let virtuals = vec![VirtualColumn::combined(
        "FullName",
        Side::Left,
        ["Last", "Middle", "First"],
    )];
    let resolver = Resolver::new(Side::Left, &virtuals, &indexes);
    let mut person = row(&[("Last", "Nguyễn"), ("Middle", ""), ("First", "An")]);
    assert_eq!(
        resolver.resolve(&person, "FullName"),
        Some(CellValue::from("Nguyễn An"))
    );
    person.insert("Last", CellValue::Null);
    person.insert("First", CellValue::Integer(7));
    assert_eq!(resolver.resolve(&person, "FullName"), Some(CellValue::from("7")));

    let empty = row(&[]);
    assert_eq!(resolver.resolve(&empty, "FullName"), Some(CellValue::from("")));
}

#[test]
fn virtual_columns_only_apply_to_their_side() {
    let indexes = JoinIndexes::new();
    let virtuals = vec![VirtualColumn::combined("FullName", Side::Left, ["First"])];
    let right = Resolver::new(Side::Right, &virtuals, &indexes);
    let person = row(&[("First", "An")]);
    assert_eq!(right.resolve(&person, "FullName"), None);
}

#[test]
fn original_columns_pass_through_verbatim() {
    let resolver = Resolver::passthrough(Side::Left);
    let person = Row::from_pairs([("Age", CellValue::Integer(30)), ("Note", CellValue::Null)]);
    assert_eq!(resolver.resolve(&person, "Age"), Some(CellValue::Integer(30)));
    assert_eq!(resolver.resolve(&person, "Note"), Some(CellValue::Null));
    assert_eq!(resolver.resolve(&person, "Missing"), None);
}

#[test]
fn free_function_resolves_like_the_resolver() {
    let indexes = customer_indexes();
    let virtuals = vec![customer_name(Side::Right)];
    let order = row(&[("Customer", "41")]);
    assert_eq!(
        resolve(&order, "CustomerName", &virtuals, &indexes, None),
        Some(CellValue::from("Trần Thị B"))
    );
}

#[test]
fn materialize_keeps_requested_columns_only() {
    let indexes = customer_indexes();
    let virtuals = vec![customer_name(Side::Left)];
    let resolver = Resolver::new(Side::Left, &virtuals, &indexes);
    let order = row(&[("Oid", "900"), ("Customer", "42"), ("Total", "5")]);
    let resolved = resolver.materialize(
        &order,
        &["Oid".to_string(), "CustomerName".to_string(), "Ghost".to_string()],
    );
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved.get("CustomerName"), Some(&CellValue::from("Nguyễn Văn A")));
}

#[test]
fn joined_column_matches_unsigned_keys_past_i64() {
    let customers = vec![Row::from_pairs([
        ("Oid", CellValue::from(serde_json::json!(18446744073709551615u64))),
        ("Name", CellValue::from("Phạm Văn D")),
    ])];
    let mut indexes = JoinIndexes::new();
    indexes.insert_page(TableRef::new("dbo", "Customer"), &Page::new(vec![], customers));
    let virtuals = vec![customer_name(Side::Left)];
    let resolver = Resolver::new(Side::Left, &virtuals, &indexes);
    let order = row(&[("Customer", "18446744073709551615")]);
    assert_eq!(
        resolver.resolve(&order, "CustomerName"),
        Some(CellValue::from("Phạm Văn D"))
    );
}
