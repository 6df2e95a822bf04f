use std::collections::HashMap;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use table_compare::compare::{ComparisonRequest, SideInput, run_comparison};
use table_compare::data::{CellValue, Page, Row};
use table_compare::relationship::{Relationship, TableRef};
use table_compare::virtual_columns::{Side, VirtualColumn};

const CITIES: &[&str] = &["Hà Nội", "Huế", "Đà Nẵng", "Cần Thơ", "Hải Phòng"];

fn customers(rows: usize) -> Page {
    let rows = (0..rows)
        .map(|i| {
            Row::from_pairs([
                ("Oid", CellValue::Integer(i as i64)),
                ("Name", CellValue::from(format!("Khách hàng {i}"))),
                ("City", CellValue::from(CITIES[i % CITIES.len()])),
            ])
        })
        .collect();
    Page::new(
        vec!["Oid".into(), "Name".into(), "City".into()],
        rows,
    )
}

fn orders(rows: usize, customers: usize, shift: usize) -> Page {
    let rows = (0..rows)
        .map(|i| {
            let customer = (i + shift) % customers;
            Row::from_pairs([
                ("Number", CellValue::from(format!("SO-{i}"))),
                (
                    "Customer",
                    CellValue::from(format!("Khách hàng {customer}\n(ID: {customer})")),
                ),
                ("Total", CellValue::Float((i % 97) as f64 * 1.5)),
            ])
        })
        .collect();
    Page::new(
        vec!["Number".into(), "Customer".into(), "Total".into()],
        rows,
    )
}

fn order_request(rows: usize) -> ComparisonRequest {
    let relationship = Relationship {
        fk_schema: "dbo".into(),
        fk_table: "Order".into(),
        fk_column: "Customer".into(),
        pk_schema: "dbo".into(),
        pk_table: "Customer".into(),
        pk_column: "Oid".into(),
        name: "FK_Order_Customer".into(),
    };
    let customer_count = rows / 4 + 1;
    let mut related_pages = HashMap::new();
    related_pages.insert(TableRef::new("dbo", "Customer"), customers(customer_count));
    ComparisonRequest {
        left: SideInput::new(orders(rows, customer_count, 0)).with_table(TableRef::new("dbo", "Order")),
        right: SideInput::new(orders(rows, customer_count, 1)).with_table(TableRef::new("dbo", "Order")),
        columns: vec!["Number".into(), "CustomerCity".into(), "Total".into()],
        virtual_columns: vec![
            VirtualColumn::joined("CustomerCity", Side::Left, relationship.clone(), "City"),
            VirtualColumn::joined("CustomerCity", Side::Right, relationship, "City"),
        ],
        related_pages,
    }
}

fn bench_align_and_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_comparison");
    for rows in [200, 2_000] {
        let request = order_request(rows);
        group.bench_function(format!("joined_{rows}_rows"), |b| {
            b.iter_batched(
                || (),
                |_| run_comparison(&request),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_align_and_diff);
criterion_main!(benches);
