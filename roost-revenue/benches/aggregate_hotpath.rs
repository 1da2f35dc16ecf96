use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use roost_revenue::{
    process_raw_reservations, process_revenue_data, ChartView, ChartViewAssembler, MonthlySeries,
    RevenueRecord,
};
use serde_json::{json, Value};
use std::hint::black_box;

const STATUSES: [&str; 5] = ["new", "modified", "ownerStay", "cancelled", "inquiry"];

fn bench_records(count: usize, today: NaiveDate) -> Vec<RevenueRecord> {
    (0..count)
        .map(|i| {
            let date = today - Duration::days((i % 1200) as i64);
            let amount = 50.0 + (i % 997) as f64 * 1.37;
            RevenueRecord::new(date, amount, STATUSES[i % STATUSES.len()])
        })
        .collect()
}

fn bench_reservations(records: &[RevenueRecord]) -> Vec<Value> {
    records
        .iter()
        .map(|r| {
            json!({
                "arrivalDate": r.arrival_date.format("%Y-%m-%d").to_string(),
                "status": r.status,
                "totalPrice": r.amount,
            })
        })
        .collect()
}

fn bench_aggregation(c: &mut Criterion) {
    let now = Utc
        .with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .expect("valid instant");
    let records = bench_records(10_000, now.date_naive());
    let raw = bench_reservations(&records);

    c.bench_function("revenue/aggregate_10k", |b| {
        b.iter(|| {
            let summary = process_revenue_data(black_box(&records), now);
            black_box(summary.one_year.total);
        });
    });

    c.bench_function("revenue/aggregate_raw_10k", |b| {
        b.iter(|| {
            let summary = process_raw_reservations(black_box(&raw), now);
            black_box(summary.all.total);
        });
    });
}

fn bench_chart_assembly(c: &mut Criterion) {
    let assembler = ChartViewAssembler::new(2024, 5);
    let labels = ["Jul", "Aug", "Sep", "Oct", "Nov", "Dec", "Jan", "Feb", "Mar", "Apr", "May", "Jun"];
    let series = MonthlySeries {
        labels: labels.iter().map(|l| l.to_string()).collect(),
        data: (0..12).map(|i| 1000.0 + f64::from(i) * 125.0).collect(),
        years: (0..12).map(|i| if i < 6 { 2023 } else { 2024 }).collect(),
    };

    c.bench_function("chart/assemble_all_views", |b| {
        b.iter(|| {
            for view in [
                ChartView::SixMonths,
                ChartView::YearToDate,
                ChartView::MonthToDate,
                ChartView::Year(2023),
            ] {
                let out = assembler.assemble_series(view, black_box(&series));
                black_box(out.total);
            }
        });
    });
}

criterion_group!(benches, bench_aggregation, bench_chart_assembly);
criterion_main!(benches);
