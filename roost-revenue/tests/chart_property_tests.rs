//! Property-Based Tests for Chart View Assembly
//!
//! **Property 1: Full-Length Output**
//!
//! Every view returns one value per canonical slot (6M: 6, YTD: current
//! month + 1, MTD: 1, fixed year: 12) whatever the source looks like.
//!
//! **Property 2: Totals**
//!
//! A view's total is the sum of its values; unmatched entries contribute
//! nothing.
//!
//! **Property 3: Year-less Sources**
//!
//! A newest-first trailing series without years always shows its newest
//! months, never an older duplicate of the same month label.
//!
//! **Property 4: November Backfill**
//!
//! Only the 5-entry, December-first, November-less shape in the 6M view gets
//! a November value, equal to `round(0.8 × December)`.

use proptest::prelude::*;
use roost_revenue::{ChartView, ChartViewAssembler, MonthlyEntry};
use roost_test_utils::arb_month_label;

// ============================================================================
// GENERATORS
// ============================================================================

fn arb_assembler() -> impl Strategy<Value = ChartViewAssembler> {
    (2018i32..2032, 0u32..12).prop_map(|(year, month0)| ChartViewAssembler::new(year, month0))
}

fn arb_entry() -> impl Strategy<Value = MonthlyEntry> {
    (
        arb_month_label(),
        0u32..100_000,
        prop::option::of(2016i32..2034),
    )
        .prop_map(|(label, value, year)| MonthlyEntry {
            label,
            value: f64::from(value),
            year,
        })
}

fn arb_entries() -> impl Strategy<Value = Vec<MonthlyEntry>> {
    prop::collection::vec(arb_entry(), 0..24)
}

fn arb_view() -> impl Strategy<Value = ChartView> {
    prop_oneof![
        Just(ChartView::SixMonths),
        Just(ChartView::YearToDate),
        Just(ChartView::MonthToDate),
        Just(ChartView::All),
        (2016i32..2034).prop_map(ChartView::Year),
    ]
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #[test]
    fn views_are_full_length(
        assembler in arb_assembler(),
        view in arb_view(),
        entries in arb_entries(),
    ) {
        let series = assembler.assemble(view, &entries);
        let expected = match view {
            ChartView::SixMonths | ChartView::All => 6,
            ChartView::YearToDate => assembler.month0() as usize + 1,
            ChartView::MonthToDate => 1,
            ChartView::Year(_) => 12,
        };
        prop_assert_eq!(series.labels.len(), expected);
        prop_assert_eq!(series.values.len(), expected);
        prop_assert_eq!(series.years.len(), expected);
        prop_assert!(series.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn total_is_sum_of_values(
        assembler in arb_assembler(),
        view in arb_view(),
        entries in arb_entries(),
    ) {
        let series = assembler.assemble(view, &entries);
        prop_assert_eq!(series.total, series.values.iter().sum::<f64>());
    }

    #[test]
    fn all_is_six_months(assembler in arb_assembler(), entries in arb_entries()) {
        prop_assert_eq!(
            assembler.assemble(ChartView::All, &entries),
            assembler.assemble(ChartView::SixMonths, &entries)
        );
    }

    #[test]
    fn unknown_labels_are_ignored(
        assembler in arb_assembler(),
        entries in arb_entries(),
        junk in prop::collection::vec(("[QW][0-9]", 1u32..1000), 1..4),
    ) {
        let mut noisy = entries.clone();
        noisy.extend(
            junk.into_iter()
                .map(|(label, value)| MonthlyEntry::new(label, f64::from(value))),
        );
        // YTD never backfills, so entry count cannot matter
        prop_assert_eq!(
            assembler.assemble(ChartView::YearToDate, &noisy),
            assembler.assemble(ChartView::YearToDate, &entries)
        );
    }

    #[test]
    fn placed_values_come_from_matching_entries(
        assembler in arb_assembler(),
        year in 2016i32..2034,
        entries in arb_entries(),
    ) {
        let series = assembler.assemble(ChartView::Year(year), &entries);
        for (i, value) in series.values.iter().enumerate() {
            if *value != 0.0 {
                let matched = entries.iter().any(|e| {
                    roost_core::month_index(&e.label) == Some(i as u32)
                        && e.year.map_or(true, |y| y == year)
                        && e.value == *value
                });
                prop_assert!(matched, "slot {} has unmatched value {}", i, value);
            }
        }
    }

    #[test]
    fn yearless_trailing_series_shows_newest_months(
        assembler in arb_assembler(),
        values in prop::collection::vec(1u32..100_000, 24),
    ) {
        // Newest first, one entry per trailing month, no years
        let entries: Vec<MonthlyEntry> = values
            .iter()
            .enumerate()
            .map(|(back, value)| {
                let month0 = (assembler.month0() as i32 - back as i32).rem_euclid(12) as u32;
                MonthlyEntry::new(roost_core::month_label(month0), f64::from(*value))
            })
            .collect();

        let series = assembler.assemble(ChartView::SixMonths, &entries);
        let expected: Vec<f64> = values[..6].iter().rev().map(|v| f64::from(*v)).collect();
        prop_assert_eq!(series.values, expected);

        let current = assembler.assemble(ChartView::MonthToDate, &entries);
        prop_assert_eq!(current.values, vec![f64::from(values[0])]);
    }

    #[test]
    fn november_backfill_for_detected_shape(
        december in 0u32..100_000,
        rest in prop::collection::vec(1u32..100_000, 4),
        year in 2018i32..2032,
    ) {
        let assembler = ChartViewAssembler::new(year, 11);
        let mut entries = vec![MonthlyEntry::new("Dec", f64::from(december))];
        for (label, value) in ["Oct", "Sep", "Aug", "Jul"].iter().zip(&rest) {
            entries.push(MonthlyEntry::new(*label, f64::from(*value)));
        }

        let series = assembler.assemble(ChartView::SixMonths, &entries);
        let november = (f64::from(december) * 0.8).round();
        prop_assert_eq!(series.labels[4].as_str(), "Nov");
        prop_assert_eq!(series.values[4], november);

        let expected_total = f64::from(december) + november
            + rest.iter().map(|v| f64::from(*v)).sum::<f64>();
        prop_assert_eq!(series.total, expected_total);

        // Same data, other views: no imputation
        let year_view = assembler.assemble(ChartView::Year(year), &entries);
        prop_assert_eq!(year_view.values[10], 0.0);
    }

    #[test]
    fn no_backfill_when_november_present(
        december in 1u32..100_000,
        november in 1u32..100_000,
        year in 2018i32..2032,
    ) {
        let assembler = ChartViewAssembler::new(year, 11);
        let entries = vec![
            MonthlyEntry::new("Dec", f64::from(december)),
            MonthlyEntry::new("Nov", f64::from(november)),
            MonthlyEntry::new("Oct", 1.0),
            MonthlyEntry::new("Sep", 1.0),
            MonthlyEntry::new("Aug", 1.0),
        ];
        let series = assembler.assemble(ChartView::SixMonths, &entries);
        prop_assert_eq!(series.values[4], f64::from(november));
    }
}
