//! Fixed-shape chart views over a monthly revenue series.
//!
//! Every view has a canonical list of `(year, month)` slots. Values start at
//! zero and source entries overwrite the slot they match, so callers always
//! receive full-length arrays.
//!
//! Entries without a year are read as the latest occurrence of their month
//! at or before the reference month. Sources list months newest first, so
//! among year-less entries for the same month the first one wins.

use chrono::{Datelike, NaiveDate};
use roost_core::{month_index, month_label, Clock, ValidationError};
use serde::{Deserialize, Serialize};

const NOVEMBER: u32 = 10;
const DECEMBER: u32 = 11;

/// Upstream drops November from a 5-entry series that starts at December;
/// the gap is filled with this share of December.
const NOVEMBER_BACKFILL_RATIO: f64 = 0.8;

/// Named chart aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartView {
    /// Six trailing calendar months ending at the current month.
    SixMonths,
    /// January through the current month.
    YearToDate,
    /// The current month alone.
    MonthToDate,
    /// All twelve months of one year.
    Year(i32),
    /// Same as [`ChartView::SixMonths`]; older call sites still ask for it.
    All,
}

impl ChartView {
    /// Parse `6M`, `YTD`, `MTD`, `ALL` or a four-digit year.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "6M" => Some(Self::SixMonths),
            "YTD" => Some(Self::YearToDate),
            "MTD" => Some(Self::MonthToDate),
            "ALL" => Some(Self::All),
            other if other.len() == 4 => other.parse().ok().map(Self::Year),
            _ => None,
        }
    }

    fn resolved(self) -> Self {
        match self {
            Self::All => Self::SixMonths,
            other => other,
        }
    }
}

/// One month of source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEntry {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl MonthlyEntry {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            year: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// Column-oriented monthly series as returned by the revenue endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    #[serde(default)]
    pub years: Vec<i32>,
}

impl MonthlySeries {
    /// Row view of the series. Extra labels or values without a partner are
    /// dropped; missing years leave the entry unqualified.
    pub fn entries(&self) -> Vec<MonthlyEntry> {
        if self.labels.len() != self.data.len() {
            tracing::warn!(
                labels = self.labels.len(),
                values = self.data.len(),
                "Monthly series columns differ in length"
            );
        }

        self.labels
            .iter()
            .zip(&self.data)
            .enumerate()
            .map(|(i, (label, value))| MonthlyEntry {
                label: label.clone(),
                value: *value,
                year: self.years.get(i).copied(),
            })
            .collect()
    }
}

/// A full-length chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub years: Vec<i32>,
    pub total: f64,
}

impl ViewSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Builds chart views relative to a reference month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartViewAssembler {
    year: i32,
    month0: u32,
}

impl ChartViewAssembler {
    /// Reference month as year plus zero-based month. Months past 11 roll
    /// into following years.
    pub fn new(year: i32, month0: u32) -> Self {
        Self {
            year: year + (month0 / 12) as i32,
            month0: month0 % 12,
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month0())
    }

    /// Reference month taken from `clock` (UTC).
    pub fn today(clock: &dyn Clock) -> Self {
        Self::for_date(clock.now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month0(&self) -> u32 {
        self.month0
    }

    /// Canonical `(year, month0)` slots of `view`, oldest first.
    pub fn slots(&self, view: ChartView) -> Vec<(i32, u32)> {
        match view {
            ChartView::SixMonths | ChartView::All => {
                (0..6).rev().map(|back| self.months_back(back)).collect()
            }
            ChartView::YearToDate => (0..=self.month0).map(|m| (self.year, m)).collect(),
            ChartView::MonthToDate => vec![(self.year, self.month0)],
            ChartView::Year(year) => (0..12).map(|m| (year, m)).collect(),
        }
    }

    /// Place `entries` into the slots of `view`.
    pub fn assemble(&self, view: ChartView, entries: &[MonthlyEntry]) -> ViewSeries {
        let view = view.resolved();
        let slots = self.slots(view);
        let mut values = vec![0.0; slots.len()];
        let mut placed_unqualified = vec![false; slots.len()];

        for entry in entries {
            let Some(month0) = month_index(&entry.label) else {
                let e = ValidationError::UnknownMonth {
                    label: entry.label.clone(),
                };
                tracing::warn!(error = %e, "Skipping monthly entry");
                continue;
            };
            if !entry.value.is_finite() {
                tracing::warn!(label = %entry.label, "Skipping monthly entry with non-finite value");
                continue;
            }
            let year = entry.year.unwrap_or_else(|| self.latest_year_of(month0));
            let Some(slot) = find_slot(&slots, month0, year) else {
                continue;
            };
            if entry.year.is_none() {
                if placed_unqualified[slot] {
                    continue;
                }
                placed_unqualified[slot] = true;
            }
            values[slot] = entry.value;
        }

        if view == ChartView::SixMonths {
            self.backfill_november(entries, &slots, &mut values);
        }

        ViewSeries {
            labels: slots.iter().map(|(_, m)| month_label(*m).to_string()).collect(),
            years: slots.iter().map(|(y, _)| *y).collect(),
            total: values.iter().sum(),
            values,
        }
    }

    /// [`assemble`](Self::assemble) over a column-oriented series.
    pub fn assemble_series(&self, view: ChartView, series: &MonthlySeries) -> ViewSeries {
        self.assemble(view, &series.entries())
    }

    fn months_back(&self, back: u32) -> (i32, u32) {
        let absolute = self.year * 12 + self.month0 as i32 - back as i32;
        (absolute.div_euclid(12), absolute.rem_euclid(12) as u32)
    }

    /// Year of the latest `month0` at or before the reference month.
    fn latest_year_of(&self, month0: u32) -> i32 {
        if month0 <= self.month0 {
            self.year
        } else {
            self.year - 1
        }
    }

    /// Fill the November gap for the one upstream shape known to drop it.
    fn backfill_november(
        &self,
        entries: &[MonthlyEntry],
        slots: &[(i32, u32)],
        values: &mut [f64],
    ) {
        let [december, ..] = entries else {
            return;
        };
        if entries.len() != 5
            || month_index(&december.label) != Some(DECEMBER)
            || !december.value.is_finite()
            || entries
                .iter()
                .any(|e| month_index(&e.label) == Some(NOVEMBER))
        {
            return;
        }

        let year = december
            .year
            .unwrap_or_else(|| self.latest_year_of(DECEMBER));
        if let Some(slot) = find_slot(slots, NOVEMBER, year) {
            let filled = (december.value * NOVEMBER_BACKFILL_RATIO).round();
            tracing::debug!(december = december.value, filled, "Backfilled missing November");
            values[slot] = filled;
        }
    }
}

fn find_slot(slots: &[(i32, u32)], month0: u32, year: i32) -> Option<usize> {
    slots.iter().position(|(y, m)| *m == month0 && *y == year)
}
