//! Revenue bucketing over fixed lookback horizons.
//!
//! The same record set is viewed through six independent horizons; a record
//! may land in several of them or in none. Bucket index assignment depends
//! only on `(now, arrival date)`.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::RevenueRecord;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A fixed lookback window with its own bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    /// 7 daily buckets.
    #[serde(rename = "1W")]
    OneWeek,
    /// 4 seven-day buckets over the last 30 days.
    #[serde(rename = "1M")]
    OneMonth,
    /// 3 calendar-month buckets.
    #[serde(rename = "3M")]
    ThreeMonths,
    /// 6 calendar-month buckets.
    #[serde(rename = "6M")]
    SixMonths,
    /// 4 quarter buckets over the last year.
    #[serde(rename = "1Y")]
    OneYear,
    /// 4 calendar-year buckets over the last 3 years.
    #[serde(rename = "ALL")]
    ThreeYears,
}

/// Every horizon, in output order.
pub const HORIZONS: [Horizon; 6] = [
    Horizon::OneWeek,
    Horizon::OneMonth,
    Horizon::ThreeMonths,
    Horizon::SixMonths,
    Horizon::OneYear,
    Horizon::ThreeYears,
];

impl Horizon {
    pub fn key(&self) -> &'static str {
        match self {
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::ThreeYears => "ALL",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        HORIZONS.into_iter().find(|h| h.key() == key)
    }

    pub fn bucket_count(&self) -> usize {
        match self {
            Self::OneWeek => 7,
            Self::OneMonth => 4,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::OneYear => 4,
            Self::ThreeYears => 4,
        }
    }

    /// Earliest arrival instant inside the window, or `None` if the
    /// subtraction leaves chrono's range.
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::OneWeek => now.checked_sub_signed(Duration::days(7)),
            Self::OneMonth => now.checked_sub_signed(Duration::days(30)),
            Self::ThreeMonths => now.checked_sub_months(Months::new(3)),
            Self::SixMonths => now.checked_sub_months(Months::new(6)),
            Self::OneYear => now.checked_sub_months(Months::new(12)),
            Self::ThreeYears => now.checked_sub_months(Months::new(36)),
        }
    }

    /// Bucket (0 = oldest) for an arrival at `arrival`, or `None` when the
    /// arrival is outside the window, in the future, or maps past either end.
    pub fn bucket_index(&self, now: DateTime<Utc>, arrival: DateTime<Utc>) -> Option<usize> {
        if arrival > now || arrival < self.window_start(now)? {
            return None;
        }

        let elapsed_secs = (now - arrival).num_seconds();
        let months = month_distance(now, arrival);
        let raw = match self {
            Self::OneWeek => 6 - elapsed_secs.div_euclid(SECONDS_PER_DAY),
            Self::OneMonth => 3 - elapsed_secs.div_euclid(7 * SECONDS_PER_DAY),
            Self::ThreeMonths => 2 - months,
            Self::SixMonths => 5 - months,
            Self::OneYear => 3 - months.div_euclid(3),
            Self::ThreeYears => 3 - i64::from(now.year() - arrival.year()),
        };

        usize::try_from(raw)
            .ok()
            .filter(|index| *index < self.bucket_count())
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Whole calendar months from `earlier` to `later`, ignoring the day.
pub fn month_distance(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    i64::from(later.year() - earlier.year()) * 12 + i64::from(later.month())
        - i64::from(earlier.month())
}

/// Rounded bucket values for one horizon, oldest bucket first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HorizonSeries {
    pub data: Vec<i64>,
    pub total: i64,
}

impl HorizonSeries {
    fn from_totals(totals: &[f64]) -> Self {
        Self {
            data: totals.iter().map(|v| round_currency(*v)).collect(),
            total: round_currency(totals.iter().sum()),
        }
    }
}

/// All six horizons for one record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSummary {
    #[serde(rename = "1W")]
    pub one_week: HorizonSeries,
    #[serde(rename = "1M")]
    pub one_month: HorizonSeries,
    #[serde(rename = "3M")]
    pub three_months: HorizonSeries,
    #[serde(rename = "6M")]
    pub six_months: HorizonSeries,
    #[serde(rename = "1Y")]
    pub one_year: HorizonSeries,
    #[serde(rename = "ALL")]
    pub all: HorizonSeries,
}

impl RevenueSummary {
    pub fn get(&self, horizon: Horizon) -> &HorizonSeries {
        match horizon {
            Horizon::OneWeek => &self.one_week,
            Horizon::OneMonth => &self.one_month,
            Horizon::ThreeMonths => &self.three_months,
            Horizon::SixMonths => &self.six_months,
            Horizon::OneYear => &self.one_year,
            Horizon::ThreeYears => &self.all,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Horizon, &HorizonSeries)> + '_ {
        HORIZONS.into_iter().map(move |h| (h, self.get(h)))
    }
}

/// Bucket `records` into every horizon relative to `now`.
///
/// Records with an uncounted status are ignored entirely. Amounts are summed
/// unrounded; each bucket and each total is rounded once at the end.
pub fn process_revenue_data(records: &[RevenueRecord], now: DateTime<Utc>) -> RevenueSummary {
    let mut totals: [Vec<f64>; 6] = HORIZONS.map(|h| vec![0.0; h.bucket_count()]);
    let mut counted = 0usize;

    for record in records.iter().filter(|r| r.is_counted()) {
        if !record.amount.is_finite() {
            tracing::warn!(
                arrival_date = %record.arrival_date,
                "Skipping reservation with non-finite amount"
            );
            continue;
        }

        let arrival = record.arrival_instant();
        for (horizon, buckets) in HORIZONS.iter().zip(totals.iter_mut()) {
            if let Some(index) = horizon.bucket_index(now, arrival) {
                buckets[index] += record.amount;
            }
        }
        counted += 1;
    }

    tracing::debug!(records = records.len(), counted, "Revenue aggregated");

    let [one_week, one_month, three_months, six_months, one_year, all] =
        totals.map(|t| HorizonSeries::from_totals(&t));
    RevenueSummary {
        one_week,
        one_month,
        three_months,
        six_months,
        one_year,
        all,
    }
}

/// Parse raw reservation objects, skipping (and logging) malformed ones.
pub fn parse_reservations(values: &[Value]) -> Vec<RevenueRecord> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match RevenueRecord::from_reservation(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed reservation");
                None
            }
        })
        .collect()
}

/// [`process_revenue_data`] over raw reservation objects.
pub fn process_raw_reservations(values: &[Value], now: DateTime<Utc>) -> RevenueSummary {
    process_revenue_data(&parse_reservations(values), now)
}

fn round_currency(value: f64) -> i64 {
    value.round() as i64
}
