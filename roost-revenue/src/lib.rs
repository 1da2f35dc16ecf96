//! Roost Revenue - Revenue Engine
//!
//! Turns a reservation feed into fixed-horizon revenue buckets and a monthly
//! revenue series into fixed-shape chart views, and wires both to cached
//! remote sources.
//!
//! # Components
//!
//! - [`aggregator`]: six lookback horizons over reservation records
//! - [`chart`]: `6M` / `YTD` / `MTD` / year / `ALL` views of a monthly series
//! - [`sources`]: remote endpoint traits and their fetcher adapters
//! - [`dashboard`]: cached monthly revenue and owner payout for a listing set

pub mod aggregator;
pub mod chart;
pub mod dashboard;
pub mod record;
pub mod sources;

pub use aggregator::{
    month_distance, parse_reservations, process_raw_reservations, process_revenue_data, Horizon,
    HorizonSeries, RevenueSummary, HORIZONS,
};
pub use chart::{ChartView, ChartViewAssembler, MonthlyEntry, MonthlySeries, ViewSeries};
pub use dashboard::{
    FinancialsResource, MonthlyResource, RevenueDashboard, LISTING_FINANCIALS_KEY,
    MONTHLY_REVENUE_KEY,
};
pub use record::{RevenueRecord, COUNTED_STATUSES};
pub use sources::{
    FinancialsFetcher, FinancialsParams, FinancialsResult, ListingFinancials,
    ListingFinancialsSource, MonthlyRevenueFetcher, MonthlyRevenueParams, MonthlyRevenueSource,
};
