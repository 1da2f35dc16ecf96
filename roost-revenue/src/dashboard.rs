//! Cached revenue dashboard.
//!
//! Composes two cache controllers (monthly revenue and listing financials)
//! with the chart assembler and the reservation aggregator. Each controller
//! has its own cache key, throttle and sequence numbers.

use std::sync::Arc;

use roost_core::{Clock, RoostConfig};
use roost_storage::{CacheStore, CachedResource, ResourceOptions, ResourceState};
use serde_json::Value;

use crate::aggregator::{process_raw_reservations, RevenueSummary};
use crate::chart::{ChartView, ChartViewAssembler, MonthlySeries, ViewSeries};
use crate::sources::{
    FinancialsFetcher, FinancialsParams, ListingFinancials, ListingFinancialsSource,
    MonthlyRevenueFetcher, MonthlyRevenueParams, MonthlyRevenueSource,
};

/// Base cache key of the monthly revenue series.
pub const MONTHLY_REVENUE_KEY: &str = "monthly_revenue";
/// Base cache key of the listing financials report.
pub const LISTING_FINANCIALS_KEY: &str = "listing_financials";

/// Cache controller of the monthly revenue series.
pub type MonthlyResource<M> =
    CachedResource<MonthlySeries, MonthlyRevenueParams, MonthlyRevenueFetcher<M>>;
/// Cache controller of the listing financials report.
pub type FinancialsResource<L> =
    CachedResource<ListingFinancials, FinancialsParams, FinancialsFetcher<L>>;

/// Revenue data for a selection of listings.
pub struct RevenueDashboard<M, L> {
    monthly: MonthlyResource<M>,
    financials: FinancialsResource<L>,
    clock: Arc<dyn Clock>,
}

impl<M, L> RevenueDashboard<M, L>
where
    M: MonthlyRevenueSource + 'static,
    L: ListingFinancialsSource + 'static,
{
    /// Build an idle dashboard for `listing_ids`. Call [`mount`](Self::mount)
    /// to load.
    pub fn new(
        store: CacheStore,
        config: &RoostConfig,
        monthly_source: Arc<M>,
        financials_source: Arc<L>,
        listing_ids: Vec<u32>,
    ) -> Self {
        let clock = Arc::clone(store.clock());
        let options = ResourceOptions::from_config(config);

        let monthly = CachedResource::new(
            store.clone(),
            MONTHLY_REVENUE_KEY,
            MonthlyRevenueFetcher::new(monthly_source),
            MonthlyRevenueParams {
                listing_ids: listing_ids.clone(),
                month_count: config.monthly_window_months,
            },
            options.clone(),
        );
        let financials = CachedResource::new(
            store,
            LISTING_FINANCIALS_KEY,
            FinancialsFetcher::new(financials_source),
            FinancialsParams {
                listing_ids,
                ..FinancialsParams::default()
            },
            options,
        );

        Self {
            monthly,
            financials,
            clock,
        }
    }

    pub fn monthly(&self) -> &MonthlyResource<M> {
        &self.monthly
    }

    pub fn financials(&self) -> &FinancialsResource<L> {
        &self.financials
    }

    /// Activate both resources: cached data first, network as needed.
    pub async fn mount(&self) {
        self.monthly.mount().await;
        self.financials.mount().await;
    }

    /// Switch to another listing selection.
    pub async fn set_listings(&self, listing_ids: Vec<u32>) {
        let mut monthly = self.monthly.params();
        monthly.listing_ids = listing_ids.clone();
        self.monthly.set_params(monthly).await;

        let mut financials = self.financials.params();
        financials.listing_ids = listing_ids;
        self.financials.set_params(financials).await;
    }

    /// Pull-to-refresh: foreground refetch of both resources, subject to
    /// each resource's throttle.
    pub async fn refresh(&self) {
        self.monthly.refetch(true).await;
        self.financials.refetch(true).await;
    }

    /// Chart view for the current month. Zero-filled until data arrives.
    pub fn chart(&self, view: ChartView) -> ViewSeries {
        let assembler = ChartViewAssembler::today(self.clock.as_ref());
        let series = self.monthly.data().unwrap_or_default();
        assembler.assemble_series(view, &series)
    }

    /// Owner payout from the financials report, once loaded.
    pub fn owner_payout(&self) -> Option<f64> {
        self.financials
            .data()
            .map(|report| report.result.owner_payout)
    }

    pub fn monthly_state(&self) -> ResourceState<MonthlySeries> {
        self.monthly.state()
    }

    pub fn financials_state(&self) -> ResourceState<ListingFinancials> {
        self.financials.state()
    }

    /// Bucket raw reservations relative to the dashboard clock.
    pub fn summarize(&self, reservations: &[Value]) -> RevenueSummary {
        process_raw_reservations(reservations, self.clock.now())
    }

    /// Wait for any background refreshes to land.
    pub async fn settle(&self) {
        self.monthly.wait_for_background().await;
        self.financials.wait_for_background().await;
    }
}
