//! Remote revenue endpoints and their fetcher adapters.
//!
//! The dashboard never talks to an HTTP client directly. Hosts implement
//! these traits over whatever client they use; the adapters turn them into
//! [`DataFetcher`]s for the cache controller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use roost_core::FetchError;
use roost_storage::DataFetcher;
use serde::{Deserialize, Serialize};

use crate::chart::MonthlySeries;

/// Request params for the monthly revenue endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenueParams {
    pub listing_ids: Vec<u32>,
    pub month_count: u32,
}

/// Request params for the listing financials report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialsParams {
    pub listing_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
}

/// Listing financials report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingFinancials {
    pub result: FinancialsResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialsResult {
    pub owner_payout: f64,
}

/// Monthly revenue totals for a set of listings.
#[async_trait]
pub trait MonthlyRevenueSource: Send + Sync {
    async fn monthly_revenue(
        &self,
        listing_ids: &[u32],
        month_count: u32,
    ) -> Result<MonthlySeries, FetchError>;
}

/// Aggregated financials for a set of listings.
#[async_trait]
pub trait ListingFinancialsSource: Send + Sync {
    async fn listing_financials(
        &self,
        params: &FinancialsParams,
    ) -> Result<ListingFinancials, FetchError>;
}

/// [`DataFetcher`] over a [`MonthlyRevenueSource`].
pub struct MonthlyRevenueFetcher<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ?Sized> MonthlyRevenueFetcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S> DataFetcher<MonthlyRevenueParams, MonthlySeries> for MonthlyRevenueFetcher<S>
where
    S: MonthlyRevenueSource + ?Sized,
{
    async fn fetch(&self, params: &MonthlyRevenueParams) -> Result<MonthlySeries, FetchError> {
        self.source
            .monthly_revenue(&params.listing_ids, params.month_count)
            .await
    }
}

/// [`DataFetcher`] over a [`ListingFinancialsSource`].
pub struct FinancialsFetcher<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ?Sized> FinancialsFetcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S> DataFetcher<FinancialsParams, ListingFinancials> for FinancialsFetcher<S>
where
    S: ListingFinancialsSource + ?Sized,
{
    async fn fetch(&self, params: &FinancialsParams) -> Result<ListingFinancials, FetchError> {
        self.source.listing_financials(params).await
    }
}
