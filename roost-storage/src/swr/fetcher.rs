//! Fetch function abstraction.

use std::future::Future;

use async_trait::async_trait;
use roost_core::FetchError;

/// A caller-supplied data source for one logical resource.
///
/// This trait abstracts over the network call, allowing the controller to
/// work with any client. Errors surface as the controller's `error` state.
#[async_trait]
pub trait DataFetcher<P, T>: Send + Sync
where
    P: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Fetch fresh data for `params`.
    async fn fetch(&self, params: &P) -> Result<T, FetchError>;
}

/// Adapts an async closure `Fn(P) -> Future<Output = Result<T, FetchError>>`
/// into a [`DataFetcher`].
#[derive(Debug, Clone)]
pub struct FnFetcher<F> {
    f: F,
}

/// Wrap an async closure as a [`DataFetcher`].
///
/// ```ignore
/// let fetcher = fetcher_fn(|ids: Vec<u32>| async move { client.revenue(&ids).await });
/// ```
pub fn fetcher_fn<F>(f: F) -> FnFetcher<F> {
    FnFetcher { f }
}

#[async_trait]
impl<P, T, F, Fut> DataFetcher<P, T> for FnFetcher<F>
where
    P: Clone + Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    async fn fetch(&self, params: &P) -> Result<T, FetchError> {
        (self.f)(params.clone()).await
    }
}
