//! Seller analytics.

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::models::SalesStats;

/// Read-only sales figures for the logged-in seller.
#[derive(Debug, Clone)]
pub struct SalesService {
    api: ApiClient,
}

impl SalesService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /sales/stats`.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn stats(&self) -> Result<SalesStats, ApiError> {
        self.api.get(&["sales", "stats"], RequestOptions::default()).await
    }
}
