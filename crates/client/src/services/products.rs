//! Catalog operations.

use tracing::instrument;

use tiendita_core::ProductId;

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::models::{NewProduct, Product, ProductUpdate};

/// Product CRUD and catalog reads.
#[derive(Debug, Clone)]
pub struct ProductsService {
    api: ApiClient,
}

impl ProductsService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /products`: the public catalog.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn list(&self) -> Result<Vec<Product>, ApiError> {
        self.api.get(&["products"], RequestOptions::public()).await
    }

    /// The public catalog restricted to products with stock left.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn in_stock(&self) -> Result<Vec<Product>, ApiError> {
        let mut products = self.list().await?;
        products.retain(Product::in_stock);
        Ok(products)
    }

    /// `GET /products/:id`.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn get(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.api
            .get(&["products", id.as_str()], RequestOptions::public())
            .await
    }

    /// `GET /products/my-products`: the logged-in seller's catalog.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    pub async fn mine(&self) -> Result<Vec<Product>, ApiError> {
        self.api
            .get(&["products", "my-products"], RequestOptions::default())
            .await
    }

    /// `POST /products`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without calling the server if the
    /// body is invalid; otherwise propagates any [`ApiError`].
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, ApiError> {
        product.validate().map_err(ApiError::Validation)?;
        self.api
            .post(&["products"], product, RequestOptions::default())
            .await
    }

    /// `PATCH /products/:id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without calling the server if the
    /// body is invalid; otherwise propagates any [`ApiError`].
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, update: &ProductUpdate) -> Result<Product, ApiError> {
        update.validate().map_err(ApiError::Validation)?;
        self.api
            .patch(&["products", id.as_str()], update, RequestOptions::default())
            .await
    }

    /// `DELETE /products/:id`.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiError`].
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .api
            .delete(&["products", id.as_str()], RequestOptions::default())
            .await?;
        Ok(())
    }
}
