//! HTTP client for the inventory service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

use crate::{InventoryClient, InventoryError, ProductId, ProductSnapshot};

/// HTTP client for the stock ledger.
///
/// Endpoints, relative to `base_url`:
/// - `GET  /products/{id}`
/// - `POST /products/details` with a JSON array of ids
/// - `PUT  /products/{id}/decrement` with a JSON integer quantity
/// - `PUT  /products/{id}/increment` with a JSON integer quantity
///
/// 404 maps to `NotFound`, 409 to `InsufficientBalance`; anything else that
/// is not a success, and every connection, timeout or decoding problem, is a
/// `Transport` failure.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    client: Client,
    base_url: String,
}

impl HttpInventoryClient {
    /// Creates a client for the inventory service at `base_url`
    /// (e.g. `http://inventory:8080/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InventoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn product_url(&self, product_id: ProductId, suffix: &str) -> String {
        format!("{}/products/{}{}", self.base_url, product_id, suffix)
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<Response, InventoryError> {
        request
            .send()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))
    }

    /// Maps a non-success status to the error the ledger meant by it.
    async fn status_error(
        response: Response,
        product_id: ProductId,
        requested: u32,
    ) -> InventoryError {
        match response.status() {
            StatusCode::NOT_FOUND => InventoryError::NotFound(product_id),
            StatusCode::CONFLICT => InventoryError::InsufficientBalance {
                product_id,
                requested,
            },
            status => {
                let body = response.text().await.unwrap_or_default();
                InventoryError::Transport(format!("unexpected status {status}: {body}"))
            }
        }
    }

    async fn adjust(
        &self,
        product_id: ProductId,
        quantity: u32,
        operation: &str,
    ) -> Result<(), InventoryError> {
        let url = self.product_url(product_id, &format!("/{operation}"));
        let response = Self::send(self.client.put(url).json(&quantity)).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(response, product_id, quantity).await)
        }
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    #[tracing::instrument(skip(self))]
    async fn get(&self, product_id: ProductId) -> Result<ProductSnapshot, InventoryError> {
        let response = Self::send(self.client.get(self.product_url(product_id, ""))).await?;

        // A 409 makes no sense for a read; let it surface as a transport problem.
        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| InventoryError::Transport(format!("invalid product body: {e}"))),
            StatusCode::NOT_FOUND => Err(InventoryError::NotFound(product_id)),
            status => Err(InventoryError::Transport(format!(
                "unexpected status {status}"
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(count = ids.len()))]
    async fn batch_get(&self, ids: &[ProductId]) -> Result<Vec<ProductSnapshot>, InventoryError> {
        // The ledger answers an empty batch with 400.
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/products/details", self.base_url);
        let response = Self::send(self.client.post(url).json(ids)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::Transport(format!(
                "unexpected status {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| InventoryError::Transport(format!("invalid product list body: {e}")))
    }

    #[tracing::instrument(skip(self))]
    async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        self.adjust(product_id, quantity, "decrement").await
    }

    #[tracing::instrument(skip(self))]
    async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        self.adjust(product_id, quantity, "increment").await
    }
}
