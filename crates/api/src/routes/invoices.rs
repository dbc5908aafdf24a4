//! Invoice issue, lookup and print endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{InvoiceId, ProductId};
use domain::{Invoice, InvoiceStatus, LineItem};
use inventory::InventoryClient;
use invoice_store::InvoiceStore;
use rust_decimal::Decimal;
use saga::{InvoiceIssuer, ItemRequest, PrintCoordinator, PrintedInvoice};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Invoice store shared by every handler.
pub type SharedStore = Arc<dyn InvoiceStore>;

/// Ledger client shared by every handler.
pub type SharedInventory = Arc<dyn InventoryClient>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub issuer: InvoiceIssuer<SharedStore, SharedInventory>,
    pub coordinator: PrintCoordinator<SharedStore, SharedInventory>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateInvoiceRequest {
    pub items: Vec<InvoiceItemRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: InvoiceId,
    pub number: i64,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub total_amount: Decimal,
    pub items: Vec<InvoiceItemResponse>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemResponse {
    pub id: common::LineItemId,
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl InvoiceItemResponse {
    fn new(item: &LineItem, product_name: Option<String>) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price(),
        }
    }
}

impl InvoiceResponse {
    fn with_items(invoice: &Invoice, items: Vec<InvoiceItemResponse>) -> Self {
        Self {
            id: invoice.id(),
            number: invoice.number(),
            status: invoice.status(),
            issued_at: invoice.issued_at(),
            total_amount: invoice.total_amount(),
            items,
        }
    }
}

impl From<&Invoice> for InvoiceResponse {
    fn from(invoice: &Invoice) -> Self {
        let items = invoice
            .items()
            .iter()
            .map(|item| InvoiceItemResponse::new(item, None))
            .collect();
        Self::with_items(invoice, items)
    }
}

impl From<PrintedInvoice> for InvoiceResponse {
    fn from(printed: PrintedInvoice) -> Self {
        let items = printed
            .lines
            .into_iter()
            .map(|line| InvoiceItemResponse::new(&line.item, Some(line.product_name)))
            .collect();
        Self::with_items(&printed.invoice, items)
    }
}

// -- Handlers --

/// POST /invoices — issue a new invoice against live ledger snapshots.
#[tracing::instrument(skip(state, req), fields(items = req.items.len()))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let requests = req
        .items
        .iter()
        .map(|item| {
            let product_id = ProductId::from_str(&item.product_id).map_err(|e| {
                ApiError::BadRequest(format!("Invalid productId {}: {e}", item.product_id))
            })?;
            Ok(ItemRequest::new(product_id, item.quantity))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let invoice = state.issuer.issue(requests).await?;

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(&invoice))))
}

/// GET /invoices — list invoices, optionally filtered by `?status=`.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(InvoiceStatus::from_str)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let invoices = state.coordinator.list(status).await?;

    Ok(Json(invoices.iter().map(InvoiceResponse::from).collect()))
}

/// GET /invoices/{id} — load an invoice.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = parse_invoice_id(&id)?;
    let invoice = state.coordinator.invoice(invoice_id).await?;

    Ok(Json(InvoiceResponse::from(&invoice)))
}

/// POST /invoices/{id}/print — run the print saga.
#[tracing::instrument(skip(state))]
pub async fn print(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = parse_invoice_id(&id)?;
    let printed = state
        .coordinator
        .print(invoice_id)
        .await
        .map_err(ApiError::from_print)?;

    Ok(Json(InvoiceResponse::from(printed)))
}

fn parse_invoice_id(id: &str) -> Result<InvoiceId, ApiError> {
    InvoiceId::from_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid invoice ID: {e}")))
}
