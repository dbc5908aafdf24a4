use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{LineItemId, ProductId};
use domain::{Invoice, InvoiceStatus, LineItem, NewInvoice};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    InvoiceId, Result, StoreError,
    store::{InvoiceStore, validate_transition},
};

/// PostgreSQL-backed invoice store.
///
/// Invoice numbers come from an identity column; status transitions are a
/// single conditional `UPDATE`, so two workers racing on the same invoice
/// cannot both win.
#[derive(Clone)]
pub struct PostgresInvoiceStore {
    pool: PgPool,
}

struct InvoiceRow {
    id: InvoiceId,
    number: i64,
    status: InvoiceStatus,
    issued_at: DateTime<Utc>,
}

impl PostgresInvoiceStore {
    /// Creates a new PostgreSQL invoice store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn parse_status(raw: &str) -> Result<InvoiceStatus> {
        raw.parse().map_err(StoreError::Corrupt)
    }

    fn row_to_invoice(row: &PgRow) -> Result<InvoiceRow> {
        let status: String = row.try_get("status")?;
        Ok(InvoiceRow {
            id: InvoiceId::from_uuid(row.try_get::<Uuid, _>("id")?),
            number: row.try_get("number")?,
            status: Self::parse_status(&status)?,
            issued_at: row.try_get("issued_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<LineItem> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::Corrupt(format!("quantity {quantity} out of range")))?;

        Ok(LineItem {
            id: LineItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            invoice_id: InvoiceId::from_uuid(row.try_get::<Uuid, _>("invoice_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity,
            unit_price: row.try_get::<Decimal, _>("unit_price")?,
        })
    }

    /// Loads the items of several invoices, grouped by invoice and in position order.
    async fn load_items(&self, ids: &[Uuid]) -> Result<HashMap<InvoiceId, Vec<LineItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, invoice_id, product_id, quantity, unit_price
            FROM invoice_items
            WHERE invoice_id = ANY($1)
            ORDER BY invoice_id, position ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<InvoiceId, Vec<LineItem>> = HashMap::new();
        for row in &rows {
            let item = Self::row_to_item(row)?;
            grouped.entry(item.invoice_id).or_default().push(item);
        }
        Ok(grouped)
    }

    async fn assemble(&self, rows: Vec<InvoiceRow>) -> Result<Vec<Invoice>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id.as_uuid()).collect();
        let mut items = self.load_items(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let lines = items.remove(&r.id).unwrap_or_default();
                Invoice::from_parts(r.id, r.number, r.status, r.issued_at, lines)
            })
            .collect())
    }
}

#[async_trait]
impl InvoiceStore for PostgresInvoiceStore {
    async fn insert(&self, invoice: NewInvoice) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        let number: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoices (id, status, issued_at)
            VALUES ($1, $2, $3)
            RETURNING number
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(InvoiceStatus::Open.as_str())
        .bind(invoice.issued_at)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in invoice.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::Corrupt("too many invoice items".to_string()))?;
            let quantity = i64::from(item.quantity);

            sqlx::query(
                r#"
                INSERT INTO invoice_items (id, invoice_id, position, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(invoice.id.as_uuid())
            .bind(position)
            .bind(item.product_id.as_uuid())
            .bind(quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(invoice_id = %invoice.id, number, "invoice inserted");

        Ok(invoice.into_invoice(number))
    }

    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        let row = sqlx::query(
            r#"
            SELECT id, number, status, issued_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let row = Self::row_to_invoice(&row)?;
                Ok(self.assemble(vec![row]).await?.pop())
            }
            None => Ok(None),
        }
    }

    async fn list(&self, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>> {
        let rows = sqlx::query(
            r#"
            SELECT id, number, status, issued_at
            FROM invoices
            WHERE $1::TEXT IS NULL OR status = $1
            ORDER BY number ASC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let rows = rows
            .iter()
            .map(Self::row_to_invoice)
            .collect::<Result<Vec<_>>>()?;
        self.assemble(rows).await
    }

    async fn transition_status(
        &self,
        id: InvoiceId,
        expected: InvoiceStatus,
        next: InvoiceStatus,
    ) -> Result<Invoice> {
        validate_transition(expected, next)?;

        let updated = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $1
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(next.as_str())
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            let actual: Option<String> =
                sqlx::query_scalar("SELECT status FROM invoices WHERE id = $1")
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;

            return match actual {
                Some(actual) => Err(StoreError::StatusConflict {
                    invoice_id: id,
                    expected,
                    actual: Self::parse_status(&actual)?,
                }),
                None => Err(StoreError::NotFound(id)),
            };
        }

        self.get(id).await?.ok_or(StoreError::NotFound(id))
    }
}
