//! # Sale Ledger Repository
//!
//! Read access to the append-only sale ledger, plus the `pub(crate)` append
//! used by the checkout transaction.
//!
//! ## Append-Only Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Ledger                                       │
//! │                                                                         │
//! │  WRITE: append_sale()  - once, inside the checkout transaction,        │
//! │                          with a coordinator-assigned id + timestamp    │
//! │                                                                         │
//! │  READ:  get_by_id()    - full snapshot (items + payments)              │
//! │         list_by_shift()- a shift's sales, newest first                 │
//! │         shift_totals() - cash/transfer aggregation for the closure     │
//! │                                                                         │
//! │  There is NO update and NO delete here. Status transitions happen     │
//! │  elsewhere and never touch financial columns.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Once the checkout transaction commits, the record is durably readable by
//! every subsequent query on the pool (read-your-writes).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::StoreResult;
use fonda_core::{PaymentSplit, Sale, SaleItem, SaleStatus};

// =============================================================================
// Row Types
// =============================================================================

/// Sale header row; items and payments are loaded separately.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    user_id: String,
    shift_id: String,
    customer_id: Option<String>,
    status: SaleStatus,
    subtotal_cents: i64,
    discount_cents: i64,
    delivery_fee_cents: i64,
    total_cents: i64,
    created_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>, payments: Vec<PaymentSplit>) -> Sale {
        Sale {
            id: self.id,
            user_id: self.user_id,
            shift_id: self.shift_id,
            customer_id: self.customer_id,
            status: self.status,
            items,
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            delivery_fee_cents: self.delivery_fee_cents,
            total_cents: self.total_cents,
            payments,
            created_at: self.created_at,
        }
    }
}

const SELECT_SALE: &str = "\
    SELECT id, user_id, shift_id, customer_id, status, subtotal_cents, \
           discount_cents, delivery_fee_cents, total_cents, created_at \
    FROM sales";

const SELECT_ITEMS: &str = "\
    SELECT product_id, product_name, category, unit_price_cents, \
           cost_at_sale_cents, quantity, subtotal_cents \
    FROM sale_items WHERE sale_id = ? ORDER BY position";

const SELECT_PAYMENTS: &str = "\
    SELECT method, amount_cents \
    FROM sale_payments WHERE sale_id = ? ORDER BY position";

// =============================================================================
// Transaction-Scoped Append (used by the checkout service)
// =============================================================================

/// Appends one fully-formed sale snapshot inside the caller's transaction.
///
/// Items and payment allocations keep their cart order via `position`.
pub(crate) async fn append_sale(conn: &mut SqliteConnection, sale: &Sale) -> StoreResult<()> {
    debug!(id = %sale.id, total = sale.total_cents, "Appending sale");

    sqlx::query(
        "INSERT INTO sales (id, user_id, shift_id, customer_id, status, subtotal_cents, \
                            discount_cents, delivery_fee_cents, total_cents, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&sale.id)
    .bind(&sale.user_id)
    .bind(&sale.shift_id)
    .bind(&sale.customer_id)
    .bind(sale.status)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.delivery_fee_cents)
    .bind(sale.total_cents)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    for (position, item) in sale.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO sale_items (sale_id, position, product_id, product_name, category, \
                                     unit_price_cents, cost_at_sale_cents, quantity, subtotal_cents) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&sale.id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(&item.category)
        .bind(item.unit_price_cents)
        .bind(item.cost_at_sale_cents)
        .bind(item.quantity)
        .bind(item.subtotal_cents)
        .execute(&mut *conn)
        .await?;
    }

    for (position, payment) in sale.payments.iter().enumerate() {
        sqlx::query(
            "INSERT INTO sale_payments (sale_id, position, method, amount_cents) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&sale.id)
        .bind(position as i64)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Shift Totals
// =============================================================================

/// System-side totals for one shift, split by payment method.
///
/// Cancelled sales are excluded: their money never stayed in the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTotals {
    pub sales_count: i64,
    pub cash_cents: i64,
    pub transfer_cents: i64,
}

impl ShiftTotals {
    /// Combined system total (cash + transfer).
    #[inline]
    pub fn total_cents(&self) -> i64 {
        self.cash_cents + self.transfer_cents
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    cash_cents: i64,
    transfer_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale ledger reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID with its items and payment allocations.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!("{SELECT_SALE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(SELECT_ITEMS)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let payments = sqlx::query_as::<_, PaymentSplit>(SELECT_PAYMENTS)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(row.into_sale(items, payments)))
    }

    /// Lists a shift's sales, newest first, excluding cancelled ones.
    pub async fn list_by_shift(&self, shift_id: &str) -> StoreResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "{SELECT_SALE} WHERE shift_id = ? AND status != 'cancelled' ORDER BY created_at DESC"
        ))
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let items = sqlx::query_as::<_, SaleItem>(SELECT_ITEMS)
                .bind(&row.id)
                .fetch_all(&self.pool)
                .await?;
            let payments = sqlx::query_as::<_, PaymentSplit>(SELECT_PAYMENTS)
                .bind(&row.id)
                .fetch_all(&self.pool)
                .await?;
            sales.push(row.into_sale(items, payments));
        }

        Ok(sales)
    }

    /// Aggregates a shift's payment allocations by method.
    ///
    /// Feeds the cash-closure reconciliation; cancelled sales are excluded
    /// on both the count and the sums.
    pub async fn shift_totals(&self, shift_id: &str) -> StoreResult<ShiftTotals> {
        let sales_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales WHERE shift_id = ? AND status != 'cancelled'",
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        let sums = sqlx::query_as::<_, TotalsRow>(
            "SELECT \
                COALESCE(SUM(CASE WHEN p.method = 'cash' THEN p.amount_cents ELSE 0 END), 0) AS cash_cents, \
                COALESCE(SUM(CASE WHEN p.method = 'transfer' THEN p.amount_cents ELSE 0 END), 0) AS transfer_cents \
             FROM sale_payments p \
             INNER JOIN sales s ON s.id = p.sale_id \
             WHERE s.shift_id = ? AND s.status != 'cancelled'",
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ShiftTotals {
            sales_count,
            cash_cents: sums.cash_cents,
            transfer_cents: sums.transfer_cents,
        })
    }
}
