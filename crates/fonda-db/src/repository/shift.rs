//! # Cash Shift Repository
//!
//! Closing a cash shift: compare what the cashier counted against what the
//! ledger recorded, and persist the reconciliation.
//!
//! ## Closure Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  close_shift(shift_id, closed_by, declared cash, declared transfer)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shift_totals(shift_id)   ← system side, cancelled sales excluded      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  difference = declared − system                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  append one closure row (UNIQUE per shift)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reconciliation is read + append only: closing a shift never touches
//! stock or sale rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::repository::sale::SaleRepository;
use fonda_core::CashShiftClosure;

/// Repository for cash shift closures.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Closes a shift: aggregates its sales, computes the declared-vs-system
    /// difference, and appends the closure record.
    ///
    /// ## Errors
    /// * [`StoreError::UniqueViolation`] - the shift was already closed
    ///
    /// [`StoreError::UniqueViolation`]: crate::error::StoreError::UniqueViolation
    pub async fn close_shift(
        &self,
        shift_id: &str,
        closed_by: &str,
        declared_cash_cents: i64,
        declared_transfer_cents: i64,
    ) -> StoreResult<CashShiftClosure> {
        debug!(shift_id = %shift_id, "Closing cash shift");

        let totals = SaleRepository::new(self.pool.clone())
            .shift_totals(shift_id)
            .await?;

        let declared_total_cents = declared_cash_cents + declared_transfer_cents;
        let system_total_cents = totals.total_cents();

        let closure = CashShiftClosure {
            id: Uuid::new_v4().to_string(),
            shift_id: shift_id.to_string(),
            closed_by: closed_by.to_string(),
            closed_at: Utc::now(),
            declared_cash_cents,
            declared_transfer_cents,
            declared_total_cents,
            system_cash_cents: totals.cash_cents,
            system_transfer_cents: totals.transfer_cents,
            system_total_cents,
            difference_cents: declared_total_cents - system_total_cents,
            sales_count: totals.sales_count,
        };

        sqlx::query(
            "INSERT INTO cash_shift_closures (id, shift_id, closed_by, closed_at, \
                 declared_cash_cents, declared_transfer_cents, declared_total_cents, \
                 system_cash_cents, system_transfer_cents, system_total_cents, \
                 difference_cents, sales_count) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&closure.id)
        .bind(&closure.shift_id)
        .bind(&closure.closed_by)
        .bind(closure.closed_at)
        .bind(closure.declared_cash_cents)
        .bind(closure.declared_transfer_cents)
        .bind(closure.declared_total_cents)
        .bind(closure.system_cash_cents)
        .bind(closure.system_transfer_cents)
        .bind(closure.system_total_cents)
        .bind(closure.difference_cents)
        .bind(closure.sales_count)
        .execute(&self.pool)
        .await?;

        info!(
            shift_id = %shift_id,
            sales = closure.sales_count,
            difference_cents = closure.difference_cents,
            "Cash shift closed"
        );

        Ok(closure)
    }

    /// Gets the closure record for a shift, if it was closed.
    pub async fn get_closure(&self, shift_id: &str) -> StoreResult<Option<CashShiftClosure>> {
        let closure = sqlx::query_as::<_, CashShiftClosure>(
            "SELECT id, shift_id, closed_by, closed_at, \
                    declared_cash_cents, declared_transfer_cents, declared_total_cents, \
                    system_cash_cents, system_transfer_cents, system_total_cents, \
                    difference_cents, sales_count \
             FROM cash_shift_closures WHERE shift_id = ?",
        )
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(closure)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::generate_catalog_id;
    use fonda_core::{
        PaymentMethod, PaymentSplit, Product, SaleDraft, SaleItem, SaleStatus, StockSource,
    };

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(price_cents: i64, on_hand: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_catalog_id(),
            name: "Cola 330ml".to_string(),
            description: None,
            category: "Drinks".to_string(),
            price_cents,
            stock: StockSource::Direct { on_hand },
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    fn draft(product: &Product, quantity: i64, method: PaymentMethod, shift_id: &str) -> SaleDraft {
        let subtotal = product.price_cents * quantity;
        SaleDraft {
            user_id: "cashier-1".to_string(),
            shift_id: shift_id.to_string(),
            customer_id: None,
            items: vec![SaleItem {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                category: product.category.clone(),
                unit_price_cents: product.price_cents,
                cost_at_sale_cents: None,
                quantity,
                subtotal_cents: subtotal,
            }],
            subtotal_cents: subtotal,
            discount_cents: 0,
            delivery_fee_cents: 0,
            total_cents: subtotal,
            payments: vec![PaymentSplit {
                method,
                amount_cents: subtotal,
            }],
            status: SaleStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_close_shift_reconciles_by_method() {
        let db = test_db().await;

        let cola = product(1500, 100);
        db.catalog().insert_product(&cola).await.unwrap();

        // Two cash sales and one transfer sale on the shift
        db.checkout()
            .commit_sale(&draft(&cola, 2, PaymentMethod::Cash, "shift-7"))
            .await
            .unwrap();
        db.checkout()
            .commit_sale(&draft(&cola, 1, PaymentMethod::Cash, "shift-7"))
            .await
            .unwrap();
        db.checkout()
            .commit_sale(&draft(&cola, 4, PaymentMethod::Transfer, "shift-7"))
            .await
            .unwrap();

        // A sale on another shift must not leak in
        db.checkout()
            .commit_sale(&draft(&cola, 10, PaymentMethod::Cash, "shift-8"))
            .await
            .unwrap();

        // system: cash 4500, transfer 6000; cashier counted 100 cents short
        let closure = db
            .shifts()
            .close_shift("shift-7", "cashier-1", 4400, 6000)
            .await
            .unwrap();

        assert_eq!(closure.sales_count, 3);
        assert_eq!(closure.system_cash_cents, 4500);
        assert_eq!(closure.system_transfer_cents, 6000);
        assert_eq!(closure.system_total_cents, 10500);
        assert_eq!(closure.difference_cents, -100);

        let loaded = db.shifts().get_closure("shift-7").await.unwrap().unwrap();
        assert_eq!(loaded.difference_cents, -100);
    }

    #[tokio::test]
    async fn test_cancelled_sales_excluded_from_totals() {
        let db = test_db().await;

        let cola = product(1500, 100);
        db.catalog().insert_product(&cola).await.unwrap();

        let receipt = db
            .checkout()
            .commit_sale(&draft(&cola, 2, PaymentMethod::Cash, "shift-7"))
            .await
            .unwrap();
        db.checkout()
            .commit_sale(&draft(&cola, 1, PaymentMethod::Cash, "shift-7"))
            .await
            .unwrap();

        // Status transitions live outside the checkout core; flip one to
        // cancelled directly for the aggregation test.
        sqlx::query("UPDATE sales SET status = 'cancelled' WHERE id = ?")
            .bind(&receipt.sale_id)
            .execute(db.pool())
            .await
            .unwrap();

        let totals = db.sales().shift_totals("shift-7").await.unwrap();
        assert_eq!(totals.sales_count, 1);
        assert_eq!(totals.cash_cents, 1500);

        let sales = db.sales().list_by_shift("shift-7").await.unwrap();
        assert_eq!(sales.len(), 1);
    }

    #[tokio::test]
    async fn test_shift_closes_once() {
        let db = test_db().await;

        db.shifts()
            .close_shift("shift-7", "cashier-1", 0, 0)
            .await
            .unwrap();

        let err = db
            .shifts()
            .close_shift("shift-7", "cashier-1", 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }
}
