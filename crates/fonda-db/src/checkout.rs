//! # Checkout Service
//!
//! The sale-commit transaction: the one place in the system that verifies
//! inventory, deducts it, and appends the immutable sale record, atomically.
//!
//! ## One Checkout Attempt
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_sale(draft)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_draft ──── invalid ──► Validation (no store access at all)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ── read Products ── resolve ── read Ingredients ── check stock  │
//! │       │                      │                               │          │
//! │       │                      └── missing ──► *NotFound       │          │
//! │       │                                      └── short ──► Insufficient│
//! │       ▼                                                                 │
//! │  version-guarded decrements                                            │
//! │       │                                                                 │
//! │       ├── zero rows matched ──► Conflict ──► ROLLBACK, retry fresh     │
//! │       ▼                                                                 │
//! │  append sale (id + timestamp assigned here) ── COMMIT ── receipt       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - **Atomic**: decrements and the ledger append commit together or not at
//!   all; no other operation observes an intermediate state.
//! - **Isolated**: every write is conditioned on the row version captured by
//!   the snapshot read. Two checkouts racing for the same finite resource
//!   cannot both succeed past availability; the loser re-validates against
//!   fresh data.
//! - **Bounded retries**: only [`CheckoutError::Conflict`] is retried, and at
//!   most [`MAX_COMMIT_ATTEMPTS`] times. Insufficient stock is never retried
//!   automatically: it cannot resolve without human intervention.
//! - **Not idempotent, on purpose**: committing the same draft twice creates
//!   two sales and deducts twice. Deduplication is the caller's job; a timed
//!   out call must re-check the ledger before resubmitting.
//!
//! Once COMMITTING begins the attempt runs to completion; there is no
//! external cancellation point between the first write and the commit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::repository::{catalog, sale};
use fonda_core::validation::validate_draft;
use fonda_core::{
    inventory, CoreError, Ingredient, Product, Sale, SaleDraft, ValidationError,
};

/// Maximum optimistic attempts per checkout call.
///
/// A conflict means another writer touched one of our rows between snapshot
/// and write; fresh reads usually succeed on the next try. Three attempts
/// bounds the work under sustained contention.
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

// =============================================================================
// Error Surface
// =============================================================================

/// Typed outcome of a failed checkout.
///
/// Every variant except [`CheckoutError::Commit`] guarantees that stock and
/// ledger state are exactly as they were before the attempt. `Commit` is the
/// one case where the backing store's atomicity could not be observed: the
/// caller must re-check the ledger before resubmitting.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The payload itself is structurally invalid (arithmetic mismatch,
    /// empty cart, non-positive amounts). Raised before any store access;
    /// never retried.
    #[error("Invalid sale payload: {0}")]
    Validation(#[from] ValidationError),

    /// A line item references a product missing from the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A recipe references an ingredient missing from the catalog.
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// The computed deduction exceeds availability for a resource. Carries
    /// the user-facing detail; never auto-retried.
    #[error("Insufficient stock for {resource}: available {available}, required {required}")]
    InsufficientStock {
        resource: String,
        available: i64,
        required: i64,
    },

    /// The optimistic snapshot went stale before the write. Retried
    /// automatically with fresh reads up to [`MAX_COMMIT_ATTEMPTS`];
    /// surfaced only when retries are exhausted.
    #[error("Concurrent modification of {resource}, retry the sale")]
    Conflict { resource: String },

    /// The storage transaction could not be applied for infrastructure
    /// reasons. Whether any effect landed is unknowable from here; the
    /// caller should re-check ledger state before resubmitting.
    #[error("Sale could not be committed: {0}")]
    Commit(StoreError),
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(name) => CheckoutError::ProductNotFound(name),
            CoreError::IngredientNotFound(name) => CheckoutError::IngredientNotFound(name),
            CoreError::InsufficientStock {
                resource,
                available,
                required,
            } => CheckoutError::InsufficientStock {
                resource,
                available,
                required,
            },
            CoreError::Validation(err) => CheckoutError::Validation(err),
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            // SQLITE_BUSY aborts cleanly; same remedy as a stale version
            StoreError::Busy(_) => CheckoutError::Conflict {
                resource: "store".to_string(),
            },
            other => CheckoutError::Commit(other),
        }
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// What a successful checkout returns to the UI layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    /// Ledger-assigned sale identifier.
    pub sale_id: String,

    /// Committed grand total in cents.
    pub total_cents: i64,

    /// Ledger-assigned commit timestamp.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Checkout Service
// =============================================================================

/// The transaction coordinator for sale commits.
///
/// This is the sole externally callable operation of the core, and the only
/// writer of `products.stock` / `ingredients.current_stock` during checkout.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Commits a sale: verifies inventory, deducts it, appends the record.
    ///
    /// Validation runs before the first store access; a structurally invalid
    /// draft causes no reads and no writes. Conflicts from concurrent
    /// writers are retried with fresh snapshots up to
    /// [`MAX_COMMIT_ATTEMPTS`] before surfacing.
    pub async fn commit_sale(&self, draft: &SaleDraft) -> Result<CheckoutReceipt, CheckoutError> {
        validate_draft(draft)?;

        let mut attempt = 1;
        loop {
            match self.commit_once(draft).await {
                Err(CheckoutError::Conflict { resource }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(
                        attempt,
                        resource = %resource,
                        "checkout snapshot went stale, retrying with fresh reads"
                    );
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    /// One optimistic attempt. Any early return drops the transaction,
    /// which rolls it back; nothing becomes visible unless the final
    /// commit succeeds.
    async fn commit_once(&self, draft: &SaleDraft) -> Result<CheckoutReceipt, CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        // Snapshot phase: every product the cart references, deduplicated.
        let mut products: BTreeMap<String, Product> = BTreeMap::new();
        for item in &draft.items {
            if products.contains_key(&item.product_id) {
                continue;
            }
            let product = catalog::fetch_product(&mut tx, &item.product_id)
                .await?
                .ok_or_else(|| CheckoutError::ProductNotFound(item.product_name.clone()))?;
            products.insert(item.product_id.clone(), product);
        }

        let deductions = inventory::resolve_deductions(&draft.items, &products)?;
        debug!(
            products = deductions.products().len(),
            ingredients = deductions.ingredients().len(),
            "deductions resolved"
        );

        // Ingredients are only known after resolution (recipes expand here).
        let mut ingredients: BTreeMap<String, Ingredient> = BTreeMap::new();
        for ingredient_id in deductions.ingredient_ids() {
            let ingredient = catalog::fetch_ingredient(&mut tx, ingredient_id)
                .await?
                .ok_or_else(|| CheckoutError::IngredientNotFound(ingredient_id.to_string()))?;
            ingredients.insert(ingredient_id.to_string(), ingredient);
        }

        inventory::check_stock(&deductions, &products, &ingredients)?;

        // Write phase: every decrement is conditioned on the version we read.
        for (product_id, quantity) in deductions.products() {
            let product = &products[product_id];
            let applied =
                catalog::deduct_product_stock(&mut tx, product_id, *quantity, product.version)
                    .await?;
            if !applied {
                return Err(CheckoutError::Conflict {
                    resource: product.name.clone(),
                });
            }
        }

        for (ingredient_id, quantity) in deductions.ingredients() {
            let ingredient = &ingredients[ingredient_id];
            let applied = catalog::deduct_ingredient_stock(
                &mut tx,
                ingredient_id,
                *quantity,
                ingredient.version,
            )
            .await?;
            if !applied {
                return Err(CheckoutError::Conflict {
                    resource: ingredient.name.clone(),
                });
            }
        }

        // Ledger append: identity and timestamp are assigned here, once.
        let record = Sale {
            id: Uuid::new_v4().to_string(),
            user_id: draft.user_id.clone(),
            shift_id: draft.shift_id.clone(),
            customer_id: draft.customer_id.clone(),
            status: draft.status,
            items: draft.items.clone(),
            subtotal_cents: draft.subtotal_cents,
            discount_cents: draft.discount_cents,
            delivery_fee_cents: draft.delivery_fee_cents,
            total_cents: draft.total_cents,
            payments: draft.payments.clone(),
            created_at: Utc::now(),
        };

        sale::append_sale(&mut tx, &record).await?;

        tx.commit().await.map_err(StoreError::from)?;

        info!(
            sale_id = %record.id,
            total_cents = record.total_cents,
            items = record.items.len(),
            "sale committed"
        );

        Ok(CheckoutReceipt {
            sale_id: record.id,
            total_cents: record.total_cents,
            created_at: record.created_at,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
