//! # Domain Types
//!
//! Core domain types used throughout Fonda POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Ingredient    │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price_cents    │   │  unit (g/ml/u)  │   │  items (frozen) │       │
//! │  │  stock: Source  │   │  current_stock  │   │  payments       │       │
//! │  │  version        │   │  version        │   │  total_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  StockSource::Direct { on_hand }     - counted units on the shelf      │
//! │  StockSource::Recipe { components }  - assembled from ingredients      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A [`SaleItem`] freezes product identity and pricing at the moment of sale.
//! The persisted [`Sale`] is immutable: its financial fields never change
//! after commit, regardless of later catalog edits.
//!
//! ## Optimistic Versioning
//! `Product.version` and `Ingredient.version` are incremented on every write.
//! The checkout transaction conditions its stock decrements on the version it
//! read, so a concurrent modification forces a clean abort instead of a
//! blind write over stale data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Ingredient
// =============================================================================

/// Unit of measure for an ingredient.
///
/// Stock for an ingredient is always an integer amount of the unit's
/// smallest denomination (grams, milliliters, or pieces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum IngredientUnit {
    /// Weighed stock, tracked in grams.
    Mass,
    /// Poured stock, tracked in milliliters.
    Volume,
    /// Counted stock, tracked in pieces.
    Count,
}

impl IngredientUnit {
    /// Short label used on tickets and stock screens.
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            IngredientUnit::Mass => "g",
            IngredientUnit::Volume => "ml",
            IngredientUnit::Count => "u",
        }
    }
}

/// A raw ingredient consumed by recipe products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in recipes and stock alerts.
    pub name: String,

    /// Unit of measure; stock is an integer in this unit's smallest denomination.
    pub unit: IngredientUnit,

    /// Current stock level (integer, never negative).
    pub current_stock: i64,

    /// Alert threshold; purely a display policy, never enforced.
    pub min_stock: i64,

    /// Cost per unit in cents (weighted average purchase cost).
    pub cost_per_unit_cents: i64,

    /// When the ingredient was created.
    pub created_at: DateTime<Utc>,

    /// When the ingredient was last updated.
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency token, incremented on every write.
    pub version: i64,
}

impl Ingredient {
    /// Returns the per-unit cost as a Money type.
    #[inline]
    pub fn cost_per_unit(&self) -> Money {
        Money::from_cents(self.cost_per_unit_cents)
    }
}

// =============================================================================
// Product
// =============================================================================

/// One component of a recipe: an ingredient and how much of it a single
/// unit of the product consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct RecipeComponent {
    /// Ingredient consumed by this component.
    pub ingredient_id: String,

    /// Quantity per unit of product, in the ingredient's smallest
    /// denomination (integer, > 0).
    pub quantity: i64,
}

/// How a product's inventory is tracked.
///
/// Exactly one source exists per product; the enum makes the
/// "stock XOR recipe" invariant impossible to violate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stockType", rename_all = "lowercase")]
pub enum StockSource {
    /// Finished goods counted directly (e.g. canned drinks).
    Direct {
        /// Units on the shelf (integer, never negative).
        #[serde(rename = "stock")]
        on_hand: i64,
    },
    /// Assembled from ingredients at sale time (e.g. a burger).
    /// Selling one unit deducts every component from ingredient stock.
    Recipe {
        /// Ordered component list (non-empty).
        #[serde(rename = "recipe")]
        components: Vec<RecipeComponent>,
    },
}

impl StockSource {
    /// True for directly counted stock.
    #[inline]
    pub const fn is_direct(&self) -> bool {
        matches!(self, StockSource::Direct { .. })
    }

    /// Units on hand for direct stock, None for recipe products.
    #[inline]
    pub fn direct_stock(&self) -> Option<i64> {
        match self {
            StockSource::Direct { on_hand } => Some(*on_hand),
            StockSource::Recipe { .. } => None,
        }
    }

    /// Recipe components, None for direct stock.
    #[inline]
    pub fn components(&self) -> Option<&[RecipeComponent]> {
        match self {
            StockSource::Direct { .. } => None,
            StockSource::Recipe { components } => Some(components),
        }
    }
}

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the grid and on tickets.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Grid/report category (e.g. "Burgers", "Drinks").
    pub category: String,

    /// Price in cents (integer, > 0).
    pub price_cents: i64,

    /// How inventory is tracked for this product.
    #[serde(flatten)]
    pub stock: StockSource,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency token, incremented on every write.
    pub version: i64,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// The checkout transaction only ever writes the initial status; later
/// transitions (kitchen flow, delivery, cancellation) happen elsewhere and
/// never touch the financial fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Committed, not yet picked up by the kitchen.
    Pending,
    /// Being prepared.
    Preparing,
    /// Ready for pickup or delivery.
    Ready,
    /// Handed over and done.
    Completed,
    /// Cancelled after commit; excluded from shift totals.
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

// =============================================================================
// Payments
// =============================================================================

/// How a payment allocation was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Bank transfer.
    Transfer,
}

/// One payment allocation towards a sale.
/// A sale can have multiple allocations for split tender; they must sum to
/// the sale total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PaymentSplit {
    pub method: PaymentMethod,

    /// Amount in cents (integer, > 0).
    pub amount_cents: i64,
}

impl PaymentSplit {
    /// Returns the allocation amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Product sold (catalog reference, not a foreign key into live data).
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Category at time of sale (frozen, for reports).
    pub category: String,

    /// Unit price in cents at time of sale (frozen, decoupled from the
    /// live catalog price).
    pub unit_price_cents: i64,

    /// Historical cost snapshot. The field is persisted but the checkout
    /// transaction never populates it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_at_sale_cents: Option<i64>,

    /// Quantity sold (integer, > 0).
    pub quantity: i64,

    /// Line total (unit_price_cents × quantity).
    pub subtotal_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Sale Draft & Sale
// =============================================================================

/// The checkout payload: a fully priced cart, totals pre-computed by the
/// caller.
///
/// The coordinator re-validates every financial invariant before committing
/// (`subtotal == Σ items`, `total == subtotal − discount + delivery`,
/// `Σ payments == total`); a draft that fails validation never reaches the
/// store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    /// Cashier committing the sale.
    pub user_id: String,

    /// Open cash shift this sale belongs to.
    pub shift_id: String,

    /// Customer reference for delivery orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    /// Frozen line items (≥ 1).
    pub items: Vec<SaleItem>,

    /// Sum of item subtotals, in cents.
    pub subtotal_cents: i64,

    /// Absolute discount in cents (≥ 0).
    #[serde(default)]
    pub discount_cents: i64,

    /// Delivery fee in cents (≥ 0).
    #[serde(default)]
    pub delivery_fee_cents: i64,

    /// Grand total in cents (> 0): subtotal − discount + delivery fee.
    pub total_cents: i64,

    /// Payment allocations; must sum to `total_cents`.
    pub payments: Vec<PaymentSplit>,

    /// Initial status written at commit.
    #[serde(default)]
    pub status: SaleStatus,
}

impl SaleDraft {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A committed sale: the draft plus the ledger-assigned identity.
///
/// Append-only. The financial fields are permanently frozen after commit;
/// only `status` transitions later, and that happens outside the checkout
/// core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Ledger-assigned identifier (UUID v4).
    pub id: String,

    pub user_id: String,
    pub shift_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub status: SaleStatus,

    pub items: Vec<SaleItem>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,
    pub payments: Vec<PaymentSplit>,

    /// Ledger-assigned commit timestamp.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Shift Closure
// =============================================================================

/// Reconciliation record written when a cash shift is closed.
///
/// Compares what the cashier counted (declared) against what the ledger
/// recorded for the shift (system). Cancelled sales are excluded from the
/// system side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CashShiftClosure {
    pub id: String,
    pub shift_id: String,
    pub closed_by: String,
    pub closed_at: DateTime<Utc>,

    pub declared_cash_cents: i64,
    pub declared_transfer_cents: i64,
    pub declared_total_cents: i64,

    pub system_cash_cents: i64,
    pub system_transfer_cents: i64,
    pub system_total_cents: i64,

    /// declared − system. Zero means the drawer balanced.
    pub difference_cents: i64,

    pub sales_count: i64,
}

impl CashShiftClosure {
    /// Returns the declared-vs-system difference as Money.
    #[inline]
    pub fn difference(&self) -> Money {
        Money::from_cents(self.difference_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_abbreviations() {
        assert_eq!(IngredientUnit::Mass.abbreviation(), "g");
        assert_eq!(IngredientUnit::Volume.abbreviation(), "ml");
        assert_eq!(IngredientUnit::Count.abbreviation(), "u");
    }

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Pending);
    }

    #[test]
    fn test_stock_source_accessors() {
        let direct = StockSource::Direct { on_hand: 12 };
        assert!(direct.is_direct());
        assert_eq!(direct.direct_stock(), Some(12));
        assert!(direct.components().is_none());

        let recipe = StockSource::Recipe {
            components: vec![RecipeComponent {
                ingredient_id: "ing-1".to_string(),
                quantity: 50,
            }],
        };
        assert!(!recipe.is_direct());
        assert_eq!(recipe.direct_stock(), None);
        assert_eq!(recipe.components().unwrap().len(), 1);
    }

    /// The UI layer sends camelCase JSON; the stock source is tagged by
    /// `stockType` with a sibling `stock` or `recipe` field.
    #[test]
    fn test_product_wire_shape() {
        let json = r#"{
            "id": "p-1",
            "name": "Cola 330ml",
            "description": null,
            "category": "Drinks",
            "priceCents": 1500,
            "stockType": "direct",
            "stock": 24,
            "isActive": true,
            "createdAt": "2026-01-05T12:00:00Z",
            "updatedAt": "2026-01-05T12:00:00Z",
            "version": 0
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price_cents, 1500);
        assert_eq!(product.stock.direct_stock(), Some(24));

        let json = r#"{
            "id": "p-2",
            "name": "Burger",
            "description": null,
            "category": "Burgers",
            "priceCents": 4500,
            "stockType": "recipe",
            "recipe": [{"ingredientId": "ing-beef", "quantity": 150}],
            "isActive": true,
            "createdAt": "2026-01-05T12:00:00Z",
            "updatedAt": "2026-01-05T12:00:00Z",
            "version": 3
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        let components = product.stock.components().unwrap();
        assert_eq!(components[0].ingredient_id, "ing-beef");
        assert_eq!(components[0].quantity, 150);
    }

    #[test]
    fn test_sale_draft_wire_defaults() {
        let json = r#"{
            "userId": "cashier-1",
            "shiftId": "shift-9",
            "items": [{
                "productId": "p-1",
                "productName": "Cola 330ml",
                "category": "Drinks",
                "unitPriceCents": 1500,
                "quantity": 2,
                "subtotalCents": 3000
            }],
            "subtotalCents": 3000,
            "totalCents": 3000,
            "payments": [{"method": "cash", "amountCents": 3000}]
        }"#;
        let draft: SaleDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.discount_cents, 0);
        assert_eq!(draft.delivery_fee_cents, 0);
        assert_eq!(draft.status, SaleStatus::Pending);
        assert_eq!(draft.items[0].cost_at_sale_cents, None);
        assert_eq!(draft.payments[0].method, PaymentMethod::Cash);
    }
}
