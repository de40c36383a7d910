//! # Validation Module
//!
//! Sale payload and catalog field validation for Fonda POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI (separate client)                                         │
//! │  ├── Basic format checks (empty fields, ranges)                        │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules for catalog writes                                    │
//! │  └── validate_draft: the financial invariants, re-checked by the       │
//! │      checkout transaction as the last gate before a durable write      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A draft that fails [`validate_draft`] must never reach the store: the
//! checkout entrypoint runs it before opening a transaction.

use crate::error::{ValidationError, ValidationResult};
use crate::types::{RecipeComponent, SaleDraft};
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

// =============================================================================
// Sale Draft Validation
// =============================================================================

/// Validates the full financial shape of a checkout payload.
///
/// ## Rules
/// - `user_id` and `shift_id` non-empty
/// - at least one line item, at most [`MAX_SALE_ITEMS`]
/// - per item: `quantity` in 1..=[`MAX_ITEM_QUANTITY`], `unit_price_cents > 0`,
///   `subtotal_cents == unit_price_cents * quantity`
/// - `subtotal_cents == Σ item.subtotal_cents`
/// - `discount_cents ≥ 0`, `delivery_fee_cents ≥ 0`
/// - `total_cents == subtotal − discount + delivery` and `total_cents > 0`
/// - at least one payment, each `amount_cents > 0`, `Σ == total_cents`
///
/// Runs entirely in memory; no store access. Violations are terminal: the
/// caller must fix the payload, retrying cannot succeed.
pub fn validate_draft(draft: &SaleDraft) -> ValidationResult<()> {
    if draft.user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    if draft.shift_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "shift_id".to_string(),
        });
    }

    if draft.items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    if draft.items.len() > MAX_SALE_ITEMS {
        return Err(ValidationError::CartTooLarge {
            max: MAX_SALE_ITEMS,
        });
    }

    let mut items_sum: i64 = 0;
    for item in &draft.items {
        validate_quantity(item.quantity)?;

        if item.unit_price_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("unit price of {}", item.product_name),
            });
        }

        let expected = item.unit_price_cents * item.quantity;
        if item.subtotal_cents != expected {
            return Err(ValidationError::LineSubtotalMismatch {
                product: item.product_name.clone(),
                declared: item.subtotal_cents,
                expected,
            });
        }

        items_sum += item.subtotal_cents;
    }

    if draft.subtotal_cents != items_sum {
        return Err(ValidationError::SubtotalMismatch {
            declared: draft.subtotal_cents,
            computed: items_sum,
        });
    }

    if draft.discount_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "discount".to_string(),
        });
    }

    if draft.delivery_fee_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "delivery fee".to_string(),
        });
    }

    let computed_total = draft.subtotal_cents - draft.discount_cents + draft.delivery_fee_cents;
    if draft.total_cents != computed_total {
        return Err(ValidationError::TotalMismatch {
            declared: draft.total_cents,
            computed: computed_total,
        });
    }

    if draft.total_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "total".to_string(),
        });
    }

    if draft.payments.is_empty() {
        return Err(ValidationError::NoPayments);
    }

    let mut payments_sum: i64 = 0;
    for payment in &draft.payments {
        if payment.amount_cents <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "payment amount".to_string(),
            });
        }
        payments_sum += payment.amount_cents;
    }

    if payments_sum != draft.total_cents {
        return Err(ValidationError::PaymentMismatch {
            paid: payments_sum,
            total: draft.total_cents,
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Field Validators
// =============================================================================

/// Validates a product or ingredient display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a product price in cents.
///
/// ## Rules
/// - Must be strictly positive; there are no free products in the catalog
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level (direct product stock or ingredient stock).
///
/// ## Rules
/// - Must be non-negative; zero means sold out, never oversold
pub fn validate_stock_level(level: i64) -> ValidationResult<()> {
    if level < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::QuantityTooLarge {
            requested: qty,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a recipe definition for a recipe product.
///
/// ## Rules
/// - Must have at least one component
/// - Every component quantity must be positive
pub fn validate_recipe(product_name: &str, components: &[RecipeComponent]) -> ValidationResult<()> {
    if components.is_empty() {
        return Err(ValidationError::EmptyRecipe {
            product: product_name.to_string(),
        });
    }

    for component in components {
        if component.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("recipe quantity for {}", component.ingredient_id),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, PaymentSplit, SaleItem, SaleStatus};

    fn item(product_id: &str, unit_price: i64, quantity: i64) -> SaleItem {
        SaleItem {
            product_id: product_id.to_string(),
            product_name: format!("Product {product_id}"),
            category: "Test".to_string(),
            unit_price_cents: unit_price,
            cost_at_sale_cents: None,
            quantity,
            subtotal_cents: unit_price * quantity,
        }
    }

    fn valid_draft() -> SaleDraft {
        SaleDraft {
            user_id: "cashier-1".to_string(),
            shift_id: "shift-1".to_string(),
            customer_id: None,
            items: vec![item("p-1", 1500, 2), item("p-2", 4500, 1)],
            subtotal_cents: 7500,
            discount_cents: 500,
            delivery_fee_cents: 1000,
            total_cents: 8000,
            payments: vec![
                PaymentSplit {
                    method: PaymentMethod::Cash,
                    amount_cents: 5000,
                },
                PaymentSplit {
                    method: PaymentMethod::Transfer,
                    amount_cents: 3000,
                },
            ],
            status: SaleStatus::Pending,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&valid_draft()).is_ok());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let mut draft = valid_draft();
        draft.items.clear();
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::EmptyCart)
        ));
    }

    #[test]
    fn test_missing_ids_rejected() {
        let mut draft = valid_draft();
        draft.user_id = "  ".to_string();
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::Required { .. })
        ));

        let mut draft = valid_draft();
        draft.shift_id = String::new();
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_line_subtotal_mismatch_rejected() {
        let mut draft = valid_draft();
        draft.items[0].subtotal_cents += 1;
        draft.subtotal_cents += 1;
        draft.total_cents += 1;
        draft.payments[0].amount_cents += 1;
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::LineSubtotalMismatch { .. })
        ));
    }

    #[test]
    fn test_subtotal_mismatch_rejected() {
        let mut draft = valid_draft();
        draft.subtotal_cents = 9999;
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::SubtotalMismatch {
                declared: 9999,
                computed: 7500
            })
        ));
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let mut draft = valid_draft();
        draft.total_cents = 7500;
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::TotalMismatch {
                declared: 7500,
                computed: 8000
            })
        ));
    }

    #[test]
    fn test_payment_mismatch_rejected() {
        let mut draft = valid_draft();
        draft.payments.pop();
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::PaymentMismatch {
                paid: 5000,
                total: 8000
            })
        ));
    }

    #[test]
    fn test_zero_payment_rejected() {
        let mut draft = valid_draft();
        draft.payments[0].amount_cents = 0;
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_no_payments_rejected() {
        let mut draft = valid_draft();
        draft.payments.clear();
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::NoPayments)
        ));
    }

    #[test]
    fn test_negative_discount_rejected() {
        let mut draft = valid_draft();
        draft.discount_cents = -100;
        assert!(matches!(
            validate_draft(&draft),
            Err(ValidationError::MustBeNonNegative { .. })
        ));
    }

    #[test]
    fn test_fully_discounted_sale_rejected() {
        // subtotal 7500, discount 7500, no delivery: total would be 0
        let mut draft = valid_draft();
        draft.discount_cents = 7500;
        draft.delivery_fee_cents = 0;
        draft.total_cents = 0;
        draft.payments = vec![PaymentSplit {
            method: PaymentMethod::Cash,
            amount_cents: 1,
        }];
        let err = validate_draft(&draft).unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(1).is_ok());
        assert!(validate_price_cents(0).is_err());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Cola 330ml").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_stock_level() {
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(120).is_ok());
        assert!(validate_stock_level(-1).is_err());
    }

    #[test]
    fn test_validate_recipe() {
        assert!(validate_recipe("Burger", &[]).is_err());

        let bad = vec![RecipeComponent {
            ingredient_id: "ing-1".to_string(),
            quantity: 0,
        }];
        assert!(validate_recipe("Burger", &bad).is_err());

        let good = vec![RecipeComponent {
            ingredient_id: "ing-1".to_string(),
            quantity: 150,
        }];
        assert!(validate_recipe("Burger", &good).is_ok());
    }
}
