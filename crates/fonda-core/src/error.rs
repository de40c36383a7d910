//! # Error Types
//!
//! Domain-specific error types for fonda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fonda-core errors (this file)                                         │
//! │  ├── CoreError        - Resolution / stock check failures              │
//! │  └── ValidationError  - Sale payload and field validation failures     │
//! │                                                                         │
//! │  fonda-db errors (separate crate)                                      │
//! │  ├── StoreError       - Database operation failures                    │
//! │  └── CheckoutError    - Typed outcome of the checkout entrypoint       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (resource name, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business logic errors raised while resolving and checking a sale.
///
/// These errors represent hard failures of a checkout attempt. They abort
/// the attempt before any write is applied.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item references a product that does not exist in the catalog
    /// snapshot. Fatal to the attempt.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A recipe references an ingredient that does not exist in the catalog
    /// snapshot. Fatal to the attempt.
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// The computed deduction exceeds availability for a resource.
    ///
    /// The check is all-or-nothing across every resource the sale touches:
    /// a sale of five products where one is short rejects entirely.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (2× Burger, recipe: 150g beef each)
    ///      │
    ///      ▼
    /// Check stock: beef available=200
    ///      │
    ///      ▼
    /// InsufficientStock { resource: "Beef", available: 200, required: 300 }
    ///      │
    ///      ▼
    /// UI shows: "Not enough Beef (available 200, required 300)"
    /// ```
    #[error("Insufficient stock for {resource}: available {available}, required {required}")]
    InsufficientStock {
        resource: String,
        available: i64,
        required: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Sale payload and field validation errors.
///
/// These fire before any store access. The caller must fix the input;
/// retrying an invalid payload can never succeed.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// The cart has no line items.
    #[error("cart must contain at least one item")]
    EmptyCart,

    /// The cart has more line items than allowed.
    #[error("cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line item quantity exceeds the maximum allowed.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A line item's subtotal does not equal unit price × quantity.
    #[error("line subtotal for {product} is {declared}, expected {expected}")]
    LineSubtotalMismatch {
        product: String,
        declared: i64,
        expected: i64,
    },

    /// The sale subtotal does not equal the sum of item subtotals.
    #[error("sale subtotal {declared} does not match item sum {computed}")]
    SubtotalMismatch { declared: i64, computed: i64 },

    /// The sale total does not equal subtotal − discount + delivery fee.
    #[error("sale total {declared} does not match computed total {computed}")]
    TotalMismatch { declared: i64, computed: i64 },

    /// The sale carries no payment allocations.
    #[error("at least one payment method is required")]
    NoPayments,

    /// Payment allocations do not sum to the sale total.
    #[error("payments sum to {paid}, but the sale total is {total}")]
    PaymentMismatch { paid: i64, total: i64 },

    /// The recipe definition is empty or malformed.
    #[error("recipe for {product} must have at least one component")]
    EmptyRecipe { product: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            resource: "Beef".to_string(),
            available: 200,
            required: 300,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Beef: available 200, required 300"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "shift_id".to_string(),
        };
        assert_eq!(err.to_string(), "shift_id is required");

        let err = ValidationError::PaymentMismatch {
            paid: 900,
            total: 1000,
        };
        assert_eq!(err.to_string(), "payments sum to 900, but the sale total is 1000");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptyCart;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
