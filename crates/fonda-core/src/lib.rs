//! # fonda-core: Pure Business Logic for Fonda POS
//!
//! This crate is the **heart** of Fonda POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fonda POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    POS / Admin UI (separate client)             │   │
//! │  │    Product grid ──► Cart ──► Checkout ──► Cash closure         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ explicit request boundary              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    fonda-db (storage layer)                     │   │
//! │  │    CheckoutService, CatalogRepository, SaleRepository           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ snapshots in, decisions out            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fonda-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ inventory │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ resolver  │  │   draft   │  │   │
//! │  │   │   Sale    │  │  (cents)  │  │ validator │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Ingredient, Sale, payments)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Sale payload and catalog field validation
//! - [`inventory`] - Deduction resolution and stock checks over snapshots
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use fonda_core::Money` instead of
// `use fonda_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{DeductionSet, StockAlert};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;
