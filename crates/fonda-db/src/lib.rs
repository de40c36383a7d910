//! # fonda-db: Database Layer for Fonda POS
//!
//! This crate provides database access for the Fonda POS system and owns the
//! sale-commit transaction. It uses SQLite for local storage with sqlx for
//! async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fonda POS Data Flow                              │
//! │                                                                         │
//! │  Checkout request (SaleDraft from the UI layer)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     fonda-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │   Checkout   │  │   │
//! │  │   │   (pool.rs)   │    │ catalog, sale │    │   Service    │  │   │
//! │  │   │               │◄───│ shift         │◄───│ (the atomic  │  │   │
//! │  │   │ SqlitePool    │    │               │    │ transaction) │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, embedded migrations)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, sale, shift)
//! - [`checkout`] - The sale-commit transaction coordinator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fonda_db::{Database, DbConfig};
//!
//! // Create database with default config (runs migrations)
//! let db = Database::new(DbConfig::new("path/to/fonda.db")).await?;
//!
//! // Commit a sale atomically
//! let receipt = db.checkout().commit_sale(&draft).await?;
//!
//! // Close the shift at end of day
//! let closure = db.shifts().close_shift("shift-7", "cashier-1", 44_000, 60_000).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutError, CheckoutReceipt, CheckoutService};
pub use error::StoreError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::sale::{SaleRepository, ShiftTotals};
pub use repository::shift::ShiftRepository;
