//! # Catalog Repository
//!
//! Database operations for products and ingredients.
//!
//! ## Two Surfaces
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CatalogRepository                                    │
//! │                                                                         │
//! │  Public (admin CRUD, pool-scoped)                                      │
//! │  ├── insert/update/get/list products and ingredients                   │
//! │  └── update is version-guarded: a stale admin form cannot              │
//! │      silently overwrite a concurrent edit                              │
//! │                                                                         │
//! │  pub(crate) (checkout transaction, connection-scoped)                  │
//! │  ├── fetch_product / fetch_ingredient   - snapshot reads               │
//! │  └── deduct_product_stock /                                            │
//! │      deduct_ingredient_stock            - version-guarded decrements   │
//! │                                                                         │
//! │  The checkout service is the only caller that decrements stock; admin │
//! │  CRUD sets absolute values.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Representation
//! `Product.stock` is an enum in the domain (`Direct` / `Recipe`), persisted
//! as a `stock_type` discriminator plus either the `stock` column or rows in
//! `recipe_components`. Assembly happens here so the rest of the system never
//! sees a half-populated product.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use fonda_core::validation::{validate_name, validate_price_cents, validate_recipe, validate_stock_level};
use fonda_core::{Ingredient, Product, RecipeComponent, StockSource};

// =============================================================================
// Row Types
// =============================================================================

/// Flat product row; recipe components are loaded separately.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    category: String,
    price_cents: i64,
    stock_type: String,
    stock: Option<i64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl ProductRow {
    fn into_product(self, components: Vec<RecipeComponent>) -> Product {
        let stock = match self.stock_type.as_str() {
            "direct" => StockSource::Direct {
                on_hand: self.stock.unwrap_or(0),
            },
            _ => StockSource::Recipe { components },
        };

        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            price_cents: self.price_cents,
            stock,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        }
    }
}

const SELECT_PRODUCT: &str = "\
    SELECT id, name, description, category, price_cents, stock_type, stock, \
           is_active, created_at, updated_at, version \
    FROM products WHERE id = ?";

const SELECT_COMPONENTS: &str = "\
    SELECT ingredient_id, quantity \
    FROM recipe_components WHERE product_id = ? ORDER BY position";

const SELECT_INGREDIENT: &str = "\
    SELECT id, name, unit, current_stock, min_stock, cost_per_unit_cents, \
           created_at, updated_at, version \
    FROM ingredients WHERE id = ?";

// =============================================================================
// Transaction-Scoped Primitives (used by the checkout service)
// =============================================================================

/// Reads one product inside the caller's transaction scope.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> StoreResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(SELECT_PRODUCT)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let components = if row.stock_type == "recipe" {
        sqlx::query_as::<_, RecipeComponent>(SELECT_COMPONENTS)
            .bind(id)
            .fetch_all(&mut *conn)
            .await?
    } else {
        Vec::new()
    };

    Ok(Some(row.into_product(components)))
}

/// Reads one ingredient inside the caller's transaction scope.
pub(crate) async fn fetch_ingredient(
    conn: &mut SqliteConnection,
    id: &str,
) -> StoreResult<Option<Ingredient>> {
    let ingredient = sqlx::query_as::<_, Ingredient>(SELECT_INGREDIENT)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(ingredient)
}

/// Decrements direct product stock, conditioned on the version the caller
/// read.
///
/// Returns `false` when no row matched: the product was modified (or
/// deleted) after the snapshot was taken, and the caller must abort the
/// transaction instead of writing over stale data.
pub(crate) async fn deduct_product_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    expected_version: i64,
) -> StoreResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE products \
         SET stock = stock - ?, version = version + 1, updated_at = ? \
         WHERE id = ? AND version = ? AND stock_type = 'direct'",
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Decrements ingredient stock, conditioned on the version the caller read.
///
/// Same contract as [`deduct_product_stock`].
pub(crate) async fn deduct_ingredient_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    expected_version: i64,
) -> StoreResult<bool> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE ingredients \
         SET current_stock = current_stock - ?, version = version + 1, updated_at = ? \
         WHERE id = ? AND version = ?",
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product and ingredient database operations.
///
/// ## Usage
/// ```rust,ignore
/// let catalog = db.catalog();
///
/// let product = catalog.get_product("uuid-here").await?;
/// let drinks = catalog.list_category("Drinks", 50).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, category, price_cents, stock_type, stock, \
                    is_active, created_at, updated_at, version \
             FROM products WHERE is_active = 1 ORDER BY name LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.attach_components(rows).await
    }

    /// Lists active products in one category, sorted by name.
    ///
    /// ## Usage
    /// Backs the POS grid's category tabs.
    pub async fn list_category(&self, category: &str, limit: u32) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, category, price_cents, stock_type, stock, \
                    is_active, created_at, updated_at, version \
             FROM products WHERE is_active = 1 AND category = ? ORDER BY name LIMIT ?",
        )
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.attach_components(rows).await
    }

    async fn attach_components(&self, rows: Vec<ProductRow>) -> StoreResult<Vec<Product>> {
        let mut products = Vec::with_capacity(rows.len());
        let mut conn = self.pool.acquire().await?;

        for row in rows {
            let components = if row.stock_type == "recipe" {
                sqlx::query_as::<_, RecipeComponent>(SELECT_COMPONENTS)
                    .bind(&row.id)
                    .fetch_all(&mut *conn)
                    .await?
            } else {
                Vec::new()
            };
            products.push(row.into_product(components));
        }

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Arguments
    /// * `product` - Product to insert (id should be generated beforehand)
    ///
    /// Field rules are checked before SQLite sees the row, so admin input
    /// errors surface as [`StoreError::Validation`] with a usable message.
    pub async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        validate_name(&product.name)?;
        validate_price_cents(product.price_cents)?;
        match &product.stock {
            StockSource::Direct { on_hand } => validate_stock_level(*on_hand)?,
            StockSource::Recipe { components } => validate_recipe(&product.name, components)?,
        }

        let mut tx = self.pool.begin().await?;

        let (stock_type, stock) = match &product.stock {
            StockSource::Direct { on_hand } => ("direct", Some(*on_hand)),
            StockSource::Recipe { .. } => ("recipe", None),
        };

        sqlx::query(
            "INSERT INTO products (id, name, description, category, price_cents, \
                                   stock_type, stock, is_active, created_at, updated_at, version) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(stock_type)
        .bind(stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.version)
        .execute(&mut *tx)
        .await?;

        if let Some(components) = product.stock.components() {
            insert_components(&mut tx, &product.id, components).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Updates an existing product, guarded by the version the caller read.
    ///
    /// ## Returns
    /// * `Err(StoreError::VersionConflict)` - the product changed since it
    ///   was loaded (concurrent admin edit or a checkout deduction); reload
    ///   and retry
    pub async fn update_product(&self, product: &Product) -> StoreResult<()> {
        debug!(id = %product.id, "Updating product");

        validate_name(&product.name)?;
        validate_price_cents(product.price_cents)?;
        match &product.stock {
            StockSource::Direct { on_hand } => validate_stock_level(*on_hand)?,
            StockSource::Recipe { components } => validate_recipe(&product.name, components)?,
        }

        let now = Utc::now();
        let (stock_type, stock) = match &product.stock {
            StockSource::Direct { on_hand } => ("direct", Some(*on_hand)),
            StockSource::Recipe { .. } => ("recipe", None),
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE products \
             SET name = ?, description = ?, category = ?, price_cents = ?, \
                 stock_type = ?, stock = ?, is_active = ?, updated_at = ?, \
                 version = version + 1 \
             WHERE id = ? AND version = ?",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(stock_type)
        .bind(stock)
        .bind(product.is_active)
        .bind(now)
        .bind(&product.id)
        .bind(product.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::version_conflict("Product", &product.id));
        }

        // Recipe definition is replaced wholesale on every update
        sqlx::query("DELETE FROM recipe_components WHERE product_id = ?")
            .bind(&product.id)
            .execute(&mut *tx)
            .await?;

        if let Some(components) = product.stock.components() {
            insert_components(&mut tx, &product.id, components).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical sales still reference this product; their snapshots stay
    /// intact and no cascading delete touches the ledger.
    pub async fn soft_delete_product(&self, id: &str) -> StoreResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?, version = version + 1 \
             WHERE id = ?",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count_products(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Ingredients
    // -------------------------------------------------------------------------

    /// Gets an ingredient by its ID.
    pub async fn get_ingredient(&self, id: &str) -> StoreResult<Option<Ingredient>> {
        let mut conn = self.pool.acquire().await?;
        fetch_ingredient(&mut conn, id).await
    }

    /// Lists all ingredients sorted by name.
    pub async fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, unit, current_stock, min_stock, cost_per_unit_cents, \
                    created_at, updated_at, version \
             FROM ingredients ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    /// Inserts a new ingredient.
    pub async fn insert_ingredient(&self, ingredient: &Ingredient) -> StoreResult<()> {
        debug!(id = %ingredient.id, name = %ingredient.name, "Inserting ingredient");

        validate_name(&ingredient.name)?;
        validate_stock_level(ingredient.current_stock)?;
        validate_stock_level(ingredient.min_stock)?;

        sqlx::query(
            "INSERT INTO ingredients (id, name, unit, current_stock, min_stock, \
                                      cost_per_unit_cents, created_at, updated_at, version) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(ingredient.unit)
        .bind(ingredient.current_stock)
        .bind(ingredient.min_stock)
        .bind(ingredient.cost_per_unit_cents)
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .bind(ingredient.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing ingredient, guarded by the version the caller read.
    pub async fn update_ingredient(&self, ingredient: &Ingredient) -> StoreResult<()> {
        debug!(id = %ingredient.id, "Updating ingredient");

        validate_name(&ingredient.name)?;
        validate_stock_level(ingredient.current_stock)?;
        validate_stock_level(ingredient.min_stock)?;

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE ingredients \
             SET name = ?, unit = ?, current_stock = ?, min_stock = ?, \
                 cost_per_unit_cents = ?, updated_at = ?, version = version + 1 \
             WHERE id = ? AND version = ?",
        )
        .bind(&ingredient.name)
        .bind(ingredient.unit)
        .bind(ingredient.current_stock)
        .bind(ingredient.min_stock)
        .bind(ingredient.cost_per_unit_cents)
        .bind(now)
        .bind(&ingredient.id)
        .bind(ingredient.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::version_conflict("Ingredient", &ingredient.id));
        }

        Ok(())
    }
}

async fn insert_components(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    product_id: &str,
    components: &[RecipeComponent],
) -> StoreResult<()> {
    for (position, component) in components.iter().enumerate() {
        sqlx::query(
            "INSERT INTO recipe_components (product_id, position, ingredient_id, quantity) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(product_id)
        .bind(position as i64)
        .bind(&component.ingredient_id)
        .bind(component.quantity)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Helper to generate a new catalog entity ID.
pub fn generate_catalog_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use fonda_core::IngredientUnit;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn direct_product(name: &str, on_hand: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_catalog_id(),
            name: name.to_string(),
            description: None,
            category: "Drinks".to_string(),
            price_cents: 1500,
            stock: StockSource::Direct { on_hand },
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    fn ingredient(name: &str, current_stock: i64) -> Ingredient {
        let now = Utc::now();
        Ingredient {
            id: generate_catalog_id(),
            name: name.to_string(),
            unit: IngredientUnit::Mass,
            current_stock,
            min_stock: 100,
            cost_per_unit_cents: 3,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_product_roundtrip_direct() {
        let db = test_db().await;
        let catalog = db.catalog();

        let product = direct_product("Cola 330ml", 24);
        catalog.insert_product(&product).await.unwrap();

        let loaded = catalog.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Cola 330ml");
        assert_eq!(loaded.stock.direct_stock(), Some(24));
        assert_eq!(loaded.version, 0);
    }

    #[tokio::test]
    async fn test_product_roundtrip_recipe() {
        let db = test_db().await;
        let catalog = db.catalog();

        let beef = ingredient("Beef", 5000);
        catalog.insert_ingredient(&beef).await.unwrap();

        let now = Utc::now();
        let product = Product {
            id: generate_catalog_id(),
            name: "Burger".to_string(),
            description: Some("House burger".to_string()),
            category: "Burgers".to_string(),
            price_cents: 4500,
            stock: StockSource::Recipe {
                components: vec![RecipeComponent {
                    ingredient_id: beef.id.clone(),
                    quantity: 150,
                }],
            },
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        catalog.insert_product(&product).await.unwrap();

        let loaded = catalog.get_product(&product.id).await.unwrap().unwrap();
        let components = loaded.stock.components().unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].ingredient_id, beef.id);
        assert_eq!(components[0].quantity, 150);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_fields() {
        let db = test_db().await;
        let catalog = db.catalog();

        let mut product = direct_product("", 5);
        let err = catalog.insert_product(&product).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        product.name = "Cola".to_string();
        product.price_cents = 0;
        let err = catalog.insert_product(&product).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_product_version_guard() {
        let db = test_db().await;
        let catalog = db.catalog();

        let product = direct_product("Cola 330ml", 24);
        catalog.insert_product(&product).await.unwrap();

        // First update succeeds and bumps the version
        let mut edit = product.clone();
        edit.price_cents = 1600;
        catalog.update_product(&edit).await.unwrap();

        // Second update against the original version is stale
        let mut stale = product.clone();
        stale.price_cents = 1700;
        let err = catalog.update_product(&stale).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));

        let loaded = catalog.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.price_cents, 1600);
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_guarded_deduct_rejects_stale_version() {
        let db = test_db().await;
        let catalog = db.catalog();

        let product = direct_product("Cola 330ml", 24);
        catalog.insert_product(&product).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();

        // Fresh version applies
        let applied = deduct_product_stock(&mut conn, &product.id, 4, 0)
            .await
            .unwrap();
        assert!(applied);

        // The same version again is stale (the deduct bumped it to 1)
        let applied = deduct_product_stock(&mut conn, &product.id, 4, 0)
            .await
            .unwrap();
        assert!(!applied);

        // Return the connection: the in-memory pool has exactly one
        drop(conn);

        let loaded = catalog.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.stock.direct_stock(), Some(20));
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_ingredient_roundtrip_and_update_guard() {
        let db = test_db().await;
        let catalog = db.catalog();

        let beef = ingredient("Beef", 5000);
        catalog.insert_ingredient(&beef).await.unwrap();

        let loaded = catalog.get_ingredient(&beef.id).await.unwrap().unwrap();
        assert_eq!(loaded.unit, IngredientUnit::Mass);
        assert_eq!(loaded.current_stock, 5000);

        let mut edit = loaded.clone();
        edit.min_stock = 500;
        catalog.update_ingredient(&edit).await.unwrap();

        let err = catalog.update_ingredient(&edit).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = test_db().await;
        let catalog = db.catalog();

        let product = direct_product("Cola 330ml", 24);
        catalog.insert_product(&product).await.unwrap();
        assert_eq!(catalog.count_products().await.unwrap(), 1);

        catalog.soft_delete_product(&product.id).await.unwrap();
        assert_eq!(catalog.count_products().await.unwrap(), 0);

        // Still readable by id: historical sales reference it
        let loaded = catalog.get_product(&product.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);
    }
}
