//! # Inventory Resolution & Stock Checks
//!
//! Pure functions at the center of the sale-commit transaction.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  One Checkout Attempt (fonda-db)                        │
//! │                                                                         │
//! │  BEGIN transaction                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  read Product rows for every line item          (snapshot, versioned)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  resolve_deductions(items, products)  ← THIS MODULE                    │
//! │       │   products:    product_id  → Σ quantity                        │
//! │       │   ingredients: ingredient_id → Σ quantity × per-unit           │
//! │       ▼                                                                 │
//! │  read Ingredient rows for every deducted ingredient                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_stock(deductions, products, ingredients)  ← THIS MODULE         │
//! │       │                                                                 │
//! │       ├── any shortfall → InsufficientStock, ROLLBACK                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  version-guarded decrements + sale append, COMMIT                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both functions operate on in-memory snapshots supplied by the caller.
//! They never do I/O, which is what makes the transaction's decision logic
//! fully testable without a database.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Ingredient, Product, SaleItem, StockSource};

// =============================================================================
// Deduction Set
// =============================================================================

/// The net inventory deduction a sale requires, aggregated per resource.
///
/// Built by [`resolve_deductions`]. Duplicate line items for the same
/// product merge by summation, as do repeated recipe components; the maps
/// hold the combined requirement, never a per-line value.
///
/// BTreeMap keeps iteration order deterministic, so stock checks report the
/// same shortfall for the same input and the write phase touches rows in a
/// stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionSet {
    products: BTreeMap<String, i64>,
    ingredients: BTreeMap<String, i64>,
}

impl DeductionSet {
    /// Required units per direct-stock product.
    pub fn products(&self) -> &BTreeMap<String, i64> {
        &self.products
    }

    /// Required units per ingredient, in the ingredient's smallest
    /// denomination.
    pub fn ingredients(&self) -> &BTreeMap<String, i64> {
        &self.ingredients
    }

    /// Ingredient ids that need to be read before validation.
    pub fn ingredient_ids(&self) -> impl Iterator<Item = &str> {
        self.ingredients.keys().map(String::as_str)
    }

    /// True when the sale touches no tracked inventory at all.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.ingredients.is_empty()
    }
}

// =============================================================================
// Inventory Resolver
// =============================================================================

/// Computes the net deduction a list of line items requires.
///
/// For a direct-stock product, the item's own `quantity` contributes to the
/// product map. For a recipe product, each component contributes
/// `component.quantity × item.quantity` to the ingredient map. Contributions
/// for the same resource are summed across all line items.
///
/// ## Errors
/// - [`CoreError::ProductNotFound`] if a line item references a product
///   absent from the snapshot. Hard failure: the attempt aborts before any
///   validation or write.
pub fn resolve_deductions(
    items: &[SaleItem],
    products: &BTreeMap<String, Product>,
) -> CoreResult<DeductionSet> {
    let mut deductions = DeductionSet::default();

    for item in items {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(item.product_name.clone()))?;

        match &product.stock {
            StockSource::Direct { .. } => {
                *deductions
                    .products
                    .entry(item.product_id.clone())
                    .or_insert(0) += item.quantity;
            }
            StockSource::Recipe { components } => {
                for component in components {
                    *deductions
                        .ingredients
                        .entry(component.ingredient_id.clone())
                        .or_insert(0) += component.quantity * item.quantity;
                }
            }
        }
    }

    Ok(deductions)
}

// =============================================================================
// Stock Validator
// =============================================================================

/// Checks every aggregated deduction against the snapshot's availability.
///
/// All-or-nothing across the whole sale: the first resource whose
/// `available − required` is negative fails the operation, and no deduction
/// is ever applied partially. Deterministic: resources are visited in
/// BTreeMap key order.
///
/// ## Errors
/// - [`CoreError::IngredientNotFound`] if a required ingredient is absent
///   from the snapshot (a recipe referencing a deleted ingredient).
/// - [`CoreError::InsufficientStock`] with the resource's display name and
///   the available/required quantities for the user-facing message.
pub fn check_stock(
    deductions: &DeductionSet,
    products: &BTreeMap<String, Product>,
    ingredients: &BTreeMap<String, Ingredient>,
) -> CoreResult<()> {
    for (product_id, required) in &deductions.products {
        let product = products
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

        // resolve_deductions only routes direct-stock products here
        let Some(available) = product.stock.direct_stock() else {
            continue;
        };

        if available - required < 0 {
            return Err(CoreError::InsufficientStock {
                resource: product.name.clone(),
                available,
                required: *required,
            });
        }
    }

    for (ingredient_id, required) in &deductions.ingredients {
        let ingredient = ingredients
            .get(ingredient_id)
            .ok_or_else(|| CoreError::IngredientNotFound(ingredient_id.clone()))?;

        let available = ingredient.current_stock;
        if available - required < 0 {
            return Err(CoreError::InsufficientStock {
                resource: ingredient.name.clone(),
                available,
                required: *required,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Stock Alert Display Policy
// =============================================================================

/// Display-only stock level classification for the admin screens.
///
/// Not an invariant: nothing in the checkout transaction consults this.
/// Carried as a pure display policy until product requirements tie it to
/// restocking automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAlert {
    /// At or above the minimum.
    Ok,
    /// Below the minimum stock threshold.
    Low,
    /// At or below 20% of the minimum stock threshold.
    Critical,
}

/// Classifies a stock level against its alert threshold.
///
/// A threshold of zero disables alerts for the resource.
pub fn stock_alert(current: i64, min_stock: i64) -> StockAlert {
    if min_stock <= 0 || current >= min_stock {
        return StockAlert::Ok;
    }

    // critical at 20% of the minimum, integer-safe: current <= min/5
    if current * 5 <= min_stock {
        StockAlert::Critical
    } else {
        StockAlert::Low
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IngredientUnit, RecipeComponent};
    use chrono::Utc;

    fn direct_product(id: &str, name: &str, on_hand: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            category: "Test".to_string(),
            price_cents: 1000,
            stock: StockSource::Direct { on_hand },
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 0,
        }
    }

    fn recipe_product(id: &str, name: &str, components: Vec<(&str, i64)>) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            category: "Test".to_string(),
            price_cents: 4500,
            stock: StockSource::Recipe {
                components: components
                    .into_iter()
                    .map(|(ingredient_id, quantity)| RecipeComponent {
                        ingredient_id: ingredient_id.to_string(),
                        quantity,
                    })
                    .collect(),
            },
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 0,
        }
    }

    fn ingredient(id: &str, name: &str, current_stock: i64) -> Ingredient {
        Ingredient {
            id: id.to_string(),
            name: name.to_string(),
            unit: IngredientUnit::Mass,
            current_stock,
            min_stock: 0,
            cost_per_unit_cents: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 0,
        }
    }

    fn line(product_id: &str, quantity: i64) -> SaleItem {
        SaleItem {
            product_id: product_id.to_string(),
            product_name: format!("Product {product_id}"),
            category: "Test".to_string(),
            unit_price_cents: 1000,
            cost_at_sale_cents: None,
            quantity,
            subtotal_cents: 1000 * quantity,
        }
    }

    #[test]
    fn test_direct_deduction() {
        let mut products = BTreeMap::new();
        products.insert("p-1".to_string(), direct_product("p-1", "Cola", 10));

        let deductions = resolve_deductions(&[line("p-1", 3)], &products).unwrap();
        assert_eq!(deductions.products().get("p-1"), Some(&3));
        assert!(deductions.ingredients().is_empty());
    }

    /// Duplicate line items for the same product merge by summation,
    /// never overwrite.
    #[test]
    fn test_duplicate_lines_merge() {
        let mut products = BTreeMap::new();
        products.insert("p-1".to_string(), direct_product("p-1", "Cola", 10));

        let deductions =
            resolve_deductions(&[line("p-1", 3), line("p-1", 2)], &products).unwrap();
        assert_eq!(deductions.products().get("p-1"), Some(&5));
    }

    #[test]
    fn test_recipe_deduction_scales_by_quantity() {
        let mut products = BTreeMap::new();
        products.insert(
            "p-burger".to_string(),
            recipe_product("p-burger", "Burger", vec![("ing-beef", 150), ("ing-bun", 1)]),
        );

        let deductions = resolve_deductions(&[line("p-burger", 2)], &products).unwrap();
        assert!(deductions.products().is_empty());
        assert_eq!(deductions.ingredients().get("ing-beef"), Some(&300));
        assert_eq!(deductions.ingredients().get("ing-bun"), Some(&2));
    }

    /// The same ingredient appearing in multiple recipes (or multiple cart
    /// items) aggregates into one requirement.
    #[test]
    fn test_shared_ingredient_aggregates_across_items() {
        let mut products = BTreeMap::new();
        products.insert(
            "p-burger".to_string(),
            recipe_product("p-burger", "Burger", vec![("ing-bun", 1)]),
        );
        products.insert(
            "p-hotdog".to_string(),
            recipe_product("p-hotdog", "Hot Dog", vec![("ing-bun", 1)]),
        );

        let items = [line("p-burger", 2), line("p-hotdog", 3)];
        let deductions = resolve_deductions(&items, &products).unwrap();
        assert_eq!(deductions.ingredients().get("ing-bun"), Some(&5));
    }

    #[test]
    fn test_missing_product_is_hard_failure() {
        let products = BTreeMap::new();
        let err = resolve_deductions(&[line("p-ghost", 1)], &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_check_stock_passes_at_exact_availability() {
        let mut products = BTreeMap::new();
        products.insert("p-1".to_string(), direct_product("p-1", "Cola", 5));
        let ingredients = BTreeMap::new();

        let deductions = resolve_deductions(&[line("p-1", 5)], &products).unwrap();
        assert!(check_stock(&deductions, &products, &ingredients).is_ok());
    }

    #[test]
    fn test_check_stock_reports_shortfall_detail() {
        let mut products = BTreeMap::new();
        products.insert("p-1".to_string(), direct_product("p-1", "Cola", 2));
        let ingredients = BTreeMap::new();

        let deductions = resolve_deductions(&[line("p-1", 5)], &products).unwrap();
        let err = check_stock(&deductions, &products, &ingredients).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                resource,
                available,
                required,
            } => {
                assert_eq!(resource, "Cola");
                assert_eq!(available, 2);
                assert_eq!(required, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// A sale touching several resources rejects entirely when any single
    /// one is short.
    #[test]
    fn test_check_stock_is_all_or_nothing() {
        let mut products = BTreeMap::new();
        products.insert("p-1".to_string(), direct_product("p-1", "Cola", 100));
        products.insert(
            "p-burger".to_string(),
            recipe_product("p-burger", "Burger", vec![("ing-beef", 150)]),
        );
        let mut ingredients = BTreeMap::new();
        ingredients.insert("ing-beef".to_string(), ingredient("ing-beef", "Beef", 100));

        let items = [line("p-1", 1), line("p-burger", 1)];
        let deductions = resolve_deductions(&items, &products).unwrap();
        let err = check_stock(&deductions, &products, &ingredients).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 100, required: 150, .. }
        ));
    }

    #[test]
    fn test_missing_ingredient_is_hard_failure() {
        let mut products = BTreeMap::new();
        products.insert(
            "p-burger".to_string(),
            recipe_product("p-burger", "Burger", vec![("ing-ghost", 10)]),
        );
        let ingredients = BTreeMap::new();

        let deductions = resolve_deductions(&[line("p-burger", 1)], &products).unwrap();
        let err = check_stock(&deductions, &products, &ingredients).unwrap_err();
        assert!(matches!(err, CoreError::IngredientNotFound(_)));
    }

    #[test]
    fn test_stock_alert_thresholds() {
        // min_stock = 100: ok at 100+, low below, critical at <= 20
        assert_eq!(stock_alert(150, 100), StockAlert::Ok);
        assert_eq!(stock_alert(100, 100), StockAlert::Ok);
        assert_eq!(stock_alert(99, 100), StockAlert::Low);
        assert_eq!(stock_alert(21, 100), StockAlert::Low);
        assert_eq!(stock_alert(20, 100), StockAlert::Critical);
        assert_eq!(stock_alert(0, 100), StockAlert::Critical);

        // threshold of zero disables alerts
        assert_eq!(stock_alert(0, 0), StockAlert::Ok);
    }
}
