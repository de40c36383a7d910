//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p fonda-db --bin seed
//!
//! # Specify database path
//! cargo run -p fonda-db --bin seed -- --db ./data/fonda.db
//! ```
//!
//! ## Generated Catalog
//! - Ingredients with realistic units and stock (beef in grams, milk in
//!   milliliters, buns by count)
//! - Recipe products assembled from those ingredients (burgers, shakes)
//! - Direct-stock products (bottled drinks, desserts)

use std::env;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use fonda_core::{Ingredient, IngredientUnit, Product, RecipeComponent, StockSource};
use fonda_db::repository::catalog::generate_catalog_id;
use fonda_db::{Database, DbConfig};

/// Ingredients: (name, unit, current stock, min stock, cost per unit in cents)
const INGREDIENTS: &[(&str, IngredientUnit, i64, i64, i64)] = &[
    ("Ground Beef", IngredientUnit::Mass, 12_000, 2_000, 4),
    ("Cheddar", IngredientUnit::Mass, 4_000, 800, 6),
    ("Lettuce", IngredientUnit::Mass, 2_500, 500, 1),
    ("Tomato", IngredientUnit::Mass, 3_000, 500, 1),
    ("Burger Bun", IngredientUnit::Count, 120, 24, 90),
    ("Milk", IngredientUnit::Volume, 20_000, 4_000, 1),
    ("Ice Cream Base", IngredientUnit::Volume, 8_000, 1_500, 2),
    ("Coffee Beans", IngredientUnit::Mass, 5_000, 1_000, 8),
];

/// Recipe products: (name, category, price cents, components by ingredient name)
const RECIPES: &[(&str, &str, i64, &[(&str, i64)])] = &[
    (
        "Classic Burger",
        "Burgers",
        45_00,
        &[("Ground Beef", 150), ("Burger Bun", 1), ("Lettuce", 30), ("Tomato", 40)],
    ),
    (
        "Cheeseburger",
        "Burgers",
        52_00,
        &[("Ground Beef", 150), ("Burger Bun", 1), ("Cheddar", 40)],
    ),
    (
        "Double Burger",
        "Burgers",
        68_00,
        &[("Ground Beef", 300), ("Burger Bun", 1), ("Cheddar", 40)],
    ),
    (
        "Vanilla Shake",
        "Drinks",
        28_00,
        &[("Milk", 200), ("Ice Cream Base", 150)],
    ),
    (
        "Latte",
        "Drinks",
        22_00,
        &[("Milk", 180), ("Coffee Beans", 18)],
    ),
];

/// Direct-stock products: (name, category, price cents, on hand)
const DIRECT: &[(&str, &str, i64, i64)] = &[
    ("Cola 330ml", "Drinks", 15_00, 48),
    ("Sparkling Water 500ml", "Drinks", 12_00, 36),
    ("Orange Juice 330ml", "Drinks", 18_00, 24),
    ("Brownie", "Desserts", 20_00, 15),
    ("Alfajor", "Desserts", 9_00, 40),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fonda=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./fonda_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Fonda POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./fonda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Fonda POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing catalog
    let existing = db.catalog().count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let catalog = db.catalog();
    let now = Utc::now();

    // Ingredients first: recipes reference them by id
    let mut ingredient_ids = std::collections::HashMap::new();
    for (name, unit, current_stock, min_stock, cost) in INGREDIENTS {
        let ingredient = Ingredient {
            id: generate_catalog_id(),
            name: name.to_string(),
            unit: *unit,
            current_stock: *current_stock,
            min_stock: *min_stock,
            cost_per_unit_cents: *cost,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        catalog.insert_ingredient(&ingredient).await?;
        ingredient_ids.insert(*name, ingredient.id);
    }
    println!("  {} ingredients", INGREDIENTS.len());

    for (name, category, price_cents, components) in RECIPES {
        let product = Product {
            id: generate_catalog_id(),
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            price_cents: *price_cents,
            stock: StockSource::Recipe {
                components: components
                    .iter()
                    .map(|(ingredient_name, quantity)| RecipeComponent {
                        ingredient_id: ingredient_ids[ingredient_name].clone(),
                        quantity: *quantity,
                    })
                    .collect(),
            },
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        catalog.insert_product(&product).await?;
    }
    println!("  {} recipe products", RECIPES.len());

    for (name, category, price_cents, on_hand) in DIRECT {
        let product = Product {
            id: generate_catalog_id(),
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            price_cents: *price_cents,
            stock: StockSource::Direct { on_hand: *on_hand },
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        catalog.insert_product(&product).await?;
    }
    println!("  {} direct-stock products", DIRECT.len());

    let total = db.catalog().count_products().await?;
    println!();
    println!("✓ Seed complete! {} products in catalog", total);

    Ok(())
}
