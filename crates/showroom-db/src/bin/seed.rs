//! # Seed Data Generator
//!
//! Populates a showroom database with a small demo catalog, a gift list and
//! a few customers holding points.
//!
//! ## Usage
//! ```bash
//! cargo run -p showroom-db --bin seed
//!
//! # Specify database path and opening balance
//! cargo run -p showroom-db --bin seed -- --db ./data/showroom.db --points 250
//! ```
//!
//! Customer ids are fixed (`cliente-001` …) so tokens issued for local
//! testing keep working across reseeds.

use std::env;

use showroom_db::repository::{gift::new_gift, product::new_product};
use showroom_db::{Database, DbConfig};

/// (name, list price, showroom price, stock, critical stock)
const PRODUCTS: &[(&str, i64, Option<i64>, i64, i64)] = &[
    ("Perfume Essencial 100ml", 18990, Some(16990), 12, 3),
    ("Crema Tododia Macadamia", 4590, None, 30, 5),
    ("Desodorante Humor", 2500, Some(2200), 40, 8),
    ("Labial Una Rojo", 5990, None, 15, 4),
    ("Jabón Ekos Castaña x5", 3290, Some(2990), 25, 5),
    ("Neceser Showroom", 3500, None, 10, 2),
];

/// (product index, gift name, points cost, redeemable stock)
const GIFTS: &[(usize, &str, i64, i64)] = &[
    (5, "Neceser Showroom de regalo", 50, 10),
    (2, "Desodorante Humor de regalo", 80, 6),
    (1, "Crema Tododia de regalo", 150, 3),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("cliente-001", "Lucía Ramos"),
    ("cliente-002", "Carmen Quispe"),
    ("cliente-003", "Rosa Huamán"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./showroom_dev.db");
    let mut opening_points: i64 = 120;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--points" | "-p" => {
                if i + 1 < args.len() {
                    opening_points = args[i + 1].parse().unwrap_or(120);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Showroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./showroom_dev.db)");
                println!("  -p, --points <N>     Opening balance per customer (default: 120)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Showroom Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for (name, list, showroom, stock, critical) in PRODUCTS {
        let mut product = new_product(name, *list, *stock);
        product.price_showroom_cents = *showroom;
        product.critical_stock = *critical;
        db.products().insert(&product).await?;
        product_ids.push(product.id);
    }
    println!("✓ {} products", product_ids.len());

    for (index, name, cost, stock) in GIFTS {
        let gift = new_gift(&product_ids[*index], name, *cost, *stock);
        db.gifts().insert(&gift).await?;
    }
    println!("✓ {} gifts", GIFTS.len());

    for (id, name) in CUSTOMERS {
        db.points().open_account(id, Some(name)).await?;
        let balance = db.points().credit(id, opening_points).await?;
        println!("  {} ({}) -> {} pts", id, name, balance);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
