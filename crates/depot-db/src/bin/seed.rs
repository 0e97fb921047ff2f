//! # Seed Data Generator
//!
//! Populates the database with a development catalog and the launch coupon.
//!
//! ## Usage
//! ```bash
//! # Generate the full catalog (default)
//! cargo run -p depot-db --bin seed
//!
//! # Limit the number of products
//! cargo run -p depot-db --bin seed -- --count 20
//!
//! # Specify database path
//! cargo run -p depot-db --bin seed -- --db ./data/depot.db
//! ```
//!
//! ## Generated Data
//! - Products across categories (water, cooking oil, cleaning liquids, fuel)
//!   in several container sizes, SKU `{CATEGORY}-{NAME}-{SIZE}`
//! - Every fifth product carries a sale price
//! - Coupon `POTONG10K`: Rp 10.000 off, valid for 10 days, quota 100

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use depot_core::{Coupon, Money, Product, ProductStatus, StockStatus};
use depot_db::{Database, DbConfig};

/// Product categories for realistic development data
const CATEGORIES: &[(&str, &[&str])] = &[
    ("AIR", &["Air Mineral", "Air Galon Isi Ulang", "Air Demineral"]),
    ("OIL", &["Minyak Goreng Sawit", "Minyak Kelapa", "Minyak Jagung"]),
    ("CLN", &["Sabun Cuci Piring", "Deterjen Cair", "Pembersih Lantai", "Pewangi Pakaian"]),
    ("FUL", &["Minyak Tanah", "Spiritus"]),
];

/// Container sizes and the price multiplier (in percent of the 1L price)
const SIZES: &[(&str, i64)] = &[("1L", 100), ("5L", 450), ("19L", 1600), ("20L", 1700)];

const LAUNCH_COUPON: &str = "POTONG10K";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./depot.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Depot Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: all)");
                println!("  -d, --db <PATH>    Database file path (default: ./depot.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Depot Storefront Seed Data Generator");
    println!("=======================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping product seed to avoid duplicates.");
    } else {
        println!();
        println!("Generating products...");

        let mut generated = 0;
        'outer: for (category_idx, (category_code, names)) in CATEGORIES.iter().enumerate() {
            for (name_idx, name) in names.iter().enumerate() {
                for (size_idx, (size, multiplier)) in SIZES.iter().enumerate() {
                    if generated >= count {
                        break 'outer;
                    }

                    let seed = category_idx * 100 + name_idx * 10 + size_idx;
                    let product = generate_product(category_code, name, size, *multiplier, seed);

                    if let Err(e) = db.products().insert(&product).await {
                        eprintln!("Failed to insert {}: {}", product.sku, e);
                        continue;
                    }
                    generated += 1;
                }
            }
        }

        println!("✓ Generated {} products", generated);
    }

    if db.coupons().get_by_code(LAUNCH_COUPON).await?.is_some() {
        println!("⚠ Coupon {} already exists", LAUNCH_COUPON);
    } else {
        let now = Utc::now();
        let coupon = Coupon {
            code: LAUNCH_COUPON.to_string(),
            discount_amount: Money::from_minor(10_000),
            valid_until: now + Duration::days(10),
            quota: 100,
            created_at: now,
        };
        db.coupons().insert(&coupon).await?;
        println!(
            "✓ Coupon {}: {} off until {}, quota {}",
            coupon.code,
            coupon.discount_amount,
            coupon.valid_until.format("%Y-%m-%d %H:%M UTC"),
            coupon.quota
        );
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product(category: &str, name: &str, size: &str, multiplier: i64, seed: usize) -> Product {
    let now = Utc::now();

    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{}", category, initials, size);

    // Base 1L price Rp 5.000 - Rp 24.500 in Rp 500 steps
    let base_price = 5_000 + ((seed * 37) % 40) as i64 * 500;
    let price = Money::from_minor(base_price * multiplier / 100);

    let sale_price = (seed % 5 == 0).then(|| Money::from_minor(price.minor() * 90 / 100));

    let stock_qty = (seed % 60) as i64;
    let stock_status = if stock_qty == 0 {
        StockStatus::OutOfStock
    } else {
        StockStatus::InStock
    };

    Product {
        id: Uuid::new_v4().to_string(),
        sku,
        name: format!("{} {}", name, size),
        description: None,
        price,
        sale_price,
        stock_qty,
        stock_status,
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
    }
}
