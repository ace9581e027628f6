//! # Seed Data Generator
//!
//! Populates the database with demo data for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p corner-db --bin seed
//!
//! # Specify database path
//! cargo run -p corner-db --bin seed -- --db ./data/corner.db
//! ```
//!
//! Creates a small retail/salon catalog (tracked retail stock plus
//! untracked services), a few customers with store-credit balances, and
//! default business settings.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use corner_core::{BusinessSettings, CatalogItem, Customer};
use corner_db::{Database, DbConfig};

/// name, barcode, price cents, tracked stock (None = service)
const CATALOG: &[(&str, Option<&str>, i64, Option<i64>)] = &[
    ("Shampoo 250ml", Some("5012345678900"), 899, Some(24)),
    ("Conditioner 250ml", Some("5012345678917"), 849, Some(18)),
    ("Hair Spray", Some("5012345678924"), 599, Some(30)),
    ("Styling Wax", Some("5012345678931"), 750, Some(12)),
    ("Nail Polish Red", Some("5012345678948"), 350, Some(40)),
    ("Travel Brush", Some("5012345678955"), 425, Some(15)),
    ("Gift Bag", None, 150, Some(50)),
    // Services: no inventory tracking
    ("Cut & Blow Dry", None, 3200, None),
    ("Colour Treatment", None, 5500, None),
    ("Manicure", None, 2200, None),
    ("Beard Trim", None, 1200, None),
];

/// name, email, opening balance cents
const CUSTOMERS: &[(&str, &str, i64)] = &[
    ("Alice Smith", "alice@example.com", 2500),
    ("Bob Jones", "bob@example.com", 0),
    ("Carol White", "carol@example.com", 10000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./corner_dev.db");

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
                println!("Corner POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./corner_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Corner POS Seed Data Generator");
    println!("==============================");
    println!("Database: {db_path}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} products");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for (name, barcode, price_cents, stock) in CATALOG {
        let item = CatalogItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            barcode: barcode.map(str::to_string),
            price_cents: *price_cents,
            track_inventory: stock.is_some(),
            stock_quantity: stock.unwrap_or(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&item).await?;
    }
    println!("✓ Seeded {} catalog items", CATALOG.len());

    for (name, email, balance) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: Some(email.to_string()),
            phone: None,
            balance_cents: 0,
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await?;
        if *balance > 0 {
            db.customers()
                .credit_balance(&customer.id, *balance, "topup")
                .await?;
        }
    }
    println!("✓ Seeded {} customers", CUSTOMERS.len());

    let mut settings = BusinessSettings::default();
    settings.shop_name = "Corner Salon & Shop".to_string();
    settings.shop_address = vec!["12 High Street".to_string(), "London".to_string()];
    settings.receipt_header = "Corner Salon & Shop".to_string();
    db.settings().save(&settings).await?;
    println!("✓ Saved default business settings");

    let results = db.products().search("shampoo", 10).await?;
    println!();
    println!("Search 'shampoo': {} result(s)", results.len());
    println!("✓ Seed complete!");

    Ok(())
}
