//! # Demo Data Generator
//!
//! Fills a database with a small shop's worth of data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/umkm.db with 3 sizes per product (default)
//! cargo run -p umkm-db --bin seed
//!
//! # Fewer products, more sales
//! cargo run -p umkm-db --bin seed -- --sizes 1 --sales 200
//!
//! # Specify database path
//! cargo run -p umkm-db --bin seed -- --db ./data/demo.db
//! ```
//!
//! ## Generated Data
//! - Products across staple, drink, snack and household groups
//! - A handful of customers and suppliers
//! - A run of sales, every seventh one on credit with a staggered due date
//! - A restock purchase and monthly operating expenses
//!
//! Values come from index arithmetic, so every run produces the same shop.

use chrono::{Duration, Utc};
use std::env;
use umkm_core::{Money, PaymentStatus, TransactionType};
use umkm_db::{
    CheckoutLine, CheckoutRequest, Database, DbConfig, NewCustomer, NewExpense, NewProduct,
    NewSupplier,
};

/// Product groups: (SKU prefix, names, base price in rupiah)
const GROUPS: &[(&str, &[&str], i64)] = &[
    (
        "SMB",
        &[
            "Beras Pandan Wangi",
            "Gula Pasir",
            "Minyak Goreng",
            "Tepung Terigu",
            "Telur Ayam",
            "Garam Dapur",
        ],
        12_000,
    ),
    (
        "MNM",
        &[
            "Teh Botol",
            "Kopi Sachet",
            "Air Mineral",
            "Susu Kental Manis",
            "Sirup Jeruk",
        ],
        4_000,
    ),
    (
        "SNK",
        &[
            "Keripik Singkong",
            "Kacang Goreng",
            "Wafer Coklat",
            "Biskuit Kelapa",
            "Kerupuk Udang",
        ],
        3_000,
    ),
    (
        "RT",
        &[
            "Sabun Cuci Piring",
            "Deterjen Bubuk",
            "Sabun Mandi",
            "Pasta Gigi",
        ],
        8_000,
    ),
];

/// Size variants: (suffix, price multiplier)
const SIZES: &[(&str, i64)] = &[("Kecil", 1), ("Sedang", 2), ("Besar", 4)];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Bu Ani", "081211110001"),
    ("Pak Budi", "081211110002"),
    ("Warung Sari", "081211110003"),
    ("Mas Dedi", "081211110004"),
    ("Bu Endang", "081211110005"),
];

const SUPPLIERS: &[(&str, &str)] = &[
    ("CV Sumber Pangan", "BRI"),
    ("PT Segar Minuman", "BCA"),
    ("UD Makmur Jaya", "Mandiri"),
];

const EXPENSES: &[(&str, i64, &str)] = &[
    ("Sewa kios", 1_500_000, "sewa"),
    ("Listrik", 350_000, "utilitas"),
    ("Air PDAM", 90_000, "utilitas"),
    ("Gaji karyawan", 2_000_000, "gaji"),
    ("Plastik kemasan", 120_000, "operasional"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut sizes: usize = SIZES.len();
    let mut sales: usize = 60;
    let mut db_path = String::from("./data/umkm.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sizes" | "-s" => {
                if i + 1 < args.len() {
                    sizes = args[i + 1].parse().unwrap_or(SIZES.len()).clamp(1, SIZES.len());
                    i += 1;
                }
            }
            "--sales" | "-n" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(60);
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
                println!("UMKM ERP Demo Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sizes <N>    Size variants per product, 1-3 (default: 3)");
                println!("  -n, --sales <N>    Number of sales to record (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./data/umkm.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 UMKM ERP Demo Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let init = db.initialize().await?;
    println!("✓ Connected, {} tables ready", init.total_tables);

    let existing = db.stats().await?;
    if existing.products > 0 {
        println!("⚠ Database already has {} products", existing.products);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    // Catalogue
    let mut product_ids = Vec::new();
    for (group_idx, (prefix, names, base_price)) in GROUPS.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, multiplier)) in SIZES.iter().take(sizes).enumerate() {
                let seed = (group_idx * 100 + name_idx * 10 + size_idx) as i64;
                let price = base_price * multiplier + (seed * 500) % 2_000;

                let product = db
                    .products()
                    .create(NewProduct {
                        name: format!("{} {}", name, size),
                        sku: Some(format!("{}-{:03}", prefix, seed)),
                        price: Money::from_amount(price),
                        // cost at 70-85% of price
                        cost: Money::from_amount(price * (70 + seed % 16) / 100),
                        stock: 20 + (seed * 7) % 80,
                        ..Default::default()
                    })
                    .await?;
                product_ids.push(product.id);
            }
        }
    }
    println!("✓ {} products", product_ids.len());

    let mut customer_ids = Vec::new();
    for (name, phone) in CUSTOMERS {
        let customer = db
            .customers()
            .create(NewCustomer {
                name: name.to_string(),
                phone: Some(phone.to_string()),
                ..Default::default()
            })
            .await?;
        customer_ids.push(customer.id);
    }

    let mut supplier_ids = Vec::new();
    for (name, bank) in SUPPLIERS {
        let supplier = db
            .suppliers()
            .create(NewSupplier {
                name: name.to_string(),
                bank_name: Some(bank.to_string()),
                ..Default::default()
            })
            .await?;
        supplier_ids.push(supplier.id);
    }
    println!("✓ {} customers, {} suppliers", customer_ids.len(), supplier_ids.len());

    // One restock before the sales start
    db.transactions()
        .checkout(CheckoutRequest {
            transaction_type: TransactionType::Purchase,
            supplier_id: supplier_ids.first().cloned(),
            lines: product_ids
                .iter()
                .take(5)
                .map(|id| CheckoutLine {
                    product_id: id.clone(),
                    product_name: None,
                    quantity: 24,
                    price: None,
                })
                .collect(),
            notes: Some("Stok awal".to_string()),
            ..Default::default()
        })
        .await?;

    let today = Utc::now().date_naive();
    for n in 0..sales {
        let lines = (0..1 + n % 3)
            .map(|k| CheckoutLine {
                product_id: product_ids[(n * 7 + k * 3) % product_ids.len()].clone(),
                product_name: None,
                quantity: 1 + ((n + k) % 4) as i64,
                price: None,
            })
            .collect();

        let on_credit = n % 7 == 0;
        db.transactions()
            .checkout(CheckoutRequest {
                customer_id: (n % 2 == 0).then(|| customer_ids[n % customer_ids.len()].clone()),
                lines,
                payment_status: on_credit.then_some(PaymentStatus::Partial),
                paid_amount: on_credit.then(|| Money::from_amount(5_000)),
                due_date: on_credit.then(|| today + Duration::days(14 - (n % 21) as i64)),
                ..Default::default()
            })
            .await?;
    }
    println!("✓ {} sales", sales);

    for (description, amount, category) in EXPENSES {
        db.expenses()
            .create(NewExpense {
                description: description.to_string(),
                amount: Money::from_amount(*amount),
                category: Some(category.to_string()),
                ..Default::default()
            })
            .await?;
    }
    println!("✓ {} expenses", EXPENSES.len());

    let stats = db.reports().dashboard(Utc::now()).await?;
    println!();
    println!("Today: {} sales, {}", stats.today_transactions, stats.today_sales.format_with("Rp "));
    println!("Low stock: {} products", stats.low_stock_products.len());
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
