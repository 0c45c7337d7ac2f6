//! # Seed Data Generator
//!
//! Populates the database with demo products, trading parties and a few
//! weeks of transactions for development.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p stockline-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p stockline-db --bin seed -- --count 1000 --db ./data/stockline.db
//! ```
//!
//! Every transaction goes through the repositories, so stored stock stays
//! consistent with the calculated stock afterwards.

use std::env;

use chrono::{Duration, Utc};
use stockline_core::{
    AmountInput, CompanyInput, CompanyKind, ProductInput, PurchaseLineInput, PurchaseOrderInput,
    PurchaseStatus, SaleInput, VoucherInput, VoucherKind, VoucherLineInput,
};
use stockline_db::{Database, DbConfig};

/// Category code, category name, product names.
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "HW",
        "Hardware",
        &["Hex Bolt", "Wood Screw", "Wall Plug", "Hinge", "Padlock", "Chain"],
    ),
    (
        "EL",
        "Electrical",
        &["LED Bulb", "Extension Lead", "Wall Socket", "Cable Tie", "Fuse", "Switch"],
    ),
    (
        "PL",
        "Plumbing",
        &["PVC Elbow", "Ball Valve", "Tap Washer", "Pipe Clamp", "Teflon Tape"],
    ),
    (
        "PT",
        "Paint",
        &["Primer", "Gloss Enamel", "Wood Stain", "Roller", "Brush Set"],
    ),
    (
        "TL",
        "Tools",
        &["Claw Hammer", "Tape Measure", "Spirit Level", "Utility Knife", "Pliers"],
    ),
];

/// Variant name and price add-on in cents.
const VARIANTS: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 150),
    ("Large", 300),
    ("Pro", 900),
    ("Bulk", 1_500),
];

const UNITS: &[&str] = &["pcs", "box", "roll", "set"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stockline_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Stockline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockline_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockline Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
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

    // Parties
    let customer = db
        .companies()
        .create(&company("Hill Traders", CompanyKind::Customer))
        .await?;
    let supplier = db
        .companies()
        .create(&company("Acme Supply Co", CompanyKind::Supplier))
        .await?;
    db.companies()
        .create(&company("Riverside Builders", CompanyKind::Both))
        .await?;
    println!("✓ Created 3 companies");

    // Products
    println!();
    println!("Generating products...");
    let start = std::time::Instant::now();
    let mut product_ids = Vec::with_capacity(count);

    'outer: for (category_idx, (code, category, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (variant_idx, (variant, addon)) in VARIANTS.iter().enumerate() {
                if product_ids.len() >= count {
                    break 'outer;
                }
                let seed = category_idx * 1000 + name_idx * 20 + variant_idx;
                let input = generate_product(code, category, name, variant, *addon, seed);
                match db.products().create(&input).await {
                    Ok(product) => product_ids.push(product.id),
                    Err(e) => eprintln!("Failed to insert {}: {}", input.sku, e),
                }
            }
        }
    }
    println!(
        "✓ Generated {} products in {:?}",
        product_ids.len(),
        start.elapsed()
    );

    // Transactions over the last 30 days
    println!();
    println!("Generating transactions...");
    let today = Utc::now().date_naive();
    let mut sales = 0;
    let mut orders = 0;

    for (idx, chunk) in product_ids.chunks(5).enumerate() {
        let day = today - Duration::days((idx % 30) as i64);

        db.purchases()
            .insert_order(&PurchaseOrderInput {
                supplier_id: Some(supplier.id.clone()),
                purchase_date: Some(day),
                status: Some(if idx % 7 == 0 {
                    PurchaseStatus::Pending
                } else {
                    PurchaseStatus::Received
                }),
                notes: None,
                lines: chunk
                    .iter()
                    .map(|id| PurchaseLineInput {
                        product_id: id.clone(),
                        quantity: 10 + (idx % 15) as i64,
                        unit_cost: None,
                    })
                    .collect(),
            })
            .await?;
        orders += 1;

        for (line_idx, id) in chunk.iter().enumerate().take(2) {
            db.sales()
                .insert(&SaleInput {
                    reference: Some(format!("S-{:05}", idx * 2 + line_idx)),
                    product_id: id.clone(),
                    customer_id: (line_idx == 0).then(|| customer.id.clone()),
                    customer_name: None,
                    quantity: 1 + ((idx + line_idx) % 4) as i64,
                    unit_price: None,
                    discount: None,
                    sale_date: Some(day),
                    notes: None,
                })
                .await?;
            sales += 1;
        }
    }
    println!("✓ {} purchase orders, {} sales", orders, sales);

    if product_ids.len() >= 3 {
        let voucher = db
            .vouchers(VoucherKind::Sales)
            .create(&VoucherInput {
                voucher_number: None,
                party_id: Some(customer.id.clone()),
                party_name: None,
                voucher_date: Some(today),
                discount: Some(AmountInput::Cents(100)),
                tax_bps: 750,
                notes: Some("Seeded counter sale".to_string()),
                post: true,
                items: product_ids
                    .iter()
                    .take(3)
                    .map(|id| VoucherLineInput {
                        product_id: id.clone(),
                        quantity: 1,
                        unit_price: None,
                    })
                    .collect(),
            })
            .await?;
        println!("✓ Posted voucher {}", voucher.voucher.voucher_number);
    }

    // Verify stock and search
    println!();
    println!("Verifying...");
    let drift = db
        .stock()
        .snapshots()
        .await?
        .iter()
        .filter(|s| !s.is_consistent())
        .count();
    println!("  Products with stock drift: {}", drift);
    let results = db.products().search("bolt", 10).await?;
    println!("  Search 'bolt': {} results", results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn company(name: &str, kind: CompanyKind) -> CompanyInput {
    CompanyInput {
        name: name.to_string(),
        kind,
        contact_person: None,
        phone: Some("+1 555 0100".to_string()),
        email: None,
        address: Some("1 Market Street".to_string()),
        tax_number: None,
        is_active: None,
    }
}

/// One catalogue entry with deterministic pseudo-random figures.
fn generate_product(
    code: &str,
    category: &str,
    name: &str,
    variant: &str,
    price_addon: i64,
    seed: usize,
) -> ProductInput {
    let sell_cents = 199 + ((seed * 17) % 800) as i64 + price_addon;
    // 55-75% of the sell price
    let cost_cents = sell_cents * (55 + (seed % 20) as i64) / 100;

    ProductInput {
        sku: format!("{}-{:04}", code, seed),
        name: format!("{} {}", name, variant),
        category: category.to_string(),
        description: None,
        unit: Some(UNITS[seed % UNITS.len()].to_string()),
        opening_stock: (seed % 41) as i64,
        reorder_point: 5 + (seed % 6) as i64,
        purchase_price: Some(AmountInput::Cents(cost_cents)),
        sell_price: Some(AmountInput::Cents(sell_cents)),
        status: None,
    }
}
