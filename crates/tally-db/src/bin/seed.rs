//! Development data seeder.
//!
//! Creates (or reuses) `tally.db` in the working directory and loads a small
//! catalog of stock items so the UI and the engine have something to sell.
//! Idempotent: items are keyed by SKU and skipped when already present.
//!
//! ```text
//! cargo run -p tally-db --bin seed
//! ```

use chrono::Utc;
use tracing::{info, warn};

use tally_core::StockItem;
use tally_db::repository::item::generate_item_id;
use tally_db::{Database, DbConfig};

struct SeedItem {
    sku: &'static str,
    name: &'static str,
    category: &'static str,
    unit_cost_cents: i64,
    retail_price_cents: i64,
    on_hand: i64,
    supplier: Option<&'static str>,
}

const CATALOG: &[SeedItem] = &[
    SeedItem {
        sku: "MED001",
        name: "Paracetamol 500mg",
        category: "MED",
        unit_cost_cents: 600,
        retail_price_cents: 1000,
        on_hand: 100,
        supplier: Some("Acme Pharma"),
    },
    SeedItem {
        sku: "MED002",
        name: "Ibuprofen 200mg",
        category: "MED",
        unit_cost_cents: 450,
        retail_price_cents: 850,
        on_hand: 80,
        supplier: Some("Acme Pharma"),
    },
    SeedItem {
        sku: "BEV001",
        name: "Mineral Water 500ml",
        category: "BEV",
        unit_cost_cents: 40,
        retail_price_cents: 120,
        on_hand: 240,
        supplier: Some("Springs Co"),
    },
    SeedItem {
        sku: "BEV002",
        name: "Orange Juice 1L",
        category: "BEV",
        unit_cost_cents: 180,
        retail_price_cents: 350,
        on_hand: 60,
        supplier: Some("Springs Co"),
    },
    SeedItem {
        sku: "SNK001",
        name: "Salted Crackers",
        category: "SNK",
        unit_cost_cents: 90,
        retail_price_cents: 200,
        on_hand: 150,
        supplier: None,
    },
    SeedItem {
        sku: "SNK002",
        name: "Chocolate Bar",
        category: "SNK",
        unit_cost_cents: 120,
        retail_price_cents: 250,
        // Deliberately low so the low-stock screen shows something
        on_hand: 8,
        supplier: None,
    },
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db = Database::new(DbConfig::new("tally.db")).await?;
    let items = db.items();

    let mut inserted = 0usize;
    for seed in CATALOG {
        if items.get_by_sku(seed.sku).await?.is_some() {
            warn!(sku = %seed.sku, "Already present, skipping");
            continue;
        }

        let now = Utc::now();
        items
            .insert(&StockItem {
                id: generate_item_id(),
                sku: seed.sku.to_string(),
                name: seed.name.to_string(),
                category: seed.category.to_string(),
                unit_cost_cents: seed.unit_cost_cents,
                retail_price_cents: seed.retail_price_cents,
                on_hand: seed.on_hand,
                reserved: 0,
                supplier: seed.supplier.map(String::from),
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(sku = %seed.sku, on_hand = %seed.on_hand, "Seeded");
        inserted += 1;
    }

    info!(
        inserted = inserted,
        total = items.count().await?,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
