//! # Seed Data Generator
//!
//! Fills a database with a small demo venue: hourly pool tables, an instant
//! arcade table and regular bar tables, some with open sessions and unpaid
//! sales (one of them malformed).
//!
//! ## Usage
//! ```bash
//! cargo run -p tally-db --bin seed
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! Prints the reconciled tables as JSON when done.

use chrono::{Duration, Utc};
use std::env;
use tally_core::{Money, NewSale, NewTable, Reconciler, Sale, TableKind};
use tally_db::{Database, DbConfig};
use uuid::Uuid;

/// (name, kind, hourly rate in cents, minutes since opened, sales)
const TABLES: &[(&str, TableKind, Option<i64>, Option<i64>, &[&str])] = &[
    ("Pool 1", TableKind::Hourly, Some(4000), Some(90), &["12.00", "8"]),
    ("Pool 2", TableKind::Hourly, Some(4000), None, &[]),
    ("Snooker", TableKind::Hourly, Some(5500), Some(25), &["4.50"]),
    ("Arcade", TableKind::Instant, None, None, &["2.00"]),
    ("Bar 1", TableKind::Regular, None, Some(40), &["6.50", "6.50", "3"]),
    ("Bar 2", TableKind::Regular, None, None, &[]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./tally_dev.db");

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
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.tables().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} tables", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut ids = Vec::with_capacity(TABLES.len());

    for (name, kind, rate, opened_minutes_ago, sales) in TABLES {
        let table = db
            .tables()
            .create(&NewTable {
                name: name.to_string(),
                kind: *kind,
                hourly_rate: rate.map(Money::from_cents),
            })
            .await?;

        if let Some(minutes) = opened_minutes_ago {
            db.tables()
                .open_session(&table.id, now - Duration::minutes(*minutes))
                .await?;
        }

        for amount in *sales {
            db.sales()
                .add_sale(&NewSale {
                    table_id: table.id.clone(),
                    sale_total: amount.to_string(),
                })
                .await?;
        }

        println!("  + {:<10} {:<8} {} sale(s)", name, kind, sales.len());
        ids.push(table.id);
    }

    // A record as a faulty till might leave it; billing counts it as zero.
    if let Some(bar) = ids.get(4) {
        db.sales()
            .import(&Sale::unpaid(Uuid::new_v4().to_string(), bar, "N/A"))
            .await?;
        println!("  + malformed sale on Bar 1");
    }

    let reconciler = Reconciler::new(db.clone());
    let mut results = reconciler.refresh_tables(db.tables().list().await?).await;
    let saved_at = Utc::now();
    for result in &mut results {
        result.table.updated_at = saved_at;
        db.tables().save_totals(&result.table, saved_at).await?;
    }

    println!();
    println!("✓ Seeded {} tables", ids.len());
    println!();
    println!("{}", serde_json::to_string_pretty(&results)?);

    db.close().await;
    Ok(())
}
