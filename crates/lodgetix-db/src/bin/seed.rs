//! # Demo Catalog Loader
//!
//! Stores a sample function catalog so the wizard has something to sell
//! during development.
//!
//! ## Usage
//! ```bash
//! cargo run -p lodgetix-db --bin seed
//!
//! # Specify database path
//! cargo run -p lodgetix-db --bin seed -- --db ./data/lodgetix.db
//!
//! # Overwrite an existing catalog for the demo function
//! cargo run -p lodgetix-db --bin seed -- --force
//! ```
//!
//! ## Generated Catalog
//! One function, "Grand Installation", with:
//! - Four tickets across four events (ceremony is Masons only)
//! - Individual packages with discounts
//! - A lodge table of ten that only lodge registrations can buy

use chrono::{TimeZone, Utc};
use lodgetix_core::catalog::{CapacityCounters, FunctionDefinition};
use lodgetix_core::{
    AttendeeType, CatalogSnapshot, Money, PackageDefinition, RegistrationMode, TicketDefinition,
};
use lodgetix_db::{Database, DbConfig};
use std::env;

const FUNCTION_ID: &str = "fn-grand-installation";

/// (id, event id, name, price in cents, capacity, masons only)
const TICKETS: &[(&str, &str, &str, i64, Option<u32>, bool)] = &[
    ("tkt-ceremony", "evt-ceremony", "Installation Ceremony", 5000, None, true),
    ("tkt-gala", "evt-gala", "Grand Gala Dinner", 15000, Some(400), false),
    ("tkt-lunch", "evt-lunch", "Farewell Lunch", 7500, Some(250), false),
    ("tkt-tour", "evt-tour", "Partners' Harbour Tour", 6000, Some(60), false),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./lodgetix_dev.db");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("LodgeTix Demo Catalog Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./lodgetix_dev.db)");
                println!("  -f, --force        Replace the demo catalog if it already exists");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("LodgeTix Demo Catalog Loader");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if !force && db.catalog().load_snapshot(FUNCTION_ID).await?.is_some() {
        println!("⚠ Catalog for {} already exists", FUNCTION_ID);
        println!("  Pass --force to replace it.");
        return Ok(());
    }

    let snapshot = demo_catalog();
    let problems = snapshot.check_integrity();
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("✗ {}", problem);
        }
        return Err("demo catalog failed integrity checks".into());
    }

    db.catalog().replace_catalog(&snapshot).await?;

    println!("✓ Stored {} tickets", snapshot.tickets.len());
    for package in &snapshot.packages {
        println!(
            "  {:<28} {:>10}  ({} tickets, saves {})",
            package.name,
            package.price.to_string(),
            package.tickets_per_package(),
            package.savings()
        );
    }
    let stats = db.stats().await?;
    println!();
    println!(
        "✓ Store now holds {} function(s), {} package(s), {} draft(s)",
        stats.functions, stats.packages, stats.drafts
    );
    println!("✓ Seed complete!");

    Ok(())
}

fn demo_catalog() -> CatalogSnapshot {
    let function = FunctionDefinition {
        id: FUNCTION_ID.to_string(),
        name: "Grand Installation".to_string(),
        location: Some("Sydney Masonic Centre".to_string()),
        starts_at: Utc.with_ymd_and_hms(2026, 11, 20, 9, 0, 0).single(),
        ends_at: Utc.with_ymd_and_hms(2026, 11, 22, 15, 0, 0).single(),
    };

    let tickets = TICKETS
        .iter()
        .map(|(id, event_id, name, cents, total, masons_only)| TicketDefinition {
            id: id.to_string(),
            event_id: event_id.to_string(),
            name: name.to_string(),
            price: Money::from_cents(*cents),
            capacity: CapacityCounters {
                total: *total,
                available: *total,
                reserved: 0,
                sold: 0,
            },
            is_active: true,
            eligible_attendee_types: if *masons_only {
                vec![AttendeeType::Mason]
            } else {
                Vec::new()
            },
        })
        .collect();

    let packages = vec![
        package(
            "pkg-full-weekend",
            "Full Weekend Package",
            30000,
            Some(33500),
            &["tkt-ceremony", "tkt-gala", "tkt-lunch", "tkt-tour"],
            vec![AttendeeType::Mason],
            Vec::new(),
        ),
        package(
            "pkg-dinner-lunch",
            "Dinner & Lunch",
            20000,
            Some(22500),
            &["tkt-gala", "tkt-lunch"],
            Vec::new(),
            Vec::new(),
        ),
        package(
            "pkg-lodge-table",
            "Lodge Table of 10",
            145000,
            Some(150000),
            &["tkt-gala"; 10],
            Vec::new(),
            vec![RegistrationMode::Lodge],
        ),
    ];

    CatalogSnapshot::new(function, tickets, packages)
}

fn package(
    id: &str,
    name: &str,
    cents: i64,
    original_cents: Option<i64>,
    includes: &[&str],
    attendee_types: Vec<AttendeeType>,
    registration_types: Vec<RegistrationMode>,
) -> PackageDefinition {
    PackageDefinition {
        id: id.to_string(),
        name: name.to_string(),
        price: Money::from_cents(cents),
        original_price: original_cents.map(Money::from_cents),
        discount: None,
        includes: includes.iter().map(|t| t.to_string()).collect(),
        eligible_attendee_types: attendee_types,
        eligible_registration_types: registration_types,
        is_active: true,
    }
}
