//! # Catalog Repository
//!
//! Loads and replaces the purchasable catalog for a function.
//!
//! ## Row Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  functions ──► FunctionDefinition                                       │
//! │  tickets   ──► TicketDefinition   price_cents → Money                   │
//! │                                   capacity_* → CapacityCounters         │
//! │  packages  ──► PackageDefinition  includes (JSON text) → Vec<String>    │
//! │                                                                         │
//! │  A row that can't be mapped back (bad JSON, negative counter) is a     │
//! │  DbError::CorruptRow, never a silently skipped item.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `sort_order` is the position in the snapshot's vectors, so a
//! replace-then-load returns items in the order they were given.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use lodgetix_core::catalog::{CapacityCounters, FunctionDefinition};
use lodgetix_core::{CatalogSnapshot, Money, PackageDefinition, TicketDefinition};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct FunctionRow {
    id: String,
    name: String,
    location: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
}

impl From<FunctionRow> for FunctionDefinition {
    fn from(row: FunctionRow) -> Self {
        FunctionDefinition {
            id: row.id,
            name: row.name,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: String,
    event_id: String,
    name: String,
    price_cents: i64,
    capacity_total: Option<i64>,
    capacity_available: Option<i64>,
    capacity_reserved: i64,
    capacity_sold: i64,
    is_active: bool,
    eligible_attendee_types: String,
}

impl TryFrom<TicketRow> for TicketDefinition {
    type Error = DbError;

    fn try_from(row: TicketRow) -> DbResult<Self> {
        let capacity = CapacityCounters {
            total: row
                .capacity_total
                .map(|v| counter("tickets", &row.id, v))
                .transpose()?,
            available: row
                .capacity_available
                .map(|v| counter("tickets", &row.id, v))
                .transpose()?,
            reserved: counter("tickets", &row.id, row.capacity_reserved)?,
            sold: counter("tickets", &row.id, row.capacity_sold)?,
        };
        let eligible_attendee_types =
            parse_json("tickets", &row.id, &row.eligible_attendee_types)?;

        Ok(TicketDefinition {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            capacity,
            is_active: row.is_active,
            eligible_attendee_types,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PackageRow {
    id: String,
    name: String,
    price_cents: i64,
    original_price_cents: Option<i64>,
    discount_cents: Option<i64>,
    includes: String,
    eligible_attendee_types: String,
    eligible_registration_types: String,
    is_active: bool,
}

impl TryFrom<PackageRow> for PackageDefinition {
    type Error = DbError;

    fn try_from(row: PackageRow) -> DbResult<Self> {
        let includes = parse_json("packages", &row.id, &row.includes)?;
        let eligible_attendee_types =
            parse_json("packages", &row.id, &row.eligible_attendee_types)?;
        let eligible_registration_types =
            parse_json("packages", &row.id, &row.eligible_registration_types)?;

        Ok(PackageDefinition {
            id: row.id,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            original_price: row.original_price_cents.map(Money::from_cents),
            discount: row.discount_cents.map(Money::from_cents),
            includes,
            eligible_attendee_types,
            eligible_registration_types,
            is_active: row.is_active,
        })
    }
}

fn counter(table: &str, id: &str, value: i64) -> DbResult<u32> {
    u32::try_from(value)
        .map_err(|_| DbError::corrupt(table, id, format!("capacity counter out of range: {value}")))
}

fn parse_json<T: DeserializeOwned>(table: &str, id: &str, raw: &str) -> DbResult<T> {
    serde_json::from_str(raw).map_err(|e| DbError::corrupt(table, id, e))
}

fn to_json<T: Serialize>(table: &str, id: &str, value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::corrupt(table, id, e))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for function catalogs.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.catalog();
/// repo.replace_catalog(&snapshot).await?;
/// let loaded = repo.load_snapshot("fn-installation").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts or updates a function row.
    pub async fn insert_function(&self, function: &FunctionDefinition) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_function(&mut conn, function).await
    }

    /// Inserts a ticket under an existing function.
    pub async fn insert_ticket(
        &self,
        function_id: &str,
        ticket: &TicketDefinition,
        sort_order: i64,
    ) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_ticket(&mut conn, function_id, ticket, sort_order).await
    }

    /// Inserts a package under an existing function.
    pub async fn insert_package(
        &self,
        function_id: &str,
        package: &PackageDefinition,
        sort_order: i64,
    ) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_package(&mut conn, function_id, package, sort_order).await
    }

    /// Replaces everything stored for the snapshot's function in one
    /// transaction. Readers see either the old catalog or the new one.
    pub async fn replace_catalog(&self, snapshot: &CatalogSnapshot) -> DbResult<()> {
        let function_id = snapshot.function_id();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        upsert_function(&mut tx, &snapshot.function).await?;

        sqlx::query("DELETE FROM packages WHERE function_id = ?1")
            .bind(function_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tickets WHERE function_id = ?1")
            .bind(function_id)
            .execute(&mut *tx)
            .await?;

        for (position, ticket) in snapshot.tickets.iter().enumerate() {
            insert_ticket(&mut tx, function_id, ticket, position as i64).await?;
        }
        for (position, package) in snapshot.packages.iter().enumerate() {
            insert_package(&mut tx, function_id, package, position as i64).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            function_id = %function_id,
            tickets = snapshot.tickets.len(),
            packages = snapshot.packages.len(),
            "Catalog replaced"
        );
        Ok(())
    }

    /// Loads the catalog for a function, or `None` if the function is unknown.
    pub async fn load_snapshot(&self, function_id: &str) -> DbResult<Option<CatalogSnapshot>> {
        let function = sqlx::query_as::<_, FunctionRow>(
            "SELECT id, name, location, starts_at, ends_at FROM functions WHERE id = ?1",
        )
        .bind(function_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(function) = function else {
            debug!(function_id = %function_id, "No catalog stored for function");
            return Ok(None);
        };

        let tickets = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, event_id, name, price_cents,
                   capacity_total, capacity_available, capacity_reserved, capacity_sold,
                   is_active, eligible_attendee_types
            FROM tickets
            WHERE function_id = ?1
            ORDER BY sort_order, id
            "#,
        )
        .bind(function_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TicketDefinition::try_from)
        .collect::<DbResult<Vec<_>>>()?;

        let packages = sqlx::query_as::<_, PackageRow>(
            r#"
            SELECT id, name, price_cents, original_price_cents, discount_cents,
                   includes, eligible_attendee_types, eligible_registration_types, is_active
            FROM packages
            WHERE function_id = ?1
            ORDER BY sort_order, id
            "#,
        )
        .bind(function_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(PackageDefinition::try_from)
        .collect::<DbResult<Vec<_>>>()?;

        debug!(
            function_id = %function_id,
            tickets = tickets.len(),
            packages = packages.len(),
            "Catalog loaded"
        );

        Ok(Some(CatalogSnapshot::new(
            function.into(),
            tickets,
            packages,
        )))
    }
}

// =============================================================================
// Statements
// =============================================================================

async fn upsert_function(
    conn: &mut SqliteConnection,
    function: &FunctionDefinition,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO functions (id, name, location, starts_at, ends_at, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            location = excluded.location,
            starts_at = excluded.starts_at,
            ends_at = excluded.ends_at
        "#,
    )
    .bind(&function.id)
    .bind(&function.name)
    .bind(&function.location)
    .bind(function.starts_at)
    .bind(function.ends_at)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_ticket(
    conn: &mut SqliteConnection,
    function_id: &str,
    ticket: &TicketDefinition,
    sort_order: i64,
) -> DbResult<()> {
    let eligible = to_json("tickets", &ticket.id, &ticket.eligible_attendee_types)?;

    sqlx::query(
        r#"
        INSERT INTO tickets (
            id, function_id, event_id, name, price_cents,
            capacity_total, capacity_available, capacity_reserved, capacity_sold,
            is_active, eligible_attendee_types, sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&ticket.id)
    .bind(function_id)
    .bind(&ticket.event_id)
    .bind(&ticket.name)
    .bind(ticket.price.cents())
    .bind(ticket.capacity.total.map(i64::from))
    .bind(ticket.capacity.available.map(i64::from))
    .bind(i64::from(ticket.capacity.reserved))
    .bind(i64::from(ticket.capacity.sold))
    .bind(ticket.is_active)
    .bind(eligible)
    .bind(sort_order)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_package(
    conn: &mut SqliteConnection,
    function_id: &str,
    package: &PackageDefinition,
    sort_order: i64,
) -> DbResult<()> {
    let includes = to_json("packages", &package.id, &package.includes)?;
    let attendee_types = to_json("packages", &package.id, &package.eligible_attendee_types)?;
    let registration_types =
        to_json("packages", &package.id, &package.eligible_registration_types)?;

    sqlx::query(
        r#"
        INSERT INTO packages (
            id, function_id, name, price_cents, original_price_cents, discount_cents,
            includes, eligible_attendee_types, eligible_registration_types,
            is_active, sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&package.id)
    .bind(function_id)
    .bind(&package.name)
    .bind(package.price.cents())
    .bind(package.original_price.map(|m| m.cents()))
    .bind(package.discount.map(|m| m.cents()))
    .bind(includes)
    .bind(attendee_types)
    .bind(registration_types)
    .bind(package.is_active)
    .bind(sort_order)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
