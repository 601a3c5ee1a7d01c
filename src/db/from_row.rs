//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! This module provides a `FromRow` trait that models can implement to
//! define how they are constructed from database rows, plus helper functions
//! for common query patterns.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// This provides graceful error handling instead of panicking when database
/// contains invalid enum values (from corruption, migration errors, etc.).
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Parse a JSON text column.
fn parse_json<T: serde::de::DeserializeOwned>(row: &Row, col: usize) -> rusqlite::Result<T> {
    let text: String = row.get(col)?;
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_optional_json(row: &Row, col: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    let text: Option<String> = row.get(col)?;
    text.map(|t| {
        serde_json::from_str(&t).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

fn lifecycle(row: &Row, col: usize) -> rusqlite::Result<Lifecycle> {
    Ok(Lifecycle::from_deleted_at(row.get(col)?))
}

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    /// Construct an instance from a database row.
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, username, real_name, phone, email, role, department_id, team_id, status, password_hash, created_at, updated_at, deleted_at";

pub const DEPARTMENT_COLS: &str =
    "id, name, code, description, created_by, created_at, updated_at, deleted_at";

pub const TEAM_COLS: &str = "id, name, department_id, leader_id, created_at, updated_at, deleted_at";

pub const GPU_MODEL_COLS: &str = "id, name, brand, memory_gb, cpu, ram_gb, ib_card, nvme_ssd, network_adapter, power_supply, rental_price_min, rental_price_max, sale_price_min, sale_price_max, availability, created_by, created_at, updated_at, deleted_at";

pub const CUSTOMER_COLS: &str = "id, name, company_name, contact_person, contact_phone, email, demand_preference, cooperation_stage, follow_up_status, assignee_id, creator_id, team_id, created_at, updated_at, deleted_at";

pub const COMPANY_COLS: &str = "id, name, industry, years, capital, main_business, screenshot_url, creator_id, team_id, created_at, updated_at, deleted_at";

pub const DEMAND_COLS: &str = "id, title, customer_id, category, status, priority, description, source, budget, cost, creator_id, team_id, created_at, updated_at, deleted_at, details";

pub const OPERATION_LOG_COLS: &str = "id, timestamp, user_id, username, real_name, module, operation_type, description, target_id, request_method, request_path, ip_address, user_agent, success, error_message, old_value, new_value";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // An unrecognized role loads as None and is denied by every policy check
        let role: Option<Role> = row.get::<_, String>(5)?.parse().ok();
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            real_name: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
            role,
            department_id: row.get(6)?,
            team_id: row.get(7)?,
            status: parse_enum(row, 8, "status")?,
            password_hash: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            lifecycle: lifecycle(row, 12)?,
        })
    }
}

/// Columns are `USER_COLS` followed by the session's role, team and department.
impl FromRow for Session {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let user = User::from_row(row)?;
        let actor = Actor {
            id: user.id.clone(),
            role: row.get::<_, Option<String>>(13)?.and_then(|r| r.parse().ok()),
            team_id: row.get(14)?,
            department_id: row.get(15)?,
        };
        Ok(Session { actor, user })
    }
}

impl FromRow for Department {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Department {
            id: row.get(0)?,
            name: row.get(1)?,
            code: row.get(2)?,
            description: row.get(3)?,
            created_by: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            lifecycle: lifecycle(row, 7)?,
        })
    }
}

impl FromRow for Team {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Team {
            id: row.get(0)?,
            name: row.get(1)?,
            department_id: row.get(2)?,
            leader_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            lifecycle: lifecycle(row, 6)?,
        })
    }
}

impl FromRow for GpuModel {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(GpuModel {
            id: row.get(0)?,
            name: row.get(1)?,
            brand: row.get(2)?,
            memory_gb: row.get(3)?,
            cpu: row.get(4)?,
            ram_gb: row.get(5)?,
            ib_card: row.get(6)?,
            nvme_ssd: row.get(7)?,
            network_adapter: row.get(8)?,
            power_supply: row.get(9)?,
            rental_price_min: row.get(10)?,
            rental_price_max: row.get(11)?,
            sale_price_min: row.get(12)?,
            sale_price_max: row.get(13)?,
            availability: parse_enum(row, 14, "availability")?,
            created_by: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
            lifecycle: lifecycle(row, 18)?,
        })
    }
}

impl FromRow for Customer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Customer {
            id: row.get(0)?,
            name: row.get(1)?,
            company_name: row.get(2)?,
            contact_person: row.get(3)?,
            contact_phone: row.get(4)?,
            email: row.get(5)?,
            demand_preference: row.get(6)?,
            cooperation_stage: row.get(7)?,
            follow_up_status: row.get(8)?,
            assignee_id: row.get(9)?,
            creator_id: row.get(10)?,
            team_id: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
            lifecycle: lifecycle(row, 14)?,
        })
    }
}

impl FromRow for Company {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Company {
            id: row.get(0)?,
            name: row.get(1)?,
            industry: row.get(2)?,
            years: row.get(3)?,
            capital: row.get(4)?,
            main_business: row.get(5)?,
            screenshot_url: row.get(6)?,
            creator_id: row.get(7)?,
            team_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            lifecycle: lifecycle(row, 11)?,
        })
    }
}

impl FromRow for Demand {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Demand {
            id: row.get(0)?,
            title: row.get(1)?,
            customer_id: row.get(2)?,
            category: parse_enum(row, 3, "category")?,
            status: parse_enum(row, 4, "status")?,
            priority: parse_enum(row, 5, "priority")?,
            description: row.get(6)?,
            source: row.get(7)?,
            budget: row.get(8)?,
            cost: row.get(9)?,
            creator_id: row.get(10)?,
            team_id: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
            lifecycle: lifecycle(row, 14)?,
            details: parse_json(row, 15)?,
        })
    }
}

impl FromRow for OperationLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OperationLog {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            user_id: row.get(2)?,
            username: row.get(3)?,
            real_name: row.get(4)?,
            module: row.get(5)?,
            operation_type: parse_enum(row, 6, "operation_type")?,
            description: row.get(7)?,
            target_id: row.get(8)?,
            request_method: row.get(9)?,
            request_path: row.get(10)?,
            ip_address: row.get(11)?,
            user_agent: row.get(12)?,
            success: row.get::<_, i32>(13)? != 0,
            error_message: row.get(14)?,
            old_value: parse_optional_json(row, 15)?,
            new_value: parse_optional_json(row, 16)?,
        })
    }
}
