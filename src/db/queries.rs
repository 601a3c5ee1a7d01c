use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params, types::Value};
use uuid::Uuid;

use crate::error::{AppError, Result, msg};
use crate::models::*;

use super::from_row::{
    COMPANY_COLS, CUSTOMER_COLS, DEMAND_COLS, DEPARTMENT_COLS, FromRow, GPU_MODEL_COLS,
    OPERATION_LOG_COLS, TEAM_COLS, USER_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trim optional free text, storing blank input as NULL.
fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query for efficiency.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    /// Use this for Option<T> where Some(v) = set to v, None = set to NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    /// Apply a PATCH-style double option: absent leaves the column alone,
    /// `null` clears it.
    fn set_patch<V: Into<Value>>(self, column: &'static str, value: Option<Option<V>>) -> Self {
        match value {
            Some(v) => self.set_nullable(column, v),
            None => self,
        }
    }

    /// Execute the update and return the updated entity using RETURNING clause.
    /// Returns None if the entity is missing or soft-deleted. An empty update
    /// returns the current row unchanged.
    fn execute_returning<T: FromRow>(mut self, conn: &Connection, returning_cols: &str) -> Result<Option<T>> {
        if self.fields.is_empty() {
            let sql = format!(
                "SELECT {} FROM {} WHERE id = ?1 AND deleted_at IS NULL",
                returning_cols, self.table
            );
            return query_one(conn, &sql, &[&self.id]);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? AND deleted_at IS NULL RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

/// Mark a row deleted. Returns false if it is missing or already deleted,
/// leaving the original deletion timestamp untouched.
fn soft_delete_entity(conn: &Connection, table: &'static str, id: &str) -> Result<bool> {
    let affected = conn.execute(
        &format!(
            "UPDATE {} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            table
        ),
        params![now(), id],
    )?;
    Ok(affected > 0)
}

fn get_active<T: FromRow>(conn: &Connection, table: &str, cols: &str, id: &str) -> Result<Option<T>> {
    query_one(
        conn,
        &format!("SELECT {} FROM {} WHERE id = ?1 AND deleted_at IS NULL", cols, table),
        &[&id],
    )
}

fn get_deleted<T: FromRow>(conn: &Connection, table: &str, cols: &str, id: &str) -> Result<Option<T>> {
    query_one(
        conn,
        &format!("SELECT {} FROM {} WHERE id = ?1 AND deleted_at IS NOT NULL", cols, table),
        &[&id],
    )
}

fn list_active<T: FromRow>(conn: &Connection, table: &str, cols: &str) -> Result<Vec<T>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM {} WHERE deleted_at IS NULL ORDER BY created_at DESC, id",
            cols, table
        ),
        &[],
    )
}

// ============ Users ============

/// Create a user. `password_hash` is the already-hashed password.
pub fn create_user(conn: &Connection, input: &CreateUser, password_hash: &str) -> Result<User> {
    let id = gen_id();
    let now = now();
    let username = input.username.trim().to_string();
    let real_name = input.real_name.trim().to_string();
    let email = clean(&input.email).map(|e| e.to_lowercase());
    let phone = clean(&input.phone);

    conn.execute(
        "INSERT INTO users (id, username, real_name, phone, email, role, department_id, team_id, status, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            &id,
            &username,
            &real_name,
            &phone,
            &email,
            input.role.as_ref(),
            &input.department_id,
            &input.team_id,
            input.status.as_ref(),
            password_hash,
            now,
            now
        ],
    )
    .map_err(|e| AppError::conflict_on_unique(e, "Username already exists"))?;

    Ok(User {
        id,
        username,
        real_name,
        phone,
        email,
        role: Some(input.role),
        department_id: input.department_id.clone(),
        team_id: input.team_id.clone(),
        status: input.status,
        password_hash: password_hash.to_string(),
        created_at: now,
        updated_at: now,
        lifecycle: Lifecycle::Active,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    get_active(conn, "users", USER_COLS, id)
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM users WHERE username = ?1 AND deleted_at IS NULL",
            USER_COLS
        ),
        &[&username.trim()],
    )
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    list_active(conn, "users", USER_COLS)
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Update a user. `password_hash` replaces the stored hash when given.
/// Returns the updated user, or None if not found.
pub fn update_user(
    conn: &Connection,
    id: &str,
    input: &UpdateUser,
    password_hash: Option<&str>,
) -> Result<Option<User>> {
    let email = input
        .email
        .as_ref()
        .map(|e| clean(e).map(|e| e.to_lowercase()));
    let phone = input.phone.as_ref().map(clean);

    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set_opt("real_name", input.real_name.as_deref().map(|n| n.trim().to_string()))
        .set_patch("phone", phone)
        .set_patch("email", email)
        .set_opt("role", input.role.map(|r| r.as_ref().to_string()))
        .set_patch("department_id", input.department_id.clone())
        .set_patch("team_id", input.team_id.clone())
        .set_opt("status", input.status.map(|s| s.as_ref().to_string()))
        .set_opt("password_hash", password_hash.map(String::from))
        .execute_returning(conn, USER_COLS)
}

/// Soft delete a user and revoke their sessions.
/// Returns true if the user was found and soft deleted.
pub fn soft_delete_user(conn: &Connection, id: &str) -> Result<bool> {
    if !soft_delete_entity(conn, "users", id)? {
        return Ok(false);
    }
    delete_sessions_for_user(conn, id)?;
    Ok(true)
}

/// Get a soft-deleted user by ID (inspection only; there is no restore).
pub fn get_deleted_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    get_deleted(conn, "users", USER_COLS, id)
}

// ============ Sessions ============

/// Store a session together with the actor snapshot taken at login.
pub fn create_session(conn: &Connection, token_hash: &str, actor: &Actor) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, role, team_id, department_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            token_hash,
            actor.id,
            actor.role.map(|r| r.as_ref().to_string()),
            actor.team_id,
            actor.department_id,
            now()
        ],
    )?;
    Ok(())
}

/// Look up a session and its user, including deleted users so callers can
/// tear the session down.
pub fn get_session(conn: &Connection, token_hash: &str) -> Result<Option<Session>> {
    let cols = USER_COLS
        .split(", ")
        .map(|c| format!("u.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    query_one(
        conn,
        &format!(
            "SELECT {}, s.role, s.team_id, s.department_id
             FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token_hash = ?1",
            cols
        ),
        &[&token_hash],
    )
}

pub fn touch_session(conn: &Connection, token_hash: &str) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET last_used_at = ?1 WHERE token_hash = ?2",
        params![now(), token_hash],
    )?;
    Ok(())
}

/// Returns true if a session was removed.
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
    Ok(deleted > 0)
}

pub fn delete_sessions_for_user(conn: &Connection, user_id: &str) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
    Ok(deleted)
}

// ============ Departments ============

pub fn create_department(
    conn: &Connection,
    input: &CreateDepartment,
    created_by: Option<&str>,
) -> Result<Department> {
    let id = gen_id();
    let now = now();
    let name = input.name.trim().to_string();
    let code = input.code.trim().to_string();
    let description = clean(&input.description);

    conn.execute(
        "INSERT INTO departments (id, name, code, description, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![&id, &name, &code, &description, created_by, now, now],
    )
    .map_err(|e| AppError::conflict_on_unique(e, "Department code already exists"))?;

    Ok(Department {
        id,
        name,
        code,
        description,
        created_by: created_by.map(String::from),
        created_at: now,
        updated_at: now,
        lifecycle: Lifecycle::Active,
    })
}

pub fn get_department_by_id(conn: &Connection, id: &str) -> Result<Option<Department>> {
    get_active(conn, "departments", DEPARTMENT_COLS, id)
}

pub fn list_departments(conn: &Connection) -> Result<Vec<Department>> {
    list_active(conn, "departments", DEPARTMENT_COLS)
}

pub fn update_department(
    conn: &Connection,
    id: &str,
    input: &UpdateDepartment,
) -> Result<Option<Department>> {
    UpdateBuilder::new("departments", id)
        .with_updated_at()
        .set_opt("name", input.name.as_deref().map(|n| n.trim().to_string()))
        .set_opt("code", input.code.as_deref().map(|c| c.trim().to_string()))
        .set_patch("description", input.description.as_ref().map(clean))
        .execute_returning(conn, DEPARTMENT_COLS)
        .map_err(|e| match e {
            AppError::Database(db) => AppError::conflict_on_unique(db, "Department code already exists"),
            other => other,
        })
}

pub fn soft_delete_department(conn: &Connection, id: &str) -> Result<bool> {
    soft_delete_entity(conn, "departments", id)
}

pub fn get_deleted_department_by_id(conn: &Connection, id: &str) -> Result<Option<Department>> {
    get_deleted(conn, "departments", DEPARTMENT_COLS, id)
}

// ============ Teams ============

pub fn create_team(conn: &Connection, input: &CreateTeam) -> Result<Team> {
    let id = gen_id();
    let now = now();
    let name = input.name.trim().to_string();

    conn.execute(
        "INSERT INTO teams (id, name, department_id, leader_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, &name, &input.department_id, &input.leader_id, now, now],
    )?;

    Ok(Team {
        id,
        name,
        department_id: input.department_id.clone(),
        leader_id: input.leader_id.clone(),
        created_at: now,
        updated_at: now,
        lifecycle: Lifecycle::Active,
    })
}

pub fn get_team_by_id(conn: &Connection, id: &str) -> Result<Option<Team>> {
    get_active(conn, "teams", TEAM_COLS, id)
}

pub fn list_teams(conn: &Connection) -> Result<Vec<Team>> {
    list_active(conn, "teams", TEAM_COLS)
}

pub fn update_team(conn: &Connection, id: &str, input: &UpdateTeam) -> Result<Option<Team>> {
    UpdateBuilder::new("teams", id)
        .with_updated_at()
        .set_opt("name", input.name.as_deref().map(|n| n.trim().to_string()))
        .set_opt("department_id", input.department_id.clone())
        .set_patch("leader_id", input.leader_id.clone())
        .execute_returning(conn, TEAM_COLS)
}

pub fn soft_delete_team(conn: &Connection, id: &str) -> Result<bool> {
    soft_delete_entity(conn, "teams", id)
}

// ============ GPU Models ============

pub fn create_gpu_model(
    conn: &Connection,
    input: &CreateGpuModel,
    created_by: Option<&str>,
) -> Result<GpuModel> {
    let id = gen_id();
    let now = now();
    let name = input.name.trim().to_string();
    let brand = input.brand.trim().to_string();

    conn.execute(
        "INSERT INTO gpu_models (id, name, brand, memory_gb, cpu, ram_gb, ib_card, nvme_ssd, network_adapter, power_supply, rental_price_min, rental_price_max, sale_price_min, sale_price_max, availability, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            &id,
            &name,
            &brand,
            input.memory_gb,
            &input.cpu,
            input.ram_gb,
            &input.ib_card,
            &input.nvme_ssd,
            &input.network_adapter,
            &input.power_supply,
            input.rental_price_min,
            input.rental_price_max,
            input.sale_price_min,
            input.sale_price_max,
            input.availability.as_ref(),
            created_by,
            now,
            now
        ],
    )?;

    Ok(GpuModel {
        id,
        name,
        brand,
        memory_gb: input.memory_gb,
        cpu: input.cpu.clone(),
        ram_gb: input.ram_gb,
        ib_card: input.ib_card.clone(),
        nvme_ssd: input.nvme_ssd.clone(),
        network_adapter: input.network_adapter.clone(),
        power_supply: input.power_supply.clone(),
        rental_price_min: input.rental_price_min,
        rental_price_max: input.rental_price_max,
        sale_price_min: input.sale_price_min,
        sale_price_max: input.sale_price_max,
        availability: input.availability,
        created_by: created_by.map(String::from),
        created_at: now,
        updated_at: now,
        lifecycle: Lifecycle::Active,
    })
}

pub fn get_gpu_model_by_id(conn: &Connection, id: &str) -> Result<Option<GpuModel>> {
    get_active(conn, "gpu_models", GPU_MODEL_COLS, id)
}

pub fn list_gpu_models(conn: &Connection) -> Result<Vec<GpuModel>> {
    list_active(conn, "gpu_models", GPU_MODEL_COLS)
}

pub fn update_gpu_model(conn: &Connection, id: &str, input: &UpdateGpuModel) -> Result<Option<GpuModel>> {
    UpdateBuilder::new("gpu_models", id)
        .with_updated_at()
        .set_opt("name", input.name.as_deref().map(|n| n.trim().to_string()))
        .set_opt("brand", input.brand.as_deref().map(|b| b.trim().to_string()))
        .set_patch("memory_gb", input.memory_gb)
        .set_patch("cpu", input.cpu.clone())
        .set_patch("ram_gb", input.ram_gb)
        .set_patch("ib_card", input.ib_card.clone())
        .set_patch("nvme_ssd", input.nvme_ssd.clone())
        .set_patch("network_adapter", input.network_adapter.clone())
        .set_patch("power_supply", input.power_supply.clone())
        .set_patch("rental_price_min", input.rental_price_min)
        .set_patch("rental_price_max", input.rental_price_max)
        .set_patch("sale_price_min", input.sale_price_min)
        .set_patch("sale_price_max", input.sale_price_max)
        .set_opt("availability", input.availability.map(|a| a.as_ref().to_string()))
        .execute_returning(conn, GPU_MODEL_COLS)
}

pub fn soft_delete_gpu_model(conn: &Connection, id: &str) -> Result<bool> {
    soft_delete_entity(conn, "gpu_models", id)
}

pub fn get_deleted_gpu_model_by_id(conn: &Connection, id: &str) -> Result<Option<GpuModel>> {
    get_deleted(conn, "gpu_models", GPU_MODEL_COLS, id)
}

/// Display names of active GPU models keyed by id.
pub fn gpu_model_names(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT id, name FROM gpu_models WHERE deleted_at IS NULL")?;
    let names = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(names)
}

// ============ Customers ============

/// Create a customer owned by `actor` and stamped with the actor's team.
pub fn create_customer(conn: &Connection, input: &CreateCustomer, actor: &Actor) -> Result<Customer> {
    let id = gen_id();
    let now = now();
    let name = input.name.trim().to_string();

    conn.execute(
        "INSERT INTO customers (id, name, company_name, contact_person, contact_phone, email, demand_preference, cooperation_stage, follow_up_status, assignee_id, creator_id, team_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            &id,
            &name,
            &input.company_name,
            &input.contact_person,
            &input.contact_phone,
            &input.email,
            &input.demand_preference,
            &input.cooperation_stage,
            &input.follow_up_status,
            &input.assignee_id,
            &actor.id,
            &actor.team_id,
            now,
            now
        ],
    )?;

    Ok(Customer {
        id,
        name,
        company_name: input.company_name.clone(),
        contact_person: input.contact_person.clone(),
        contact_phone: input.contact_phone.clone(),
        email: input.email.clone(),
        demand_preference: input.demand_preference.clone(),
        cooperation_stage: input.cooperation_stage.clone(),
        follow_up_status: input.follow_up_status.clone(),
        assignee_id: input.assignee_id.clone(),
        creator_id: actor.id.clone(),
        team_id: actor.team_id.clone(),
        created_at: now,
        updated_at: now,
        lifecycle: Lifecycle::Active,
    })
}

pub fn get_customer_by_id(conn: &Connection, id: &str) -> Result<Option<Customer>> {
    get_active(conn, "customers", CUSTOMER_COLS, id)
}

pub fn list_customers(conn: &Connection) -> Result<Vec<Customer>> {
    list_active(conn, "customers", CUSTOMER_COLS)
}

/// Update a customer. Ownership columns are never touched.
pub fn update_customer(conn: &Connection, id: &str, input: &UpdateCustomer) -> Result<Option<Customer>> {
    UpdateBuilder::new("customers", id)
        .with_updated_at()
        .set_opt("name", input.name.as_deref().map(|n| n.trim().to_string()))
        .set_patch("company_name", input.company_name.clone())
        .set_patch("contact_person", input.contact_person.clone())
        .set_patch("contact_phone", input.contact_phone.clone())
        .set_patch("email", input.email.clone())
        .set_patch("demand_preference", input.demand_preference.clone())
        .set_patch("cooperation_stage", input.cooperation_stage.clone())
        .set_patch("follow_up_status", input.follow_up_status.clone())
        .set_patch("assignee_id", input.assignee_id.clone())
        .execute_returning(conn, CUSTOMER_COLS)
}

pub fn soft_delete_customer(conn: &Connection, id: &str) -> Result<bool> {
    soft_delete_entity(conn, "customers", id)
}

pub fn get_deleted_customer_by_id(conn: &Connection, id: &str) -> Result<Option<Customer>> {
    get_deleted(conn, "customers", CUSTOMER_COLS, id)
}

// ============ Companies ============

pub fn create_company(conn: &Connection, input: &CreateCompany, actor: &Actor) -> Result<Company> {
    let id = gen_id();
    let now = now();
    let name = input.name.trim().to_string();

    conn.execute(
        "INSERT INTO companies (id, name, industry, years, capital, main_business, screenshot_url, creator_id, team_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &id,
            &name,
            &input.industry,
            input.years,
            &input.capital,
            &input.main_business,
            &input.screenshot_url,
            &actor.id,
            &actor.team_id,
            now,
            now
        ],
    )?;

    Ok(Company {
        id,
        name,
        industry: input.industry.clone(),
        years: input.years,
        capital: input.capital.clone(),
        main_business: input.main_business.clone(),
        screenshot_url: input.screenshot_url.clone(),
        creator_id: actor.id.clone(),
        team_id: actor.team_id.clone(),
        created_at: now,
        updated_at: now,
        lifecycle: Lifecycle::Active,
    })
}

pub fn get_company_by_id(conn: &Connection, id: &str) -> Result<Option<Company>> {
    get_active(conn, "companies", COMPANY_COLS, id)
}

pub fn list_companies(conn: &Connection) -> Result<Vec<Company>> {
    list_active(conn, "companies", COMPANY_COLS)
}

pub fn update_company(conn: &Connection, id: &str, input: &UpdateCompany) -> Result<Option<Company>> {
    UpdateBuilder::new("companies", id)
        .with_updated_at()
        .set_opt("name", input.name.as_deref().map(|n| n.trim().to_string()))
        .set_patch("industry", input.industry.clone())
        .set_patch("years", input.years)
        .set_patch("capital", input.capital.clone())
        .set_patch("main_business", input.main_business.clone())
        .set_patch("screenshot_url", input.screenshot_url.clone())
        .execute_returning(conn, COMPANY_COLS)
}

pub fn soft_delete_company(conn: &Connection, id: &str) -> Result<bool> {
    soft_delete_entity(conn, "companies", id)
}

pub fn get_deleted_company_by_id(conn: &Connection, id: &str) -> Result<Option<Company>> {
    get_deleted(conn, "companies", COMPANY_COLS, id)
}

// ============ Demands ============

/// Create a demand owned by `actor`. Omitted category, status and priority
/// take their defaults; permission to set them is checked by the caller.
pub fn create_demand(conn: &Connection, input: &CreateDemand, actor: &Actor) -> Result<Demand> {
    let id = gen_id();
    let now = now();
    let title = input.title.trim().to_string();
    let category = input.category.unwrap_or_default();
    let status = input.status.unwrap_or_default();
    let priority = input.priority.unwrap_or_default();
    let details_json = serde_json::to_string(&input.details)?;

    conn.execute(
        "INSERT INTO demands (id, kind, title, customer_id, category, status, priority, description, source, budget, cost, details, creator_id, team_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            &id,
            input.details.kind().as_ref(),
            &title,
            &input.customer_id,
            category.as_ref(),
            status.as_ref(),
            priority.as_ref(),
            &input.description,
            &input.source,
            &input.budget,
            &input.cost,
            &details_json,
            &actor.id,
            &actor.team_id,
            now,
            now
        ],
    )?;

    Ok(Demand {
        id,
        title,
        customer_id: input.customer_id.clone(),
        category,
        status,
        priority,
        description: input.description.clone(),
        source: input.source.clone(),
        budget: input.budget.clone(),
        cost: input.cost.clone(),
        creator_id: actor.id.clone(),
        team_id: actor.team_id.clone(),
        created_at: now,
        updated_at: now,
        lifecycle: Lifecycle::Active,
        details: input.details.clone(),
    })
}

pub fn get_demand_by_id(conn: &Connection, kind: DemandKind, id: &str) -> Result<Option<Demand>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM demands WHERE id = ?1 AND kind = ?2 AND deleted_at IS NULL",
            DEMAND_COLS
        ),
        params![id, kind.as_ref()],
    )
}

pub fn list_demands(conn: &Connection, kind: DemandKind) -> Result<Vec<Demand>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM demands WHERE kind = ?1 AND deleted_at IS NULL ORDER BY created_at DESC, id",
            DEMAND_COLS
        ),
        params![kind.as_ref()],
    )
}

/// Update a demand of the given kind, merging kind-specific fields into the
/// stored details. Returns None if not found.
pub fn update_demand(
    conn: &Connection,
    kind: DemandKind,
    id: &str,
    input: &UpdateDemand,
) -> Result<Option<Demand>> {
    let Some(current) = get_demand_by_id(conn, kind, id)? else {
        return Ok(None);
    };

    let mut details = current.details;
    input.details.apply(&mut details)?;
    let details_json = serde_json::to_string(&details)?;

    UpdateBuilder::new("demands", id)
        .with_updated_at()
        .set_opt("title", input.title.as_deref().map(|t| t.trim().to_string()))
        .set_patch("customer_id", input.customer_id.clone())
        .set_opt("category", input.category.map(|c| c.as_ref().to_string()))
        .set_opt("status", input.status.map(|s| s.as_ref().to_string()))
        .set_opt("priority", input.priority.map(|p| p.as_ref().to_string()))
        .set_patch("description", input.description.clone())
        .set_patch("source", input.source.clone())
        .set_patch("budget", input.budget.clone())
        .set_patch("cost", input.cost.clone())
        .set("details", details_json)
        .execute_returning(conn, DEMAND_COLS)
}

pub fn soft_delete_demand(conn: &Connection, kind: DemandKind, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE demands SET deleted_at = ?1 WHERE id = ?2 AND kind = ?3 AND deleted_at IS NULL",
        params![now(), id, kind.as_ref()],
    )?;
    Ok(affected > 0)
}

pub fn get_deleted_demand_by_id(conn: &Connection, id: &str) -> Result<Option<Demand>> {
    get_deleted(conn, "demands", DEMAND_COLS, id)
}

// ============ Operation Logs ============

pub fn create_operation_log(conn: &Connection, entry: &OperationLog) -> Result<()> {
    let old_value = entry.old_value.as_ref().map(|v| v.to_string());
    let new_value = entry.new_value.as_ref().map(|v| v.to_string());

    conn.execute(
        "INSERT INTO operation_logs (id, timestamp, user_id, username, real_name, module, operation_type, description, target_id, request_method, request_path, ip_address, user_agent, success, error_message, old_value, new_value)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            &entry.id,
            entry.timestamp,
            &entry.user_id,
            &entry.username,
            &entry.real_name,
            &entry.module,
            entry.operation_type.as_ref(),
            &entry.description,
            &entry.target_id,
            &entry.request_method,
            &entry.request_path,
            &entry.ip_address,
            &entry.user_agent,
            entry.success as i32,
            &entry.error_message,
            &old_value,
            &new_value
        ],
    )?;
    Ok(())
}

pub fn query_operation_logs(
    conn: &Connection,
    query: &OperationLogQuery,
) -> Result<(Vec<OperationLog>, i64)> {
    let mut where_clause = String::from("WHERE 1=1");
    let mut filters: Vec<Value> = Vec::new();

    if let Some(ref v) = query.user_id {
        where_clause.push_str(" AND user_id = ?");
        filters.push(v.clone().into());
    }
    if let Some(ref v) = query.module {
        where_clause.push_str(" AND module = ?");
        filters.push(v.clone().into());
    }
    if let Some(v) = query.operation_type {
        where_clause.push_str(" AND operation_type = ?");
        filters.push(v.as_ref().to_string().into());
    }
    if let Some(v) = query.from_timestamp {
        where_clause.push_str(" AND timestamp >= ?");
        filters.push(v.into());
    }
    if let Some(v) = query.to_timestamp {
        where_clause.push_str(" AND timestamp <= ?");
        filters.push(v.into());
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM operation_logs {}", where_clause),
        rusqlite::params_from_iter(filters.iter()),
        |row| row.get(0),
    )?;

    let mut values = filters;
    values.push(query.limit().into());
    values.push(query.offset().into());
    let sql = format!(
        "SELECT {} FROM operation_logs {} ORDER BY timestamp DESC, rowid DESC LIMIT ? OFFSET ?",
        OPERATION_LOG_COLS, where_clause
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(rusqlite::params_from_iter(values), OperationLog::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((items, total))
}

/// Remove every log entry. Returns the number of entries removed.
pub fn clear_operation_logs(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM operation_logs", [])?;
    Ok(deleted)
}

// ============ Lookups ============

/// Ensure an optional department reference points at an active department.
pub fn ensure_department_exists(conn: &Connection, id: Option<&str>) -> Result<()> {
    match id {
        Some(id) if get_department_by_id(conn, id)?.is_none() => {
            Err(AppError::BadRequest(msg::UNKNOWN_DEPARTMENT.into()))
        }
        _ => Ok(()),
    }
}

/// Ensure an optional team reference points at an active team.
pub fn ensure_team_exists(conn: &Connection, id: Option<&str>) -> Result<()> {
    match id {
        Some(id) if get_team_by_id(conn, id)?.is_none() => Err(AppError::BadRequest(msg::UNKNOWN_TEAM.into())),
        _ => Ok(()),
    }
}
