//! Test utilities and fixtures for GPU CRM integration tests

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

pub use gpucrm::db::{AppState, init_db, init_log_db, queries};
pub use gpucrm::handlers;
pub use gpucrm::identity::{self, StoredPasswordVerifier};
pub use gpucrm::models::*;

pub const TEST_PASSWORD: &str = "password123";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an in-memory operation log database with schema initialized
pub fn setup_test_log_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory log database");
    init_log_db(&conn).expect("Failed to initialize log schema");
    conn
}

pub fn create_test_department(conn: &Connection, name: &str, code: &str) -> Department {
    let input = CreateDepartment {
        name: name.to_string(),
        code: code.to_string(),
        description: None,
    };
    queries::create_department(conn, &input, None).expect("Failed to create test department")
}

pub fn create_test_team(conn: &Connection, department_id: &str, name: &str) -> Team {
    let input = CreateTeam {
        name: name.to_string(),
        department_id: department_id.to_string(),
        leader_id: None,
    };
    queries::create_team(conn, &input).expect("Failed to create test team")
}

/// Create an enabled employee with [`TEST_PASSWORD`]
pub fn create_test_user(conn: &Connection, username: &str, role: Role, team_id: Option<&str>) -> User {
    let input = CreateUser {
        username: username.to_string(),
        password: TEST_PASSWORD.to_string(),
        real_name: format!("Test {}", username),
        phone: None,
        email: None,
        role,
        department_id: None,
        team_id: team_id.map(String::from),
        status: UserStatus::Enable,
    };
    queries::create_user(conn, &input, &gpucrm::crypto::hash_password(TEST_PASSWORD))
        .expect("Failed to create test user")
}

pub fn create_test_customer(conn: &Connection, owner: &User, name: &str) -> Customer {
    let input: CreateCustomer =
        serde_json::from_value(serde_json::json!({ "name": name })).expect("Invalid customer payload");
    queries::create_customer(conn, &input, &Actor::from(owner)).expect("Failed to create test customer")
}

pub fn create_test_company(conn: &Connection, owner: &User, name: &str) -> Company {
    let input: CreateCompany =
        serde_json::from_value(serde_json::json!({ "name": name })).expect("Invalid company payload");
    queries::create_company(conn, &input, &Actor::from(owner)).expect("Failed to create test company")
}

pub fn create_test_gpu_model(conn: &Connection, name: &str) -> GpuModel {
    let input: CreateGpuModel = serde_json::from_value(serde_json::json!({
        "name": name,
        "brand": "NVIDIA",
        "rental_price_min": 100.0,
        "rental_price_max": 200.0
    }))
    .expect("Invalid GPU model payload");
    queries::create_gpu_model(conn, &input, None).expect("Failed to create test GPU model")
}

/// Create a demand with default category and status. `extra` is merged into
/// the body, e.g. `{"payment_method": "monthly"}` for rentals.
pub fn create_test_demand(
    conn: &Connection,
    owner: &User,
    kind: DemandKind,
    title: &str,
    extra: Value,
) -> Demand {
    let mut body = serde_json::json!({ "kind": kind.as_ref(), "title": title });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    let input: CreateDemand = serde_json::from_value(body).expect("Invalid demand payload");
    queries::create_demand(conn, &input, &Actor::from(owner)).expect("Failed to create test demand")
}

/// Open a session for `username` and return the bearer token
pub fn login(conn: &Connection, username: &str) -> String {
    identity::login(conn, &StoredPasswordVerifier, username, TEST_PASSWORD)
        .expect("Failed to log in test user")
        .token
}

/// Create an AppState for testing with in-memory databases.
///
/// Every in-memory connection is its own database, so each pool holds a
/// single connection. Tests must drop their connection before calling the app.
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    let log_manager = SqliteConnectionManager::memory();
    let log_pool = Pool::builder().max_size(1).build(log_manager).unwrap();
    {
        let conn = log_pool.get().unwrap();
        init_log_db(&conn).unwrap();
    }

    AppState::new(pool, log_pool, true)
}

pub fn test_app(state: AppState) -> Router {
    handlers::router(state.clone()).with_state(state)
}

/// Send a request and decode the JSON response body (Null when empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
