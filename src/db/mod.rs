mod from_row;
mod schema;
pub mod queries;

pub use from_row::{FromRow, query_all, query_one};
pub use schema::{init_db, init_log_db};

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::identity::{CredentialVerifier, StoredPasswordVerifier};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding database pools and configuration
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (employees, org structure, catalog, CRM records)
    pub db: DbPool,
    /// Operation log database pool (separate file to isolate growth)
    pub log: DbPool,
    pub operation_log_enabled: bool,
    /// Checks login credentials
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    pub fn new(db: DbPool, log: DbPool, operation_log_enabled: bool) -> Self {
        Self {
            db,
            log,
            operation_log_enabled,
            verifier: Arc::new(StoredPasswordVerifier),
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
