use rusqlite::Connection;

/// Initialize the main database schema (everything except the operation log)
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Soft delete everywhere: deleted_at = timestamp when deleted, NULL = active

        CREATE TABLE IF NOT EXISTS departments (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            description TEXT,
            created_by TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        -- Codes are reusable once the department is deleted
        CREATE UNIQUE INDEX IF NOT EXISTS idx_departments_code ON departments(code) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            department_id TEXT NOT NULL REFERENCES departments(id),
            leader_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_teams_department ON teams(department_id);

        -- Users (employees). role is free text so an unknown stored value
        -- loads as "no role" instead of failing the row.
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            real_name TEXT NOT NULL,
            phone TEXT,
            email TEXT,
            role TEXT NOT NULL,
            department_id TEXT,
            team_id TEXT,
            status TEXT NOT NULL CHECK (status IN ('ENABLE', 'DISABLE')),
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users(username) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS idx_users_team ON users(team_id);

        -- Sessions: only the token hash is stored
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            role TEXT,
            team_id TEXT,
            department_id TEXT,
            created_at INTEGER NOT NULL,
            last_used_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

        CREATE TABLE IF NOT EXISTS gpu_models (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            brand TEXT NOT NULL,
            memory_gb INTEGER,
            cpu TEXT,
            ram_gb INTEGER,
            ib_card TEXT,
            nvme_ssd TEXT,
            network_adapter TEXT,
            power_supply TEXT,
            rental_price_min REAL,
            rental_price_max REAL,
            sale_price_min REAL,
            sale_price_max REAL,
            availability TEXT NOT NULL CHECK (availability IN ('AVAILABLE', 'SHORTAGE', 'UNAVAILABLE')),
            created_by TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );

        -- Owned entities: creator_id and team_id are set once at insert
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            company_name TEXT,
            contact_person TEXT,
            contact_phone TEXT,
            email TEXT,
            demand_preference TEXT,
            cooperation_stage TEXT,
            follow_up_status TEXT,
            assignee_id TEXT,
            creator_id TEXT NOT NULL,
            team_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_customers_creator ON customers(creator_id);
        CREATE INDEX IF NOT EXISTS idx_customers_team ON customers(team_id);

        CREATE TABLE IF NOT EXISTS companies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            industry TEXT,
            years INTEGER,
            capital TEXT,
            main_business TEXT,
            screenshot_url TEXT,
            creator_id TEXT NOT NULL,
            team_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_companies_creator ON companies(creator_id);
        CREATE INDEX IF NOT EXISTS idx_companies_team ON companies(team_id);

        -- All three demand kinds share one table; kind-specific fields live
        -- in the details JSON
        CREATE TABLE IF NOT EXISTS demands (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL CHECK (kind IN ('rental', 'purchase', 'project')),
            title TEXT NOT NULL,
            customer_id TEXT,
            category TEXT NOT NULL,
            status TEXT NOT NULL,
            priority TEXT NOT NULL,
            description TEXT,
            source TEXT,
            budget TEXT,
            cost TEXT,
            details TEXT NOT NULL,
            creator_id TEXT NOT NULL,
            team_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_demands_kind ON demands(kind) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS idx_demands_creator ON demands(creator_id);
        CREATE INDEX IF NOT EXISTS idx_demands_team ON demands(team_id);
        "#,
    )?;
    Ok(())
}

/// Initialize the operation log database schema (separate DB file)
/// Optimized for append-only workload with WAL mode
pub fn init_log_db(conn: &Connection) -> rusqlite::Result<()> {
    // WAL mode: writes are sequential appends
    // synchronous=NORMAL: safe with WAL, faster than FULL
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 1000;
        PRAGMA journal_size_limit = 67108864;

        CREATE TABLE IF NOT EXISTS operation_logs (
            id TEXT PRIMARY KEY,
            timestamp INTEGER NOT NULL,
            user_id TEXT,
            username TEXT,                        -- denormalized for display
            real_name TEXT,
            module TEXT NOT NULL,
            operation_type TEXT NOT NULL,
            description TEXT NOT NULL,
            target_id TEXT,
            request_method TEXT,
            request_path TEXT,
            ip_address TEXT,
            user_agent TEXT,
            success INTEGER NOT NULL DEFAULT 1,
            error_message TEXT,
            old_value TEXT,
            new_value TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_operation_logs_timestamp ON operation_logs(timestamp);
        CREATE INDEX IF NOT EXISTS idx_operation_logs_user ON operation_logs(user_id);
        CREATE INDEX IF NOT EXISTS idx_operation_logs_module ON operation_logs(module, timestamp DESC);
        "#,
    )?;
    Ok(())
}
