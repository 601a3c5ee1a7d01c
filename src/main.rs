use axum::Router;
use clap::Parser;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gpucrm::config::Config;
use gpucrm::crypto::hash_password;
use gpucrm::db::{AppState, create_pool, init_db, init_log_db, queries};
use gpucrm::handlers;
use gpucrm::models::{
    Actor, CreateCompany, CreateCustomer, CreateDemand, CreateDepartment, CreateGpuModel, CreateTeam,
    CreateUser, OperationType, Role, User, UserStatus,
};
use gpucrm::util::OperationLogBuilder;

#[derive(Parser, Debug)]
#[command(name = "gpucrm")]
#[command(about = "Role-gated CRM service for GPU-compute sales teams")]
struct Cli {
    /// Seed the database with dev data (org structure, sample users, catalog, records)
    #[arg(long)]
    seed: bool,

    /// Delete databases on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

fn bootstrap_first_admin(state: &AppState, username: &str, password: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");
    let log_conn = state.log.get().expect("Failed to get log db connection");

    let count = queries::count_users(&conn).expect("Failed to count users");
    if count > 0 {
        tracing::info!("Users already exist, skipping bootstrap");
        return;
    }

    let input = CreateUser {
        username: username.to_string(),
        password: password.to_string(),
        real_name: "Administrator".to_string(),
        phone: None,
        email: None,
        role: Role::Admin,
        department_id: None,
        team_id: None,
        status: UserStatus::Enable,
    };
    if let Err(e) = input.validate() {
        tracing::error!("Bootstrap admin rejected: {}", e);
        return;
    }

    let admin = queries::create_user(&conn, &input, &hash_password(password))
        .expect("Failed to create bootstrap admin");

    let headers = axum::http::HeaderMap::new();
    OperationLogBuilder::new(&log_conn, state.operation_log_enabled, &headers)
        .operation("employees", OperationType::Add)
        .target(&admin.id)
        .description(format!("bootstrapped administrator {}", admin.username))
        .save()
        .expect("Failed to create operation log for bootstrap");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP ADMIN CREATED: {}", admin.username);
    tracing::info!("============================================");
}

fn seed_user(
    conn: &rusqlite::Connection,
    username: &str,
    real_name: &str,
    role: Role,
    department_id: &str,
    team_id: Option<&str>,
) -> User {
    let input = CreateUser {
        username: username.to_string(),
        password: "password123".to_string(),
        real_name: real_name.to_string(),
        phone: None,
        email: Some(format!("{}@gpucrm.local", username)),
        role,
        department_id: Some(department_id.to_string()),
        team_id: team_id.map(String::from),
        status: UserStatus::Enable,
    };
    let user = queries::create_user(conn, &input, &hash_password(&input.password))
        .expect("Failed to create dev user");
    tracing::info!("User: {} ({}) role={}", user.username, user.real_name, role.as_ref());
    user
}

fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).expect("Invalid seed payload")
}

/// Seeds the database with dev data for testing.
/// Creates: departments, teams, one user per role, GPU catalog, customers,
/// companies and one demand of each kind.
/// Only runs in dev mode and when database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count = queries::count_users(&conn).expect("Failed to count users");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    // 1. Org structure
    let sales_dept = queries::create_department(
        &conn,
        &CreateDepartment {
            name: "Sales".to_string(),
            code: "SALES".to_string(),
            description: Some("GPU compute sales".to_string()),
        },
        None,
    )
    .expect("Failed to create dev department");

    let east = queries::create_team(
        &conn,
        &CreateTeam {
            name: "East Region".to_string(),
            department_id: sales_dept.id.clone(),
            leader_id: None,
        },
    )
    .expect("Failed to create dev team");
    let west = queries::create_team(
        &conn,
        &CreateTeam {
            name: "West Region".to_string(),
            department_id: sales_dept.id.clone(),
            leader_id: None,
        },
    )
    .expect("Failed to create dev team");

    tracing::info!("Department: {} with teams {}, {}", sales_dept.name, east.name, west.name);

    // 2. One user per role
    let admin = seed_user(&conn, "admin", "Ada Admin", Role::Admin, &sales_dept.id, None);
    seed_user(&conn, "director", "Dana Director", Role::SalesDirector, &sales_dept.id, None);
    let manager = seed_user(&conn, "manager", "Max Manager", Role::SalesManager, &sales_dept.id, Some(&east.id));
    let sales = seed_user(&conn, "sales", "Sam Sales", Role::Sales, &sales_dept.id, Some(&east.id));
    let west_sales = seed_user(&conn, "sales2", "Wes Sales", Role::Sales, &sales_dept.id, Some(&west.id));

    // 3. GPU catalog
    let h100: CreateGpuModel = from_json(json!({
        "name": "H100 SXM5 8-GPU",
        "brand": "NVIDIA",
        "memory_gb": 80,
        "cpu": "2x Xeon Platinum 8480+",
        "ram_gb": 2048,
        "ib_card": "8x ConnectX-7 400G",
        "rental_price_min": 18000.0,
        "rental_price_max": 22000.0,
        "sale_price_min": 250000.0,
        "sale_price_max": 280000.0
    }));
    let h100 = queries::create_gpu_model(&conn, &h100, Some(&admin.id)).expect("Failed to create GPU model");
    let a800: CreateGpuModel = from_json(json!({
        "name": "A800 PCIe 8-GPU",
        "brand": "NVIDIA",
        "memory_gb": 80,
        "availability": "SHORTAGE"
    }));
    queries::create_gpu_model(&conn, &a800, Some(&admin.id)).expect("Failed to create GPU model");

    // 4. Records owned by the sales users
    let sales_actor = Actor::from(&sales);
    let west_actor = Actor::from(&west_sales);

    let customer: CreateCustomer = from_json(json!({
        "name": "Acme AI Lab",
        "company_name": "Acme Inc.",
        "contact_person": "Li Wei",
        "cooperation_stage": "negotiating"
    }));
    let customer = queries::create_customer(&conn, &customer, &sales_actor).expect("Failed to create customer");
    let other: CreateCustomer = from_json(json!({ "name": "Westwind Render Farm" }));
    queries::create_customer(&conn, &other, &west_actor).expect("Failed to create customer");

    let company: CreateCompany = from_json(json!({
        "name": "Acme Inc.",
        "industry": "Machine learning",
        "years": 6
    }));
    queries::create_company(&conn, &company, &sales_actor).expect("Failed to create company");

    let demands = [
        json!({ "kind": "rental", "title": "H100 cluster for LLM pretraining", "customer_id": customer.id,
                "gpu_model_id": h100.id, "server_count": 16, "rental_period": "12 months",
                "payment_method": "quarterly prepay" }),
        json!({ "kind": "purchase", "title": "Inference fleet refresh", "customer_id": customer.id,
                "gpu_model_id": h100.id, "server_count": 4 }),
        json!({ "kind": "project", "title": "Managed training platform", "customer_id": customer.id,
                "project_name": "Acme Train", "project_duration": "6 months" }),
    ];
    for demand in demands {
        let input: CreateDemand = from_json(demand);
        queries::create_demand(&conn, &input, &sales_actor).expect("Failed to create demand");
    }

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("Manager {} leads team {}", manager.username, east.name);
    tracing::info!("============================================");

    println!();
    println!("--- DEV ACCOUNTS (password: password123) ---");
    println!("  admin, director, manager, sales, sales2");
    println!("--- END ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gpucrm=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let log_pool = create_pool(&config.log_database_path).expect("Failed to create log database pool");

    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = log_pool.get().expect("Failed to get log connection");
        init_log_db(&conn).expect("Failed to initialize log database");
    }

    let state = AppState::new(db_pool, log_pool, config.operation_log_enabled);

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set GPUCRM_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    if let (Some(username), Some(password)) =
        (&config.bootstrap_admin_username, &config.bootstrap_admin_password)
    {
        bootstrap_first_admin(&state, username, password);
    }

    let app = Router::new()
        .merge(handlers::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();
    let log_path = config.log_database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: databases will be deleted on exit");
    }

    tracing::info!("GPU CRM listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral databases...");
        for path in [&db_path, &log_path] {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove {}: {}", path, e);
            } else {
                tracing::info!("Removed {}", path);
            }
            let _ = std::fs::remove_file(format!("{}-wal", path));
            let _ = std::fs::remove_file(format!("{}-shm", path));
        }
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
