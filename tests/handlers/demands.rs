//! Demand endpoints: kind routing, field redaction and restricted edits.

use axum::http::StatusCode;
use serde_json::json;

#[path = "../common/mod.rs"]
mod common;
use common::*;

struct Tokens {
    director: String,
    manager: String,
    sales: String,
}

fn seed(state: &AppState) -> Tokens {
    let conn = state.db.get().unwrap();
    let dept = create_test_department(&conn, "Sales", "SALES");
    let team = create_test_team(&conn, &dept.id, "East");
    create_test_user(&conn, "director", Role::SalesDirector, None);
    create_test_user(&conn, "manager", Role::SalesManager, Some(&team.id));
    create_test_user(&conn, "sales", Role::Sales, Some(&team.id));
    Tokens {
        director: login(&conn, "director"),
        manager: login(&conn, "manager"),
        sales: login(&conn, "sales"),
    }
}

#[tokio::test]
async fn test_sales_creates_rental_with_defaults() {
    let state = create_test_app_state();
    let t = seed(&state);
    let gpu_id = {
        let conn = state.db.get().unwrap();
        create_test_gpu_model(&conn, "H100 SXM5").id
    };
    let app = test_app(state);

    let (status, body) = send(
        &app,
        "POST",
        "/demands/rental",
        Some(&t.sales),
        Some(json!({
            "title": "H100 for pretraining",
            "gpu_model_id": gpu_id,
            "server_count": 16,
            "payment_method": "quarterly"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["kind"], "rental");
    assert_eq!(body["gpu_model_name"], "H100 SXM5");
    assert!(body.get("category").is_none(), "category hidden from sales");
    assert!(body.get("status").is_none(), "status hidden from sales");
    assert!(body.get("payment_method").is_none(), "payment method hidden from sales");

    let id = body["id"].as_str().unwrap();
    let (_, body) = send(&app, "GET", &format!("/demands/rental/{}", id), Some(&t.director), None).await;
    assert_eq!(body["category"], "POTENTIAL");
    assert_eq!(body["status"], "PENDING_REVIEW");
    assert_eq!(body["payment_method"], "quarterly");
}

#[tokio::test]
async fn test_sales_cannot_set_category_or_status() {
    let state = create_test_app_state();
    let t = seed(&state);
    let app = test_app(state);

    let (status, body) = send(
        &app,
        "POST",
        "/demands/purchase",
        Some(&t.sales),
        Some(json!({ "title": "A800 x4", "category": "STRATEGIC" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _) = send(
        &app,
        "POST",
        "/demands/purchase",
        Some(&t.sales),
        Some(json!({ "title": "A800 x4", "status": "APPROVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_manager_edits_category_but_not_status() {
    let state = create_test_app_state();
    let t = seed(&state);
    let demand_id = {
        let conn = state.db.get().unwrap();
        let sales = queries::get_user_by_username(&conn, "sales").unwrap().unwrap();
        create_test_demand(&conn, &sales, DemandKind::Project, "Training platform", json!({})).id
    };
    let app = test_app(state);
    let uri = format!("/demands/project/{}", demand_id);

    let (status, body) = send(&app, "PUT", &uri, Some(&t.manager), Some(json!({ "category": "STRATEGIC" }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["category"], "STRATEGIC");
    assert!(body.get("status").is_none(), "manager still cannot see status");

    let (status, _) = send(&app, "PUT", &uri, Some(&t.manager), Some(json!({ "status": "APPROVED" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PUT", &uri, Some(&t.director), Some(json!({ "status": "APPROVED" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");
}

#[tokio::test]
async fn test_kind_mismatch_and_unknown_kind() {
    let state = create_test_app_state();
    let t = seed(&state);
    let app = test_app(state);

    let (status, body) = send(
        &app,
        "POST",
        "/demands/rental",
        Some(&t.sales),
        Some(json!({ "kind": "project", "title": "Wrong kind" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Details do not match the demand kind");

    let (status, _) = send(&app, "GET", "/demands/leasing", Some(&t.sales), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_demand_not_found_under_other_kind() {
    let state = create_test_app_state();
    let t = seed(&state);
    let demand_id = {
        let conn = state.db.get().unwrap();
        let sales = queries::get_user_by_username(&conn, "sales").unwrap().unwrap();
        create_test_demand(&conn, &sales, DemandKind::Rental, "H100", json!({})).id
    };
    let app = test_app(state);

    let (status, _) = send(&app, "GET", &format!("/demands/purchase/{}", demand_id), Some(&t.sales), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manager_lists_team_demands_regardless_of_creator() {
    let state = create_test_app_state();
    let t = seed(&state);
    {
        let conn = state.db.get().unwrap();
        let sales = queries::get_user_by_username(&conn, "sales").unwrap().unwrap();
        let customer = create_test_customer(&conn, &sales, "Acme");
        create_test_demand(
            &conn,
            &sales,
            DemandKind::Rental,
            "H100 cluster",
            json!({ "customer_id": customer.id }),
        );
    }
    let app = test_app(state);

    let (status, body) = send(&app, "GET", "/demands/rental", Some(&t.manager), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["customer_name"], "Acme");
    assert_eq!(body["items"][0]["category"], "POTENTIAL");
    assert!(body["items"][0].get("status").is_none());
}

#[tokio::test]
async fn test_update_rejects_fields_of_other_kinds() {
    let state = create_test_app_state();
    let t = seed(&state);
    let demand_id = {
        let conn = state.db.get().unwrap();
        let sales = queries::get_user_by_username(&conn, "sales").unwrap().unwrap();
        create_test_demand(&conn, &sales, DemandKind::Purchase, "A800", json!({})).id
    };
    let app = test_app(state);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/demands/purchase/{}", demand_id),
        Some(&t.sales),
        Some(json!({ "project_name": "Nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// A customer owned by a salesperson on another team, invisible to `sales`.
fn create_west_customer(state: &AppState, name: &str) -> String {
    let conn = state.db.get().unwrap();
    let dept = create_test_department(&conn, "Overseas", "OVERSEAS");
    let west = create_test_team(&conn, &dept.id, "West");
    let owner = create_test_user(&conn, "west_sales", Role::Sales, Some(&west.id));
    create_test_customer(&conn, &owner, name).id
}

#[tokio::test]
async fn test_cannot_link_demand_to_invisible_customer() {
    let state = create_test_app_state();
    let t = seed(&state);
    let secret_id = create_west_customer(&state, "Secret West Customer");
    let own_id = {
        let conn = state.db.get().unwrap();
        let sales = queries::get_user_by_username(&conn, "sales").unwrap().unwrap();
        create_test_demand(&conn, &sales, DemandKind::Purchase, "A800 x4", json!({})).id
    };
    let app = test_app(state);

    let (status, _) = send(&app, "GET", &format!("/customers/{}", secret_id), Some(&t.sales), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/demands/purchase",
        Some(&t.sales),
        Some(json!({ "title": "x", "customer_id": secret_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!body.to_string().contains("Secret West Customer"));

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/demands/purchase/{}", own_id),
        Some(&t.sales),
        Some(json!({ "customer_id": secret_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The director sees every customer, so the same link is accepted
    let (status, body) = send(
        &app,
        "POST",
        "/demands/purchase",
        Some(&t.director),
        Some(json!({ "title": "y", "customer_id": secret_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["customer_name"], "Secret West Customer");
}

#[tokio::test]
async fn test_invisible_customer_name_is_not_resolved() {
    let state = create_test_app_state();
    let t = seed(&state);
    let secret_id = create_west_customer(&state, "Secret West Customer");
    let demand_id = {
        let conn = state.db.get().unwrap();
        let sales = queries::get_user_by_username(&conn, "sales").unwrap().unwrap();
        create_test_demand(
            &conn,
            &sales,
            DemandKind::Rental,
            "H100 cluster",
            json!({ "customer_id": secret_id }),
        )
        .id
    };
    let app = test_app(state);

    let (status, body) = send(&app, "GET", &format!("/demands/rental/{}", demand_id), Some(&t.sales), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer_name"], serde_json::Value::Null);

    let (_, body) = send(&app, "GET", "/demands/rental", Some(&t.sales), None).await;
    assert_eq!(body["items"][0]["customer_name"], serde_json::Value::Null);

    let (_, body) = send(&app, "GET", "/demands/rental?q=secret", Some(&t.sales), None).await;
    assert_eq!(body["total"], 0, "search must not match names the caller cannot see");

    let (_, body) = send(&app, "GET", "/demands/rental?q=secret", Some(&t.director), None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["customer_name"], "Secret West Customer");
}

#[tokio::test]
async fn test_search_demands_by_customer_name() {
    let state = create_test_app_state();
    let t = seed(&state);
    {
        let conn = state.db.get().unwrap();
        let sales = queries::get_user_by_username(&conn, "sales").unwrap().unwrap();
        let acme = create_test_customer(&conn, &sales, "Acme AI Labs");
        create_test_demand(&conn, &sales, DemandKind::Project, "Inference rollout", json!({ "customer_id": acme.id }));
        create_test_demand(&conn, &sales, DemandKind::Project, "Acme-free pilot", json!({}));
        create_test_demand(&conn, &sales, DemandKind::Project, "Unrelated", json!({}));
    }
    let app = test_app(state);

    let (status, body) = send(&app, "GET", "/demands/project?q=ACME", Some(&t.sales), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2, "matches title or customer name: {}", body);
}
