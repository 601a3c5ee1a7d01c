//! Customer and company endpoints: row scoping, search and pagination.

use axum::http::StatusCode;
use serde_json::{Value, json};

#[path = "../common/mod.rs"]
mod common;
use common::*;

struct Org {
    admin: String,
    manager: String,
    sales: String,
    other_sales: String,
    sales_customer: String,
    other_customer: String,
}

/// Two teams: manager + sales in East, other_sales in West. Each sales user
/// owns one customer.
fn seed_org(state: &AppState) -> Org {
    let conn = state.db.get().unwrap();
    let dept = create_test_department(&conn, "Sales", "SALES");
    let east = create_test_team(&conn, &dept.id, "East");
    let west = create_test_team(&conn, &dept.id, "West");

    create_test_user(&conn, "admin", Role::Admin, None);
    create_test_user(&conn, "manager", Role::SalesManager, Some(&east.id));
    let sales = create_test_user(&conn, "sales", Role::Sales, Some(&east.id));
    let other = create_test_user(&conn, "other", Role::Sales, Some(&west.id));

    let sales_customer = create_test_customer(&conn, &sales, "Acme AI");
    let other_customer = create_test_customer(&conn, &other, "Westwind Render");

    Org {
        admin: login(&conn, "admin"),
        manager: login(&conn, "manager"),
        sales: login(&conn, "sales"),
        other_sales: login(&conn, "other"),
        sales_customer: sales_customer.id,
        other_customer: other_customer.id,
    }
}

fn ids(body: &Value) -> Vec<String> {
    let mut ids: Vec<String> = body["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_list_customers_scoped_by_role() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    let app = test_app(state);

    let (status, body) = send(&app, "GET", "/customers", Some(&org.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (_, body) = send(&app, "GET", "/customers", Some(&org.manager), None).await;
    assert_eq!(ids(&body), vec![org.sales_customer.clone()], "manager sees own team only");

    let (_, body) = send(&app, "GET", "/customers", Some(&org.sales), None).await;
    assert_eq!(ids(&body), vec![org.sales_customer.clone()]);

    let (_, body) = send(&app, "GET", "/customers", Some(&org.other_sales), None).await;
    assert_eq!(ids(&body), vec![org.other_customer.clone()]);
}

#[tokio::test]
async fn test_invisible_customer_is_not_found() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    let app = test_app(state);
    let uri = format!("/customers/{}", org.other_customer);

    let (status, body) = send(&app, "GET", &uri, Some(&org.sales), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"], "Customer not found");

    let (status, _) = send(&app, "PUT", &uri, Some(&org.sales), Some(json!({ "name": "Mine now" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(&org.sales), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", &uri, Some(&org.admin), None).await;
    assert_eq!(status, StatusCode::OK, "record untouched and visible to admin");
    assert_eq!(body["name"], "Westwind Render");
}

#[tokio::test]
async fn test_create_customer_owned_by_caller() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    let app = test_app(state);

    let (status, body) = send(
        &app,
        "POST",
        "/customers",
        Some(&org.other_sales),
        Some(json!({ "name": "New Lead", "creator_id": "someone-else" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let (_, me) = send(&app, "GET", "/auth/me", Some(&org.other_sales), None).await;
    assert_eq!(body["creator_id"], me["user"]["id"]);
    assert_eq!(body["team_id"], me["user"]["team_id"]);

    let (status, _) = send(&app, "GET", &format!("/customers/{}", id), Some(&org.manager), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "East manager cannot see West record");
}

#[tokio::test]
async fn test_create_customer_rejects_blank_name() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    let app = test_app(state);

    let (status, _) = send(&app, "POST", "/customers", Some(&org.sales), Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_customer_twice() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    let app = test_app(state);
    let uri = format!("/customers/{}", org.sales_customer);

    let (status, _) = send(&app, "DELETE", &uri, Some(&org.sales), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &uri, Some(&org.sales), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/customers", Some(&org.admin), None).await;
    assert_eq!(body["total"], 1, "deleted rows drop out of lists");
}

#[tokio::test]
async fn test_pagination_counts_only_visible_rows() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    {
        let conn = state.db.get().unwrap();
        let other = queries::get_user_by_username(&conn, "other").unwrap().unwrap();
        for i in 0..5 {
            create_test_customer(&conn, &other, &format!("West lead {}", i));
        }
    }
    let app = test_app(state);

    let (_, body) = send(&app, "GET", "/customers?limit=2&offset=0", Some(&org.sales), None).await;
    assert_eq!(body["total"], 1, "total counts rows after filtering");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/customers?limit=2&offset=2", Some(&org.other_sales), None).await;
    assert_eq!(body["total"], 6);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["offset"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_customers() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    let app = test_app(state);

    let (_, body) = send(&app, "GET", "/customers?q=acme", Some(&org.admin), None).await;
    assert_eq!(ids(&body), vec![org.sales_customer.clone()]);

    let (_, body) = send(&app, "GET", "/customers?q=westwind", Some(&org.sales), None).await;
    assert_eq!(body["total"], 0, "search never widens visibility");
}

#[tokio::test]
async fn test_company_scoping_matches_customers() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    let company_id = {
        let conn = state.db.get().unwrap();
        let sales = queries::get_user_by_username(&conn, "sales").unwrap().unwrap();
        create_test_company(&conn, &sales, "Acme Inc.").id
    };
    let app = test_app(state);
    let uri = format!("/companies/{}", company_id);

    let (status, _) = send(&app, "GET", &uri, Some(&org.manager), None).await;
    assert_eq!(status, StatusCode::OK, "same team");

    let (status, _) = send(&app, "GET", &uri, Some(&org.other_sales), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "PUT", &uri, Some(&org.sales), Some(json!({ "years": 7 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["years"], 7);

    let (status, _) = send(&app, "PUT", &uri, Some(&org.sales), Some(json!({ "years": -1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_counts_visible_rows() {
    let state = create_test_app_state();
    let org = seed_org(&state);
    let app = test_app(state);

    let (status, body) = send(&app, "GET", "/dashboard", Some(&org.sales), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customers"], 1);
    assert!(body.get("demands_by_status").is_none(), "status breakdown hidden from sales");

    let (_, body) = send(&app, "GET", "/dashboard", Some(&org.admin), None).await;
    assert_eq!(body["customers"], 2);
    assert!(body["demands_by_status"].is_object());
}
