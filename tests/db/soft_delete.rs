//! Tests for soft delete: records are flagged, never physically removed

#[path = "../common/mod.rs"]
mod common;

use common::*;
use serde_json::json;

fn row_count(conn: &rusqlite::Connection, table: &str, id: &str) -> i64 {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", table),
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn test_soft_delete_customer_keeps_row() {
    let conn = setup_test_db();
    let sales = create_test_user(&conn, "sam", Role::Sales, None);
    let customer = create_test_customer(&conn, &sales, "Acme");

    assert!(queries::soft_delete_customer(&conn, &customer.id).unwrap());

    assert!(queries::get_customer_by_id(&conn, &customer.id).unwrap().is_none());
    assert!(queries::list_customers(&conn).unwrap().is_empty());
    assert_eq!(row_count(&conn, "customers", &customer.id), 1, "row must remain");

    let deleted = queries::get_deleted_customer_by_id(&conn, &customer.id)
        .unwrap()
        .expect("deleted customer should be inspectable");
    assert!(deleted.lifecycle.is_deleted());
    assert!(deleted.lifecycle.deleted_at().is_some());
}

#[test]
fn test_soft_delete_is_idempotent() {
    let conn = setup_test_db();
    let sales = create_test_user(&conn, "sam", Role::Sales, None);
    let company = create_test_company(&conn, &sales, "Acme Inc.");

    assert!(queries::soft_delete_company(&conn, &company.id).unwrap());
    let first = queries::get_deleted_company_by_id(&conn, &company.id)
        .unwrap()
        .unwrap()
        .lifecycle;

    assert!(
        !queries::soft_delete_company(&conn, &company.id).unwrap(),
        "second delete reports nothing changed"
    );
    let second = queries::get_deleted_company_by_id(&conn, &company.id)
        .unwrap()
        .unwrap()
        .lifecycle;
    assert_eq!(first, second, "original deletion timestamp is kept");
}

#[test]
fn test_soft_delete_missing_returns_false() {
    let conn = setup_test_db();
    assert!(!queries::soft_delete_customer(&conn, "does-not-exist").unwrap());
    assert!(!queries::soft_delete_demand(&conn, DemandKind::Rental, "does-not-exist").unwrap());
}

#[test]
fn test_deleted_demand_not_updatable() {
    let conn = setup_test_db();
    let sales = create_test_user(&conn, "sam", Role::Sales, None);
    let demand = create_test_demand(&conn, &sales, DemandKind::Rental, "H100", json!({}));
    assert!(queries::soft_delete_demand(&conn, DemandKind::Rental, &demand.id).unwrap());

    let input: UpdateDemand = serde_json::from_value(json!({ "title": "revived" })).unwrap();
    assert!(
        queries::update_demand(&conn, DemandKind::Rental, &demand.id, &input)
            .unwrap()
            .is_none()
    );
    assert_eq!(row_count(&conn, "demands", &demand.id), 1);
    assert!(queries::get_deleted_demand_by_id(&conn, &demand.id).unwrap().is_some());
}

#[test]
fn test_soft_delete_user_revokes_sessions() {
    let conn = setup_test_db();
    create_test_user(&conn, "sam", Role::Sales, None);
    let token = login(&conn, "sam");

    let (_, user) = identity::resolve_actor(&conn, &token).unwrap().expect("session is live");
    assert!(queries::soft_delete_user(&conn, &user.id).unwrap());

    assert!(identity::resolve_actor(&conn, &token).unwrap().is_none());
    assert!(queries::get_user_by_username(&conn, "sam").unwrap().is_none());
    assert!(queries::get_deleted_user_by_id(&conn, &user.id).unwrap().is_some());
}

#[test]
fn test_deleted_gpu_model_excluded_from_names() {
    let conn = setup_test_db();
    let model = create_test_gpu_model(&conn, "V100");
    assert!(queries::soft_delete_gpu_model(&conn, &model.id).unwrap());

    assert!(queries::gpu_model_names(&conn).unwrap().is_empty());
    assert!(queries::list_gpu_models(&conn).unwrap().is_empty());
    assert!(queries::get_deleted_gpu_model_by_id(&conn, &model.id).unwrap().is_some());
}

#[test]
fn test_soft_delete_department_and_team() {
    let conn = setup_test_db();
    let dept = create_test_department(&conn, "Sales", "SALES");
    let team = create_test_team(&conn, &dept.id, "East");

    assert!(queries::soft_delete_team(&conn, &team.id).unwrap());
    assert!(queries::list_teams(&conn).unwrap().is_empty());

    assert!(queries::soft_delete_department(&conn, &dept.id).unwrap());
    assert!(queries::get_department_by_id(&conn, &dept.id).unwrap().is_none());
    let deleted = queries::get_deleted_department_by_id(&conn, &dept.id)
        .unwrap()
        .expect("deleted department should be inspectable");
    assert_eq!(deleted.code, "SALES");
}
