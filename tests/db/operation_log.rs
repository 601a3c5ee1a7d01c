//! Operation log storage: filtering, paging and clearing

#[path = "../common/mod.rs"]
mod common;

use axum::http::HeaderMap;
use common::*;
use gpucrm::util::OperationLogBuilder;

fn record(conn: &rusqlite::Connection, user: &User, module: &str, op: OperationType) {
    let headers = HeaderMap::new();
    OperationLogBuilder::new(conn, true, &headers)
        .user(user)
        .operation(module, op)
        .description(format!("{} {}", op.as_ref(), module))
        .save()
        .expect("Failed to write log entry");
}

#[test]
fn test_query_filters_by_module_and_type() {
    let db = setup_test_db();
    let log = setup_test_log_db();
    let alice = create_test_user(&db, "alice", Role::Sales, None);
    let bob = create_test_user(&db, "bob", Role::Sales, None);

    record(&log, &alice, "customers", OperationType::Add);
    record(&log, &alice, "customers", OperationType::Update);
    record(&log, &bob, "demands", OperationType::Add);

    let all = OperationLogQuery::default();
    let (items, total) = queries::query_operation_logs(&log, &all).unwrap();
    assert_eq!(total, 3);
    assert_eq!(items.len(), 3);

    let by_module = OperationLogQuery {
        module: Some("customers".to_string()),
        ..Default::default()
    };
    assert_eq!(queries::query_operation_logs(&log, &by_module).unwrap().1, 2);

    let by_user_and_type = OperationLogQuery {
        user_id: Some(alice.id.clone()),
        operation_type: Some(OperationType::Add),
        ..Default::default()
    };
    let (items, total) = queries::query_operation_logs(&log, &by_user_and_type).unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].username.as_deref(), Some("alice"));
    assert_eq!(items[0].module, "customers");
}

#[test]
fn test_query_pages_with_total() {
    let db = setup_test_db();
    let log = setup_test_log_db();
    let alice = create_test_user(&db, "alice", Role::Sales, None);
    for _ in 0..5 {
        record(&log, &alice, "customers", OperationType::Add);
    }

    let page = OperationLogQuery {
        limit: Some(2),
        offset: Some(4),
        ..Default::default()
    };
    let (items, total) = queries::query_operation_logs(&log, &page).unwrap();
    assert_eq!(total, 5, "total ignores paging");
    assert_eq!(items.len(), 1);
}

#[test]
fn test_clear_removes_everything() {
    let db = setup_test_db();
    let log = setup_test_log_db();
    let alice = create_test_user(&db, "alice", Role::Admin, None);
    record(&log, &alice, "customers", OperationType::Add);
    record(&log, &alice, "demands", OperationType::Delete);

    assert_eq!(queries::clear_operation_logs(&log).unwrap(), 2);
    assert_eq!(
        queries::query_operation_logs(&log, &OperationLogQuery::default()).unwrap().1,
        0
    );
}

#[test]
fn test_disabled_builder_writes_nothing() {
    let log = setup_test_log_db();
    let headers = HeaderMap::new();

    let entry = OperationLogBuilder::new(&log, false, &headers)
        .operation("customers", OperationType::Add)
        .description("not persisted")
        .save()
        .unwrap();

    assert!(entry.success);
    assert_eq!(
        queries::query_operation_logs(&log, &OperationLogQuery::default()).unwrap().1,
        0
    );
}
