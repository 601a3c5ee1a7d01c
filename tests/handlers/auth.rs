//! Login, logout and session resolution over HTTP.

use axum::http::StatusCode;
use serde_json::json;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_login_returns_token_and_permissions() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "sam", Role::Sales, None);
    }
    let app = test_app(state);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "sam", "password": TEST_PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token in response");
    assert!(token.starts_with("crm_"));
    assert_eq!(body["user"]["username"], "sam");
    assert!(body["user"].get("password_hash").is_none(), "hash never serialized");
    assert_eq!(body["permissions"]["role"], "SALES");
    assert_eq!(body["permissions"]["can_clear_logs"], false);
}

#[tokio::test]
async fn test_login_wrong_password_is_401_and_logged() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "sam", Role::Sales, None);
    }
    let app = test_app(state.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "sam", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let log = state.log.get().unwrap();
    let (items, _) = queries::query_operation_logs(&log, &OperationLogQuery::default()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].operation_type, OperationType::Login);
    assert!(!items[0].success);
}

#[tokio::test]
async fn test_disabled_user_cannot_log_in() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        let user = create_test_user(&conn, "sam", Role::Sales, None);
        let input: UpdateUser = serde_json::from_value(json!({ "status": "DISABLE" })).unwrap();
        queries::update_user(&conn, &user.id, &input, None).unwrap();
    }
    let app = test_app(state);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "sam", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = test_app(create_test_app_state());

    for uri in ["/auth/me", "/customers", "/demands/rental", "/gpu-models", "/dashboard"] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "Unauthorized", "401 body is JSON for {}", uri);
    }

    let (status, _) = send(&app, "GET", "/customers", Some("crm_not-a-real-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_and_logout() {
    let state = create_test_app_state();
    let token = {
        let conn = state.db.get().unwrap();
        let dept = create_test_department(&conn, "Sales", "SALES");
        let team = create_test_team(&conn, &dept.id, "East");
        create_test_user(&conn, "max", Role::SalesManager, Some(&team.id));
        login(&conn, "max")
    };
    let app = test_app(state);

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actor"]["role"], "SALES_MANAGER");
    assert!(body["actor"]["team_id"].is_string());

    let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "session is gone after logout");
}

#[tokio::test]
async fn test_disabling_user_ends_live_session() {
    let state = create_test_app_state();
    let (user_id, token) = {
        let conn = state.db.get().unwrap();
        let user = create_test_user(&conn, "sam", Role::Sales, None);
        let token = login(&conn, "sam");
        (user.id, token)
    };
    let app = test_app(state.clone());

    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    {
        let conn = state.db.get().unwrap();
        let input: UpdateUser = serde_json::from_value(json!({ "status": "DISABLE" })).unwrap();
        queries::update_user(&conn, &user_id, &input, None).unwrap();
    }

    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_keeps_actor_from_login() {
    let state = create_test_app_state();
    let (user_id, token) = {
        let conn = state.db.get().unwrap();
        let user = create_test_user(&conn, "sam", Role::Sales, None);
        let token = login(&conn, "sam");
        (user.id, token)
    };
    let app = test_app(state.clone());

    // Promote behind the session's back
    {
        let conn = state.db.get().unwrap();
        let input: UpdateUser = serde_json::from_value(json!({ "role": "SALES_DIRECTOR" })).unwrap();
        queries::update_user(&conn, &user_id, &input, None).unwrap();
    }

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actor"]["role"], "SALES");
    assert_eq!(body["user"]["role"], "SALES_DIRECTOR");

    let (status, _) = send(&app, "GET", "/logs", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "old role holds until the next login");

    let fresh = {
        let conn = state.db.get().unwrap();
        login(&conn, "sam")
    };
    let (status, _) = send(&app, "GET", "/logs", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reassigning_employee_ends_live_session() {
    let state = create_test_app_state();
    let (user_id, admin_token, token) = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "admin", Role::Admin, None);
        let user = create_test_user(&conn, "sam", Role::Sales, None);
        (user.id, login(&conn, "admin"), login(&conn, "sam"))
    };
    let app = test_app(state);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/employees/{}", user_id),
        Some(&admin_token),
        Some(json!({ "real_name": "Sam Lee" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "unrelated edits keep the session");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/employees/{}", user_id),
        Some(&admin_token),
        Some(json!({ "role": "SALES_MANAGER" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_role_gets_no_access() {
    let state = create_test_app_state();
    let token = {
        let conn = state.db.get().unwrap();
        let user = create_test_user(&conn, "legacy", Role::Sales, None);
        create_test_customer(&conn, &user, "Own customer");
        conn.execute("UPDATE users SET role = 'INTERN' WHERE id = ?1", [&user.id])
            .unwrap();
        login(&conn, "legacy")
    };
    let app = test_app(state);

    let (status, body) = send(&app, "GET", "/customers", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0, "not even own rows are visible");

    let (_, body) = send(&app, "GET", "/me/permissions", Some(&token), None).await;
    assert!(body["modules"].as_array().unwrap().is_empty());
}

/// Accepts one fixed password for every account, standing in for an
/// external directory.
struct DirectoryVerifier;

impl gpucrm::identity::CredentialVerifier for DirectoryVerifier {
    fn verify(&self, _user: &User, password: &str) -> bool {
        password == "directory-pass"
    }
}

#[tokio::test]
async fn test_login_uses_configured_verifier() {
    let state = create_test_app_state().with_verifier(std::sync::Arc::new(DirectoryVerifier));
    {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "sam", Role::Sales, None);
    }
    let app = test_app(state);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "sam", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "stored hash is not consulted");

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "sam", "password": "directory-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
