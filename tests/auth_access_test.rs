//! Route protection: bearer verification and the admin role gate.

mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN_TOKEN, SUPPLIER_TOKEN, USER_TOKEN};
use serde_json::json;

#[tokio::test]
async fn missing_token_is_unauthorized_everywhere() {
    let app = TestApp::new().await;

    for uri in [
        "/api/quotations",
        "/api/reports/rfqs",
        "/users",
        "/supplier/supplierdetails",
    ] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "GET {uri}");
    }
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/quotations", None, Some("forged-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn buyer_role_reaches_rfq_and_report_routes() {
    let app = TestApp::new().await;

    for uri in ["/api/quotations", "/api/reports/rfqs"] {
        let response = app.request(Method::GET, uri, None, Some(USER_TOKEN)).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }
}

#[tokio::test]
async fn non_admin_is_forbidden_on_account_routes() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/users", None, Some(USER_TOKEN)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn supplier_is_forbidden_on_buyer_routes() {
    let app = TestApp::new().await;

    for uri in ["/api/quotations", "/api/reports/rfqs"] {
        let response = app
            .request(Method::GET, uri, None, Some(SUPPLIER_TOKEN))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "GET {uri}");
    }
}

#[tokio::test]
async fn admin_reaches_admin_routes() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/quotations", None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/users", None, Some(ADMIN_TOKEN)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn supplier_sees_own_profile_but_not_admin_routes() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            "/supplier/supplierdetails",
            None,
            Some(SUPPLIER_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::response_json(response).await;
    assert_eq!(body["name"], "Acme Metals");
    assert_eq!(body["msmeStatus"], "MSME");

    let response = app
        .request(Method::GET, "/users", None, Some(SUPPLIER_TOKEN))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn supplier_cannot_edit_another_suppliers_profile() {
    let app = TestApp::new().await;

    let other = uuid::Uuid::new_v4();
    let response = app
        .request(
            Method::PUT,
            &format!("/supplier/update-supplier/{other}"),
            Some(json!({"phone": "+91 98765 43210"})),
            Some(SUPPLIER_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_is_open() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn self_deletion_is_a_validation_error() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::DELETE,
            "/delete-user",
            Some(json!({"uid": app.admin_uid})),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
