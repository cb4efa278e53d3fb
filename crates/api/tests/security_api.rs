//! HTTP-level tests for OAuth connection tracking and revocation.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{
    body_json, create_offboarding, drain_jobs, get_auth, post_auth, post_json_auth, seed_admin,
    seed_member, Seeded,
};
use offboardpro_events::BackgroundJob;
use serde_json::json;
use sqlx::PgPool;

async fn add_connection(app: axum::Router, who: &Seeded, app_name: &str) -> i64 {
    let response = post_json_auth(
        app,
        "/api/security/connections",
        json!({ "app_name": app_name, "employee_email": "Jamie@Example.com", "scopes": "repo read:org" }),
        &who.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_all_revokes_active_connections_and_logs(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let (app, mut jobs) = common::build_test_app_with_jobs(pool.clone());
    add_connection(app.clone(), &admin, "GitHub").await;
    add_connection(app.clone(), &admin, "Slack").await;

    let response = post_auth(app.clone(), "/api/security/revoke-all", &admin.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["revokedCount"], 2);

    let queued = drain_jobs(&mut jobs);
    assert_eq!(queued.len(), 1);
    assert_matches!(&queued[0], BackgroundJob::SendEmail(email) if email.to == "admin@acme.test");

    let response = get_auth(app.clone(), "/api/security/connections?status=active", &admin.token).await;
    assert_eq!(body_json(response).await["data"], json!([]));

    let response = get_auth(app.clone(), "/api/security/revocation-logs", &admin.token).await;
    let logs = body_json(response).await["data"].clone();
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l["status_before"] == "active"));
    assert!(logs.iter().all(|l| l["revoked_by"] == admin.user.id));

    // Nothing left to revoke: no alert.
    let response = post_auth(app, "/api/security/revoke-all", &admin.token).await;
    assert_eq!(body_json(response).await["revokedCount"], 0);
    assert!(drain_jobs(&mut jobs).is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_all_leaves_other_organizations_alone(pool: PgPool) {
    let acme = seed_admin(&pool, "admin@acme.test").await;
    let other = seed_admin(&pool, "admin@other.test").await;
    let app = common::build_test_app(pool.clone());
    add_connection(app.clone(), &other, "GitHub").await;

    let response = post_auth(app.clone(), "/api/security/revoke-all", &acme.token).await;
    assert_eq!(body_json(response).await["revokedCount"], 0);

    let response = get_auth(app, "/api/security/connections?status=active", &other.token).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn single_revocation_is_not_repeatable(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let it = seed_member(&pool, admin.organization_id, "it@acme.test", "it_manager").await;
    let app = common::build_test_app(pool.clone());
    let id = add_connection(app.clone(), &it, "Notion").await;

    let uri = format!("/api/security/connections/{id}/revoke");
    let response = post_auth(app.clone(), &uri, &it.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["connection"]["status"], "revoked");
    assert_eq!(json["connection"]["revocation_method"], "manual");

    let response = post_auth(app.clone(), &uri, &it.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_auth(app, "/api/security/connections/999999/revoke", &it.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn connection_management_requires_security_role(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let hr = seed_member(&pool, admin.organization_id, "hr@acme.test", "hr_manager").await;
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app.clone(),
        "/api/security/connections",
        json!({ "app_name": "GitHub", "employee_email": "jamie@example.com" }),
        &hr.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let id = add_connection(app.clone(), &admin, "GitHub").await;
    let response = post_auth(app.clone(), &format!("/api/security/connections/{id}/revoke"), &hr.token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let user = seed_member(&pool, admin.organization_id, "user@acme.test", "user").await;
    let response = post_auth(app.clone(), "/api/security/revoke-all", &user.token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let status: String = sqlx::query_scalar("SELECT status FROM oauth_connections WHERE id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "active");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn connection_input_is_validated(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let other = seed_admin(&pool, "admin@other.test").await;
    let app = common::build_test_app(pool.clone());
    let foreign = create_offboarding(app.clone(), &pool, &other.token).await;

    let response = post_json_auth(
        app.clone(),
        "/api/security/connections",
        json!({ "app_name": " ", "employee_email": "jamie@example.com" }),
        &admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.clone(),
        "/api/security/connections",
        json!({ "app_name": "GitHub", "employee_email": "jamie@example.com", "offboarding_id": foreign["id"] }),
        &admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(app, "/api/security/connections?status=paused", &admin.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
