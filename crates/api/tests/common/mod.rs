//! Shared harness for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tower::ServiceExt;

use offboardpro_api::auth::jwt::{generate_access_token, JwtConfig};
use offboardpro_api::auth::password::hash_password;
use offboardpro_api::config::ServerConfig;
use offboardpro_api::router::build_app_router;
use offboardpro_api::state::AppState;
use offboardpro_core::types::DbId;
use offboardpro_db::models::user::{CreateUser, User};
use offboardpro_db::repositories::{OrganizationRepo, OrganizationSetup, UserRepo};
use offboardpro_events::{BackgroundJob, JobQueue};

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const CRON_SECRET: &str = "test-cron-secret";

/// Build a test `ServerConfig` with safe defaults and known secrets.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        app_base_url: "http://localhost:5173".to_string(),
        survey_token_ttl_days: 30,
        paddle_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        cron_secret: Some(CRON_SECRET.to_string()),
    }
}

/// Full application router whose background jobs are drained and discarded.
pub fn build_test_app(pool: PgPool) -> Router {
    let (app, mut jobs) = build_test_app_with_jobs(pool);
    tokio::spawn(async move { while jobs.recv().await.is_some() {} });
    app
}

/// Full application router plus the receiving end of its job queue, so a
/// test can assert on what handlers submitted.
pub fn build_test_app_with_jobs(pool: PgPool) -> (Router, mpsc::Receiver<BackgroundJob>) {
    let config = test_config();
    let (jobs, receiver) = JobQueue::new(64);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        jobs,
    };
    (build_app_router(state, &config), receiver)
}

/// Every job currently sitting in the queue.
pub fn drain_jobs(receiver: &mut mpsc::Receiver<BackgroundJob>) -> Vec<BackgroundJob> {
    let mut jobs = Vec::new();
    while let Ok(job) = receiver.try_recv() {
        jobs.push(job);
    }
    jobs
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST without a body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// A seeded user with a valid access token.
pub struct Seeded {
    pub user: User,
    pub organization_id: DbId,
    pub token: String,
}

/// Create a user without an organization.
pub async fn seed_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name: "Test User".to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role: "user".to_string(),
        },
    )
    .await
    .unwrap()
}

/// Create a user, give them a fresh organization (which makes them its
/// admin) and issue an access token.
pub async fn seed_admin(pool: &PgPool, email: &str) -> Seeded {
    let user = seed_user(pool, email).await;
    let setup = OrganizationRepo::create_for_user(
        pool,
        "Acme",
        user.id,
        Utc::now() + Duration::days(14),
    )
    .await
    .unwrap();
    let OrganizationSetup::Created { organization, user } = setup else {
        panic!("organization setup failed: {setup:?}");
    };
    let token = token_for(&user);
    Seeded {
        organization_id: organization.id,
        user,
        token,
    }
}

/// Add a member with `role` to an existing organization.
pub async fn seed_member(pool: &PgPool, organization_id: DbId, email: &str, role: &str) -> Seeded {
    let user = seed_user(pool, email).await;
    sqlx::query("UPDATE users SET organization_id = $2, role = $3 WHERE id = $1")
        .bind(user.id)
        .bind(organization_id)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
    let user = UserRepo::find_by_id(pool, user.id).await.unwrap().unwrap();
    let token = token_for(&user);
    Seeded {
        user,
        organization_id,
        token,
    }
}

pub async fn deactivate(pool: &PgPool, user_id: DbId) {
    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn set_plan(pool: &PgPool, organization_id: DbId, plan: &str) {
    sqlx::query("UPDATE organizations SET subscription_plan = $2 WHERE id = $1")
        .bind(organization_id)
        .bind(plan)
        .execute(pool)
        .await
        .unwrap();
}

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.role, &test_config().jwt).unwrap()
}

/// Id of the seeded global "Standard Offboarding" template.
pub async fn standard_template_id(pool: &PgPool) -> DbId {
    sqlx::query_scalar(
        "SELECT id FROM templates WHERE organization_id IS NULL AND name = 'Standard Offboarding'",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Start an offboarding from the standard template through the API and
/// return the `data` object of the response.
pub async fn create_offboarding(app: Router, pool: &PgPool, token: &str) -> serde_json::Value {
    let template_id = standard_template_id(pool).await;
    let response = post_json_auth(
        app,
        "/api/offboardings",
        serde_json::json!({
            "employee_name": "Jamie Doe",
            "employee_email": "Jamie@Example.com",
            "department": "Engineering",
            "role_title": "Engineer",
            "last_working_day": "2026-03-31",
            "template_id": template_id,
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}
