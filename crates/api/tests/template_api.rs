//! HTTP-level tests for templates: visibility, role gate and plan cap.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json_auth, seed_admin, seed_member, standard_template_id};
use serde_json::json;
use sqlx::PgPool;

fn template_body(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "description": "Engineering exits",
        "tasks": [
            { "name": "Revoke GitHub access", "department": "IT", "due_offset_days": 0, "priority": "High" },
            { "name": "Hand over on-call", "department": "Engineering", "due_offset_days": 2 },
        ],
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn global_template_is_visible_to_every_organization(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let template_id = standard_template_id(&pool).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app.clone(), "/api/templates", &admin.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    let list = data.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert!(list[0]["organization_id"].is_null());
    assert_eq!(list[0]["tasks"].as_array().unwrap().len(), 7);

    let response = get_auth(app, &format!("/api/templates/{template_id}"), &admin.token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn hr_manager_creates_an_organization_template(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let hr = seed_member(&pool, admin.organization_id, "hr@acme.test", "hr_manager").await;
    let other = seed_admin(&pool, "admin@other.test").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app.clone(), "/api/templates", template_body("Engineering"), &hr.token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["organization_id"], admin.organization_id);
    let tasks = data["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1]["priority"], "Medium");
    assert_eq!(tasks[1]["order_index"], 1);

    // Another organization cannot see it.
    let id = data["id"].as_i64().unwrap();
    let response = get_auth(app, &format!("/api/templates/{id}"), &other.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn plain_members_cannot_create_templates(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let it = seed_member(&pool, admin.organization_id, "it@acme.test", "it_manager").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app, "/api/templates", template_body("Nope"), &it.token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn template_input_is_validated(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let app = common::build_test_app(pool);

    let empty = json!({ "name": "Empty", "tasks": [] });
    let response = post_json_auth(app.clone(), "/api/templates", empty, &admin.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bad_priority = json!({
        "name": "Loud",
        "tasks": [{ "name": "Shout", "department": "IT", "priority": "urgent" }],
    });
    let response = post_json_auth(app, "/api/templates", bad_priority, &admin.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn due_offset_out_of_range_is_rejected(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let app = common::build_test_app(pool);

    for offset in [i64::from(i32::MAX), 3651, -1] {
        let body = json!({
            "name": "Far future",
            "tasks": [{ "name": "Someday", "department": "IT", "due_offset_days": offset }],
        });
        let response = post_json_auth(app.clone(), "/api/templates", body, &admin.token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    let response = get_auth(app, "/api/templates", &admin.token).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn starter_plan_caps_templates(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@acme.test").await;
    let app = common::build_test_app(pool);

    for i in 0..3 {
        let response = post_json_auth(
            app.clone(),
            "/api/templates",
            template_body(&format!("Template {i}")),
            &admin.token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = post_json_auth(app, "/api/templates", template_body("Fourth"), &admin.token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
