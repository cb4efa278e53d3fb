mod common;

use assert_matches::assert_matches;
use sqlx::PgPool;
use offboardpro_db::models::oauth_connection::CreateOAuthConnection;
use offboardpro_db::repositories::{OAuthConnectionRepo, RevokeOutcome};

use common::seed_org_admin;

async fn connect(pool: &PgPool, org_id: i64, app: &str) -> i64 {
    OAuthConnectionRepo::create(
        pool,
        org_id,
        &CreateOAuthConnection {
            offboarding_id: None,
            app_name: app.to_string(),
            employee_email: "jamie@example.com".to_string(),
            scopes: Some("read".to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_all_writes_one_log_per_connection(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (other_org, _) = seed_org_admin(&pool, "other@beta.test").await;
    for app in ["Slack", "GitHub", "Notion"] {
        connect(&pool, org_id, app).await;
    }
    connect(&pool, other_org, "Slack").await;

    let revoked = OAuthConnectionRepo::revoke_all(&pool, org_id, admin.id).await.unwrap();
    assert_eq!(revoked.len(), 3);
    assert!(revoked.iter().all(|c| c.status == "revoked"
        && c.revocation_method.as_deref() == Some("bulk")
        && c.revoked_by == Some(admin.id)
        && c.version == 2));

    let logs = OAuthConnectionRepo::list_logs(&pool, org_id, 100, 0).await.unwrap();
    assert_eq!(logs.len(), 3);
    assert!(logs
        .iter()
        .all(|l| l.status_before == "active" && l.status_after == "revoked"));

    let untouched = OAuthConnectionRepo::list(&pool, other_org, Some("active")).await.unwrap();
    assert_eq!(untouched.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_all_with_nothing_active_writes_nothing(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;

    let revoked = OAuthConnectionRepo::revoke_all(&pool, org_id, admin.id).await.unwrap();
    assert!(revoked.is_empty());

    let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM revocation_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(logs, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_revoke_is_conditional(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let id = connect(&pool, org_id, "Slack").await;

    let outcome = OAuthConnectionRepo::revoke_one(&pool, id, org_id, admin.id).await.unwrap();
    assert_matches!(outcome, RevokeOutcome::Revoked(ref c) if c.revocation_method.as_deref() == Some("manual"));

    let outcome = OAuthConnectionRepo::revoke_one(&pool, id, org_id, admin.id).await.unwrap();
    assert_matches!(outcome, RevokeOutcome::AlreadyRevoked);

    let outcome = OAuthConnectionRepo::revoke_one(&pool, id + 1000, org_id, admin.id).await.unwrap();
    assert_matches!(outcome, RevokeOutcome::NotFound);

    let logs = OAuthConnectionRepo::list_logs(&pool, org_id, 100, 0).await.unwrap();
    assert_eq!(logs.len(), 1);
}
