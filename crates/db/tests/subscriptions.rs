mod common;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use offboardpro_core::entitlements::Plan;
use offboardpro_db::repositories::{OrganizationRepo, SubscriptionRepo, UserRepo};

use common::seed_org_admin;

#[sqlx::test(migrations = "../../db/migrations")]
async fn created_then_canceled_moves_plan(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let t0 = Utc::now();

    let user = SubscriptionRepo::apply_created(
        &pool, admin.id, "sub_123", Some("ctm_1"), "active", Plan::Professional, None, t0,
    )
    .await
    .unwrap()
    .expect("user exists");
    assert_eq!(user.paddle_subscription_id.as_deref(), Some("sub_123"));
    let org = OrganizationRepo::find_by_id(&pool, org_id).await.unwrap().unwrap();
    assert_eq!(org.subscription_plan, "professional");

    let canceled_at = t0 + Duration::seconds(5);
    let user = SubscriptionRepo::apply_canceled(&pool, "sub_123", canceled_at, canceled_at)
        .await
        .unwrap()
        .expect("subscription exists");
    assert_eq!(user.subscription_status.as_deref(), Some("canceled"));
    assert!(user.subscription_canceled_at.is_some());
    let org = OrganizationRepo::find_by_id(&pool, org_id).await.unwrap().unwrap();
    assert_eq!(org.subscription_plan, "starter");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_subscription_is_a_no_op(pool: PgPool) {
    let result = SubscriptionRepo::apply_canceled(&pool, "sub_missing", Utc::now(), Utc::now())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_event_is_skipped(pool: PgPool) {
    let (_, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let t0 = Utc::now();
    SubscriptionRepo::apply_created(
        &pool, admin.id, "sub_1", None, "active", Plan::Enterprise, None, t0,
    )
    .await
    .unwrap();

    let stale = SubscriptionRepo::apply_updated(
        &pool,
        "sub_1",
        "past_due",
        None,
        t0 - Duration::minutes(1),
    )
    .await
    .unwrap();
    assert!(stale.is_none());

    let user = UserRepo::find_by_id(&pool, admin.id).await.unwrap().unwrap();
    assert_eq!(user.subscription_status.as_deref(), Some("active"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_trials_are_downgraded(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    sqlx::query("UPDATE users SET trial_ends_at = NOW() - INTERVAL '1 day' WHERE id = $1")
        .bind(admin.id)
        .execute(&pool)
        .await
        .unwrap();
    let (_, ending_soon) = seed_org_admin(&pool, "soon@beta.test").await;
    sqlx::query("UPDATE users SET trial_ends_at = NOW() + INTERVAL '2 days' WHERE id = $1")
        .bind(ending_soon.id)
        .execute(&pool)
        .await
        .unwrap();

    let now = Utc::now();
    let downgraded = SubscriptionRepo::expire_trials(&pool, now).await.unwrap();
    assert_eq!(downgraded.len(), 1);
    assert_eq!(downgraded[0].id, admin.id);
    assert_eq!(downgraded[0].subscription_status.as_deref(), Some("expired"));

    let reminders = SubscriptionRepo::trials_ending_between(&pool, now, now + Duration::days(3))
        .await
        .unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].id, ending_soon.id);

    let org = OrganizationRepo::find_by_id(&pool, org_id).await.unwrap().unwrap();
    assert_eq!(org.subscription_plan, "starter");
}
