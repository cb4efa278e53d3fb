mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use offboardpro_core::survey::TokenState;
use offboardpro_db::models::survey::{IssueToken, SurveyAnswers};
use offboardpro_db::repositories::{
    ExitSurveyRepo, FinalizeOutcome, OffboardingRepo, SubmitOutcome, SurveyTokenRepo,
};

use common::{seed_offboarding, seed_org_admin};

fn answers() -> SurveyAnswers {
    SurveyAnswers {
        departure_reason: "Compensation".to_string(),
        likelihood_to_recommend: 8,
        would_return: true,
        would_return_reason: None,
        suggestions: Some("More remote days".to_string()),
    }
}

fn issue(offboarding_id: i64, organization_id: i64, ttl_days: i64) -> IssueToken {
    IssueToken {
        offboarding_id,
        organization_id,
        employee_email: "jamie@example.com".to_string(),
        employee_name: "Jamie Doe".to_string(),
        ttl_days,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pending_token_is_reused(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (offboarding, _) = seed_offboarding(&pool, org_id, admin.id, 1).await;
    let now = Utc::now();

    let first = SurveyTokenRepo::create_or_reuse(&pool, org_id, &issue(offboarding.id, org_id, 30), now)
        .await
        .unwrap()
        .unwrap();
    let second = SurveyTokenRepo::create_or_reuse(&pool, org_id, &issue(offboarding.id, org_id, 30), now)
        .await
        .unwrap()
        .unwrap();

    assert!(first.fresh);
    assert!(!second.fresh);
    assert_eq!(first.token.token, second.token.token);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_token_is_replaced(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (offboarding, _) = seed_offboarding(&pool, org_id, admin.id, 1).await;
    let issued_at = Utc::now() - Duration::days(10);

    let old = SurveyTokenRepo::create_or_reuse(&pool, org_id, &issue(offboarding.id, org_id, 1), issued_at)
        .await
        .unwrap()
        .unwrap();
    let new = SurveyTokenRepo::create_or_reuse(&pool, org_id, &issue(offboarding.id, org_id, 30), Utc::now())
        .await
        .unwrap()
        .unwrap();

    assert!(new.fresh);
    assert_ne!(old.token.token, new.token.token);
    assert!(SurveyTokenRepo::find_by_token(&pool, &old.token.token)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn foreign_organization_cannot_issue(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (other_org, _) = seed_org_admin(&pool, "other@beta.test").await;
    let (offboarding, _) = seed_offboarding(&pool, org_id, admin.id, 1).await;

    let result = SurveyTokenRepo::create_or_reuse(
        &pool,
        other_org,
        &issue(offboarding.id, other_org, 30),
        Utc::now(),
    )
    .await
    .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn token_is_consumed_exactly_once(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (offboarding, _) = seed_offboarding(&pool, org_id, admin.id, 1).await;
    let issued = SurveyTokenRepo::create_or_reuse(&pool, org_id, &issue(offboarding.id, org_id, 30), Utc::now())
        .await
        .unwrap()
        .unwrap();
    let token = issued.token.token;

    let first = SurveyTokenRepo::submit(&pool, &token, &answers(), Utc::now())
        .await
        .unwrap();
    assert_matches!(first, SubmitOutcome::Submitted { ref survey, .. } if survey.submitted_by.is_none());

    let second = SurveyTokenRepo::submit(&pool, &token, &answers(), Utc::now())
        .await
        .unwrap();
    assert_matches!(second, SubmitOutcome::Rejected(TokenState::Completed));

    let surveys = ExitSurveyRepo::list_for_organization(&pool, org_id).await.unwrap();
    assert_eq!(surveys.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_and_unknown_tokens_are_rejected(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (offboarding, _) = seed_offboarding(&pool, org_id, admin.id, 1).await;
    let issued = SurveyTokenRepo::create_or_reuse(
        &pool,
        org_id,
        &issue(offboarding.id, org_id, 1),
        Utc::now() - Duration::days(5),
    )
    .await
    .unwrap()
    .unwrap();

    let outcome = SurveyTokenRepo::submit(&pool, &issued.token.token, &answers(), Utc::now())
        .await
        .unwrap();
    assert_matches!(outcome, SubmitOutcome::Rejected(TokenState::Expired));

    let outcome = SurveyTokenRepo::submit(&pool, "nope", &answers(), Utc::now())
        .await
        .unwrap();
    assert_matches!(outcome, SubmitOutcome::UnknownToken);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn finalize_is_idempotent(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (offboarding, _) = seed_offboarding(&pool, org_id, admin.id, 1).await;

    let first = OffboardingRepo::finalize(&pool, offboarding.id, org_id, 30, Utc::now())
        .await
        .unwrap();
    assert!(first.needs_invitation());
    let FinalizeOutcome::Finalized { offboarding: done, token: first_token, .. } = first else {
        panic!("expected finalized");
    };
    assert_eq!(done.status, "completed");

    let second = OffboardingRepo::finalize(&pool, offboarding.id, org_id, 30, Utc::now())
        .await
        .unwrap();
    assert!(!second.needs_invitation());
    assert_matches!(
        second,
        FinalizeOutcome::Finalized { ref token, newly_completed: false, token_issued: false, .. }
            if token.token == first_token.token
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn finalize_refuses_cancelled(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (offboarding, _) = seed_offboarding(&pool, org_id, admin.id, 1).await;
    OffboardingRepo::cancel(&pool, offboarding.id, org_id).await.unwrap();

    let outcome = OffboardingRepo::finalize(&pool, offboarding.id, org_id, 30, Utc::now())
        .await
        .unwrap();
    assert_matches!(outcome, FinalizeOutcome::Cancelled);
}
