mod common;

use assert_matches::assert_matches;
use sqlx::PgPool;
use offboardpro_db::repositories::{OffboardingRepo, TaskCompletion, TaskRepo};

use common::{seed_offboarding, seed_org_admin};

#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_last_task_cascades_once(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (offboarding, tasks) = seed_offboarding(&pool, org_id, admin.id, 3).await;

    for task in &tasks[..2] {
        let outcome = TaskRepo::complete(&pool, task.id, org_id, admin.id, None, None)
            .await
            .unwrap();
        assert_matches!(
            outcome,
            TaskCompletion::Completed { offboarding_completed: false, .. }
        );
    }

    let outcome = TaskRepo::complete(&pool, tasks[2].id, org_id, admin.id, Some("done"), None)
        .await
        .unwrap();
    let TaskCompletion::Completed { task, offboarding: parent, offboarding_completed } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert!(offboarding_completed);
    assert_eq!(parent.status, "completed");
    assert!(parent.completed_at.is_some());
    assert_eq!(task.notes.as_deref(), Some("done"));
    assert_eq!(task.completed_by, Some(admin.id));
    assert_eq!(task.version, 2);

    // A repeat is a no-op and does not re-trigger the cascade.
    let outcome = TaskRepo::complete(&pool, tasks[2].id, org_id, admin.id, None, None)
        .await
        .unwrap();
    assert_matches!(outcome, TaskCompletion::AlreadyCompleted { .. });

    let reloaded = OffboardingRepo::find(&pool, offboarding.id, org_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.version, parent.version);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn partial_completion_stays_in_progress(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (offboarding, tasks) = seed_offboarding(&pool, org_id, admin.id, 2).await;

    TaskRepo::complete(&pool, tasks[0].id, org_id, admin.id, None, None)
        .await
        .unwrap();

    let reloaded = OffboardingRepo::find(&pool, offboarding.id, org_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, "in_progress");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_version_is_rejected(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (_, tasks) = seed_offboarding(&pool, org_id, admin.id, 1).await;

    let outcome = TaskRepo::complete(&pool, tasks[0].id, org_id, admin.id, None, Some(7))
        .await
        .unwrap();
    assert_matches!(outcome, TaskCompletion::VersionMismatch { current: 1 });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancelled_and_foreign_tasks_are_refused(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (other_org, _) = seed_org_admin(&pool, "other@beta.test").await;
    let (offboarding, tasks) = seed_offboarding(&pool, org_id, admin.id, 1).await;

    let outcome = TaskRepo::complete(&pool, tasks[0].id, other_org, admin.id, None, None)
        .await
        .unwrap();
    assert_matches!(outcome, TaskCompletion::NotFound);

    OffboardingRepo::cancel(&pool, offboarding.id, org_id)
        .await
        .unwrap()
        .expect("in-progress offboarding cancels");
    let outcome = TaskRepo::complete(&pool, tasks[0].id, org_id, admin.id, None, None)
        .await
        .unwrap();
    assert_matches!(outcome, TaskCompletion::OffboardingCancelled);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_completions_cascade_exactly_once(pool: PgPool) {
    let (org_id, admin) = seed_org_admin(&pool, "admin@acme.test").await;
    let (_, tasks) = seed_offboarding(&pool, org_id, admin.id, 2).await;

    let (a, b) = tokio::join!(
        TaskRepo::complete(&pool, tasks[0].id, org_id, admin.id, None, None),
        TaskRepo::complete(&pool, tasks[1].id, org_id, admin.id, None, None),
    );
    let cascades = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(|o| {
            matches!(o, TaskCompletion::Completed { offboarding_completed: true, .. })
        })
        .count();
    assert_eq!(cascades, 1);
}
