use sqlx::PgPool;

/// Connect, migrate, and verify the seeded global template.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    offboardpro_db::health_check(&pool).await.unwrap();

    let (templates, tasks): (i64, i64) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM templates WHERE organization_id IS NULL),
            (SELECT COUNT(*) FROM template_tasks)",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(templates, 1);
    assert_eq!(tasks, 7);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_check_constraints(pool: PgPool) {
    let org_id: i64 = sqlx::query_scalar("INSERT INTO organizations (name) VALUES ('X') RETURNING id")
        .fetch_one(&pool)
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO offboardings (organization_id, employee_name, employee_email, last_working_day, status)
         VALUES ($1, 'A', 'a@example.com', '2026-01-01', 'archived')",
    )
    .bind(org_id)
    .execute(&pool)
    .await;
    assert!(result.is_err(), "unknown offboarding status must be rejected");

    let result = sqlx::query(
        "INSERT INTO oauth_connections (organization_id, app_name, employee_email, status)
         VALUES ($1, 'Slack', 'a@example.com', 'paused')",
    )
    .bind(org_id)
    .execute(&pool)
    .await;
    assert!(result.is_err(), "unknown connection status must be rejected");
}
