//! Seed helpers shared by the repository tests.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use offboardpro_core::types::DbId;
use offboardpro_db::models::offboarding::{CreateOffboarding, NewTask, Offboarding, Task};
use offboardpro_db::models::user::{CreateUser, User};
use offboardpro_db::repositories::{OffboardingRepo, OrganizationRepo, OrganizationSetup, UserRepo};

/// Create a user and attach a fresh organization to it. Returns `(org_id, user)`.
pub async fn seed_org_admin(pool: &PgPool, email: &str) -> (DbId, User) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name: "Admin".to_string(),
            password_hash: "$argon2id$unused".to_string(),
            role: "user".to_string(),
        },
    )
    .await
    .unwrap();

    let setup = OrganizationRepo::create_for_user(pool, "Acme", user.id, Utc::now() + Duration::days(14))
        .await
        .unwrap();
    match setup {
        OrganizationSetup::Created { organization, user } => (organization.id, user),
        other => panic!("unexpected setup outcome: {other:?}"),
    }
}

/// Create an offboarding with `n` tasks named "Task 0".."Task n-1".
pub async fn seed_offboarding(
    pool: &PgPool,
    organization_id: DbId,
    created_by: DbId,
    n: usize,
) -> (Offboarding, Vec<Task>) {
    let input = CreateOffboarding {
        employee_name: "Jamie Doe".to_string(),
        employee_email: "jamie@example.com".to_string(),
        department: Some("Engineering".to_string()),
        role_title: Some("Engineer".to_string()),
        last_working_day: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        template_id: None,
    };
    let tasks: Vec<NewTask> = (0..n)
        .map(|i| NewTask {
            name: format!("Task {i}"),
            department: Some("IT".to_string()),
            due_date: None,
            priority: "Medium".to_string(),
            order_index: i as i32,
        })
        .collect();
    OffboardingRepo::create_with_tasks(pool, organization_id, created_by, &input, &tasks)
        .await
        .unwrap()
}
