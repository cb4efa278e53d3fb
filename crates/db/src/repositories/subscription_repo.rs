//! Subscription state on `users`, driven by billing webhooks and the trial
//! checker. The owning organization's plan follows every change.
//!
//! Webhook writes skip events older than the last one applied to the row
//! (`subscription_event_at`), so out-of-order delivery cannot roll state back.

use sqlx::{PgConnection, PgPool};
use offboardpro_core::billing::organization_plan;
use offboardpro_core::entitlements::Plan;
use offboardpro_core::trial::{
    SUBSCRIPTION_ACTIVE, SUBSCRIPTION_CANCELED, SUBSCRIPTION_EXPIRED, SUBSCRIPTION_TRIALING,
};
use offboardpro_core::types::{DbId, Timestamp};

use crate::models::user::User;
use crate::repositories::user_repo::COLUMNS;

/// Matches a row that has never seen an event or whose last event is not
/// newer than the bind parameter at position `param`.
fn guarded(param: usize) -> String {
    format!("(subscription_event_at IS NULL OR subscription_event_at <= ${param})")
}

pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// `subscription.created`, keyed by user id.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_created(
        pool: &PgPool,
        user_id: DbId,
        subscription_id: &str,
        customer_id: Option<&str>,
        status: &str,
        plan: Plan,
        trial_ends_at: Option<Timestamp>,
        event_at: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE users SET
                paddle_subscription_id = $2,
                paddle_customer_id = COALESCE($3, paddle_customer_id),
                subscription_status = $4,
                subscription_plan = $5,
                trial_ends_at = COALESCE($6, trial_ends_at),
                subscription_event_at = $7
             WHERE id = $1 AND {}
             RETURNING {COLUMNS}",
            guarded(7)
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(subscription_id)
            .bind(customer_id)
            .bind(status)
            .bind(plan.as_str())
            .bind(trial_ends_at)
            .bind(event_at)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(user) = &user {
            Self::sync_organization(&mut *tx, user, trial_ends_at).await?;
        }
        tx.commit().await?;
        Ok(user)
    }

    /// `subscription.updated`, keyed by subscription id. A `None` plan keeps
    /// the stored one.
    pub async fn apply_updated(
        pool: &PgPool,
        subscription_id: &str,
        status: &str,
        plan: Option<Plan>,
        event_at: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE users SET
                subscription_status = $2,
                subscription_plan = COALESCE($3, subscription_plan),
                subscription_event_at = $4
             WHERE paddle_subscription_id = $1 AND {}
             RETURNING {COLUMNS}",
            guarded(4)
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(subscription_id)
            .bind(status)
            .bind(plan.map(Plan::as_str))
            .bind(event_at)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(user) = &user {
            Self::sync_organization(&mut *tx, user, None).await?;
        }
        tx.commit().await?;
        Ok(user)
    }

    /// `subscription.canceled`, keyed by subscription id.
    pub async fn apply_canceled(
        pool: &PgPool,
        subscription_id: &str,
        canceled_at: Timestamp,
        event_at: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE users SET
                subscription_status = $2,
                subscription_canceled_at = $3,
                subscription_event_at = $4
             WHERE paddle_subscription_id = $1 AND {}
             RETURNING {COLUMNS}",
            guarded(4)
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(subscription_id)
            .bind(SUBSCRIPTION_CANCELED)
            .bind(canceled_at)
            .bind(event_at)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(user) = &user {
            Self::sync_organization(&mut *tx, user, None).await?;
        }
        tx.commit().await?;
        Ok(user)
    }

    /// `transaction.completed`, keyed by subscription id: the subscription is active.
    pub async fn apply_transaction_completed(
        pool: &PgPool,
        subscription_id: &str,
        event_at: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        Self::apply_updated(pool, subscription_id, SUBSCRIPTION_ACTIVE, None, event_at).await
    }

    /// Move every trial that ended before `now` to `expired` and drop the
    /// owning organizations to starter. Returns the downgraded users.
    pub async fn expire_trials(pool: &PgPool, now: Timestamp) -> Result<Vec<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE users SET subscription_status = $2
             WHERE subscription_status = $3 AND trial_ends_at < $1
             RETURNING {COLUMNS}"
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(now)
            .bind(SUBSCRIPTION_EXPIRED)
            .bind(SUBSCRIPTION_TRIALING)
            .fetch_all(&mut *tx)
            .await?;

        let organization_ids: Vec<DbId> = users.iter().filter_map(|u| u.organization_id).collect();
        if !organization_ids.is_empty() {
            sqlx::query("UPDATE organizations SET subscription_plan = $2 WHERE id = ANY($1)")
                .bind(&organization_ids)
                .bind(Plan::Starter.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(users)
    }

    /// Active trials ending in `[now, until]`.
    pub async fn trials_ending_between(
        pool: &PgPool,
        now: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE subscription_status = $3 AND trial_ends_at >= $1 AND trial_ends_at <= $2
             ORDER BY trial_ends_at"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(now)
            .bind(until)
            .bind(SUBSCRIPTION_TRIALING)
            .fetch_all(pool)
            .await
    }

    async fn sync_organization(
        conn: &mut PgConnection,
        user: &User,
        trial_ends_at: Option<Timestamp>,
    ) -> Result<(), sqlx::Error> {
        let Some(organization_id) = user.organization_id else {
            return Ok(());
        };
        let plan = organization_plan(
            user.subscription_status.as_deref().unwrap_or_default(),
            Plan::from_name(user.subscription_plan.as_deref()),
        );
        sqlx::query(
            "UPDATE organizations
             SET subscription_plan = $2, trial_ends_at = COALESCE($3, trial_ends_at)
             WHERE id = $1",
        )
        .bind(organization_id)
        .bind(plan.as_str())
        .bind(trial_ends_at)
        .execute(conn)
        .await?;
        Ok(())
    }
}
