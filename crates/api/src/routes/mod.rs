pub mod auth;
pub mod billing;
pub mod cron;
pub mod exit_survey;
pub mod health;
pub mod notification;
pub mod offboarding;
pub mod organization;
pub mod security;
pub mod task;
pub mod template;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh       public
/// /auth/logout, /auth/me                           session
///
/// /organization                                    get
/// /organization/create                             create (session, no org yet)
/// /organization/entitlements                       plan, limits, usage
///
/// /templates                                       list, create
/// /templates/{id}                                  get
///
/// /offboardings                                    list, create
/// /offboardings/{id}                               get
/// /offboardings/{id}/cancel                        cancel
/// /offboardings/{id}/finalize                      finalize + survey invitation
///
/// /tasks/{id}/complete                             complete (cascades)
///
/// /exit-survey/create-token                        issue or reuse token
/// /exit-survey/validate-token                      public
/// /exit-survey/submit                              public
/// /exit-survey/analyze                             queue analysis
/// /exit-survey/analysis                            latest analysis
/// /exit-surveys                                    list
///
/// /security/revoke-all                             bulk revocation
/// /security/connections                            list, create
/// /security/connections/{id}/revoke                revoke one
/// /security/revocation-logs                        audit trail
///
/// /paddle/webhook                                  signed webhook
/// /cron/check-trials                               bearer CRON_SECRET
///
/// /notifications                                   list (?unread_only, limit, offset)
/// /notifications/read-all                          mark all read
/// /notifications/unread-count                      unread count
/// /notifications/{id}/read                         mark read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/organization", organization::router())
        .nest("/templates", template::router())
        .nest("/offboardings", offboarding::router())
        .nest("/tasks", task::router())
        .nest("/exit-survey", exit_survey::router())
        .nest("/exit-surveys", exit_survey::list_router())
        .nest("/security", security::router())
        .nest("/paddle", billing::router())
        .nest("/cron", cron::router())
        .nest("/notifications", notification::router())
}
