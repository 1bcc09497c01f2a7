//! Free/pro plan gating.
//!
//! Free accounts may analyze a fixed number of documents per period. The
//! period is approximated as "more than N days since the account was
//! created"; once that holds, every check resets the counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::DocumentError;
use crate::models::{Plan, SubscriptionStatus, User};
use crate::repository::DieselUserRepository;

/// Plan limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Documents a free account may process per period
    #[serde(default = "default_free_monthly_limit")]
    pub free_monthly_limit: i32,
    /// Days after account creation past which the counter resets
    #[serde(default = "default_reset_after_days")]
    pub reset_after_days: i64,
}

fn default_free_monthly_limit() -> i32 {
    5
}

fn default_reset_after_days() -> i64 {
    30
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free_monthly_limit: default_free_monthly_limit(),
            reset_after_days: default_reset_after_days(),
        }
    }
}

/// Account usage as shown to the account holder.
#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub plan: Plan,
    pub documents_processed_this_month: i32,
    /// `None` for unlimited plans.
    pub monthly_limit: Option<i32>,
    pub remaining: Option<i32>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

/// Gate run before upload and analyze.
#[derive(Clone)]
pub struct PlanLimiter {
    users: DieselUserRepository,
    limits: PlanLimits,
}

impl PlanLimiter {
    pub fn new(users: DieselUserRepository, limits: PlanLimits) -> Self {
        Self { users, limits }
    }

    pub fn limits(&self) -> PlanLimits {
        self.limits
    }

    /// Read the account fresh, reset its counter if due, and reject free
    /// accounts that have used up their allowance.
    pub async fn check(&self, user_id: &str) -> Result<User, DocumentError> {
        let user = self.load_current(user_id).await?;

        if user.plan == Plan::Free
            && user.documents_processed_this_month >= self.limits.free_monthly_limit
        {
            info!(
                "User {} reached the free limit ({} documents)",
                user.id, user.documents_processed_this_month
            );
            return Err(DocumentError::PlanLimitReached);
        }

        Ok(user)
    }

    /// Current usage for an account. Applies the same counter reset as `check`.
    pub async fn usage(&self, user_id: &str) -> Result<Usage, DocumentError> {
        let user = self.load_current(user_id).await?;
        let monthly_limit = match user.plan {
            Plan::Free => Some(self.limits.free_monthly_limit),
            Plan::Pro => None,
        };

        Ok(Usage {
            plan: user.plan,
            documents_processed_this_month: user.documents_processed_this_month,
            monthly_limit,
            remaining: monthly_limit.map(|l| (l - user.documents_processed_this_month).max(0)),
            subscription_status: user.subscription_status,
            subscription_end_date: user.subscription_end_date,
        })
    }

    async fn load_current(&self, user_id: &str) -> Result<User, DocumentError> {
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or(DocumentError::UserNotFound)?;

        if is_reset_due(user.created_at, Utc::now(), self.limits.reset_after_days)
            && user.documents_processed_this_month != 0
        {
            self.users.reset_monthly_counter(&user.id).await?;
            user.documents_processed_this_month = 0;
        }

        Ok(user)
    }
}

/// Whether more than `reset_after_days` whole days separate `created_at` and `now`.
pub fn is_reset_due(created_at: DateTime<Utc>, now: DateTime<Utc>, reset_after_days: i64) -> bool {
    (now - created_at).num_days() > reset_after_days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, DbContext, PlanLimiter) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let limiter = PlanLimiter::new(ctx.users(), PlanLimits::default());
        (dir, ctx, limiter)
    }

    async fn user_with_count(ctx: &DbContext, plan: Plan, count: i32) -> User {
        let user = User::new(format!("{}@example.com", uuid::Uuid::new_v4()), "Test");
        ctx.users().create(&user).await.unwrap();
        ctx.users().set_plan(&user.id, plan).await.unwrap();
        ctx.users().set_processed_count(&user.id, count).await.unwrap();
        user
    }

    #[test]
    fn test_reset_needs_more_than_thirty_whole_days() {
        let now = Utc::now();
        assert!(!is_reset_due(now - Duration::days(30), now, 30));
        assert!(!is_reset_due(
            now - Duration::days(31) + Duration::seconds(1),
            now,
            30
        ));
        assert!(is_reset_due(now - Duration::days(31), now, 30));
    }

    #[tokio::test]
    async fn test_free_user_below_limit_passes() {
        let (_dir, ctx, limiter) = setup().await;
        let user = user_with_count(&ctx, Plan::Free, 4).await;

        let checked = limiter.check(&user.id).await.unwrap();
        assert_eq!(checked.documents_processed_this_month, 4);
    }

    #[tokio::test]
    async fn test_free_user_at_limit_is_rejected() {
        let (_dir, ctx, limiter) = setup().await;
        let user = user_with_count(&ctx, Plan::Free, 5).await;

        let err = limiter.check(&user.id).await.unwrap_err();
        assert!(matches!(err, DocumentError::PlanLimitReached));
    }

    #[tokio::test]
    async fn test_pro_user_is_never_limited() {
        let (_dir, ctx, limiter) = setup().await;
        let user = user_with_count(&ctx, Plan::Pro, 500).await;

        assert!(limiter.check(&user.id).await.is_ok());
        let usage = limiter.usage(&user.id).await.unwrap();
        assert_eq!(usage.monthly_limit, None);
        assert_eq!(usage.remaining, None);
    }

    #[tokio::test]
    async fn test_old_account_counter_resets_during_check() {
        let (_dir, ctx, limiter) = setup().await;
        let user = user_with_count(&ctx, Plan::Free, 5).await;
        ctx.users()
            .set_created_at(&user.id, Utc::now() - Duration::days(45))
            .await
            .unwrap();

        let checked = limiter.check(&user.id).await.unwrap();
        assert_eq!(checked.documents_processed_this_month, 0);

        let stored = ctx.users().get(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.documents_processed_this_month, 0);
    }

    #[tokio::test]
    async fn test_usage_reports_remaining() {
        let (_dir, ctx, limiter) = setup().await;
        let user = user_with_count(&ctx, Plan::Free, 3).await;

        let usage = limiter.usage(&user.id).await.unwrap();
        assert_eq!(usage.monthly_limit, Some(5));
        assert_eq!(usage.remaining, Some(2));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (_dir, _ctx, limiter) = setup().await;
        assert!(matches!(
            limiter.check("missing").await,
            Err(DocumentError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_custom_limit() {
        let (_dir, ctx, _) = setup().await;
        let limiter = PlanLimiter::new(
            ctx.users(),
            PlanLimits {
                free_monthly_limit: 1,
                reset_after_days: 30,
            },
        );
        let user = user_with_count(&ctx, Plan::Free, 1).await;
        assert!(matches!(
            limiter.check(&user.id).await,
            Err(DocumentError::PlanLimitReached)
        ));
    }
}
