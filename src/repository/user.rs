//! Diesel-based user repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewUser, UserRecord};
use super::pool::{DbError, DbPool};
use super::{parse_datetime, parse_datetime_opt};
use crate::models::{Plan, SubscriptionStatus, User};
use crate::schema::users;
use crate::with_conn;

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            email: record.email,
            name: record.name,
            api_token: record.api_token,
            plan: Plan::from_str(&record.plan).unwrap_or(Plan::Free),
            documents_processed_this_month: record.documents_processed_this_month,
            subscription_status: SubscriptionStatus::from_str(&record.subscription_status)
                .unwrap_or_default(),
            billing_customer_id: record.billing_customer_id,
            billing_subscription_id: record.billing_subscription_id,
            subscription_end_date: parse_datetime_opt(record.subscription_end_date),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Diesel-based user repository.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new user.
    pub async fn create(&self, user: &User) -> Result<(), DbError> {
        let created_at = user.created_at.to_rfc3339();
        let end_date = user.subscription_end_date.map(|d| d.to_rfc3339());
        let new_user = NewUser {
            id: &user.id,
            email: &user.email,
            name: &user.name,
            api_token: &user.api_token,
            plan: user.plan.as_str(),
            documents_processed_this_month: user.documents_processed_this_month,
            subscription_status: user.subscription_status.as_str(),
            billing_customer_id: user.billing_customer_id.as_deref(),
            billing_subscription_id: user.billing_subscription_id.as_deref(),
            subscription_end_date: end_date.as_deref(),
            created_at: &created_at,
        };

        with_conn!(self.pool, conn => {
            diesel::insert_into(users::table)
                .values(&new_user)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> Result<Option<User>, DbError> {
        with_conn!(self.pool, conn => {
            users::table
                .find(id)
                .first::<UserRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(User::from))
        })
    }

    /// Get a user by email address.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        with_conn!(self.pool, conn => {
            users::table
                .filter(users::email.eq(email))
                .first::<UserRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(User::from))
        })
    }

    /// Get a user by API token.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<User>, DbError> {
        with_conn!(self.pool, conn => {
            users::table
                .filter(users::api_token.eq(token))
                .first::<UserRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(User::from))
        })
    }

    /// Get a user by billing customer ID.
    pub async fn get_by_billing_customer(&self, customer_id: &str) -> Result<Option<User>, DbError> {
        with_conn!(self.pool, conn => {
            users::table
                .filter(users::billing_customer_id.eq(customer_id))
                .first::<UserRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(User::from))
        })
    }

    /// List all users, oldest first.
    pub async fn list(&self) -> Result<Vec<User>, DbError> {
        with_conn!(self.pool, conn => {
            users::table
                .order(users::created_at.asc())
                .load::<UserRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(User::from).collect())
        })
    }

    /// Reset the monthly counter to zero.
    pub async fn reset_monthly_counter(&self, id: &str) -> Result<(), DbError> {
        with_conn!(self.pool, conn => {
            diesel::update(users::table.find(id))
                .set(users::documents_processed_this_month.eq(0))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Increment the monthly counter by one.
    pub async fn increment_processed(&self, id: &str) -> Result<(), DbError> {
        with_conn!(self.pool, conn => {
            diesel::update(users::table.find(id))
                .set(
                    users::documents_processed_this_month
                        .eq(users::documents_processed_this_month + 1),
                )
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Set the monthly counter to an explicit value.
    pub async fn set_processed_count(&self, id: &str, count: i32) -> Result<bool, DbError> {
        with_conn!(self.pool, conn => {
            let rows = diesel::update(users::table.find(id))
                .set(users::documents_processed_this_month.eq(count))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    /// Change the plan tier without touching subscription fields.
    pub async fn set_plan(&self, id: &str, plan: Plan) -> Result<bool, DbError> {
        with_conn!(self.pool, conn => {
            let rows = diesel::update(users::table.find(id))
                .set(users::plan.eq(plan.as_str()))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    /// Persist plan and subscription fields from `user`.
    pub async fn save_subscription(&self, user: &User) -> Result<(), DbError> {
        let end_date = user.subscription_end_date.map(|d| d.to_rfc3339());
        with_conn!(self.pool, conn => {
            diesel::update(users::table.find(&user.id))
                .set((
                    users::plan.eq(user.plan.as_str()),
                    users::subscription_status.eq(user.subscription_status.as_str()),
                    users::billing_customer_id.eq(user.billing_customer_id.as_deref()),
                    users::billing_subscription_id.eq(user.billing_subscription_id.as_deref()),
                    users::subscription_end_date.eq(end_date.as_deref()),
                ))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Overwrite an account's creation time. Only used to age accounts in tests
    /// and by administrative backfills.
    pub async fn set_created_at(&self, id: &str, created_at: DateTime<Utc>) -> Result<(), DbError> {
        let ts = created_at.to_rfc3339();
        with_conn!(self.pool, conn => {
            diesel::update(users::table.find(id))
                .set(users::created_at.eq(&ts))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }
}
