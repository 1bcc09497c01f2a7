//! Plan and subscription transitions driven by billing events.
//!
//! Events arrive already verified; this module only maps them onto the
//! account's plan and subscription state.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{Plan, SubscriptionStatus, User};
use crate::repository::{DbError, DieselUserRepository};

/// A subscription lifecycle event from the payment processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BillingEvent {
    /// Checkout finished; the account is upgraded.
    CheckoutCompleted {
        user_id: String,
        customer_id: String,
        subscription_id: String,
    },
    SubscriptionUpdated {
        customer_id: String,
        status: String,
    },
    SubscriptionDeleted {
        customer_id: String,
    },
    PaymentFailed {
        customer_id: String,
    },
}

/// What applying an event did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingOutcome {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
}

impl BillingOutcome {
    fn ignored() -> Self {
        Self {
            applied: false,
            user_id: None,
            plan: None,
            subscription_status: None,
        }
    }

    fn applied(user: &User) -> Self {
        Self {
            applied: true,
            user_id: Some(user.id.clone()),
            plan: Some(user.plan),
            subscription_status: Some(user.subscription_status),
        }
    }
}

/// Applies billing events to accounts.
#[derive(Clone)]
pub struct BillingService {
    users: DieselUserRepository,
}

impl BillingService {
    pub fn new(users: DieselUserRepository) -> Self {
        Self { users }
    }

    /// Apply an event. Events for unknown accounts are logged and ignored.
    pub async fn apply(&self, event: &BillingEvent) -> Result<BillingOutcome, DbError> {
        let user = match event {
            BillingEvent::CheckoutCompleted { user_id, .. } => self.users.get(user_id).await?,
            BillingEvent::SubscriptionUpdated { customer_id, .. }
            | BillingEvent::SubscriptionDeleted { customer_id }
            | BillingEvent::PaymentFailed { customer_id } => {
                self.users.get_by_billing_customer(customer_id).await?
            }
        };

        let Some(mut user) = user else {
            warn!("Ignoring billing event for unknown account: {:?}", event);
            return Ok(BillingOutcome::ignored());
        };

        if !apply_transition(&mut user, event) {
            warn!("Ignoring billing event with unknown status: {:?}", event);
            return Ok(BillingOutcome::ignored());
        }

        self.users.save_subscription(&user).await?;
        info!(
            "Billing: user {} is now {} ({})",
            user.id, user.plan, user.subscription_status
        );
        Ok(BillingOutcome::applied(&user))
    }
}

/// Update plan and subscription fields for an event. Returns false when the
/// event carries a status this service does not understand.
pub fn apply_transition(user: &mut User, event: &BillingEvent) -> bool {
    match event {
        BillingEvent::CheckoutCompleted {
            customer_id,
            subscription_id,
            ..
        } => {
            user.plan = Plan::Pro;
            user.subscription_status = SubscriptionStatus::Active;
            user.billing_customer_id = Some(customer_id.clone());
            user.billing_subscription_id = Some(subscription_id.clone());
            user.subscription_end_date = None;
        }
        BillingEvent::SubscriptionUpdated { status, .. } => {
            let Some(status) = SubscriptionStatus::from_str(status) else {
                return false;
            };
            user.subscription_status = status;
            if !status.is_in_good_standing() && status != SubscriptionStatus::Inactive {
                user.plan = Plan::Free;
                user.subscription_end_date = Some(Utc::now());
            }
        }
        BillingEvent::SubscriptionDeleted { .. } => {
            user.plan = Plan::Free;
            user.subscription_status = SubscriptionStatus::Canceled;
            user.subscription_end_date = Some(Utc::now());
        }
        BillingEvent::PaymentFailed { .. } => {
            user.subscription_status = SubscriptionStatus::PastDue;
        }
    }
    true
}
