//! Account, plan tier, and subscription state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription tier gating analysis volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            _ => None,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing subscription state as reported by the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Inactive,
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unpaid,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inactive" => Some(Self::Inactive),
            "active" => Some(Self::Active),
            "trialing" => Some(Self::Trialing),
            "past_due" => Some(Self::PastDue),
            "canceled" | "cancelled" => Some(Self::Canceled),
            "unpaid" => Some(Self::Unpaid),
            _ => None,
        }
    }

    /// Whether this status keeps a paid plan in force.
    pub fn is_in_good_standing(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DocuMind account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Bearer token for the HTTP API.
    #[serde(skip_serializing)]
    pub api_token: String,
    pub plan: Plan,
    pub documents_processed_this_month: i32,
    pub subscription_status: SubscriptionStatus,
    pub billing_customer_id: Option<String>,
    pub billing_subscription_id: Option<String>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new free-plan account with a fresh API token.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            name: name.into(),
            api_token: generate_api_token(),
            plan: Plan::Free,
            documents_processed_this_month: 0,
            subscription_status: SubscriptionStatus::Inactive,
            billing_customer_id: None,
            billing_subscription_id: None,
            subscription_end_date: None,
            created_at: Utc::now(),
        }
    }
}

/// Generate an opaque API token.
pub fn generate_api_token() -> String {
    format!(
        "dm_{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parsing() {
        assert_eq!(Plan::from_str("PRO"), Some(Plan::Pro));
        assert_eq!(Plan::from_str("free"), Some(Plan::Free));
        assert_eq!(Plan::from_str("enterprise"), None);
    }

    #[test]
    fn test_subscription_status_strings() {
        assert_eq!(
            SubscriptionStatus::from_str("past_due"),
            Some(SubscriptionStatus::PastDue)
        );
        assert_eq!(SubscriptionStatus::PastDue.as_str(), "past_due");
        assert!(SubscriptionStatus::Trialing.is_in_good_standing());
        assert!(!SubscriptionStatus::Unpaid.is_in_good_standing());
    }

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("a@example.com", "A");
        assert_eq!(user.plan, Plan::Free);
        assert_eq!(user.documents_processed_this_month, 0);
        assert!(user.api_token.starts_with("dm_"));
        assert_ne!(user.api_token, User::new("b@example.com", "B").api_token);
    }
}
