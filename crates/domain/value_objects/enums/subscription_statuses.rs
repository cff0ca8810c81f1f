use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SubscriptionStatus::Pending),
            "active" => Some(SubscriptionStatus::Active),
            "expired" => Some(SubscriptionStatus::Expired),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }

    /// Direct transitions allowed outside of activation and renewal.
    ///
    /// `expired` and `cancelled` are only left through a renewal, which is not
    /// expressed here.
    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Pending, Active) | (Pending, Cancelled) | (Active, Expired) | (Active, Cancelled)
        )
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
