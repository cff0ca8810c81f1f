use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{
    enums::subscription_statuses::SubscriptionStatus,
    subscription_lifecycle::{ExpiryStatus, days_until_end},
    subscriptions::SubscriptionDto,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryLevel {
    Warning,
    Error,
}

/// In-app notice raised for a member whose subscription is about to lapse or has lapsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    #[serde(rename = "type")]
    pub level: AdvisoryLevel,
    pub message: String,
    pub subscription_id: Uuid,
    pub days_until_end: i64,
}

/// Advisories for the `active` subscriptions among `subscriptions`, as seen at `reference`.
pub fn advisories_for(subscriptions: &[SubscriptionDto], reference: DateTime<Utc>) -> Vec<Advisory> {
    subscriptions
        .iter()
        .filter(|subscription| subscription.status == SubscriptionStatus::Active)
        .filter_map(|subscription| {
            let ends_at = subscription.end_date?;
            let days = days_until_end(ends_at, reference);

            match ExpiryStatus::from_days_until_end(days) {
                ExpiryStatus::Current => None,
                ExpiryStatus::ExpiringSoon => Some(Advisory {
                    level: AdvisoryLevel::Warning,
                    message: format!(
                        "Your subscription expires in {} {}. Renew now to keep your access.",
                        days,
                        if days == 1 { "day" } else { "days" }
                    ),
                    subscription_id: subscription.id,
                    days_until_end: days,
                }),
                ExpiryStatus::Expired => Some(Advisory {
                    level: AdvisoryLevel::Error,
                    message: "Your subscription has expired. Renew now to keep using the gym."
                        .to_string(),
                    subscription_id: subscription.id,
                    days_until_end: days,
                }),
            }
        })
        .collect()
}
