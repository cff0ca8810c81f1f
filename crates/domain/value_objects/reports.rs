use serde::Serialize;
use uuid::Uuid;

pub const TOP_PLANS_LIMIT: i64 = 5;
pub const RECENT_SUBSCRIPTIONS_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSubscriptionCount {
    pub plan_id: Uuid,
    pub subscription_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_subscriptions: i64,
    pub subscriptions_last_7_days: i64,
    pub active_subscriptions: i64,
    /// At most [`TOP_PLANS_LIMIT`] entries, highest count first.
    pub top_plans: Vec<PlanSubscriptionCount>,
}
