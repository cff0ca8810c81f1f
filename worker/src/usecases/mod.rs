pub mod reconcile_expired_subscriptions;
pub mod send_subscription_reminders;
