//! Date arithmetic and state transitions of a subscription.
//!
//! Everything here is pure: callers load the subscription and its plan, ask for
//! the next period, and persist the result with a version check.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

/// Upper bound (inclusive) of the "expiring soon" band, in days.
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// The daily sweep reminds members whose subscription ends this many days ahead.
pub const DEFAULT_REMINDER_HORIZON_DAYS: i64 = 3;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// New lifecycle columns for one subscription, guarded by the version that was read.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPeriodUpdate {
    pub subscription_id: Uuid,
    pub expected_version: i32,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

pub fn add_plan_duration(from: DateTime<Utc>, duration_days: i32) -> Result<DateTime<Utc>> {
    if duration_days <= 0 {
        bail!("plan duration must be positive, got {duration_days} days");
    }

    from.checked_add_signed(Duration::days(duration_days.into()))
        .context("failed to compute subscription end date")
}

/// Activation after a payment: the validity window restarts at `now`.
pub fn activate(
    subscription: &SubscriptionEntity,
    plan: &PlanEntity,
    now: DateTime<Utc>,
) -> Result<SubscriptionPeriodUpdate> {
    let ends_at = add_plan_duration(now, plan.duration_days)?;

    Ok(SubscriptionPeriodUpdate {
        subscription_id: subscription.id,
        expected_version: subscription.version,
        status: SubscriptionStatus::Active,
        starts_at: now,
        ends_at: Some(ends_at),
    })
}

/// Renewal extends the current end date by one plan duration.
///
/// Renewing early keeps the remaining days. A subscription that never had an
/// end date has nothing to extend and is activated from `now` instead.
pub fn renew(
    subscription: &SubscriptionEntity,
    plan: &PlanEntity,
    now: DateTime<Utc>,
) -> Result<SubscriptionPeriodUpdate> {
    let Some(current_end) = subscription.ends_at else {
        return activate(subscription, plan, now);
    };

    Ok(SubscriptionPeriodUpdate {
        subscription_id: subscription.id,
        expected_version: subscription.version,
        status: SubscriptionStatus::Active,
        starts_at: subscription.starts_at,
        ends_at: Some(add_plan_duration(current_end, plan.duration_days)?),
    })
}

/// Date-derived classification of a subscription. Independent of the stored status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ExpiryStatus {
    Current,
    ExpiringSoon,
    Expired,
}

impl ExpiryStatus {
    pub fn classify(ends_at: DateTime<Utc>, reference: DateTime<Utc>) -> Self {
        Self::from_days_until_end(days_until_end(ends_at, reference))
    }

    pub fn from_days_until_end(days: i64) -> Self {
        if days <= 0 {
            ExpiryStatus::Expired
        } else if days <= EXPIRING_SOON_DAYS {
            ExpiryStatus::ExpiringSoon
        } else {
            ExpiryStatus::Current
        }
    }
}

/// `ceil((ends_at - reference) / 1 day)`.
pub fn days_until_end(ends_at: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    let millis = (ends_at - reference).num_milliseconds();
    if millis > 0 {
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    } else {
        // integer division truncates toward zero, which is the ceiling here
        millis / MILLIS_PER_DAY
    }
}

/// Half-open `[start, end)` bounds of the calendar day `horizon_days` after
/// `reference`, where days are counted in the `utc_offset` time zone.
pub fn reminder_window(
    reference: DateTime<Utc>,
    horizon_days: i64,
    utc_offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let local_day = reference.with_timezone(&utc_offset).date_naive();
    let target_day = local_day
        .checked_add_signed(Duration::days(horizon_days))
        .context("reminder horizon is out of range")?;
    let next_day = target_day
        .succ_opt()
        .context("reminder horizon is out of range")?;

    Ok((
        start_of_local_day(target_day, utc_offset)?,
        start_of_local_day(next_day, utc_offset)?,
    ))
}

fn start_of_local_day(day: NaiveDate, utc_offset: FixedOffset) -> Result<DateTime<Utc>> {
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .context("failed to build start of day")?;

    let local = utc_offset
        .from_local_datetime(&midnight)
        .single()
        .context("ambiguous start of day")?;

    Ok(local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn plan(duration_days: i32) -> PlanEntity {
        PlanEntity {
            id: Uuid::new_v4(),
            name: "Monthly".to_string(),
            description: "Full gym access".to_string(),
            price_minor: 3000,
            duration_days,
            created_at: at(2023, 1, 1, 0, 0),
            updated_at: at(2023, 1, 1, 0, 0),
        }
    }

    fn subscription(
        status: SubscriptionStatus,
        starts_at: DateTime<Utc>,
        ends_at: Option<DateTime<Utc>>,
    ) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            starts_at,
            ends_at,
            status: status.to_string(),
            version: 4,
            last_reminder_sent_at: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    #[test]
    fn activation_keeps_time_of_day() {
        let sub = subscription(SubscriptionStatus::Pending, at(2023, 12, 20, 9, 0), None);
        let now = at(2024, 1, 1, 10, 0);

        let update = activate(&sub, &plan(30), now).unwrap();

        assert_eq!(update.status, SubscriptionStatus::Active);
        assert_eq!(update.starts_at, now);
        assert_eq!(update.ends_at, Some(at(2024, 1, 31, 10, 0)));
        assert_eq!(update.expected_version, 4);
        assert_eq!(update.subscription_id, sub.id);
    }

    #[test]
    fn renewal_extends_from_current_end_not_from_now() {
        let sub = subscription(
            SubscriptionStatus::Active,
            at(2024, 1, 1, 0, 0),
            Some(at(2024, 1, 31, 0, 0)),
        );
        let now = at(2024, 1, 20, 0, 0);

        let update = renew(&sub, &plan(30), now).unwrap();

        assert_eq!(update.ends_at, Some(at(2024, 3, 1, 0, 0)));
        assert_ne!(update.ends_at, Some(at(2024, 2, 19, 0, 0)));
        assert_eq!(update.starts_at, sub.starts_at);
        assert_eq!(update.status, SubscriptionStatus::Active);
    }

    #[test]
    fn renewal_reopens_expired_subscription() {
        let sub = subscription(
            SubscriptionStatus::Expired,
            at(2024, 1, 1, 0, 0),
            Some(at(2024, 1, 31, 0, 0)),
        );

        let update = renew(&sub, &plan(10), at(2024, 2, 5, 0, 0)).unwrap();

        assert_eq!(update.status, SubscriptionStatus::Active);
        assert_eq!(update.ends_at, Some(at(2024, 2, 10, 0, 0)));
    }

    #[test]
    fn renewal_without_end_date_activates_from_now() {
        let sub = subscription(SubscriptionStatus::Pending, at(2024, 1, 1, 0, 0), None);
        let now = at(2024, 1, 3, 8, 30);

        let update = renew(&sub, &plan(7), now).unwrap();

        assert_eq!(update.starts_at, now);
        assert_eq!(update.ends_at, Some(at(2024, 1, 10, 8, 30)));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(add_plan_duration(at(2024, 1, 1, 0, 0), 0).is_err());
        assert!(add_plan_duration(at(2024, 1, 1, 0, 0), -3).is_err());
    }

    #[test]
    fn days_until_end_rounds_up() {
        let reference = at(2024, 1, 1, 12, 0);

        assert_eq!(days_until_end(at(2024, 1, 1, 13, 0), reference), 1);
        assert_eq!(days_until_end(at(2024, 1, 8, 12, 0), reference), 7);
        assert_eq!(days_until_end(at(2024, 1, 8, 12, 1), reference), 8);
        assert_eq!(days_until_end(reference, reference), 0);
        assert_eq!(days_until_end(at(2024, 1, 1, 11, 0), reference), 0);
        assert_eq!(days_until_end(at(2023, 12, 30, 11, 0), reference), -2);
    }

    #[test]
    fn classification_boundaries() {
        let reference = at(2024, 1, 1, 12, 0);

        assert_eq!(ExpiryStatus::classify(reference, reference), ExpiryStatus::Expired);
        assert_eq!(
            ExpiryStatus::classify(at(2023, 12, 1, 0, 0), reference),
            ExpiryStatus::Expired
        );
        assert_eq!(
            ExpiryStatus::classify(at(2024, 1, 2, 12, 0), reference),
            ExpiryStatus::ExpiringSoon
        );
        assert_eq!(
            ExpiryStatus::classify(at(2024, 1, 8, 12, 0), reference),
            ExpiryStatus::ExpiringSoon
        );
        assert_eq!(
            ExpiryStatus::classify(at(2024, 1, 9, 12, 0), reference),
            ExpiryStatus::Current
        );
    }

    #[test]
    fn reminder_window_covers_exactly_one_day() {
        let reference = at(2024, 5, 10, 15, 45);
        let utc = FixedOffset::east_opt(0).unwrap();

        let (start, end) = reminder_window(reference, 3, utc).unwrap();

        assert_eq!(start, at(2024, 5, 13, 0, 0));
        assert_eq!(end, at(2024, 5, 14, 0, 0));

        let three_days_out = at(2024, 5, 13, 0, 0);
        let two_days_out = at(2024, 5, 12, 0, 0);
        let four_days_out = at(2024, 5, 14, 0, 0);
        let in_window = |t: DateTime<Utc>| t >= start && t < end;
        assert!(in_window(three_days_out));
        assert!(in_window(at(2024, 5, 13, 23, 59)));
        assert!(!in_window(two_days_out));
        assert!(!in_window(four_days_out));
    }

    #[test]
    fn reminder_window_follows_local_calendar_day() {
        // 23:30 UTC on the 10th is already the 11th at UTC+1
        let reference = at(2024, 5, 10, 23, 30);
        let lisbon_summer = FixedOffset::east_opt(3600).unwrap();

        let (start, end) = reminder_window(reference, 3, lisbon_summer).unwrap();

        assert_eq!(start, at(2024, 5, 13, 23, 0));
        assert_eq!(end, at(2024, 5, 14, 23, 0));
    }
}
