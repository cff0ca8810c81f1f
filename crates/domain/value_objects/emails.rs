use chrono::NaiveDate;

/// Outgoing member emails and the data each one is rendered from.
#[derive(Debug, Clone, PartialEq)]
pub enum EmailTemplate {
    PaymentConfirmation {
        username: String,
        plan_name: String,
        amount_minor: i32,
        paid_on: NaiveDate,
    },
    SubscriptionReminder {
        username: String,
        plan_name: String,
        ends_on: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::PaymentConfirmation { .. } => "payment_confirmation",
            EmailTemplate::SubscriptionReminder { .. } => "subscription_reminder",
        }
    }

    pub fn render(&self) -> RenderedEmail {
        match self {
            EmailTemplate::PaymentConfirmation {
                username,
                plan_name,
                amount_minor,
                paid_on,
            } => RenderedEmail {
                subject: "Payment confirmed".to_string(),
                body: format!(
                    "Hello {username}!\n\n\
                     Your payment has been confirmed.\n\n\
                     Plan: {plan_name}\n\
                     Amount: {}\n\
                     Date: {}\n\n\
                     Your subscription is now active. Thank you for training with us!\n",
                    format_amount(*amount_minor),
                    format_date(*paid_on),
                ),
            },
            EmailTemplate::SubscriptionReminder {
                username,
                plan_name,
                ends_on,
            } => RenderedEmail {
                subject: "Your subscription is about to expire".to_string(),
                body: format!(
                    "Hello {username}!\n\n\
                     Your {plan_name} subscription ends on {}.\n\
                     Renew it at the front desk or in the member area to keep your access.\n",
                    format_date(*ends_on),
                ),
            },
        }
    }
}

/// `1250` -> `€12.50`
pub fn format_amount(amount_minor: i32) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{sign}€{}.{:02}", abs / 100, abs % 100)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
