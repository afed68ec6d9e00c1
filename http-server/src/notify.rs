use serde::Serialize;
use std::time::Duration;

use crate::models::SessionState;

// Outbound email message, delivered through a webhook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Human-readable summary of the figures computed for a session.
    pub fn winnings_summary(to: &str, session: &SessionState) -> Self {
        let name = session.player_name.as_deref().unwrap_or("Player");
        let jurisdiction = session.state.as_deref().unwrap_or("Unknown");
        let payout = session.payout_type.unwrap_or_default().as_str();

        let mut body = format!(
            "Hi {name},\n\n\
             Here is how your jackpot breaks down ({jurisdiction}, {payout} payout):\n\n\
             Starting amount: {}\n\
             Taxes withheld:  {}\n\
             Net winnings:    {}\n\
             Wallet:          {}\n\
             Savings:         {}\n",
            dollars(session.starting_amount.unwrap_or(0.0)),
            dollars(session.tax_paid.unwrap_or(0.0)),
            dollars(session.net.unwrap_or(0.0)),
            dollars(session.wallet.unwrap_or(0.0)),
            dollars(session.savings.unwrap_or(0.0)),
        );
        if let Some(goal) = session.goal.as_deref().filter(|g| !g.is_empty()) {
            body.push_str(&format!("\nYour goal: {goal}\n"));
        }

        Self {
            to: to.to_string(),
            subject: format!("{name}, your lottery winnings summary"),
            body,
        }
    }
}

// Best-effort notification sender
//
// Never retries and never fails the caller: the outcome is only a delivered flag.
#[derive(Clone)]
pub struct Notifier {
    webhook: Option<Webhook>,
}

#[derive(Clone)]
struct Webhook {
    client: reqwest::Client,
    url: String,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let webhook = match webhook_url {
            Some(url) => Some(Webhook {
                client: reqwest::Client::builder().timeout(timeout).build()?,
                url,
            }),
            None => None,
        };
        Ok(Self { webhook })
    }

    /// Notifier with no webhook; every send is logged and reported as not delivered.
    pub fn disabled() -> Self {
        Self { webhook: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook.is_some()
    }

    pub async fn send(&self, notification: &Notification) -> bool {
        let Some(webhook) = &self.webhook else {
            tracing::info!(
                "Notifications disabled, not sending '{}' to {}",
                notification.subject,
                notification.to
            );
            return false;
        };

        match webhook.client.post(&webhook.url).json(notification).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Sent notification to {}", notification.to);
                true
            }
            Ok(response) => {
                tracing::warn!(
                    "Notification webhook rejected message for {}: {}",
                    notification.to,
                    response.status()
                );
                false
            }
            Err(e) => {
                tracing::warn!("Failed to send notification to {}: {}", notification.to, e);
                false
            }
        }
    }
}

/// `1234567.5` -> `$1,234,567.50`
pub fn dollars(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
