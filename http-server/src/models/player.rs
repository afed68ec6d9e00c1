use allocator::coerce::{coerce_f64, coerce_i64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, value::RawValue};
use std::collections::HashMap;

use super::SessionState;

/// Latest snapshot of one player's simulated finances; one row per `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    pub jurisdiction: String,
    pub wallet: f64,
    pub savings: f64,
    /// Trusted as sent by the client, never recomputed
    pub net: f64,
    pub reputation: f64,
    pub goal: Option<String>,
    pub day: i64,
    pub lifestyle_score: f64,
    pub happiness: f64,
    pub high_net: f64,
    pub taxes_paid: f64,
    pub charity_given: f64,
    /// Raw JSON of the extended play state
    #[serde(skip)]
    pub last_state: Option<String>,
}

/// A stored player as read back for the leaderboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub player: PlayerRecord,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charity_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_charity: Option<CharityEntry>,
}

impl LeaderboardEntry {
    pub fn new(player: PlayerRecord, updated_at: Option<DateTime<Utc>>) -> Self {
        let summary = player.last_state.as_deref().and_then(charity_summary);
        let (charity_count, top_charity) = match summary {
            Some(s) => (Some(s.count), s.top),
            None => (None, None),
        };

        Self {
            player,
            updated_at,
            charity_count,
            top_charity,
        }
    }
}

/// Extended snapshot, version 1: the only part the leaderboard reads.
#[derive(Debug, Deserialize)]
struct SnapshotV1 {
    charities: Option<Vec<CharityEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct CharityEntry {
    #[serde(default)]
    pub name: String,
    pub monthly_drain: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharitySummary {
    pub count: usize,
    pub top: Option<CharityEntry>,
}

/// Projects the charity list out of a snapshot. Malformed snapshots give `None`.
pub fn charity_summary(last_state: &str) -> Option<CharitySummary> {
    let snapshot: SnapshotV1 = serde_json::from_str(last_state).ok()?;
    let charities = snapshot.charities?;

    let top = charities
        .iter()
        .fold(None::<&CharityEntry>, |best, c| match best {
            Some(b) if b.monthly_drain >= c.monthly_drain => Some(b),
            _ => Some(c),
        })
        .cloned();

    Some(CharitySummary {
        count: charities.len(),
        top,
    })
}

/// Body of a player update, kept as loose JSON so bad fields fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct PlayerUpdate {
    data: Map<String, Value>,
}

impl PlayerUpdate {
    /// Anything other than a JSON object is treated as an empty update.
    ///
    /// Fields are decoded one at a time, so a value serde_json rejects (such as `1e400`)
    /// only drops that field.
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(fields) = serde_json::from_slice::<HashMap<String, Box<RawValue>>>(body) else {
            return Self::default();
        };

        let data = fields
            .into_iter()
            .filter_map(|(key, raw)| {
                let value = serde_json::from_str::<Value>(raw.get()).ok()?;
                Some((key, value))
            })
            .collect();
        Self { data }
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.data.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn number(&self, key: &str, default: f64) -> f64 {
        coerce_f64(self.data.get(key), default)
    }

    /// Resolves every field, filling gaps from the session, then from fixed defaults.
    pub fn into_record(self, session: &SessionState) -> PlayerRecord {
        let id = session
            .player_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| self.text("id"))
            .unwrap_or_else(generate_player_id);

        let wallet = self.number("wallet", 0.0);
        let savings = self.number("savings", 0.0);
        let net = self.number("net", wallet + savings);

        let name = self
            .text("name")
            .or_else(|| session.player_name.clone().filter(|n| !n.is_empty()))
            .unwrap_or_else(|| format!("Player {}", id_suffix(&id)));

        let goal = self
            .text("goal")
            .or_else(|| session.goal.clone().filter(|g| !g.is_empty()));

        let last_state = self
            .data
            .get("state")
            .filter(|v| is_truthy(v))
            .map(|v| v.to_string());

        PlayerRecord {
            name,
            jurisdiction: session
                .state
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            wallet,
            savings,
            net,
            reputation: self.number("rep", 0.0),
            goal,
            day: coerce_i64(self.data.get("day"), session.day()).max(1),
            lifestyle_score: self.number("lifestyle", 0.0),
            happiness: self.number("happiness", 50.0),
            high_net: self.number("high_net", net),
            taxes_paid: self.number("taxes_paid", session.tax_paid.unwrap_or(0.0)),
            charity_given: self.number("charity_given", 0.0),
            last_state,
            id,
        }
    }
}

/// Identifier for a player that arrived without a session or payload id.
pub fn generate_player_id() -> String {
    format!("user_{}", hex::encode(rand::random::<[u8; 4]>()))
}

fn id_suffix(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
