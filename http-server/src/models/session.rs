use allocator::PayoutMode;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Per-browser game state. Never written to the player table directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub player_id: Option<String>,
    pub player_name: Option<String>,
    pub profile: Option<String>,
    pub lifestyle_pref: Option<String>,
    pub payout_type: Option<PayoutMode>,
    pub wallet: Option<f64>,
    pub savings: Option<f64>,
    pub state: Option<String>,
    pub goal: Option<String>,
    pub net: Option<f64>,
    pub starting_amount: Option<f64>,
    pub tax_paid: Option<f64>,
    pub day: Option<i64>,
    pub email: Option<String>,
}

impl SessionState {
    /// A game exists once an entry has been submitted.
    pub fn has_game(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn day(&self) -> i64 {
        self.day.unwrap_or(1)
    }

    /// The keys exposed to the browser for client sync.
    pub fn introspection(&self) -> Value {
        json!({
            "player_id": self.player_id,
            "player_name": self.player_name,
            "state": self.state,
            "goal": self.goal,
            "wallet": self.wallet,
            "savings": self.savings,
            "net": self.net,
            "tax_paid": self.tax_paid,
            "day": self.day,
        })
    }
}

struct SessionEntry {
    state: SessionState,
    last_seen: Instant,
}

/// In-process session storage keyed by an opaque cookie token.
///
/// Entries expire after `ttl` without activity.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // Session data is disposable, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fresh random token for a new browser session
    pub fn new_token() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Returns the live state for `token`, dropping it if it has expired.
    ///
    /// A successful load counts as activity and restarts the idle timer.
    pub fn load(&self, token: &str) -> Option<SessionState> {
        let mut entries = self.lock();
        let entry = entries.get_mut(token)?;

        if entry.last_seen.elapsed() >= self.ttl {
            entries.remove(token);
            tracing::debug!("Session {} expired", short(token));
            return None;
        }

        entry.last_seen = Instant::now();
        Some(entry.state.clone())
    }

    /// Stores `state` and refreshes the idle timer.
    pub fn save(&self, token: &str, state: &SessionState) {
        let mut entries = self.lock();
        entries.insert(
            token.to_string(),
            SessionEntry {
                state: state.clone(),
                last_seen: Instant::now(),
            },
        );
    }

    pub fn clear(&self, token: &str) {
        let mut entries = self.lock();
        entries.remove(token);
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.last_seen.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Periodically purges expired sessions until the runtime shuts down.
    pub async fn run_reaper(self, every: Duration) {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = self.purge_expired();
            if purged > 0 {
                tracing::info!("Purged {} expired sessions ({} live)", purged, self.len());
            }
        }
    }
}

// Only log a token prefix
fn short(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
