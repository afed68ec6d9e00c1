use allocator::PayoutMode;
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState,
    middleware::Session,
    models::{SessionState, player::generate_player_id},
    notify::Notification,
};

const DEFAULT_JURISDICTION: &str = "MI";

// Entry form posted from the start page
#[derive(Debug, Default, Deserialize)]
pub struct StartGameForm {
    pub amount: Option<String>,
    pub state: Option<String>,
    pub goal: Option<String>,
    pub profile: Option<String>,
    pub name: Option<String>,
    pub lifestyle: Option<String>,
    pub payout: Option<String>,
    pub email: Option<String>,
}

// Figures the browser game loop starts from
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartData {
    pub wallet: f64,
    pub savings: f64,
    pub net: f64,
    pub state: String,
    pub goal: String,
    pub player_name: String,
    pub player_id: Option<String>,
    pub profile: String,
    pub payout: PayoutMode,
    pub lifestyle_pref: String,
    pub tax_paid: f64,
    pub starting_amount: f64,
    pub day: i64,
}

impl StartData {
    pub fn from_session(session: &SessionState) -> Self {
        StartData {
            wallet: round_cents(session.wallet.unwrap_or(0.0)),
            savings: round_cents(session.savings.unwrap_or(0.0)),
            net: round_cents(session.net.unwrap_or(0.0)),
            state: session.state.clone().unwrap_or_default(),
            goal: session.goal.clone().unwrap_or_default(),
            player_name: session
                .player_name
                .clone()
                .unwrap_or_else(|| "Player".to_string()),
            player_id: session.player_id.clone(),
            profile: session
                .profile
                .clone()
                .unwrap_or_else(|| "balanced".to_string()),
            payout: session.payout_type.unwrap_or_default(),
            lifestyle_pref: session
                .lifestyle_pref
                .clone()
                .unwrap_or_else(|| "smart".to_string()),
            tax_paid: round_cents(session.tax_paid.unwrap_or(0.0)),
            starting_amount: round_cents(session.starting_amount.unwrap_or(0.0)),
            day: session.day(),
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Entry submission endpoint
pub async fn start_game(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<StartGameForm>,
) -> impl IntoResponse {
    let jurisdiction = non_empty(form.state)
        .unwrap_or_else(|| DEFAULT_JURISDICTION.to_string())
        .to_ascii_uppercase();
    let payout = form
        .payout
        .as_deref()
        .map(PayoutMode::from_form)
        .unwrap_or_default();

    let raw_amount = form.amount.as_deref().unwrap_or("0");
    let allocation = state
        .calculator
        .allocate_raw(raw_amount, &jurisdiction, payout);

    let game = &mut session.state;
    if game.player_id.is_none() {
        game.player_id = Some(generate_player_id());
    }
    game.player_name = Some(non_empty(form.name).unwrap_or_else(|| "Player".to_string()));
    game.profile = Some(non_empty(form.profile).unwrap_or_else(|| "balanced".to_string()));
    game.lifestyle_pref = Some(non_empty(form.lifestyle).unwrap_or_else(|| "smart".to_string()));
    game.payout_type = Some(payout);
    game.wallet = Some(allocation.wallet);
    game.savings = Some(allocation.savings);
    game.state = Some(jurisdiction);
    game.goal = Some(non_empty(form.goal).unwrap_or_default());
    game.net = Some(allocation.net);
    game.starting_amount = Some(allocation.gross);
    game.tax_paid = Some(allocation.total_tax());
    game.day = Some(1);

    let email = non_empty(form.email);
    if email.is_some() {
        game.email = email.clone();
    }

    tracing::info!(
        "Player {} started with net {:.2} ({:?})",
        game.player_id.as_deref().unwrap_or_default(),
        allocation.net,
        payout
    );

    let cookie = session.persist(&state.sessions);

    // Fire and forget: the response never waits on the outbound call
    if let Some(to) = email {
        let notifier = state.notifier.clone();
        let notification = Notification::winnings_summary(&to, &session.state);
        tokio::spawn(async move {
            notifier.send(&notification).await;
        });
    }

    (cookie, Json(StartData::from_session(&session.state)))
}

// Current game figures, for the game page
pub async fn get_game(session: Session) -> Response {
    if !session.state.has_game() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "ok": false, "message": "No game in progress" })),
        )
            .into_response();
    }

    Json(StartData::from_session(&session.state)).into_response()
}

// Flat tax tables used by the entry form
pub async fn get_tax_tables(State(state): State<AppState>) -> Json<serde_json::Value> {
    let taxes = &state.calculator.config().taxes;
    Json(json!({
        "state_tax": taxes.jurisdiction_rates,
        "federal_tax": taxes.federal_rate,
    }))
}

// Clears the session entirely
pub async fn reset(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    tracing::debug!("Resetting session");
    let cookie = session.clear(&state.sessions);
    (cookie, Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_data_defaults() {
        let data = StartData::from_session(&SessionState::default());
        assert_eq!(data.player_name, "Player");
        assert_eq!(data.profile, "balanced");
        assert_eq!(data.lifestyle_pref, "smart");
        assert_eq!(data.payout, PayoutMode::Lump);
        assert_eq!(data.day, 1);
        assert_eq!(data.wallet, 0.0);
    }

    #[test]
    fn test_start_data_rounds_to_cents() {
        let session = SessionState {
            wallet: Some(1234.5678),
            tax_paid: Some(0.004),
            ..Default::default()
        };
        let data = StartData::from_session(&session);
        assert_eq!(data.wallet, 1234.57);
        assert_eq!(data.tax_paid, 0.0);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  Ada ".to_string())), Some("Ada".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }
}
