use axum::{
    extract::FromRequestParts,
    http::{
        HeaderName,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
};
use std::convert::Infallible;
use std::time::Duration;

use crate::{
    AppState,
    models::{SessionState, SessionStore},
};

pub const SESSION_COOKIE: &str = "lotto_session";

// Axum extractor for the browser session
//
// A missing, unknown or expired cookie yields a fresh token with an empty state. Handlers
// mutate `state` and call `persist` to store it again.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub state: SessionState,
    /// No live session arrived with the request
    pub fresh: bool,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let existing = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .find_map(|header| cookie_value(header, SESSION_COOKIE))
            .and_then(|token| {
                state
                    .sessions
                    .load(token)
                    .map(|session| (token.to_string(), session))
            });

        Ok(match existing {
            Some((token, state)) => Session {
                token,
                state,
                fresh: false,
            },
            None => Session {
                token: SessionStore::new_token(),
                state: SessionState::default(),
                fresh: true,
            },
        })
    }
}

impl Session {
    /// Stores the state and returns the refreshed cookie header.
    pub fn persist(&self, store: &SessionStore) -> [(HeaderName, String); 1] {
        store.save(&self.token, &self.state);
        [(SET_COOKIE, session_cookie(&self.token, store.ttl()))]
    }

    /// Like `persist`, but only for a session the client already holds.
    pub fn persist_existing(&self, store: &SessionStore) -> Option<[(HeaderName, String); 1]> {
        (!self.fresh).then(|| self.persist(store))
    }

    /// Drops the stored state and returns a header expiring the cookie.
    pub fn clear(self, store: &SessionStore) -> [(HeaderName, String); 1] {
        store.clear(&self.token);
        [(SET_COOKIE, session_cookie("", Duration::ZERO))]
    }
}

fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    )
}

fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}
