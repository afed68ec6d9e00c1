pub mod database;
pub mod player;
pub mod session;

pub use database::PlayerStore;
pub use player::{LeaderboardEntry, PlayerRecord, PlayerUpdate};
pub use session::{SessionState, SessionStore};
