pub mod catalog;
pub mod game;
pub mod notify;
pub mod players;
pub mod session;
