//! Game Promotion Server
//!
//! Player registration, payment submission, admin review and game settings
//! for the promotion frontend, backed by a hosted PostgREST store.

pub mod api;
pub mod config;
pub mod db;
pub mod server;

pub use server::{router, AppState};
