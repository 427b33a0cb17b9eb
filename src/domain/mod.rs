//! Database queries, one module per table group.
//!
//! Functions that may run inside a transaction take a generic
//! `sqlx::Executor`, so callers can pass either `&PgPool` or `&mut *tx`.

pub mod accounts;
pub mod oauth_states;
pub mod playlists;
pub mod users;
