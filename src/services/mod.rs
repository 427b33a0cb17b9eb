pub mod auth;
pub mod cookies;
pub mod error;
pub mod google;
pub mod session;
pub mod youtube;
