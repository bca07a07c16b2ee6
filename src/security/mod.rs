//! Security module for the warden.
//!
//! - **Password**: Argon2 hashing for account credentials
//! - **Rate Limiting**: Governor-based pacing of outgoing protocol lines

pub mod password;
pub mod rate_limit;

pub use rate_limit::LinePacer;
