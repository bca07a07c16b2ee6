//! slirc-warden - channel moderation for IRC.
//!
//! Watches channel messages for blocklisted patterns, escalates from
//! warnings to kicks to timed bans per identity, and gates every
//! administrative command through role- and channel-scoped accounts.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod moderation;
pub mod network;
pub mod security;
pub mod session;

pub use session::Session;
