//! Core identity resolution and dispatch logic for the kirim messaging gateway.
//!
//! This crate is intentionally transport-agnostic. The chat network client lives
//! behind the [`messaging::port::MessagingClient`] port, implemented in adapter crates.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod group_cache;
pub mod groups;
pub mod identity;
pub mod logging;
pub mod messaging;
pub mod phone;

pub use errors::{Error, Result};
