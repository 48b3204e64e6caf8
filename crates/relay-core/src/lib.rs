//! Core domain + application logic for the channel relay.
//!
//! This crate is intentionally provider-agnostic. Telegram delivery, the Google
//! Sheets channel list and Gemini translation live behind ports (traits)
//! implemented in adapter crates.

pub mod caption;
pub mod chunking;
pub mod config;
pub mod dedup;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod feed;
pub mod formatting;
pub mod logging;
pub mod media;
pub mod ports;
pub mod relay;
pub mod store;
pub mod throttled;

pub use errors::{Error, Result};
