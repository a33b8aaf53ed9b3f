//! Place Atlas: country place-list resolution.
//!
//! The engine lives in [`places`]; [`server`] exposes it over HTTP and the
//! `atlas` binary wraps both.

pub mod config;
pub mod logging;
pub mod places;
pub mod server;
