//! Rangecast - HTTP byte-range media streaming
//!
//! This library crate exposes the range server and segment client for
//! integration testing.

pub mod client;
pub mod config;
pub mod server;
