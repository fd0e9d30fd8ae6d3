//! # Controller
//!
//! Core controller modules for the Infra Dependency Controller.
//!
//! - `backoff`: Fibonacci backoff for failed passes
//! - `projection`: Environment variable and volume bindings
//! - `provision`: Credential and trust secret checks
//! - `readiness`: Condition reader
//! - `reconciler`: Core reconciliation logic
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod projection;
pub mod provision;
pub mod readiness;
pub mod reconciler;
pub mod server;
