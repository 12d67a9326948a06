//! HTTP server for brevityd.
//!
//! This module provides:
//! - Configuration types and file resolution (`config`)
//! - The axum router and handlers (`http`)

pub mod config;
pub mod http;

pub use http::router;
