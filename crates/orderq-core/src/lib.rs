//! Ambient helpers shared by orderq services.
//!
//! Nothing in here knows about orders: configuration loading, tracing setup,
//! HTTP middleware and serialization helpers only.

pub mod config;
pub mod middleware;
pub mod serde;
pub mod tracing;
