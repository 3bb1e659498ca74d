//! kvconf Server - HTTP API over the configuration and group repositories
//!
//! This crate provides:
//! - Route table and handlers (`api`)
//! - Error to HTTP status mapping (`error`)
//! - Request span and metrics middleware
//! - Configuration loading, logging, server startup and graceful shutdown

pub mod api;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod startup;
