//! HTTP gateway for TON transfer submission and queries.

pub mod config;
pub mod metrics;
pub mod routes;
