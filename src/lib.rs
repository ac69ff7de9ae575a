//! allocation-graph library: resource-allocation graphs, exact deadlock
//! detection and policy-driven victim resolution.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod server;
