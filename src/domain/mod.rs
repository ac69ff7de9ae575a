pub mod node;
pub mod edge;
pub mod error;
pub mod graph;
pub mod detector;
pub mod policy;
pub mod risk;
pub mod config;
pub mod engine;
pub mod scenario;
pub mod builder;
pub mod ports;
