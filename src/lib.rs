// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod connection;
pub mod registry;
pub mod relay;
pub mod server;
pub mod state;
pub mod types;
pub mod ws;
