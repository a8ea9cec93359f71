//! Process configuration loaded from the environment

use std::net::SocketAddr;

use crate::relay::{OverflowPolicy, QueueBound, RelayConfig};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub relay: RelayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            relay: RelayConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables
    ///
    /// - `PORT`: listen port (default 3000)
    /// - `RELAY_QUEUE_CAPACITY`: unset or 0 = unbounded
    /// - `RELAY_OVERFLOW`: `block` (default) or `reject`, bounded queues only
    pub fn from_env() -> Self {
        let port = match std::env::var("PORT") {
            Ok(v) => v.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %v, "Invalid PORT, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let capacity: usize = match std::env::var("RELAY_QUEUE_CAPACITY") {
            Ok(v) => v.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %v, "Invalid RELAY_QUEUE_CAPACITY, using unbounded queue");
                0
            }),
            Err(_) => 0,
        };

        let overflow = match std::env::var("RELAY_OVERFLOW")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            Ok("reject") => OverflowPolicy::Reject,
            Ok("block") | Err(_) => OverflowPolicy::Block,
            Ok(other) => {
                tracing::warn!(value = other, "Unknown RELAY_OVERFLOW, using block");
                OverflowPolicy::Block
            }
        };

        let queue = if capacity == 0 {
            QueueBound::Unbounded
        } else {
            QueueBound::Bounded { capacity, overflow }
        };

        tracing::info!(port, queue = ?queue, "Server config loaded");

        Self {
            port,
            relay: RelayConfig { queue },
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 3] = ["PORT", "RELAY_QUEUE_CAPACITY", "RELAY_OVERFLOW"];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_unset() {
        clear_env();
        let config = ServerConfig::from_env();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.relay.queue, QueueBound::Unbounded);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    #[serial]
    fn test_bounded_reject_from_env() {
        clear_env();
        std::env::set_var("PORT", "8080");
        std::env::set_var("RELAY_QUEUE_CAPACITY", "64");
        std::env::set_var("RELAY_OVERFLOW", "Reject");

        let config = ServerConfig::from_env();
        clear_env();

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.relay.queue,
            QueueBound::Bounded {
                capacity: 64,
                overflow: OverflowPolicy::Reject,
            }
        );
    }

    #[test]
    #[serial]
    fn test_overflow_ignored_when_unbounded() {
        clear_env();
        std::env::set_var("RELAY_QUEUE_CAPACITY", "0");
        std::env::set_var("RELAY_OVERFLOW", "reject");

        let config = ServerConfig::from_env();
        clear_env();

        assert_eq!(config.relay.queue, QueueBound::Unbounded);
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("RELAY_QUEUE_CAPACITY", "lots");
        std::env::set_var("RELAY_OVERFLOW", "drop-newest");

        let config = ServerConfig::from_env();
        clear_env();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.relay.queue, QueueBound::Unbounded);
    }

    #[test]
    #[serial]
    fn test_unknown_overflow_defaults_to_block() {
        clear_env();
        std::env::set_var("RELAY_QUEUE_CAPACITY", "8");
        std::env::set_var("RELAY_OVERFLOW", "drop-newest");

        let config = ServerConfig::from_env();
        clear_env();

        assert_eq!(
            config.relay.queue,
            QueueBound::Bounded {
                capacity: 8,
                overflow: OverflowPolicy::Block,
            }
        );
    }
}
