//! Configuration for counters and dispatchers
//!
//! Both configs are plain structs with sensible defaults. Override individual
//! fields with struct-update syntax:
//!
//! ```
//! use concord::DispatchConfig;
//!
//! let config = DispatchConfig {
//!     max_in_flight: 8,
//!     ..Default::default()
//! };
//! assert_eq!(config.max_in_flight, 8);
//! ```

use crate::error::{Error, Result};

/// Environment variable overriding [`DispatchConfig::max_parallelism`]
pub const ENV_MAX_PARALLELISM: &str = "CONCORD_MAX_PARALLELISM";
/// Environment variable overriding [`DispatchConfig::max_in_flight`]
pub const ENV_MAX_IN_FLIGHT: &str = "CONCORD_MAX_IN_FLIGHT";
/// Environment variable overriding [`DispatchConfig::max_tasks`]
pub const ENV_MAX_TASKS: &str = "CONCORD_MAX_TASKS";

/// Default upper bound on tasks launched by a single dispatch
const DEFAULT_MAX_TASKS: usize = 1_000_000;

/// Default actor mailbox capacity
const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Configuration for task dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Worker threads used by blocking dispatch (default: num_cpus)
    pub max_parallelism: usize,
    /// Tasks allowed to contend for the counter at once (0 = unbounded)
    pub max_in_flight: usize,
    /// Largest batch a single dispatch will launch
    pub max_tasks: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_parallelism: num_cpus::get(),
            max_in_flight: 0,
            max_tasks: DEFAULT_MAX_TASKS,
        }
    }
}

impl DispatchConfig {
    /// Build a config from defaults plus `CONCORD_*` environment overrides
    ///
    /// Unset or empty variables keep their defaults. A value that is not a
    /// non-negative integer yields [`Error::InvalidConfig`]; a zero
    /// `CONCORD_MAX_PARALLELISM` is rejected the same way.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(n) = parse_override(&lookup, ENV_MAX_PARALLELISM)? {
            if n == 0 {
                return Err(Error::InvalidConfig {
                    key: ENV_MAX_PARALLELISM.to_string(),
                    value: "0".to_string(),
                });
            }
            config.max_parallelism = n;
        }
        if let Some(n) = parse_override(&lookup, ENV_MAX_IN_FLIGHT)? {
            config.max_in_flight = n;
        }
        if let Some(n) = parse_override(&lookup, ENV_MAX_TASKS)? {
            config.max_tasks = n;
        }

        tracing::debug!(?config, "dispatch config resolved");
        Ok(config)
    }
}

/// Configuration for an actor-owned counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterConfig {
    /// Starting value
    pub initial: i64,
    /// Commands buffered before senders wait for the owner task
    pub mailbox_capacity: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            initial: 0,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

fn parse_override<F>(lookup: &F, key: &str) -> Result<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| Error::InvalidConfig {
                key: key.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}
