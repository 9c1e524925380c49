//! Environment-based graph settings
//!
//! ## Environment Variables
//!
//! - `FLOWMESH_MAILBOX_CAPACITY` - Mailbox slots per agent (default: 10)
//! - `FLOWMESH_DRAIN_TIMEOUT_MS` - How long closing waits for a mailbox to
//!   drain before cancelling its worker (default: 1000)

use std::env;
use std::time::Duration;

use crate::{
    error::{MeshError, MeshResult},
    mailbox::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_MAILBOX_CAPACITY},
};

/// Environment key for the mailbox capacity
pub const MAILBOX_CAPACITY_ENV: &str = "FLOWMESH_MAILBOX_CAPACITY";
/// Environment key for the drain deadline, in milliseconds
pub const DRAIN_TIMEOUT_ENV: &str = "FLOWMESH_DRAIN_TIMEOUT_MS";

/// Settings applied when a graph is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSettings {
    /// Mailbox capacity of every wrapped agent
    pub mailbox_capacity: usize,
    /// Deadline for draining a mailbox on close
    pub drain_timeout: Duration,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

impl GraphSettings {
    /// Override the mailbox capacity
    #[must_use]
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Override the drain deadline
    #[must_use]
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Load settings from the process environment
    ///
    /// # Errors
    ///
    /// Returns `MeshError::InvalidConfig` if a variable holds an invalid value.
    pub fn from_env() -> MeshResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> MeshResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup(MAILBOX_CAPACITY_ENV) {
            let capacity = raw.trim().parse::<usize>().map_err(|e| {
                MeshError::InvalidConfig(format!(
                    "invalid value '{raw}' for {MAILBOX_CAPACITY_ENV}: {e}"
                ))
            })?;
            settings = settings.mailbox_capacity(capacity);
        }

        if let Some(raw) = lookup(DRAIN_TIMEOUT_ENV) {
            let millis = raw.trim().parse::<u64>().map_err(|e| {
                MeshError::InvalidConfig(format!("invalid value '{raw}' for {DRAIN_TIMEOUT_ENV}: {e}"))
            })?;
            settings = settings.drain_timeout(Duration::from_millis(millis));
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges
    pub fn validate(&self) -> MeshResult<()> {
        if self.mailbox_capacity == 0 {
            return Err(MeshError::InvalidConfig(
                "mailbox_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = GraphSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.mailbox_capacity, 10);
        assert_eq!(settings.drain_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_drain_timeout_from_lookup() {
        let settings =
            GraphSettings::from_lookup(lookup(&[(DRAIN_TIMEOUT_ENV, "250")])).unwrap();
        assert_eq!(settings.drain_timeout, Duration::from_millis(250));

        let err = GraphSettings::from_lookup(lookup(&[(DRAIN_TIMEOUT_ENV, "-5")])).unwrap_err();
        assert!(err.to_string().contains(DRAIN_TIMEOUT_ENV));
    }

    #[test]
    fn test_override_from_lookup() {
        let settings =
            GraphSettings::from_lookup(lookup(&[(MAILBOX_CAPACITY_ENV, " 64 ")])).unwrap();
        assert_eq!(settings.mailbox_capacity, 64);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = GraphSettings::from_lookup(lookup(&[(MAILBOX_CAPACITY_ENV, "0")])).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("greater than 0"));
    }

    #[test]
    fn test_garbage_rejected() {
        let err =
            GraphSettings::from_lookup(lookup(&[(MAILBOX_CAPACITY_ENV, "lots")])).unwrap_err();
        assert!(err.to_string().contains(MAILBOX_CAPACITY_ENV));
    }
}
