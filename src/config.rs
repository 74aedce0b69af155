/// Runtime link configuration.
///
/// Compiled-in defaults can be overridden from a small JSON object, so a host
/// tool or a config partition can retune timeouts without reflashing.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::transport::Terminator;
use crate::waiter::PollBudget;

/// Timeout and framing settings for a [`Link`](crate::link::Link).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Delay between polls of the transport (ms).
    pub poll_delay_ms: u32,
    /// Polls before a wait times out.
    pub max_polls: u32,
    /// Line ending appended to every command.
    pub terminator: Terminator,
}

impl LinkConfig {
    /// 100 polls, 10 ms apart, CR LF.
    pub const fn new() -> Self {
        Self {
            poll_delay_ms: 10,
            max_polls: 100,
            terminator: Terminator::CrLf,
        }
    }

    pub const fn budget(&self) -> PollBudget {
        PollBudget::new(self.max_polls, self.poll_delay_ms)
    }

    /// Parse a JSON object such as `{"poll_delay_ms":5,"terminator":"cr"}`.
    /// Missing keys keep their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let (raw, _) =
            serde_json_core::from_slice::<RawConfig>(data).map_err(|_| ConfigError::Json)?;

        let defaults = Self::new();
        let config = Self {
            poll_delay_ms: raw.poll_delay_ms.unwrap_or(defaults.poll_delay_ms),
            max_polls: raw.max_polls.unwrap_or(defaults.max_polls),
            terminator: raw.terminator.unwrap_or(defaults.terminator),
        };
        if config.max_polls == 0 {
            return Err(ConfigError::InvalidPollBudget);
        }
        log::info!(
            "Link config: {} polls x {} ms",
            config.max_polls,
            config.poll_delay_ms
        );
        Ok(config)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire form of [`LinkConfig`]; every key optional.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    poll_delay_ms: Option<u32>,
    #[serde(default)]
    max_polls: Option<u32>,
    #[serde(default)]
    terminator: Option<Terminator>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.poll_delay_ms, 10);
        assert_eq!(config.max_polls, 100);
        assert_eq!(config.terminator, Terminator::CrLf);
        assert_eq!(config.budget(), PollBudget::new(100, 10));
    }

    #[test]
    fn full_json() {
        let config =
            LinkConfig::from_json(br#"{"poll_delay_ms":2,"max_polls":50,"terminator":"cr"}"#)
                .unwrap();
        assert_eq!(config.poll_delay_ms, 2);
        assert_eq!(config.max_polls, 50);
        assert_eq!(config.terminator, Terminator::Cr);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LinkConfig::from_json(br#"{"max_polls":7}"#).unwrap();
        assert_eq!(config.max_polls, 7);
        assert_eq!(config.poll_delay_ms, 10);
        assert_eq!(config.terminator, Terminator::CrLf);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(LinkConfig::from_json(b"{}"), Ok(LinkConfig::new()));
    }

    #[test]
    fn zero_polls_rejected() {
        assert_eq!(
            LinkConfig::from_json(br#"{"max_polls":0}"#),
            Err(ConfigError::InvalidPollBudget)
        );
    }

    #[test]
    fn malformed_json_rejected() {
        assert_eq!(LinkConfig::from_json(b"{max_polls:"), Err(ConfigError::Json));
        assert_eq!(
            LinkConfig::from_json(br#"{"terminator":"semicolon"}"#),
            Err(ConfigError::Json)
        );
    }
}
