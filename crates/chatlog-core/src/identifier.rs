//! Log Identifiers
//!
//! A `LogIdentifier` names one log: the channel it was recorded in, the time
//! period it covers, and optionally the user whose lines it holds. A log
//! without a user-log name is a channel log; one with a user-log name is a
//! user log. The two are mutually exclusive.
//!
//! ## Example
//! ```ignore
//! let id = LogIdentifier::channel("dota2", TimePeriod::month(2018, 9)?);
//! assert!(id.is_channel_log());
//!
//! let user = LogIdentifier::user("dota2", TimePeriod::month(2018, 9)?, "alice");
//! assert!(user.is_user_log());
//! assert_ne!(id, user);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::TimePeriod;

/// Identifies one log by channel, time period and optional user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawLogIdentifier")]
pub struct LogIdentifier {
    /// Channel name
    channel_name: String,

    /// Time period covered by the log
    period: TimePeriod,

    /// User whose lines the log holds (None for a channel log)
    user_log_name: Option<String>,
}

/// Unchecked serde form; deserialization goes through `LogIdentifier::new`
#[derive(Deserialize)]
struct RawLogIdentifier {
    channel_name: String,
    period: TimePeriod,
    #[serde(default)]
    user_log_name: Option<String>,
}

impl From<RawLogIdentifier> for LogIdentifier {
    fn from(raw: RawLogIdentifier) -> Self {
        Self::new(raw.channel_name, raw.period, raw.user_log_name)
    }
}

impl LogIdentifier {
    /// Create an identifier. An empty user-log name means a channel log.
    pub fn new(
        channel_name: impl Into<String>,
        period: TimePeriod,
        user_log_name: Option<String>,
    ) -> Self {
        Self {
            channel_name: channel_name.into(),
            period,
            user_log_name: user_log_name.filter(|name| !name.is_empty()),
        }
    }

    /// Identifier of a channel log
    pub fn channel(channel_name: impl Into<String>, period: TimePeriod) -> Self {
        Self::new(channel_name, period, None)
    }

    /// Identifier of a user log
    pub fn user(
        channel_name: impl Into<String>,
        period: TimePeriod,
        user_log_name: impl Into<String>,
    ) -> Self {
        Self::new(channel_name, period, Some(user_log_name.into()))
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn period(&self) -> &TimePeriod {
        &self.period
    }

    pub fn user_log_name(&self) -> Option<&str> {
        self.user_log_name.as_deref()
    }

    pub fn is_channel_log(&self) -> bool {
        self.user_log_name.is_none()
    }

    pub fn is_user_log(&self) -> bool {
        self.user_log_name.is_some()
    }
}

impl fmt::Display for LogIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}/{}", self.channel_name, self.period)?;
        if let Some(user) = &self.user_log_name {
            write!(f, "/{}", user)?;
        }
        Ok(())
    }
}
