//! Compact duration tokens for conversation expiry.
//!
//! A token is an unsigned integer immediately followed by one unit letter:
//! `s` (seconds), `m` (minutes), `h` (hours) or `d` (days). The literal `-1`
//! and the empty token mean "never expire". [`TimeToLive::parse`] falls back to
//! [`TimeToLive::Never`] for anything else; [`TimeToLive::parse_strict`] reports
//! the problem instead.

use crate::ConfigError;
use log::warn;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Token that disables expiry.
pub const NO_EXPIRY_TOKEN: &str = "-1";
/// Engine-native expiry value meaning "no expiry".
pub const NO_EXPIRY_SECONDS: i64 = -1;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Largest expiry accepted, in seconds. Engines store expiry in milliseconds.
pub const MAX_SECONDS: u64 = (i64::MAX / 1000) as u64;

/// Expiry applied to a conversation key after each write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeToLive {
    /// Keys never expire.
    #[default]
    Never,
    /// Keys expire after this many idle seconds, in `1..=MAX_SECONDS`.
    Seconds(u64),
}

impl TimeToLive {
    /// Parse a token, falling back to [`TimeToLive::Never`] when it is not recognized.
    pub fn parse(token: &str) -> Self {
        match Self::parse_strict(token) {
            Ok(ttl) => ttl,
            Err(err) => {
                warn!("time-to-live not recognized, conversations will not expire ({err})");
                TimeToLive::Never
            }
        }
    }

    /// Parse an optional token; `None` means "never expire".
    pub fn parse_optional(token: Option<&str>) -> Self {
        token.map_or(TimeToLive::Never, Self::parse)
    }

    /// Parse a token, rejecting anything outside the grammar.
    pub fn parse_strict(token: &str) -> Result<Self, ConfigError> {
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed == NO_EXPIRY_TOKEN {
            return Ok(TimeToLive::Never);
        }

        let Some(unit) = trimmed.chars().last() else {
            return Ok(TimeToLive::Never);
        };
        let multiplier = match unit {
            's' => 1,
            'm' => SECONDS_PER_MINUTE,
            'h' => SECONDS_PER_HOUR,
            'd' => SECONDS_PER_DAY,
            _ => return Err(invalid(token, "expected a unit of s, m, h or d")),
        };

        let magnitude = &trimmed[..trimmed.len() - unit.len_utf8()];
        if magnitude.is_empty() || !magnitude.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid(token, "expected an unsigned integer before the unit"));
        }
        let magnitude: u64 = magnitude
            .parse()
            .map_err(|_| invalid(token, "magnitude is out of range"))?;
        if magnitude == 0 {
            return Err(invalid(token, "a zero time-to-live would expire keys on write"));
        }

        magnitude
            .checked_mul(multiplier)
            .filter(|seconds| *seconds <= MAX_SECONDS)
            .map(TimeToLive::Seconds)
            .ok_or_else(|| invalid(token, "magnitude is out of range"))
    }

    /// Check that a value built in code is one the engine can arm.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            TimeToLive::Never => Ok(()),
            TimeToLive::Seconds(0) => Err(ConfigError::InvalidTimeToLive {
                token: "0s".to_string(),
                reason: "a zero time-to-live would expire keys on write".to_string(),
            }),
            TimeToLive::Seconds(seconds) if seconds > MAX_SECONDS => {
                Err(ConfigError::InvalidTimeToLive {
                    token: format!("{seconds}s"),
                    reason: format!("exceeds the maximum of {MAX_SECONDS}s"),
                })
            }
            TimeToLive::Seconds(_) => Ok(()),
        }
    }

    /// Whether keys are left without expiry.
    pub fn is_never(&self) -> bool {
        matches!(self, TimeToLive::Never)
    }

    /// Seconds as understood by the engine, `-1` for no expiry.
    pub fn as_engine_seconds(&self) -> i64 {
        match self {
            TimeToLive::Never => NO_EXPIRY_SECONDS,
            TimeToLive::Seconds(seconds) => i64::try_from(*seconds).unwrap_or(i64::MAX),
        }
    }

    /// Expiry as a duration, `None` for no expiry.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            TimeToLive::Never => None,
            TimeToLive::Seconds(seconds) => Some(Duration::from_secs(*seconds)),
        }
    }
}

fn invalid(token: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidTimeToLive {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for TimeToLive {
    /// Render the shortest token that parses back to the same value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = match self {
            TimeToLive::Never => return f.write_str(NO_EXPIRY_TOKEN),
            TimeToLive::Seconds(seconds) => *seconds,
        };
        if seconds % SECONDS_PER_DAY == 0 {
            write!(f, "{}d", seconds / SECONDS_PER_DAY)
        } else if seconds % SECONDS_PER_HOUR == 0 {
            write!(f, "{}h", seconds / SECONDS_PER_HOUR)
        } else if seconds % SECONDS_PER_MINUTE == 0 {
            write!(f, "{}m", seconds / SECONDS_PER_MINUTE)
        } else {
            write!(f, "{seconds}s")
        }
    }
}

impl FromStr for TimeToLive {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(TimeToLive::parse(value))
    }
}

impl From<&str> for TimeToLive {
    fn from(token: &str) -> Self {
        TimeToLive::parse(token)
    }
}
