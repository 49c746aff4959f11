// mute durations, written as compact literals like "10m" or "1d"

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration '{0}', expected a number followed by s, m, h or d (e.g. 10m)")]
    Malformed(String),

    #[error("unknown duration unit '{0}', expected one of s, m, h, d")]
    UnknownUnit(char),

    #[error("duration must be at least 1")]
    Zero,

    #[error("duration '{0}' is too long")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl Unit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::Seconds),
            'm' => Some(Self::Minutes),
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            _ => None,
        }
    }

    fn suffix(self) -> char {
        match self {
            Self::Seconds => 's',
            Self::Minutes => 'm',
            Self::Hours => 'h',
            Self::Days => 'd',
        }
    }

    fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 60 * 60,
            Self::Days => 86_400,
        }
    }
}

/// A validated mute duration. Keeps the literal it was parsed from so it can
/// be shown back to users and persisted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MuteDuration {
    amount: u64,
    unit: Unit,
}

impl MuteDuration {
    pub fn new(amount: u64, unit: Unit) -> Result<Self, DurationError> {
        if amount == 0 {
            return Err(DurationError::Zero);
        }
        amount
            .checked_mul(unit.seconds())
            .ok_or_else(|| DurationError::Overflow(format!("{amount}{}", unit.suffix())))?;

        Ok(Self { amount, unit })
    }

    pub fn as_duration(&self) -> Duration {
        // checked in new()
        Duration::from_secs(self.amount * self.unit.seconds())
    }

    pub fn as_secs(&self) -> u64 {
        self.as_duration().as_secs()
    }
}

impl Default for MuteDuration {
    fn default() -> Self {
        Self {
            amount: 10,
            unit: Unit::Minutes,
        }
    }
}

impl FromStr for MuteDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit_char = s.chars().last().ok_or(DurationError::Empty)?;
        let digits = &s[..s.len() - unit_char.len_utf8()];

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DurationError::Malformed(s.to_string()));
        }

        let unit = Unit::from_char(unit_char).ok_or(DurationError::UnknownUnit(unit_char))?;
        let amount: u64 = digits
            .parse()
            .map_err(|_| DurationError::Overflow(s.to_string()))?;

        Self::new(amount, unit)
    }
}

impl fmt::Display for MuteDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl TryFrom<String> for MuteDuration {
    type Error = DurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MuteDuration> for String {
    fn from(d: MuteDuration) -> Self {
        d.to_string()
    }
}
