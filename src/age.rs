//! Minimum-age filter: `5d`, `4w`, `3m`, `1y`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::ConfigError;

/// How long an item must have sat in the library before it may be purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinAge {
    amount: u32,
    unit: AgeUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgeUnit {
    Days,
    Weeks,
    /// 30 days.
    Months,
    /// 365 days.
    Years,
}

impl AgeUnit {
    fn days(self) -> i64 {
        match self {
            Self::Days => 1,
            Self::Weeks => 7,
            Self::Months => 30,
            Self::Years => 365,
        }
    }

    fn suffix(self) -> char {
        match self {
            Self::Days => 'd',
            Self::Weeks => 'w',
            Self::Months => 'm',
            Self::Years => 'y',
        }
    }
}

impl MinAge {
    pub fn as_delta(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.amount) * self.unit.days())
    }

    /// Items without a recorded `added_at` count as old enough.
    pub fn is_satisfied_by(&self, added_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match added_at {
            Some(added) => now.signed_duration_since(added) >= self.as_delta(),
            None => true,
        }
    }
}

impl FromStr for MinAge {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidAge(s.to_string());
        let t = s.trim().to_ascii_lowercase();
        let unit = match t.chars().last().ok_or_else(invalid)? {
            'd' => AgeUnit::Days,
            'w' => AgeUnit::Weeks,
            'm' => AgeUnit::Months,
            'y' => AgeUnit::Years,
            _ => return Err(invalid()),
        };
        let digits = t[..t.len() - 1].trim_end();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let amount = digits.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { amount, unit })
    }
}

impl fmt::Display for MinAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}
