//! Fixed-point currency amounts.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minor units (centimes) per major unit.
const MINOR_PER_MAJOR: i64 = 100;

/// Error parsing a decimal amount string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("Amount must not be empty")]
    Empty,
    #[error("Amount has more than two decimal places: {0}")]
    TooPrecise(String),
    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// A currency amount held as an integer count of minor units.
///
/// All monetary arithmetic in the crate goes through this type; there is no
/// floating point anywhere in a money path. On the wire and in the database
/// an `Amount` is a plain integer of minor units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Build an amount from a raw count of minor units.
    #[must_use]
    pub const fn from_minor_units(minor: i64) -> Self {
        Self(minor)
    }

    /// The raw count of minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// The smaller of two amounts.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Subtraction clamped at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0 - other.0;
        if diff < 0 {
            Self(0)
        } else {
            Self(diff)
        }
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02}",
            abs / MINOR_PER_MAJOR as u64,
            abs % MINOR_PER_MAJOR as u64
        )
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Parse a decimal string like `"120"`, `"120.5"`, or `"120.50"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseAmountError::Empty);
        }

        let (raw, negative) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        let (major_str, fraction_str) = match raw.split_once('.') {
            Some((major, fraction)) => (major, fraction),
            None => (raw, ""),
        };

        if fraction_str.len() > 2 {
            return Err(ParseAmountError::TooPrecise(s.to_string()));
        }

        let major: i64 = if major_str.is_empty() {
            0
        } else {
            major_str
                .parse()
                .map_err(|_| ParseAmountError::Invalid(s.to_string()))?
        };

        let minor: i64 = if fraction_str.is_empty() {
            0
        } else {
            let padded = format!("{fraction_str:0<2}");
            padded
                .parse()
                .map_err(|_| ParseAmountError::Invalid(s.to_string()))?
        };

        let total = major * MINOR_PER_MAJOR + minor;
        Ok(Self(if negative { -total } else { total }))
    }
}
