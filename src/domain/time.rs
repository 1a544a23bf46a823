//! Integer-minutes time arithmetic.
//!
//! The optimization core works exclusively in whole minutes: durations,
//! setup times, and the cost components derived from them are all integers.
//! `Minutes` is a thin newtype over `i64` so a stray `f64` timestamp can
//! never slip into the timing kernel or the evaluator.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A point in time or a duration, expressed in whole minutes.
///
/// Points in time are minutes since midnight of the scheduling date (or any
/// other fixed epoch the host chooses — the core never inspects the epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Minutes(pub i64);

impl Minutes {
    pub const ZERO: Minutes = Minutes(0);

    pub const fn new(minutes: i64) -> Self {
        Minutes(minutes)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Saturating difference, clamped at zero (never negative).
    pub fn saturating_sub_nonneg(self, other: Minutes) -> Minutes {
        Minutes((self.0 - other.0).max(0))
    }
}

impl Add for Minutes {
    type Output = Minutes;
    fn add(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 + rhs.0)
    }
}

impl AddAssign for Minutes {
    fn add_assign(&mut self, rhs: Minutes) {
        self.0 += rhs.0;
    }
}

impl Sub for Minutes {
    type Output = Minutes;
    fn sub(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 - rhs.0)
    }
}

impl SubAssign for Minutes {
    fn sub_assign(&mut self, rhs: Minutes) {
        self.0 -= rhs.0;
    }
}

impl Sum for Minutes {
    fn sum<I: Iterator<Item = Minutes>>(iter: I) -> Self {
        iter.fold(Minutes::ZERO, Add::add)
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}min", self.0)
    }
}

impl From<i64> for Minutes {
    fn from(v: i64) -> Self {
        Minutes(v)
    }
}

impl From<u32> for Minutes {
    fn from(v: u32) -> Self {
        Minutes(v as i64)
    }
}
