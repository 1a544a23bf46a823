//! Surgery urgency levels and their weighting in the evaluator.

use std::fmt;

/// Clinical urgency of a pending surgery.
///
/// Ordered so that `Emergency > High > Medium > Low`; the ordering is used
/// to sort the initial-solution construction queue (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Urgency {
    Low,
    Medium,
    High,
    Emergency,
}

impl Urgency {
    /// Weight used by the urgency-violation cost component (§4.4).
    ///
    /// Emergency is weighted orders of magnitude above the others so that,
    /// under default weights, no amount of makespan or SDST savings can
    /// justify delaying an emergency past its deadline.
    pub const fn weight(self) -> u32 {
        match self {
            Urgency::Low => 1,
            Urgency::Medium => 10,
            Urgency::High => 100,
            Urgency::Emergency => 10_000,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
            Urgency::Emergency => "Emergency",
        };
        write!(f, "{s}")
    }
}
