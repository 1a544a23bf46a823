//! The sequence-dependent setup time (SDST) matrix.

use std::collections::HashMap;

use super::ids::SurgeryTypeId;

/// `(from_type, to_type) -> non-negative setup minutes`, total over all
/// pairs of known surgery types plus the distinguished `INITIAL` sentinel.
///
/// `from = None` represents `INITIAL`: the setup required when a room opens
/// before its first surgery (§3). Entries absent from the sparse backing map
/// default to zero, but [`SdstMatrix::lookup`] is a total function — every
/// `(from, to)` pair has a well-defined answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SdstMatrix {
    entries: HashMap<(Option<SurgeryTypeId>, SurgeryTypeId), u32>,
}

impl SdstMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matrix from `(from, to, minutes)` rows. `from = None` is the
    /// `INITIAL` sentinel row.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<SurgeryTypeId>, SurgeryTypeId, u32)>,
    {
        let mut entries = HashMap::new();
        for (from, to, minutes) in rows {
            entries.insert((from, to), minutes);
        }
        Self { entries }
    }

    pub fn set(&mut self, from: Option<SurgeryTypeId>, to: SurgeryTypeId, minutes: u32) {
        self.entries.insert((from, to), minutes);
    }

    /// Total lookup: `from = None` means `INITIAL`. Missing entries default
    /// to zero minutes of setup.
    pub fn lookup(&self, from: Option<&str>, to: &str) -> u32 {
        let key_from = from.map(str::to_owned);
        self.entries
            .get(&(key_from, to.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    /// Setup required when a room opens before surgery type `to`.
    pub fn initial(&self, to: &str) -> u32 {
        self.lookup(None, to)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted `(from, to, minutes)` rows, used for canonical fingerprinting
    /// (§4.10) so the hash is independent of hash-map iteration order.
    pub fn sorted_rows(&self) -> Vec<(Option<SurgeryTypeId>, SurgeryTypeId, u32)> {
        let mut rows: Vec<_> = self
            .entries
            .iter()
            .map(|((from, to), minutes)| (from.clone(), to.clone(), *minutes))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entries_default_to_zero() {
        let m = SdstMatrix::new();
        assert_eq!(m.lookup(Some("A"), "B"), 0);
        assert_eq!(m.initial("A"), 0);
    }

    #[test]
    fn explicit_entries_override_default() {
        let m = SdstMatrix::from_rows([
            (None, "A".to_string(), 10),
            (Some("A".to_string()), "B".to_string(), 30),
        ]);
        assert_eq!(m.initial("A"), 10);
        assert_eq!(m.lookup(Some("A"), "B"), 30);
        assert_eq!(m.lookup(Some("B"), "A"), 0);
    }

    #[test]
    fn sorted_rows_are_deterministic() {
        let m = SdstMatrix::from_rows([
            (Some("B".to_string()), "A".to_string(), 5),
            (None, "A".to_string(), 1),
            (Some("A".to_string()), "B".to_string(), 2),
        ]);
        let rows = m.sorted_rows();
        let rows2 = m.sorted_rows();
        assert_eq!(rows, rows2);
        assert_eq!(rows[0].0, None);
    }
}
