use super::config::CappedTerm;
use std::collections::BTreeMap;

impl CappedTerm {
    /// Contribution of a list with `len` entries
    pub fn apply(&self, len: usize) -> f64 {
        if self.cap == 0 {
            return 0.0;
        }
        len.min(self.cap) as f64 / self.cap as f64 * self.weight
    }
}

/// Sum of `weight * decay^i` for `i` in `0..count`
pub fn decayed_sum(count: usize, weight: f64, decay: f64) -> f64 {
    (0..count).map(|i| weight * decay.powi(i as i32)).sum()
}

/// Look up a note weight by its lower-cased, trimmed form
pub fn note_weight(note: &str, weights: &BTreeMap<String, f64>, default: f64) -> f64 {
    weights
        .get(note.trim().to_lowercase().as_str())
        .copied()
        .unwrap_or(default)
}

/// Round half away from zero to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
