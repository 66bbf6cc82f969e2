use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main scoring configuration.
///
/// Every constant of the overall and beneficial formulas lives here. The defaults
/// reproduce the stock dashboard ranking; a config file only needs to name what it changes.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   therapeutic: { cap: 20, weight: 3 }
///   most_blended_bonus: 1
///   note_weights:
///     base: 2.0
///   beneficial:
///     decay: 0.9
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Therapeutic properties term (default: cap 20, weight 3)
    pub therapeutic: CappedTerm,

    /// Emotional effects term (default: cap 10, weight 2)
    pub emotional: CappedTerm,

    /// Main chemical components term (default: cap 8, weight 2)
    pub components: CappedTerm,

    /// Blend partners term (default: cap 10, weight 1)
    pub blends: CappedTerm,

    /// Sum of note weights is divided by this (default: 5)
    pub note_divisor: f64,

    /// Aroma descriptor count is divided by this (default: 5)
    pub aroma_divisor: f64,

    /// Weight per lower-cased note string
    pub note_weights: BTreeMap<String, f64>,

    /// Weight for notes missing from `note_weights` (default: 0.5)
    pub default_note_weight: f64,

    /// Flat bonus for the oil named most often across all blend lists (default: 1)
    pub most_blended_bonus: f64,

    pub beneficial: BeneficialConfig,
}

/// A list-length term: `min(len, cap) / cap * weight`
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CappedTerm {
    pub cap: usize,
    pub weight: f64,
}

impl CappedTerm {
    pub const fn new(cap: usize, weight: f64) -> Self {
        Self { cap, weight }
    }
}

/// Beneficial score configuration.
///
/// Leading entries of the therapeutic and emotional lists count more than later ones:
/// item `i` contributes `weight * decay^i`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BeneficialConfig {
    pub therapeutic_weight: f64,
    pub emotional_weight: f64,
    pub decay: f64,
    pub blends: CappedTerm,
}

impl Default for BeneficialConfig {
    fn default() -> Self {
        Self {
            therapeutic_weight: 2.0,
            emotional_weight: 1.5,
            decay: 0.95,
            blends: CappedTerm::new(10, 1.0),
        }
    }
}

/// Stock note weights, from most volatile to least
pub fn default_note_weights() -> BTreeMap<String, f64> {
    [
        ("top", 0.5),
        ("top/middle", 0.8),
        ("middle", 1.0),
        ("middle/base", 1.3),
        ("base", 1.5),
        ("top/base", 1.4),
    ]
    .into_iter()
    .map(|(note, weight)| (note.to_string(), weight))
    .collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            therapeutic: CappedTerm::new(20, 3.0),
            emotional: CappedTerm::new(10, 2.0),
            components: CappedTerm::new(8, 2.0),
            blends: CappedTerm::new(10, 1.0),
            note_divisor: 5.0,
            aroma_divisor: 5.0,
            note_weights: default_note_weights(),
            default_note_weight: 0.5,
            most_blended_bonus: 1.0,
            beneficial: BeneficialConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.therapeutic, CappedTerm::new(20, 3.0));
        assert_eq!(config.emotional, CappedTerm::new(10, 2.0));
        assert_eq!(config.components, CappedTerm::new(8, 2.0));
        assert_eq!(config.blends, CappedTerm::new(10, 1.0));
        assert_eq!(config.note_weights.get("middle/base"), Some(&1.3));
        assert_eq!(config.note_weights.len(), 6);
        assert_eq!(config.beneficial.decay, 0.95);
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_scoring_config_parse() {
        let yaml = r#"
most_blended_bonus: 2.5
therapeutic:
  cap: 10
  weight: 4
beneficial:
  decay: 0.9
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.most_blended_bonus, 2.5);
        assert_eq!(config.therapeutic, CappedTerm::new(10, 4.0));
        assert_eq!(config.beneficial.decay, 0.9);
        assert_eq!(config.beneficial.therapeutic_weight, 2.0);
        assert_eq!(config.emotional, CappedTerm::new(10, 2.0));
    }

    #[test]
    fn test_empty_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, ScoringConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ScoringConfig, _> = serde_saphyr::from_str("base_score: 100\n");
        assert!(result.is_err());
    }
}
