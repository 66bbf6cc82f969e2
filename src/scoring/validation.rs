use super::config::{CappedTerm, ScoringConfig};

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let terms = [
        ("scoring.therapeutic", config.therapeutic),
        ("scoring.emotional", config.emotional),
        ("scoring.components", config.components),
        ("scoring.blends", config.blends),
        ("scoring.beneficial.blends", config.beneficial.blends),
    ];
    for (path, term) in terms {
        check_term(path, term, &mut errors);
    }

    check_positive("scoring.note_divisor", config.note_divisor, &mut errors);
    check_positive("scoring.aroma_divisor", config.aroma_divisor, &mut errors);

    check_weight("scoring.default_note_weight", config.default_note_weight, &mut errors);
    check_weight("scoring.most_blended_bonus", config.most_blended_bonus, &mut errors);
    for (note, weight) in &config.note_weights {
        if note.trim().to_lowercase() != *note {
            errors.push(format!(
                "scoring.note_weights: key '{}' must be lower-case without surrounding spaces",
                note
            ));
        }
        check_weight(&format!("scoring.note_weights.{}", note), *weight, &mut errors);
    }

    let b = &config.beneficial;
    check_weight("scoring.beneficial.therapeutic_weight", b.therapeutic_weight, &mut errors);
    check_weight("scoring.beneficial.emotional_weight", b.emotional_weight, &mut errors);
    if !(b.decay > 0.0 && b.decay <= 1.0) {
        errors.push(format!(
            "scoring.beneficial.decay: must be in (0, 1], got {}",
            b.decay
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_term(path: &str, term: CappedTerm, errors: &mut Vec<String>) {
    if term.cap == 0 {
        errors.push(format!("{}.cap: must be at least 1", path));
    }
    check_weight(&format!("{}.weight", path), term.weight, errors);
}

fn check_weight(path: &str, value: f64, errors: &mut Vec<String>) {
    if !value.is_finite() || value < 0.0 {
        errors.push(format!("{}: must be a non-negative number, got {}", path, value));
    }
}

fn check_positive(path: &str, value: f64, errors: &mut Vec<String>) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(format!("{}: must be greater than zero, got {}", path, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_scoring(&ScoringConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_cap() {
        let config = ScoringConfig {
            components: CappedTerm::new(0, 2.0),
            ..ScoringConfig::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("scoring.components.cap"));
    }

    #[test]
    fn test_negative_weight() {
        let config = ScoringConfig {
            most_blended_bonus: -1.0,
            ..ScoringConfig::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("most_blended_bonus"));
    }

    #[test]
    fn test_zero_divisor() {
        let config = ScoringConfig {
            aroma_divisor: 0.0,
            ..ScoringConfig::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.aroma_divisor"));
    }

    #[test]
    fn test_decay_out_of_range() {
        let mut config = ScoringConfig::default();
        config.beneficial.decay = 1.5;
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.beneficial.decay"));

        config.beneficial.decay = 0.0;
        assert!(validate_scoring(&config).is_err());

        config.beneficial.decay = 1.0;
        assert!(validate_scoring(&config).is_ok());
    }

    #[test]
    fn test_note_weight_key_must_be_lowercase() {
        let mut config = ScoringConfig::default();
        config.note_weights.insert("Base".to_string(), 2.0);
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("'Base'"));
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = ScoringConfig {
            therapeutic: CappedTerm::new(0, -3.0),
            note_divisor: f64::NAN,
            ..ScoringConfig::default()
        };
        config.beneficial.emotional_weight = f64::INFINITY;
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
