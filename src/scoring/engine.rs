use super::config::ScoringConfig;
use super::factors::{decayed_sum, note_weight, round2};
use super::frequency::Frequency;
use crate::catalog::OilRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct FactorContribution {
    pub label: String,       // e.g. "Therapeutic", "Notes", "Most blended"
    pub description: String, // e.g. "12 of 20 -> x3", "top/middle=0.8 / 5"
    pub points: f64,         // Unrounded contribution to the total
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub factors: Vec<FactorContribution>,
}

impl ScoreBreakdown {
    fn push(&mut self, label: &str, description: String, points: f64) {
        self.factors.push(FactorContribution {
            label: label.to_string(),
            description,
            points,
        });
    }

    fn total(&self) -> f64 {
        self.factors.iter().map(|f| f.points).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    /// Rounded to two decimals
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// An oil with its derived scores and global ranks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedOil {
    #[serde(flatten)]
    pub oil: OilRecord,
    pub score: f64,
    pub beneficial_score: f64,
    pub blend_count: usize,
    pub rank: usize,
    pub beneficial_rank: usize,
}

/// Scored catalog plus the blend-name frequency table it was ranked with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredCatalog {
    /// Same order as the input
    pub oils: Vec<RankedOil>,
    pub blend_counts: Frequency,
}

impl ScoredCatalog {
    /// Name listed most often across all blend lists (first seen wins ties)
    pub fn most_blended_oil(&self) -> Option<&str> {
        self.blend_counts.top()
    }
}

/// Count every non-empty blend entry, verbatim, in catalog order
pub fn blend_frequency(oils: &[OilRecord]) -> Frequency {
    oils.iter()
        .flat_map(|oil| oil.blends_well_with.iter())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Overall relevance score of one oil
pub fn calculate_score(
    oil: &OilRecord,
    config: &ScoringConfig,
    most_blended: Option<&str>,
) -> ScoreResult {
    let mut breakdown = ScoreBreakdown::default();

    let capped = [
        ("Therapeutic", oil.therapeutic_properties.len(), config.therapeutic),
        ("Emotional", oil.emotional_effects.len(), config.emotional),
        ("Components", oil.main_chemical_components.len(), config.components),
        ("Blends", oil.blends_well_with.len(), config.blends),
    ];
    for (label, len, term) in capped {
        breakdown.push(
            label,
            format!("{} of {} -> x{}", len.min(term.cap), term.cap, term.weight),
            term.apply(len),
        );
    }

    let note_sum: f64 = oil
        .note
        .iter()
        .map(|n| note_weight(n, &config.note_weights, config.default_note_weight))
        .sum();
    breakdown.push(
        "Notes",
        format!("{} ({:.2}) / {}", oil.note.joined(), note_sum, config.note_divisor),
        note_sum / config.note_divisor,
    );

    breakdown.push(
        "Aroma",
        format!("{} descriptors / {}", oil.aroma_profile.len(), config.aroma_divisor),
        oil.aroma_profile.len() as f64 / config.aroma_divisor,
    );

    if most_blended.is_some_and(|name| name == oil.oil_name) {
        breakdown.push(
            "Most blended",
            "named in the most blend lists".to_string(),
            config.most_blended_bonus,
        );
    }

    ScoreResult {
        score: round2(breakdown.total()),
        breakdown,
    }
}

/// Beneficial score: ordered therapeutic and emotional entries with decaying weight,
/// plus a light blend-diversity term
pub fn calculate_beneficial_score(oil: &OilRecord, config: &ScoringConfig) -> ScoreResult {
    let b = &config.beneficial;
    let mut breakdown = ScoreBreakdown::default();

    let therapeutic = oil.therapeutic_properties.len();
    breakdown.push(
        "Therapeutic",
        format!("{} items, {} x {}^i", therapeutic, b.therapeutic_weight, b.decay),
        decayed_sum(therapeutic, b.therapeutic_weight, b.decay),
    );

    let emotional = oil.emotional_effects.len();
    breakdown.push(
        "Emotional",
        format!("{} items, {} x {}^i", emotional, b.emotional_weight, b.decay),
        decayed_sum(emotional, b.emotional_weight, b.decay),
    );

    let blends = oil.blends_well_with.len();
    breakdown.push(
        "Blends",
        format!("{} of {} -> x{}", blends.min(b.blends.cap), b.blends.cap, b.blends.weight),
        b.blends.apply(blends),
    );

    ScoreResult {
        score: round2(breakdown.total()),
        breakdown,
    }
}

/// Score every oil and assign global ranks.
///
/// Expects a catalog whose blend relation is already symmetric (see
/// [`super::normalize_blends`]). Never fails: missing fields contribute nothing.
pub fn score_catalog(oils: Vec<OilRecord>, config: &ScoringConfig) -> ScoredCatalog {
    let blend_counts = blend_frequency(&oils);
    let most_blended = blend_counts.top().map(str::to_string);

    let mut ranked: Vec<RankedOil> = oils
        .into_iter()
        .map(|oil| {
            let score = calculate_score(&oil, config, most_blended.as_deref()).score;
            let beneficial_score = calculate_beneficial_score(&oil, config).score;
            RankedOil {
                blend_count: oil.blends_well_with.len(),
                oil,
                score,
                beneficial_score,
                rank: 0,
                beneficial_rank: 0,
            }
        })
        .collect();

    for (idx, rank) in rank_descending(&ranked, |o| o.score).into_iter().enumerate() {
        ranked[idx].rank = rank;
    }
    for (idx, rank) in rank_descending(&ranked, |o| o.beneficial_score)
        .into_iter()
        .enumerate()
    {
        ranked[idx].beneficial_rank = rank;
    }

    tracing::debug!(
        oils = ranked.len(),
        distinct_blend_names = blend_counts.len(),
        most_blended = most_blended.as_deref().unwrap_or(""),
        "catalog scored"
    );

    ScoredCatalog {
        oils: ranked,
        blend_counts,
    }
}

/// Score with the stock configuration
pub fn score_oils(oils: Vec<OilRecord>) -> ScoredCatalog {
    score_catalog(oils, &ScoringConfig::default())
}

/// 1-based rank of each element (by input index) under a stable descending sort on `key`
fn rank_descending<F>(oils: &[RankedOil], key: F) -> Vec<usize>
where
    F: Fn(&RankedOil) -> f64,
{
    let mut order: Vec<usize> = (0..oils.len()).collect();
    order.sort_by(|&a, &b| {
        key(&oils[b])
            .partial_cmp(&key(&oils[a]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0; oils.len()];
    for (position, idx) in order.into_iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}
