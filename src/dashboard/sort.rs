use crate::scoring::{Frequency, RankedOil};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// How the dashboard table is ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Score,
    Beneficial,
    Blends,
    Components,
    Therapeutic,
}

/// Sentinel position for a top component the oil doesn't list
const MISSING_POSITION: usize = 999;

/// How many of the most common components drive `SortMode::Components`
const TOP_COMPONENTS: usize = 5;

impl SortMode {
    pub const ALL: [SortMode; 5] = [
        SortMode::Score,
        SortMode::Beneficial,
        SortMode::Blends,
        SortMode::Components,
        SortMode::Therapeutic,
    ];

    /// Case-insensitive; anything unrecognized sorts by score
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "beneficial" => SortMode::Beneficial,
            "blends" => SortMode::Blends,
            "components" => SortMode::Components,
            "therapeutic" => SortMode::Therapeutic,
            _ => SortMode::Score,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Score => "score",
            SortMode::Beneficial => "beneficial",
            SortMode::Blends => "blends",
            SortMode::Components => "components",
            SortMode::Therapeutic => "therapeutic",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Score => "Top Oils",
            SortMode::Beneficial => "Most Beneficial",
            SortMode::Blends => "Most Blendable",
            SortMode::Components => "By Components",
            SortMode::Therapeutic => "By Therapeutic Use",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep oils whose name contains `query`, ignoring case. An empty query keeps everything.
pub fn filter_by_query(oils: Vec<RankedOil>, query: &str) -> Vec<RankedOil> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return oils;
    }
    oils.into_iter()
        .filter(|o| o.oil.oil_name.to_lowercase().contains(&needle))
        .collect()
}

/// Order `oils` for display. All sorts are stable.
pub fn sort_oils(oils: &mut [RankedOil], mode: SortMode) {
    match mode {
        SortMode::Score => oils.sort_by(|a, b| desc(a.score, b.score)),
        SortMode::Beneficial => oils.sort_by(|a, b| {
            desc(a.beneficial_score, b.beneficial_score)
                .then_with(|| b.oil.oil_name.cmp(&a.oil.oil_name))
        }),
        SortMode::Blends => oils.sort_by(|a, b| {
            b.blend_count
                .cmp(&a.blend_count)
                .then_with(|| desc(a.score, b.score))
                .then_with(|| b.oil.oil_name.cmp(&a.oil.oil_name))
        }),
        SortMode::Therapeutic => sort_by_top_property(oils),
        SortMode::Components => sort_by_component_priority(oils),
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Oils listing the most common therapeutic property first, then by score
fn sort_by_top_property(oils: &mut [RankedOil]) {
    let freq: Frequency = oils
        .iter()
        .flat_map(|o| o.oil.therapeutic_properties.iter())
        .collect();
    let Some(top) = freq.top().map(str::to_string) else {
        oils.sort_by(|a, b| desc(a.score, b.score));
        return;
    };

    oils.sort_by(|a, b| {
        let has_a = a.oil.therapeutic_properties.contains_ignore_case(&top);
        let has_b = b.oil.therapeutic_properties.contains_ignore_case(&top);
        has_b.cmp(&has_a).then_with(|| desc(a.score, b.score))
    });
}

/// Sort by where each of the five most common components sits in the oil's own list
fn sort_by_component_priority(oils: &mut [RankedOil]) {
    let freq: Frequency = oils
        .iter()
        .flat_map(|o| o.oil.main_chemical_components.iter())
        .collect();
    let top: Vec<String> = freq
        .most_common(TOP_COMPONENTS)
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    if top.is_empty() {
        oils.sort_by(|a, b| desc(a.score, b.score));
        return;
    }

    let priority = |oil: &RankedOil| -> Vec<usize> {
        top.iter()
            .map(|c| {
                oil.oil
                    .main_chemical_components
                    .position_ignore_case(c)
                    .unwrap_or(MISSING_POSITION)
            })
            .collect()
    };

    oils.sort_by_cached_key(|o| (priority(o), ScoreDesc(o.score)));
}

/// Orders scores highest first inside a cached sort key
#[derive(PartialEq)]
struct ScoreDesc(f64);

impl Eq for ScoreDesc {}

impl PartialOrd for ScoreDesc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreDesc {
    fn cmp(&self, other: &Self) -> Ordering {
        desc(self.0, other.0)
    }
}
