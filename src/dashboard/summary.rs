use crate::catalog::TagList;
use crate::scoring::{Frequency, RankedOil, ScoredCatalog};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const TOP_N: usize = 5;

/// Distinct-value count and the five most frequent values of one tag field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacetSummary {
    pub count: usize,
    pub top: Vec<String>,
}

impl FacetSummary {
    fn from_frequency(freq: &Frequency) -> Self {
        Self {
            count: freq.len(),
            top: freq
                .most_common(TOP_N)
                .into_iter()
                .map(|(value, _)| value.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendLeader {
    pub oil_id: u32,
    pub oil_name: String,
    pub blend_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlendSummary {
    /// Distinct names across all blend lists
    pub count: usize,
    pub top: Vec<BlendLeader>,
}

/// Catalog-wide aggregates shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_oils: usize,
    pub composition: FacetSummary,
    pub main_components: FacetSummary,
    pub therapeutic: FacetSummary,
    pub emotional: FacetSummary,
    pub blends: BlendSummary,
    /// Number of oils listing each component
    pub component_freq: Frequency,
    pub blend_freq: Frequency,
}

impl Summary {
    pub fn build(scored: &ScoredCatalog) -> Self {
        let oils = &scored.oils;
        let component_freq = component_frequency(oils);

        let mut leaders: Vec<&RankedOil> = oils.iter().collect();
        leaders.sort_by(|a, b| b.blend_count.cmp(&a.blend_count));

        Self {
            total_oils: oils.len(),
            composition: facet(oils, |o| &o.oil.composition),
            main_components: FacetSummary::from_frequency(&component_freq),
            therapeutic: facet(oils, |o| &o.oil.therapeutic_properties),
            emotional: facet(oils, |o| &o.oil.emotional_effects),
            blends: BlendSummary {
                count: scored.blend_counts.len(),
                top: leaders
                    .into_iter()
                    .take(TOP_N)
                    .map(|o| BlendLeader {
                        oil_id: o.oil.oil_id,
                        oil_name: o.oil.oil_name.clone(),
                        blend_count: o.blend_count,
                    })
                    .collect(),
            },
            component_freq,
            blend_freq: scored.blend_counts.clone(),
        }
    }

    /// Component with the most oils and that oil count
    pub fn most_common_component(&self) -> Option<(&str, usize)> {
        self.component_freq.most_common(1).into_iter().next()
    }
}

fn facet<F>(oils: &[RankedOil], field: F) -> FacetSummary
where
    F: Fn(&RankedOil) -> &TagList,
{
    let freq: Frequency = oils.iter().flat_map(|o| field(o).iter()).collect();
    FacetSummary::from_frequency(&freq)
}

/// Count the oils containing each main component.
///
/// Components are compared ignoring case and surrounding whitespace, an oil counts once
/// per component, and the first spelling seen becomes the display key.
pub fn component_frequency(oils: &[RankedOil]) -> Frequency {
    let mut display: HashMap<String, String> = HashMap::new();
    let mut freq = Frequency::new();

    for oil in oils {
        let mut seen = HashSet::new();
        for component in &oil.oil.main_chemical_components {
            let trimmed = component.trim();
            if trimmed.is_empty() {
                continue;
            }
            let key = trimmed.to_lowercase();
            if !seen.insert(key.clone()) {
                continue;
            }
            let name = display.entry(key).or_insert_with(|| trimmed.to_string());
            freq.add(name);
        }
    }

    freq
}

/// Highlight cards above the dashboard table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cards {
    pub top_oil: Option<RankedOil>,
    pub top_beneficial: Option<RankedOil>,
    pub top_blend: Option<RankedOil>,
    pub common_component: Option<String>,
    pub common_component_count: usize,
}

impl Cards {
    /// `view` is the sorted, filtered table; the component card uses the catalog summary
    pub fn build(view: &[RankedOil], summary: &Summary) -> Self {
        let (common_component, common_component_count) = match summary.most_common_component()
        {
            Some((name, count)) => (Some(name.to_string()), count),
            None => (None, 0),
        };

        Self {
            top_oil: view.first().cloned(),
            top_beneficial: first_max_by(view, |a, b| {
                a.beneficial_score > b.beneficial_score
            }),
            top_blend: first_max_by(view, |a, b| a.blend_count > b.blend_count),
            common_component,
            common_component_count,
        }
    }
}

/// First element not beaten by any later one
fn first_max_by<F>(oils: &[RankedOil], greater: F) -> Option<RankedOil>
where
    F: Fn(&RankedOil, &RankedOil) -> bool,
{
    oils.iter()
        .fold(None, |best: Option<&RankedOil>, oil| match best {
            Some(current) if !greater(oil, current) => Some(current),
            _ => Some(oil),
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OilRecord;
    use crate::scoring::{normalize_blends, score_oils};

    fn catalog() -> ScoredCatalog {
        let mut lavender = OilRecord::new(1, "Lavender");
        lavender.composition = ["Linalool", "Linalyl acetate"].into_iter().collect();
        lavender.main_chemical_components = ["Linalool", "Linalyl acetate"].into_iter().collect();
        lavender.therapeutic_properties = ["Calming", "Antiseptic"].into_iter().collect();
        lavender.emotional_effects = ["Relaxing"].into_iter().collect();
        lavender.blends_well_with = vec!["Rose".into(), "Bergamot".into()];

        let mut bergamot = OilRecord::new(2, "Bergamot");
        bergamot.main_chemical_components = ["limonene", " Linalool ", "linalool"].into_iter().collect();
        bergamot.therapeutic_properties = ["Calming"].into_iter().collect();
        bergamot.emotional_effects = ["Uplifting", "Relaxing"].into_iter().collect();

        let rose = OilRecord::new(3, "Rose");

        let oils = normalize_blends(vec![lavender, bergamot, rose]).unwrap();
        score_oils(oils)
    }

    #[test]
    fn test_component_frequency_counts_oils_not_mentions() {
        let scored = catalog();
        let freq = component_frequency(&scored.oils);
        assert_eq!(freq.get("Linalool"), 2);
        assert_eq!(freq.get("linalool"), 0);
        assert_eq!(freq.get("Linalyl acetate"), 1);
        assert_eq!(freq.get("limonene"), 1);
        assert_eq!(freq.len(), 3);
    }

    #[test]
    fn test_summary_facets() {
        let summary = Summary::build(&catalog());
        assert_eq!(summary.total_oils, 3);
        assert_eq!(summary.therapeutic.count, 2);
        assert_eq!(summary.therapeutic.top, ["Calming", "Antiseptic"]);
        assert_eq!(summary.emotional.top, ["Relaxing", "Uplifting"]);
        assert_eq!(summary.composition.count, 2);
        assert_eq!(summary.main_components.top[0], "Linalool");
        assert_eq!(summary.most_common_component(), Some(("Linalool", 2)));
    }

    #[test]
    fn test_blend_summary() {
        let summary = Summary::build(&catalog());
        // Lavender lists Rose and Bergamot; both link back
        assert_eq!(summary.blends.count, 3);
        assert_eq!(summary.blends.top[0].oil_name, "Lavender");
        assert_eq!(summary.blends.top[0].blend_count, 2);
        assert_eq!(summary.blends.top.len(), 3);
        assert_eq!(summary.blend_freq.get("Lavender"), 2);
    }

    #[test]
    fn test_empty_summary_and_cards() {
        let scored = score_oils(Vec::new());
        let summary = Summary::build(&scored);
        assert_eq!(summary, Summary::default());

        let cards = Cards::build(&[], &summary);
        assert_eq!(cards, Cards::default());
        assert_eq!(cards.common_component_count, 0);
    }

    #[test]
    fn test_cards_pick_first_maximum() {
        let scored = catalog();
        let summary = Summary::build(&scored);
        let cards = Cards::build(&scored.oils, &summary);

        assert_eq!(cards.top_oil.unwrap().oil.oil_name, "Lavender");
        assert_eq!(cards.top_beneficial.unwrap().oil.oil_name, "Lavender");
        assert_eq!(cards.top_blend.unwrap().oil.oil_name, "Lavender");
        assert_eq!(cards.common_component.as_deref(), Some("Linalool"));
        assert_eq!(cards.common_component_count, 2);
    }

    #[test]
    fn test_first_max_keeps_earliest_on_tie() {
        let scored = score_oils(vec![OilRecord::new(1, "A"), OilRecord::new(2, "B")]);
        let best = first_max_by(&scored.oils, |a, b| a.score > b.score).unwrap();
        assert_eq!(best.oil.oil_name, "A");
    }
}
