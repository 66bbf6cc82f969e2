pub mod sort;
pub mod summary;

pub use sort::{filter_by_query, sort_oils, SortMode};
pub use summary::{component_frequency, BlendLeader, BlendSummary, Cards, FacetSummary, Summary};

use crate::catalog::OilRecord;
use crate::scoring::{normalize_blends, score_catalog, BlendError, RankedOil, ScoredCatalog, ScoringConfig};
use serde::Serialize;

/// Number of oils in the "top" lists beside the table
const LEADERBOARD_SIZE: usize = 5;

/// Normalize the blend relation and score the whole catalog
pub fn prepare_catalog(
    oils: Vec<OilRecord>,
    config: &ScoringConfig,
) -> Result<ScoredCatalog, BlendError> {
    let oils = normalize_blends(oils)?;
    Ok(score_catalog(oils, config))
}

/// Everything the index page and `list` show.
///
/// Scores and the summary always cover the full catalog; the query only narrows the table.
#[derive(Debug, Clone, Serialize)]
pub struct IndexView {
    pub query: String,
    pub mode: SortMode,
    pub oils: Vec<RankedOil>,
    pub summary: Summary,
    pub cards: Cards,
    pub top_oils: Vec<RankedOil>,
    pub top_beneficial: Vec<RankedOil>,
}

/// Body of `GET /filter/{mode}`
#[derive(Debug, Clone, Serialize)]
pub struct FilterView {
    pub mode: SortMode,
    pub oils: Vec<RankedOil>,
    pub summary: Summary,
}

/// Filtered, sorted table rows
pub fn table_rows(scored: &ScoredCatalog, query: &str, mode: SortMode) -> Vec<RankedOil> {
    let mut oils = filter_by_query(scored.oils.clone(), query);
    sort_oils(&mut oils, mode);
    oils
}

pub fn index_view(scored: &ScoredCatalog, query: &str, mode: SortMode) -> IndexView {
    let oils = table_rows(scored, query, mode);
    let summary = Summary::build(scored);
    let cards = Cards::build(&oils, &summary);

    IndexView {
        query: query.trim().to_string(),
        mode,
        top_oils: leaders(scored, SortMode::Score),
        top_beneficial: leaders(scored, SortMode::Beneficial),
        oils,
        summary,
        cards,
    }
}

pub fn filter_view(scored: &ScoredCatalog, query: &str, mode: SortMode) -> FilterView {
    FilterView {
        mode,
        oils: table_rows(scored, query, mode),
        summary: Summary::build(scored),
    }
}

fn leaders(scored: &ScoredCatalog, mode: SortMode) -> Vec<RankedOil> {
    let mut oils = scored.oils.clone();
    sort_oils(&mut oils, mode);
    oils.truncate(LEADERBOARD_SIZE);
    oils
}
