use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::scoring::{RankedOil, ScoreResult};

/// Output format for `list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Scores are always shown with two decimals
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate to fit available width, counting chars rather than bytes
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// "Lavender (Lavandula angustifolia)", or just the name when no botanical name is known
fn display_name(oil: &RankedOil) -> String {
    if oil.oil.botanical_name.is_empty() {
        oil.oil.oil_name.clone()
    } else {
        format!("{} ({})", oil.oil.oil_name, oil.oil.botanical_name)
    }
}

/// Format oils as a ranked table: row number, score, beneficial score, blend count, name.
/// No headers. Names are truncated to the terminal width; pipes get them in full.
pub fn format_ranked_table(oils: &[RankedOil], use_colors: bool) -> String {
    format_ranked_table_with_width(oils, use_colors, get_terminal_width())
}

fn format_ranked_table_with_width(
    oils: &[RankedOil],
    use_colors: bool,
    term_width: Option<usize>,
) -> String {
    if oils.is_empty() {
        return "No oils found.".to_string();
    }

    // "999." + space, two 7-wide score columns, a 3-wide blend column, 2-space separators
    let index_width = 4;
    let score_width = 7;
    let blends_width = 3;
    let separator = "  ";
    let fixed_width = index_width + 1 + score_width * 2 + blends_width + separator.len() * 3;

    oils.iter()
        .enumerate()
        .map(|(idx, oil)| {
            let index_str = format!("{:>3}.", idx + 1);
            let score = format!("{:>width$}", format_score(oil.score), width = score_width);
            let beneficial = format!(
                "{:>width$}",
                format_score(oil.beneficial_score),
                width = score_width
            );
            let blends = format!("{:>width$}", oil.blend_count, width = blends_width);

            let name = display_name(oil);
            let name = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_name(&name, width - fixed_width),
                // Very narrow terminal
                Some(_) => truncate_name(&name, 20),
                None => name,
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    score.bold(),
                    separator,
                    beneficial.green(),
                    separator,
                    blends.cyan(),
                    separator,
                    name
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str, score, separator, beneficial, separator, blends, separator, name
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tab-separated values for scripting, no headers or colors.
/// Columns: rank, score, beneficial_score, blend_count, oil_id, oil_name, botanical_name
pub fn format_tsv(oils: &[RankedOil]) -> String {
    oils.iter()
        .map(|oil| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                oil.rank,
                format_score(oil.score),
                format_score(oil.beneficial_score),
                oil.blend_count,
                oil.oil.oil_id,
                oil.oil.oil_name,
                oil.oil.botanical_name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty JSON array of ranked oils
pub fn format_json(oils: &[RankedOil]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(oils)
}

fn breakdown_lines(title: &str, result: &ScoreResult, use_colors: bool) -> Vec<String> {
    let heading = format!("{}: {}", title, format_score(result.score));
    let mut lines = vec![if use_colors {
        heading.bold().to_string()
    } else {
        heading
    }];
    for factor in &result.breakdown.factors {
        lines.push(format!(
            "  {:<13}{:>7}  {}",
            factor.label,
            format_score(factor.points),
            factor.description
        ));
    }
    lines
}

/// Multi-line description of one oil with both score breakdowns (for `show`)
pub fn format_oil_detail(
    oil: &RankedOil,
    score: &ScoreResult,
    beneficial: &ScoreResult,
    use_colors: bool,
) -> String {
    let record = &oil.oil;
    let or_unknown = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };

    let title = format!("#{} {}", record.oil_id, record.oil_name);
    let mut lines = vec![if use_colors {
        title.bold().to_string()
    } else {
        title
    }];
    if !record.botanical_name.is_empty() {
        lines.push(if use_colors {
            format!("  {}", record.botanical_name.italic())
        } else {
            format!("  {}", record.botanical_name)
        });
    }
    lines.push(format!(
        "  Rank: {} (beneficial {})  Blends: {}",
        oil.rank, oil.beneficial_rank, oil.blend_count
    ));
    lines.push(format!("  Components: {}", or_unknown(record.main_chemical_components.as_slice())));
    lines.push(format!("  Therapeutic: {}", or_unknown(record.therapeutic_properties.as_slice())));
    lines.push(format!("  Emotional: {}", or_unknown(record.emotional_effects.as_slice())));
    lines.push(format!("  Aroma: {}", or_unknown(record.aroma_profile.as_slice())));
    lines.push(format!("  Note: {}", or_unknown(record.note.as_slice())));
    lines.push(format!("  Blends well with: {}", or_unknown(&record.blends_well_with)));
    if !record.url.is_empty() {
        lines.push(if use_colors {
            format!("  URL: {}", record.url.underline())
        } else {
            format!("  URL: {}", record.url)
        });
    }

    lines.push(String::new());
    lines.extend(breakdown_lines("Score", score, use_colors));
    lines.push(String::new());
    lines.extend(breakdown_lines("Beneficial", beneficial, use_colors));
    lines.join("\n")
}
