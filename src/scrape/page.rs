use super::html::{
    attr_value, inner_after_open_tag, list_items, next_tag_block_ci, opening_tag, slice_between_ci,
    strip_tags, tag_blocks, to_lowercase_fast,
};
use super::index::IndexEntry;
use super::text::{
    extract_aroma_descriptors, extract_blends, extract_emotional_effects, extract_origin,
    therapeutic_from_text, unique_preserve,
};
use crate::catalog::{OilRecord, TagList};

/// A `<h2>` inside the article
struct Heading<'a> {
    /// Byte offset just past `</h2>`
    end: usize,
    open_tag: &'a str,
    /// Lower-cased text
    text: String,
}

/// Main content region: `<article>`, else `<div class="content">`
fn article_region(html: &str) -> Option<&str> {
    slice_between_ci(html, "<article", "</article>")
        .or_else(|| slice_between_ci(html, r#"<div class="content"#, "</div>"))
}

fn headings(article: &str) -> Vec<Heading<'_>> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some((start, end)) = next_tag_block_ci(article, "<h2", "</h2>", from) {
        let block = &article[start..end];
        out.push(Heading {
            end,
            open_tag: opening_tag(block),
            text: strip_tags(inner_after_open_tag(block)).to_lowercase(),
        });
        from = end;
    }
    out
}

/// Text of the first `<p>` after `from`
fn next_paragraph(article: &str, from: usize) -> Option<String> {
    let (start, end) = next_tag_block_ci(article, "<p", "</p>", from)?;
    Some(strip_tags(inner_after_open_tag(&article[start..end])))
}

/// Items of the first `<ul>` after `from`
fn next_list(article: &str, from: usize) -> Vec<String> {
    match next_tag_block_ci(article, "<ul", "</ul>", from) {
        Some((start, end)) => unique_preserve(list_items(&article[start..end])),
        None => Vec::new(),
    }
}

fn heading_containing<'h, 'a>(headings: &'h [Heading<'a>], needle: &str) -> Option<&'h Heading<'a>> {
    headings.iter().find(|h| h.text.contains(needle))
}

fn botanical_name(article: &str, headings: &[Heading<'_>]) -> String {
    let italic = headings.iter().find(|h| {
        attr_value(h.open_tag, "style").is_some_and(|style| to_lowercase_fast(&style).contains("italic"))
    });
    if let Some(h) = italic {
        // Heading text was lower-cased for matching; re-read it with original casing
        let start = article[..h.end].rfind(h.open_tag).unwrap_or(0);
        return strip_tags(inner_after_open_tag(&article[start..h.end]));
    }

    heading_containing(headings, "botanical name")
        .and_then(|h| next_paragraph(article, h.end))
        .unwrap_or_default()
}

/// Build a catalog record from one oil page.
///
/// Returns `None` when the page has no recognizable content region. `known_names` are the
/// lower-cased names of every oil in the index; only those are accepted as blend partners.
pub fn extract_oil_page(
    html: &str,
    entry: &IndexEntry,
    oil_id: u32,
    known_names: &[String],
) -> Option<OilRecord> {
    let article = article_region(html)?;
    let headings = headings(article);

    let paragraphs: Vec<String> = tag_blocks(article, "<p", "</p>")
        .into_iter()
        .map(|p| strip_tags(inner_after_open_tag(p)))
        .filter(|p| !p.is_empty())
        .collect();
    let all_text = paragraphs.join(" ");

    let mut oil = OilRecord::new(oil_id, entry.oil_name.clone());
    oil.url = entry.url.clone();
    oil.botanical_name = botanical_name(article, &headings);

    if let Some(h) = heading_containing(&headings, "major constituents") {
        oil.main_chemical_components = next_list(article, h.end).into_iter().collect();
    }
    if let Some(color) = heading_containing(&headings, "color").and_then(|h| next_paragraph(article, h.end)) {
        oil.color = color;
    }
    if let Some(note) = heading_containing(&headings, "perfumery").and_then(|h| next_paragraph(article, h.end)) {
        oil.note = TagList::from_csv(&note);
    }

    let first_list = next_list(article, 0);
    oil.therapeutic_properties = if first_list.is_empty() {
        therapeutic_from_text(&all_text).into_iter().collect()
    } else {
        first_list.into_iter().collect()
    };
    oil.emotional_effects = extract_emotional_effects(&all_text).into_iter().collect();
    oil.aroma_profile = extract_aroma_descriptors(&all_text).into_iter().collect();
    oil.blends_well_with = extract_blends(&all_text, known_names);
    oil.origin = extract_origin(&all_text);

    Some(oil)
}
