//! Server-side HTML for the dashboard pages.
//!
//! Pages are plain `format!` strings; every catalog value goes through [`escape`].

use std::fmt::Write;

use crate::dashboard::{IndexView, SortMode};
use crate::images::IMAGE_ROUTE;
use crate::scoring::{RankedOil, ScoreResult};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f7f8f5; color: #24301f; }
nav { background: #3f5a36; padding: .6rem 1.2rem; }
nav a { color: #eef3ea; margin-right: 1rem; text-decoration: none; }
nav a.active { font-weight: bold; text-decoration: underline; }
main { padding: 1.2rem; max-width: 72rem; margin: auto; }
.cards { display: flex; gap: 1rem; flex-wrap: wrap; }
.card { background: white; border-radius: 6px; padding: .8rem; flex: 1 1 12rem; box-shadow: 0 1px 3px #0002; }
.card img { width: 100%; height: 8rem; object-fit: cover; border-radius: 4px; }
table { border-collapse: collapse; width: 100%; background: white; margin-top: 1rem; }
th, td { padding: .35rem .6rem; border-bottom: 1px solid #e3e8df; text-align: left; vertical-align: top; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
.muted { color: #6b7f62; }
"#;

/// Loads card images after the page renders
const IMAGE_SCRIPT: &str = r#"
document.querySelectorAll("img[data-oil]").forEach(function (img) {
  var params = new URLSearchParams({ oil_name: img.dataset.oil, botanical_name: img.dataset.botanical || "" });
  fetch("/get-oil-image?" + params).then(function (r) { return r.json(); })
    .then(function (body) { if (body.image_url) { img.src = body.image_url; } });
});
"#;

/// Escape text for HTML element content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, active: &str, body: &str) -> String {
    let links = [
        ("/", "index", "Dashboard"),
        ("/compounds", "compounds", "Compounds"),
        ("/blends", "blends", "Blends"),
        ("/properties", "properties", "Properties"),
    ];
    let nav: String = links
        .iter()
        .map(|(href, key, label)| {
            let class = if *key == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{href}"{class}>{label}</a>"#)
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} | oilboard</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <nav>{nav}</nav>\n<main>\n{body}\n</main>\n<script>{IMAGE_SCRIPT}</script>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn placeholder_src() -> String {
    format!("{IMAGE_ROUTE}/placeholder.svg")
}

fn card(title: &str, oil: Option<&RankedOil>, detail: impl Fn(&RankedOil) -> String) -> String {
    match oil {
        Some(o) => format!(
            r#"<div class="card"><img src="{src}" alt="" data-oil="{name}" data-botanical="{botanical}">
<h3>{title}</h3><a href="/oil/{id}">{name}</a><div class="muted">{detail}</div></div>"#,
            src = placeholder_src(),
            name = escape(&o.oil.oil_name),
            botanical = escape(&o.oil.botanical_name),
            id = o.oil.oil_id,
            detail = escape(&detail(o)),
        ),
        None => format!(r#"<div class="card"><h3>{title}</h3><div class="muted">No oils</div></div>"#),
    }
}

fn oil_list(title: &str, oils: &[RankedOil], value: impl Fn(&RankedOil) -> f64) -> String {
    let mut html = format!("<div class=\"card\"><h3>{title}</h3><ol>");
    for o in oils {
        let _ = write!(
            html,
            r#"<li><a href="/oil/{}">{}</a> <span class="muted">{:.2}</span></li>"#,
            o.oil.oil_id,
            escape(&o.oil.oil_name),
            value(o)
        );
    }
    html.push_str("</ol></div>");
    html
}

pub fn index_page(view: &IndexView) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<form method="get" action="/"><input name="q" value="{q}" placeholder="Search oils">
<select name="filter">"#,
        q = escape(&view.query)
    );
    for mode in SortMode::ALL {
        let selected = if mode == view.mode { " selected" } else { "" };
        let _ = write!(
            body,
            r#"<option value="{}"{}>{}</option>"#,
            mode.as_str(),
            selected,
            mode.label()
        );
    }
    body.push_str("</select> <button>Go</button></form>\n");

    let cards = &view.cards;
    body.push_str("<section class=\"cards\">");
    body.push_str(&card("Top Oil", cards.top_oil.as_ref(), |o| {
        format!("Score {:.2}", o.score)
    }));
    body.push_str(&card("Most Beneficial", cards.top_beneficial.as_ref(), |o| {
        format!("Beneficial {:.2}", o.beneficial_score)
    }));
    body.push_str(&card("Most Blendable", cards.top_blend.as_ref(), |o| {
        format!("{} blends", o.blend_count)
    }));
    let _ = write!(
        body,
        r#"<div class="card"><h3>Common Component</h3>{}<div class="muted">in {} oils</div></div>"#,
        cards
            .common_component
            .as_deref()
            .map(escape)
            .unwrap_or_else(|| "None".to_string()),
        cards.common_component_count
    );
    body.push_str("</section>\n");

    let summary = &view.summary;
    let _ = write!(
        body,
        r#"<section class="cards">
<div class="card"><h3>{total} oils</h3>
<div>{components} components, {therapeutic} therapeutic uses, {emotional} emotional effects, {blends} blend partners</div>
<div class="muted">Top uses: {top_uses}</div></div>
{top_oils}{top_beneficial}</section>
"#,
        total = summary.total_oils,
        components = summary.main_components.count,
        therapeutic = summary.therapeutic.count,
        emotional = summary.emotional.count,
        blends = summary.blends.count,
        top_uses = escape(&summary.therapeutic.top.join(", ")),
        top_oils = oil_list("Top 5", &view.top_oils, |o| o.score),
        top_beneficial = oil_list("Top 5 Beneficial", &view.top_beneficial, |o| o.beneficial_score),
    );

    let _ = write!(
        body,
        "<h2>{}</h2>\n<table>\n<tr><th>#</th><th>Oil</th><th>Botanical</th><th>Score</th>\
         <th>Beneficial</th><th>Blends</th><th>Main components</th></tr>\n",
        view.mode.label()
    );
    for o in &view.oils {
        let _ = writeln!(
            body,
            r#"<tr><td class="num">{rank}</td><td><a href="/oil/{id}">{name}</a></td><td><em>{botanical}</em></td><td class="num">{score:.2}</td><td class="num">{beneficial:.2}</td><td class="num">{blends}</td><td>{components}</td></tr>"#,
            rank = o.rank,
            id = o.oil.oil_id,
            name = escape(&o.oil.oil_name),
            botanical = escape(&o.oil.botanical_name),
            score = o.score,
            beneficial = o.beneficial_score,
            blends = o.blend_count,
            components = escape(&o.oil.main_chemical_components.joined()),
        );
    }
    if view.oils.is_empty() {
        body.push_str(r#"<tr><td colspan="7" class="muted">No oils match.</td></tr>"#);
    }
    body.push_str("</table>");

    page("Dashboard", "index", &body)
}

fn tag_row(label: &str, items: &[String]) -> String {
    let value = if items.is_empty() {
        r#"<span class="muted">Unknown</span>"#.to_string()
    } else {
        escape(&items.join(", "))
    };
    format!("<tr><th>{label}</th><td>{value}</td></tr>\n")
}

fn breakdown_table(title: &str, result: &ScoreResult) -> String {
    let mut html = format!("<h3>{title}: {:.2}</h3>\n<table>\n", result.score);
    for factor in &result.breakdown.factors {
        let _ = writeln!(
            html,
            r#"<tr><th>{}</th><td class="muted">{}</td><td class="num">{:.2}</td></tr>"#,
            escape(&factor.label),
            escape(&factor.description),
            factor.points
        );
    }
    html.push_str("</table>\n");
    html
}

pub fn detail_page(oil: &RankedOil, score: &ScoreResult, beneficial: &ScoreResult) -> String {
    let record = &oil.oil;
    let mut body = format!(
        r#"<h1>{name}</h1>
<p><em>{botanical}</em></p>
<img src="{src}" alt="" data-oil="{name}" data-botanical="{botanical}" style="max-width:24rem">
<p>Rank {rank} overall, {beneficial_rank} for benefits. {blend_count} blend partners.</p>
<table>
"#,
        name = escape(&record.oil_name),
        botanical = escape(&record.botanical_name),
        src = placeholder_src(),
        rank = oil.rank,
        beneficial_rank = oil.beneficial_rank,
        blend_count = oil.blend_count,
    );
    body.push_str(&tag_row("Composition", record.composition.as_slice()));
    body.push_str(&tag_row("Main components", record.main_chemical_components.as_slice()));
    body.push_str(&tag_row("Therapeutic", record.therapeutic_properties.as_slice()));
    body.push_str(&tag_row("Emotional", record.emotional_effects.as_slice()));
    body.push_str(&tag_row("Aroma", record.aroma_profile.as_slice()));
    body.push_str(&tag_row("Note", record.note.as_slice()));
    for (label, value) in [("Color", &record.color), ("Origin", &record.origin)] {
        if !value.is_empty() {
            let _ = writeln!(body, "<tr><th>{label}</th><td>{}</td></tr>", escape(value));
        }
    }
    body.push_str("</table>\n<h3>Blends well with</h3>\n<ul>");
    for partner in &record.blends_well_with {
        let _ = write!(body, "<li>{}</li>", escape(partner));
    }
    body.push_str("</ul>\n");

    body.push_str(&breakdown_table("Score", score));
    body.push_str(&breakdown_table("Beneficial score", beneficial));

    if !record.url.is_empty() {
        let _ = write!(
            body,
            r#"<p class="muted">Source: <a href="{0}">{0}</a></p>"#,
            escape(&record.url)
        );
    }

    page(&record.oil_name, "", &body)
}

/// Name and count table, used by the compounds, blends and properties pages
pub fn frequency_page<'a>(
    title: &str,
    active: &str,
    column: &str,
    rows: impl IntoIterator<Item = (&'a str, usize)>,
) -> String {
    let mut body = format!("<h1>{title}</h1>\n<table>\n<tr><th>{column}</th><th>Oils</th></tr>\n");
    let mut empty = true;
    for (name, count) in rows {
        empty = false;
        let _ = writeln!(
            body,
            r#"<tr><td>{}</td><td class="num">{}</td></tr>"#,
            escape(name),
            count
        );
    }
    if empty {
        body.push_str(r#"<tr><td colspan="2" class="muted">Nothing recorded yet.</td></tr>"#);
    }
    body.push_str("</table>");
    page(title, active, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b>"Rose" & 'Oud'</b>"#),
            "&lt;b&gt;&quot;Rose&quot; &amp; &#39;Oud&#39;&lt;/b&gt;"
        );
        assert_eq!(escape("Lavender"), "Lavender");
    }

    #[test]
    fn frequency_page_lists_rows_in_order() {
        let html = frequency_page(
            "Compounds",
            "compounds",
            "Component",
            [("Linalool", 3), ("Limonene", 1)],
        );
        let linalool = html.find("Linalool").unwrap();
        let limonene = html.find("Limonene").unwrap();
        assert!(linalool < limonene);
        assert!(html.contains(r#"<a href="/compounds" class="active">"#));
    }

    #[test]
    fn frequency_page_empty() {
        let html = frequency_page("Blends", "blends", "Oil", Vec::<(&str, usize)>::new());
        assert!(html.contains("Nothing recorded yet."));
    }
}
