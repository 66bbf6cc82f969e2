use super::html::{attr_value, inner_after_open_tag, opening_tag, slice_between_ci, strip_tags, tag_blocks};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Class of the list holding the oil links on the index page
const PRIMARY_LIST_CLASS: &str = "primarycontentlinksul";

/// Href fragment the fallback selector looks for
const FALLBACK_HREF_FRAGMENT: &str = "essential-oils";

/// One oil link from the index page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub oil_id: u32,
    pub oil_name: String,
    pub url: String,
}

/// Collect oil links from the index page.
///
/// Prefers anchors inside the primary content list; when that list is missing or empty,
/// falls back to any list-item anchor whose href points at an essential-oil page.
/// Relative hrefs are resolved against `base`. Ids are assigned 1..N in page order.
pub fn parse_index(html: &str, base: &Url) -> Vec<IndexEntry> {
    let mut links = slice_between_ci(html, PRIMARY_LIST_CLASS, "</ul>")
        .map(|list| anchors(list, base, |_| true))
        .unwrap_or_default();

    if links.is_empty() {
        links = tag_blocks(html, "<li", "</li>")
            .into_iter()
            .flat_map(|li| anchors(li, base, |href| href.contains(FALLBACK_HREF_FRAGMENT)))
            .collect();
    }

    links
        .into_iter()
        .enumerate()
        .map(|(idx, (oil_name, url))| IndexEntry {
            oil_id: idx as u32 + 1,
            oil_name,
            url,
        })
        .collect()
}

/// `(text, absolute href)` of each anchor with both a name and an accepted href
fn anchors<F>(html: &str, base: &Url, accept: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> bool,
{
    tag_blocks(html, "<a ", "</a>")
        .into_iter()
        .filter_map(|block| {
            let href = attr_value(opening_tag(block), "href")?;
            let name = strip_tags(inner_after_open_tag(block));
            if href.is_empty() || name.is_empty() || !accept(&href) {
                return None;
            }
            let url = base.join(&href).ok()?;
            Some((name, url.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.aromaweb.com/essential-oils/").unwrap()
    }

    #[test]
    fn test_primary_list() {
        let html = r#"
            <ul class="nav"><li><a href="/about">About</a></li></ul>
            <ul class="primarycontentlinksul">
              <li><a href="basil-oil.asp">Basil</a></li>
              <li><a href="https://www.aromaweb.com/essential-oils/bergamot-oil.asp"> Bergamot </a></li>
              <li><a href="empty.asp"></a></li>
            </ul>"#;
        let entries = parse_index(html, &base());

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            IndexEntry {
                oil_id: 1,
                oil_name: "Basil".to_string(),
                url: "https://www.aromaweb.com/essential-oils/basil-oil.asp".to_string(),
            }
        );
        assert_eq!(entries[1].oil_id, 2);
        assert_eq!(entries[1].oil_name, "Bergamot");
    }

    #[test]
    fn test_fallback_selector() {
        let html = r#"
            <ul>
              <li><a href="/contact">Contact</a></li>
              <li><a href="/essential-oils/rose-oil.asp">Rose</a></li>
              <li><a href="/essential-oils/neroli-oil.asp">Neroli</a></li>
            </ul>"#;
        let entries = parse_index(html, &base());
        let names: Vec<&str> = entries.iter().map(|e| e.oil_name.as_str()).collect();
        assert_eq!(names, ["Rose", "Neroli"]);
        assert_eq!(entries[1].url, "https://www.aromaweb.com/essential-oils/neroli-oil.asp");
    }

    #[test]
    fn test_no_links() {
        assert!(parse_index("<html><body>Nothing</body></html>", &base()).is_empty());
    }
}
