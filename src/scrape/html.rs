//! Low-level HTML string helpers.
//!
//! Naive on purpose: they match tag and attribute names case-insensitively on ASCII and
//! assume the markup isn't nested in surprising ways. Good enough for the oil pages and
//! image-search result pages this crate reads.

/// ASCII-only lowercasing. Byte offsets into the result match offsets into the input.
pub fn to_lowercase_fast(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// HTML inside the first element opening with `open_pat`, up to `close_pat`.
///
/// ```ignore
/// let list = slice_between_ci(html, "<ul class=\"primarycontentlinksul", "</ul>");
/// ```
pub fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = to_lowercase_fast(s);
    let open_lc = to_lowercase_fast(open_pat);
    let close_lc = to_lowercase_fast(close_pat);

    let open_idx = lc.find(&open_lc)?;
    let after_open = s[open_idx..].find('>')? + open_idx + 1;
    let close_idx_rel = lc[after_open..].find(&close_lc)?;
    Some(&s[after_open..after_open + close_idx_rel])
}

/// Next complete block from `from` onwards, as `(start, end)` byte offsets covering the
/// opening tag through the closing tag.
pub fn next_tag_block_ci(s: &str, open_tag: &str, close_tag: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lowercase_fast(s);
    let open_lc = to_lowercase_fast(open_tag);
    let close_lc = to_lowercase_fast(close_tag);

    let start = lc.get(from..)?.find(&open_lc)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&close_lc)?;
    let end = open_end + end_rel + close_tag.len();
    Some((start, end))
}

/// Every block matching `open_tag` ... `close_tag`, in document order
pub fn tag_blocks<'a>(s: &'a str, open_tag: &str, close_tag: &str) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let mut from = 0;
    while let Some((start, end)) = next_tag_block_ci(s, open_tag, close_tag, from) {
        blocks.push(&s[start..end]);
        from = end;
    }
    blocks
}

/// Given a complete block like `<td ...>INNER</td>`, return INNER (may still hold tags)
pub fn inner_after_open_tag(block: &str) -> &str {
    if let Some(open_end) = block.find('>') {
        if let Some(close_start) = block.rfind('<') {
            if close_start > open_end {
                return &block[open_end + 1..close_start];
            }
        }
    }
    ""
}

/// The opening tag of a block, e.g. `<a class="iusc" m="...">`
pub fn opening_tag(block: &str) -> &str {
    match block.find('>') {
        Some(end) => &block[..=end],
        None => block,
    }
}

/// Value of `name="..."` (or single-quoted) inside an opening tag, entities decoded
pub fn attr_value(tag: &str, name: &str) -> Option<String> {
    let lc = to_lowercase_fast(tag);
    let needle = format!("{}=", to_lowercase_fast(name));

    let mut from = 0;
    while let Some(rel) = lc[from..].find(&needle) {
        let idx = from + rel;
        from = idx + needle.len();
        // Skip matches inside a longer attribute name, e.g. `data-m=` when asking for `m`
        let preceded_ok = idx == 0
            || lc[..idx]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        if !preceded_ok {
            continue;
        }

        let rest = &tag[from..];
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(rest.len());
            return Some(decode_entities(&rest[..end]));
        }
        let end = rest[1..].find(quote)? + 1;
        return Some(decode_entities(&rest[1..end]));
    }
    None
}

/// Remove all tags `<...>`, decode common entities, then collapse whitespace
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => {
                in_tag = true;
                // Keep words in adjacent elements apart
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&decode_entities(&out))
}

/// Decode the handful of entities that show up in practice
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&rsquo;", "'")
        .replace("&lsquo;", "'")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace into a single space and trim
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Text of each `<li>` in a list, skipping empty items
pub fn list_items(list_html: &str) -> Vec<String> {
    tag_blocks(list_html, "<li", "</li>")
        .into_iter()
        .map(|li| strip_tags(inner_after_open_tag(li)))
        .filter(|text| !text.is_empty())
        .collect()
}
