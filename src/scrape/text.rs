//! Keyword heuristics that pull structured fields out of free-form page text.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Scent vocabulary recognized in aroma descriptions
pub const SCENT_WORDS: &[&str] = &[
    "woody", "sweet", "balsamic", "citrus", "lemony", "orange", "bergamot", "floral", "rose",
    "neroli", "jasmine", "ylang", "powdery", "earthy", "musky", "smoky", "spicy", "peppery",
    "camphor", "medicinal", "herbal", "green", "fresh", "fruity", "vanilla", "resinous", "amber",
    "pine", "cedar", "sandalwood", "almond", "nutty", "coconut",
];

/// Descriptors that tend to come from safety notes rather than the aroma itself
const EXCLUDED_AROMAS: &[&str] = &["medicinal"];

const AROMA_KEYWORDS: &[&str] = &[
    "aroma", "fragrance", "scent", "olfactory", "aromatic", "nose", "odor", "odour",
];

/// Sentences mentioning these are citations or safety text, not aroma descriptions
const AROMA_SENTENCE_BLOCKLIST: &[&str] = &["source", "pregnant", "tisserand", "constituents", "edition"];

pub const EMOTION_KEYWORDS: &[&str] = &[
    "emotion", "calm", "grounding", "uplift", "energ", "focus", "meditation", "sleep", "sensual",
    "aphrodisiac",
];

const THERAPEUTIC_KEYWORDS: &[&str] = &[
    "benefit", "uses", "treat", "help", "application", "anti", "asthma", "pain", "inflammation",
    "infection", "skin", "digest", "respir",
];

pub const COMMON_COUNTRIES: &[&str] = &[
    "United Kingdom", "United States", "Thailand", "Kenya", "Australia", "Dominican Republic",
    "France", "Bulgaria", "India", "Indonesia", "Madagascar", "Morocco", "Egypt", "Italy",
    "Spain", "Somalia", "Oman", "Sri Lanka", "China", "Brazil",
];

// Compiled once on first use
static SENTENCE_END_REGEX: OnceLock<Regex> = OnceLock::new();
static PUNCTUATION_REGEX: OnceLock<Regex> = OnceLock::new();
static SCENT_REGEX: OnceLock<Regex> = OnceLock::new();
static COUNTRY_REGEX: OnceLock<Regex> = OnceLock::new();
static THERAPEUTIC_SPLIT_REGEX: OnceLock<Regex> = OnceLock::new();
static BLEND_PHRASE_REGEXES: OnceLock<[Regex; 2]> = OnceLock::new();
static BLEND_SPLIT_REGEX: OnceLock<Regex> = OnceLock::new();

/// Sentence terminator followed by whitespace
fn sentence_end_regex() -> &'static Regex {
    SENTENCE_END_REGEX.get_or_init(|| {
        Regex::new(r"[.!?]\s+").expect("static pattern compiles")
    })
}

/// Anything that is neither a word character nor whitespace
fn punctuation_regex() -> &'static Regex {
    PUNCTUATION_REGEX.get_or_init(|| {
        Regex::new(r"[^\w\s]").expect("static pattern compiles")
    })
}

/// Any scent word on word boundaries
fn scent_regex() -> &'static Regex {
    SCENT_REGEX.get_or_init(|| {
        Regex::new(&word_alternation(SCENT_WORDS)).expect("static pattern compiles")
    })
}

/// Any known country on word boundaries, case-sensitive
fn country_regex() -> &'static Regex {
    COUNTRY_REGEX.get_or_init(|| {
        Regex::new(&word_alternation(COMMON_COUNTRIES)).expect("static pattern compiles")
    })
}

/// Separators between therapeutic phrases, e.g. "acne, eczema and burns"
fn therapeutic_split_regex() -> &'static Regex {
    THERAPEUTIC_SPLIT_REGEX.get_or_init(|| {
        Regex::new(r"(?i):|;|,|\band\b|\bor\b").expect("static pattern compiles")
    })
}

/// Phrases that introduce names of similar or complementary oils; group 1 runs to the
/// end of the clause
fn blend_phrase_regexes() -> &'static [Regex; 2] {
    BLEND_PHRASE_REGEXES.get_or_init(|| {
        [
            Regex::new(r"(?i)\breminiscent (?:to|of) ([^.;\n]+)").expect("static pattern compiles"),
            Regex::new(r"(?i)\b(?:similar to|like|complements|works well with) ([^.;\n]+)")
                .expect("static pattern compiles"),
        ]
    })
}

/// Separators inside a blend clause
fn blend_split_regex() -> &'static Regex {
    BLEND_SPLIT_REGEX.get_or_init(|| {
        Regex::new(r",| and | & |/").expect("static pattern compiles")
    })
}

/// `\b(?:a|b|...)\b` over escaped literals
fn word_alternation(words: &[&str]) -> String {
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    format!(r"\b(?:{})\b", escaped.join("|"))
}

/// Drop later duplicates, comparing case-insensitively; keeps the first spelling
pub fn unique_preserve<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(Into::into)
        .filter(|item: &String| seen.insert(item.to_lowercase()))
        .collect()
}

/// Split prose into sentences at `.`, `!` or `?` followed by whitespace.
/// The terminator stays with its sentence.
pub fn sentence_split(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in sentence_end_regex().find_iter(text) {
        // Terminators are ASCII, so the sentence ends one byte into the match
        let sentence = text[start..m.start() + 1].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Capitalize the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Title-case every word, e.g. "clary sage" -> "Clary Sage"
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scent words found in sentences that talk about the aroma, in vocabulary order per
/// sentence and first-seen order overall
pub fn extract_aroma_descriptors(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for sentence in sentence_split(text) {
        let lower = sentence.to_lowercase();
        if !AROMA_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }
        if AROMA_SENTENCE_BLOCKLIST.iter().any(|b| lower.contains(b)) {
            continue;
        }
        let cleaned = punctuation_regex().replace_all(&lower, " ");
        let present: HashSet<&str> = scent_regex()
            .find_iter(&cleaned)
            .map(|m| m.as_str())
            .collect();
        for word in SCENT_WORDS {
            if present.contains(word) && !EXCLUDED_AROMAS.contains(word) {
                found.push(capitalize(word));
            }
        }
    }
    unique_preserve(found)
}

/// Emotion keywords mentioned anywhere in the text
pub fn extract_emotional_effects(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for sentence in sentence_split(text) {
        let lower = sentence.to_lowercase();
        for keyword in EMOTION_KEYWORDS {
            if lower.contains(keyword) {
                found.push(capitalize(keyword));
            }
        }
    }
    unique_preserve(found)
}

/// Therapeutic phrases from sentences that mention uses or benefits
pub fn therapeutic_from_text(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    for sentence in sentence_split(text) {
        let lower = sentence.to_lowercase();
        if !THERAPEUTIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }
        for part in therapeutic_split_regex().split(sentence) {
            let part = part.trim().trim_end_matches(['.', '!', '?']).trim();
            let len = part.chars().count();
            if len > 2 && len < 120 {
                items.push(capitalize(part));
            }
        }
    }
    unique_preserve(items)
}

/// Known producing countries named in the text, comma-joined, in list order
pub fn extract_origin(text: &str) -> String {
    let present: HashSet<&str> = country_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();
    let found = COMMON_COUNTRIES
        .iter()
        .copied()
        .filter(|country| present.contains(country));
    unique_preserve(found).join(", ")
}

/// Oil names mentioned after comparison phrases ("similar to", "works well with", ...).
///
/// `known_names` are lower-cased catalog names; matches come back title-cased.
pub fn extract_blends(text: &str, known_names: &[String]) -> Vec<String> {
    let mut matches = Vec::new();

    for pattern in blend_phrase_regexes() {
        for caps in pattern.captures_iter(text) {
            let Some(clause) = caps.get(1) else { continue };
            for part in blend_split_regex().split(clause.as_str()) {
                let part = part.trim().to_lowercase();
                for name in known_names {
                    if !name.is_empty() && part.contains(name.as_str()) {
                        matches.push(title_case(name));
                    }
                }
            }
        }
    }
    unique_preserve(matches)
}
