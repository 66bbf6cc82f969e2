use serde::{Deserialize, Deserializer, Serialize};

/// A set-like list of descriptive tags.
///
/// The scraped dataset is inconsistent about these fields: some records carry a JSON
/// array, others a comma-separated string, others `null` or nothing at all. All of those
/// deserialize into the same list; serialization always writes an array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    Text(String),
    List(Vec<Option<String>>),
}

impl<'de> Deserialize<'de> for TagList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tags = match Option::<RawTags>::deserialize(deserializer)? {
            None => TagList::default(),
            Some(RawTags::Text(text)) => TagList::from_csv(&text),
            Some(RawTags::List(items)) => items
                .into_iter()
                .flatten()
                .filter(|item| !item.is_empty())
                .collect(),
        };
        Ok(tags)
    }
}

impl TagList {
    /// Split a comma-separated string, trimming items and dropping empty ones
    pub fn from_csv(text: &str) -> Self {
        text.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Case-insensitive membership test
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.0.iter().any(|tag| tag.to_lowercase() == needle)
    }

    /// Position of the first tag equal to `needle`, ignoring case
    pub fn position_ignore_case(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_lowercase();
        self.0.iter().position(|tag| tag.to_lowercase() == needle)
    }

    /// Comma-joined form used by the HTML pages and the TSV output
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

impl<S: Into<String>> FromIterator<S> for TagList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TagList(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One essential oil as stored in the catalog JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OilRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub oil_id: u32,
    pub oil_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub botanical_name: String,
    #[serde(default)]
    pub composition: TagList,
    #[serde(default)]
    pub main_chemical_components: TagList,
    #[serde(default)]
    pub therapeutic_properties: TagList,
    #[serde(default)]
    pub emotional_effects: TagList,
    #[serde(default)]
    pub aroma_profile: TagList,
    /// Perfumery note, e.g. "Top/Middle". Unrecognized values are kept as-is.
    #[serde(default)]
    pub note: TagList,
    /// Names of oils this one pairs with. Kept verbatim; see `scoring::normalize_blends`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub blends_well_with: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub origin: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl OilRecord {
    pub fn new(oil_id: u32, oil_name: impl Into<String>) -> Self {
        Self {
            oil_id,
            oil_name: oil_name.into(),
            ..Self::default()
        }
    }

    /// Copy every field that is empty here but populated in `other`.
    ///
    /// The id and name are never touched.
    pub fn fill_missing_from(&mut self, other: &OilRecord) {
        fill_string(&mut self.botanical_name, &other.botanical_name);
        fill_tags(&mut self.composition, &other.composition);
        fill_tags(&mut self.main_chemical_components, &other.main_chemical_components);
        fill_tags(&mut self.therapeutic_properties, &other.therapeutic_properties);
        fill_tags(&mut self.emotional_effects, &other.emotional_effects);
        fill_tags(&mut self.aroma_profile, &other.aroma_profile);
        fill_tags(&mut self.note, &other.note);
        if self.blends_well_with.is_empty() {
            self.blends_well_with = other.blends_well_with.clone();
        }
        fill_string(&mut self.color, &other.color);
        fill_string(&mut self.origin, &other.origin);
        fill_string(&mut self.url, &other.url);
    }
}

fn fill_string(target: &mut String, source: &str) {
    if target.is_empty() {
        *target = source.to_string();
    }
}

fn fill_tags(target: &mut TagList, source: &TagList) {
    if target.is_empty() {
        *target = source.clone();
    }
}

/// Treat an explicit JSON `null` the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_from_comma_string() {
        let tags: TagList = serde_json::from_str(r#""Floral, Sweet, , Herbaceous ""#).unwrap();
        assert_eq!(tags.as_slice(), ["Floral", "Sweet", "Herbaceous"]);
    }

    #[test]
    fn test_tags_from_array_drops_empty_and_null() {
        let tags: TagList = serde_json::from_str(r#"["Linalool", "", null, " Camphor"]"#).unwrap();
        assert_eq!(tags.as_slice(), ["Linalool", " Camphor"]);
    }

    #[test]
    fn test_tags_from_null() {
        let tags: TagList = serde_json::from_str("null").unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_tags_serialize_as_array() {
        let tags = TagList::from_csv("Top, Middle");
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["Top","Middle"]"#);
    }

    #[test]
    fn test_record_with_missing_and_null_fields() {
        let json = r#"{
            "oil_name": "Lavender",
            "botanical_name": null,
            "aroma_profile": "Floral, Sweet",
            "note": "Top/Middle",
            "blends_well_with": null,
            "unknown_field": 42
        }"#;
        let oil: OilRecord = serde_json::from_str(json).unwrap();
        assert_eq!(oil.oil_id, 0);
        assert_eq!(oil.oil_name, "Lavender");
        assert!(oil.botanical_name.is_empty());
        assert_eq!(oil.aroma_profile.len(), 2);
        assert_eq!(oil.note.as_slice(), ["Top/Middle"]);
        assert!(oil.blends_well_with.is_empty());
        assert!(oil.therapeutic_properties.is_empty());
    }

    #[test]
    fn test_record_requires_name() {
        let result: Result<OilRecord, _> = serde_json::from_str(r#"{"oil_id": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_metadata_not_serialized() {
        let oil = OilRecord::new(1, "Rose");
        let value = serde_json::to_value(&oil).unwrap();
        assert!(value.get("color").is_none());
        assert!(value.get("url").is_none());
        assert_eq!(value["blends_well_with"], serde_json::json!([]));
    }

    #[test]
    fn test_contains_and_position_ignore_case() {
        let tags = TagList::from_csv("Limonene, Linalool");
        assert!(tags.contains_ignore_case("LINALOOL"));
        assert_eq!(tags.position_ignore_case("linalool"), Some(1));
        assert_eq!(tags.position_ignore_case("menthol"), None);
    }

    #[test]
    fn test_fill_missing_keeps_existing_values() {
        let mut scraped = OilRecord::new(7, "Lemon");
        scraped.therapeutic_properties = TagList::from_csv("Antiseptic");
        let mut curated = OilRecord::new(2, "Lemon");
        curated.botanical_name = "Citrus limon".to_string();
        curated.therapeutic_properties = TagList::from_csv("Antibacterial, Digestive Aid");
        curated.blends_well_with = vec!["Lavender".to_string()];

        scraped.fill_missing_from(&curated);

        assert_eq!(scraped.oil_id, 7);
        assert_eq!(scraped.botanical_name, "Citrus limon");
        assert_eq!(scraped.therapeutic_properties.as_slice(), ["Antiseptic"]);
        assert_eq!(scraped.blends_well_with, vec!["Lavender"]);
    }
}
