use super::types::OilRecord;
use std::collections::HashMap;

/// Merge scraped oils with a hand-curated set.
///
/// Records are keyed by lowercased name. Scraped records come first in their original
/// order (a later scraped duplicate replaces the earlier one in place). Each curated record
/// either fills the empty fields of the matching scraped record or is appended. Ids are
/// reassigned sequentially from 1 afterwards.
pub fn merge_catalogs(scraped: Vec<OilRecord>, curated: Vec<OilRecord>) -> Vec<OilRecord> {
    let mut merged: Vec<OilRecord> = Vec::with_capacity(scraped.len() + curated.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for oil in scraped {
        let key = oil.oil_name.to_lowercase();
        match positions.get(&key) {
            Some(&idx) => merged[idx] = oil,
            None => {
                positions.insert(key, merged.len());
                merged.push(oil);
            }
        }
    }

    for oil in curated {
        let key = oil.oil_name.to_lowercase();
        match positions.get(&key) {
            Some(&idx) => merged[idx].fill_missing_from(&oil),
            None => {
                positions.insert(key, merged.len());
                merged.push(oil);
            }
        }
    }

    for (idx, oil) in merged.iter_mut().enumerate() {
        oil.oil_id = idx as u32 + 1;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TagList;

    fn oil(name: &str, therapeutic: &str) -> OilRecord {
        let mut oil = OilRecord::new(0, name);
        oil.therapeutic_properties = TagList::from_csv(therapeutic);
        oil
    }

    #[test]
    fn test_merge_fills_and_appends() {
        let scraped = vec![oil("Lemon", ""), oil("Basil", "Antispasmodic")];
        let mut curated_lemon = oil("lemon", "Antibacterial, Digestive Aid");
        curated_lemon.botanical_name = "Citrus limon".to_string();
        let curated = vec![curated_lemon, oil("Hinoki", "Grounding")];

        let merged = merge_catalogs(scraped, curated);

        let names: Vec<_> = merged.iter().map(|o| o.oil_name.as_str()).collect();
        assert_eq!(names, vec!["Lemon", "Basil", "Hinoki"]);
        assert_eq!(merged[0].botanical_name, "Citrus limon");
        assert_eq!(merged[0].therapeutic_properties.len(), 2);
        assert_eq!(merged[1].therapeutic_properties.as_slice(), ["Antispasmodic"]);
    }

    #[test]
    fn test_merge_reassigns_sequential_ids() {
        let mut a = oil("A", "");
        a.oil_id = 40;
        let mut b = oil("B", "");
        b.oil_id = 7;
        let merged = merge_catalogs(vec![a, b], vec![oil("C", "")]);
        let ids: Vec<_> = merged.iter().map(|o| o.oil_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_later_scraped_duplicate_replaces_in_place() {
        let merged = merge_catalogs(
            vec![oil("Rose", "Old"), oil("Neroli", ""), oil("ROSE", "New")],
            vec![],
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].oil_name, "ROSE");
        assert_eq!(merged[0].therapeutic_properties.as_slice(), ["New"]);
    }

    #[test]
    fn test_merge_empty_inputs() {
        assert!(merge_catalogs(vec![], vec![]).is_empty());
    }
}
