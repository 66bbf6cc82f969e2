use crate::catalog::OilRecord;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlendError {
    /// Two records share a display name, so blend partners can't be resolved unambiguously
    #[error("duplicate oil name '{name}' (oil ids {first_id} and {second_id})")]
    DuplicateName {
        name: String,
        first_id: u32,
        second_id: u32,
    },
}

/// Make the "blends well with" relation symmetric.
///
/// For every oil A and every partner name B listed by A (compared after trimming), when B
/// names a record in the catalog and A's name is not already in B's list, A's name is
/// appended to B's list. Existing entries are never removed or rewritten, and names that
/// don't resolve are left alone.
///
/// Passes repeat until nothing changes, so the result is a fixed point: normalizing it
/// again is a no-op.
pub fn normalize_blends(mut oils: Vec<OilRecord>) -> Result<Vec<OilRecord>, BlendError> {
    let lookup = build_lookup(&oils)?;

    // Looping to a fixed point is what makes a second normalize a no-op.
    let mut passes = 0;
    while link_pass(&mut oils, &lookup) {
        passes += 1;
    }
    tracing::trace!(passes, oils = oils.len(), "blend relation normalized");

    Ok(oils)
}

/// Check whether every resolvable blend entry has its back-link
pub fn is_symmetric(oils: &[OilRecord]) -> bool {
    let lookup: HashMap<&str, &OilRecord> =
        oils.iter().map(|oil| (oil.oil_name.as_str(), oil)).collect();

    oils.iter().all(|oil| {
        oil.blends_well_with.iter().all(|partner| {
            lookup
                .get(partner.trim())
                .map_or(true, |other| other.blends_well_with.contains(&oil.oil_name))
        })
    })
}

fn build_lookup(oils: &[OilRecord]) -> Result<HashMap<String, usize>, BlendError> {
    let mut lookup = HashMap::with_capacity(oils.len());
    for (idx, oil) in oils.iter().enumerate() {
        if let Some(first) = lookup.insert(oil.oil_name.clone(), idx) {
            return Err(BlendError::DuplicateName {
                name: oil.oil_name.clone(),
                first_id: oils[first].oil_id,
                second_id: oil.oil_id,
            });
        }
    }
    Ok(lookup)
}

/// One sweep over every blend entry. Entries appended during the sweep are visited too.
/// Returns whether any back-link was added.
fn link_pass(oils: &mut [OilRecord], lookup: &HashMap<String, usize>) -> bool {
    let mut changed = false;

    for a in 0..oils.len() {
        let mut j = 0;
        while j < oils[a].blends_well_with.len() {
            if let Some(&b) = lookup.get(oils[a].blends_well_with[j].trim()) {
                if !oils[b].blends_well_with.contains(&oils[a].oil_name) {
                    let name = oils[a].oil_name.clone();
                    oils[b].blends_well_with.push(name);
                    changed = true;
                }
            }
            j += 1;
        }
    }

    changed
}
