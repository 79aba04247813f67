use configuration::TagScope;
use core_types::RegionIndex;
use std::collections::{BTreeMap, BTreeSet};

/// Both tag views of `index`: `Tagged` keeps members of `membership` in every
/// region, `Untagged` keeps the rest. Regions are kept even when emptied.
pub fn partition(
    index: &RegionIndex,
    membership: &BTreeSet<String>,
) -> BTreeMap<TagScope, RegionIndex> {
    [TagScope::Tagged, TagScope::Untagged]
        .into_iter()
        .map(|scope| (scope, filter(index, membership, scope)))
        .collect()
}

/// A single view of `index` for `scope`. `All` is the index unchanged.
pub fn filter(index: &RegionIndex, membership: &BTreeSet<String>, scope: TagScope) -> RegionIndex {
    let view = match scope {
        TagScope::All => index.clone(),
        TagScope::Tagged => index.retain_view(|id| membership.contains(id)),
        TagScope::Untagged => index.retain_view(|id| !membership.contains(id)),
    };
    tracing::debug!(?scope, before = index.len(), after = view.len(), "Filtered region index.");
    view
}
