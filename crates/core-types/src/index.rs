use crate::structs::Region;
use crate::table::PnlTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Mapping from region to the ordered ids known for that region.
///
/// Every id appears in at most one region. Together with a `PnlTable` the
/// index must form a bijection: the union of all id lists equals the table's
/// column set (see [`RegionIndex::is_consistent_with`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Region, Vec<String>>",
    into = "BTreeMap<Region, Vec<String>>"
)]
pub struct RegionIndex {
    regions: BTreeMap<Region, Vec<String>>,
    // id -> owning region
    lookup: HashMap<String, Region>,
}

impl RegionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` to `region`. Returns `false` if the id was already known
    /// (in any region), in which case the index is left untouched.
    pub fn insert(&mut self, region: Region, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.lookup.insert(id.clone(), region.clone());
        self.regions.entry(region).or_default().push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    pub fn region_of(&self, id: &str) -> Option<&Region> {
        self.lookup.get(id)
    }

    /// The ids cached for `region`, in insertion order. `None` when the region
    /// was never seen.
    pub fn peers(&self, region: &Region) -> Option<&[String]> {
        self.regions.get(region).map(Vec::as_slice)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&Region, &[String])> {
        self.regions.iter().map(|(r, ids)| (r, ids.as_slice()))
    }

    /// All ids, region by region.
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.regions.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a view keeping, per region, only the ids accepted by `keep`.
    /// Regions are preserved even when their list becomes empty.
    pub fn retain_view<F>(&self, mut keep: F) -> RegionIndex
    where
        F: FnMut(&str) -> bool,
    {
        let regions: BTreeMap<Region, Vec<String>> = self
            .regions
            .iter()
            .map(|(region, ids)| {
                let kept = ids.iter().filter(|id| keep(id)).cloned().collect();
                (region.clone(), kept)
            })
            .collect();
        RegionIndex::from(regions)
    }

    /// Checks the region bijection invariant against a table.
    pub fn is_consistent_with(&self, table: &PnlTable) -> bool {
        let indexed: BTreeSet<&str> = self.ids().map(String::as_str).collect();
        let columns: BTreeSet<&str> = table.columns().iter().map(String::as_str).collect();
        indexed == columns
    }
}

impl From<BTreeMap<Region, Vec<String>>> for RegionIndex {
    /// Keeps empty regions; an id listed under several regions stays in the
    /// first one only.
    fn from(regions: BTreeMap<Region, Vec<String>>) -> Self {
        let mut index = RegionIndex::new();
        for (region, ids) in regions {
            index.regions.entry(region.clone()).or_default();
            for id in ids {
                index.insert(region.clone(), id);
            }
        }
        index
    }
}

impl From<RegionIndex> for BTreeMap<Region, Vec<String>> {
    fn from(index: RegionIndex) -> Self {
        index.regions
    }
}

impl FromIterator<(Region, String)> for RegionIndex {
    fn from_iter<T: IntoIterator<Item = (Region, String)>>(iter: T) -> Self {
        let mut index = RegionIndex::new();
        for (region, id) in iter {
            index.insert(region, id);
        }
        index
    }
}
