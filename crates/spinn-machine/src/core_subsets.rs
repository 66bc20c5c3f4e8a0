//! Selections of cores across chips.
//!
//! A [`CoreSubset`] is the set of cores chosen on one chip; [`CoreSubsets`]
//! holds at most one subset per chip. Chips iterate in the order they were
//! first added so anything generated from a selection is reproducible.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use indexmap::{IndexMap, IndexSet};
use spinn_geometry::ChipCoord;
use tracing::trace;

/// The cores selected on one chip.
///
/// Equality ignores the order cores were selected in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreSubset {
    coord: ChipCoord,
    processor_ids: IndexSet<u32>,
}

impl CoreSubset {
    /// Select `processor_ids` on chip `(x, y)`. Repeated ids are kept once.
    pub fn new<I>(x: u32, y: u32, processor_ids: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            coord: ChipCoord::new(x, y),
            processor_ids: processor_ids.into_iter().collect(),
        }
    }

    /// An empty selection on chip `(x, y)`.
    pub fn empty(x: u32, y: u32) -> Self {
        Self::new(x, y, std::iter::empty())
    }

    /// Chip x-coordinate.
    pub fn x(&self) -> u32 {
        self.coord.x
    }

    /// Chip y-coordinate.
    pub fn y(&self) -> u32 {
        self.coord.y
    }

    /// Chip coordinate.
    pub fn coord(&self) -> ChipCoord {
        self.coord
    }

    /// Select another core. Selecting a core twice has no effect.
    pub fn add_processor(&mut self, processor_id: u32) {
        self.processor_ids.insert(processor_id);
    }

    /// Whether a core is selected.
    pub fn contains(&self, processor_id: u32) -> bool {
        self.processor_ids.contains(&processor_id)
    }

    /// Selected cores, in the order they were added.
    pub fn processor_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.processor_ids.iter().copied()
    }

    /// Number of selected cores.
    pub fn len(&self) -> usize {
        self.processor_ids.len()
    }

    /// Whether no cores are selected.
    pub fn is_empty(&self) -> bool {
        self.processor_ids.is_empty()
    }
}

impl Hash for CoreSubset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coord.hash(state);
        // Order-independent, to agree with equality
        let mut ids: Vec<u32> = self.processor_ids.iter().copied().collect();
        ids.sort_unstable();
        ids.hash(state);
    }
}

impl std::fmt::Display for CoreSubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:[", self.coord.x, self.coord.y)?;
        for (i, id) in self.processor_ids.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", id)?;
        }
        f.write_str("]")
    }
}

/// Core selections across many chips, at most one per chip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<CoreSubset>", into = "Vec<CoreSubset>"))]
pub struct CoreSubsets {
    subsets: IndexMap<ChipCoord, CoreSubset>,
}

impl CoreSubsets {
    /// An empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subset for a chip, replacing any subset already there.
    pub fn add_core_subset(&mut self, subset: CoreSubset) {
        if let Some(previous) = self.subsets.insert(subset.coord, subset) {
            trace!(chip = %previous.coord, "replaced core subset");
        }
    }

    /// Set several subsets; later ones win for the same chip.
    pub fn add_core_subsets<I>(&mut self, subsets: I)
    where
        I: IntoIterator<Item = CoreSubset>,
    {
        for subset in subsets {
            self.add_core_subset(subset);
        }
    }

    /// Select a core, creating an empty subset for the chip if needed.
    pub fn add_processor(&mut self, x: u32, y: u32, processor_id: u32) {
        self.subsets
            .entry(ChipCoord::new(x, y))
            .or_insert_with(|| CoreSubset::empty(x, y))
            .add_processor(processor_id);
    }

    /// Whether chip `(x, y)` has a subset, even an empty one.
    pub fn is_chip(&self, x: u32, y: u32) -> bool {
        self.contains_chip(ChipCoord::new(x, y))
    }

    /// Whether a chip has a subset, even an empty one.
    pub fn contains_chip(&self, coord: ChipCoord) -> bool {
        self.subsets.contains_key(&coord)
    }

    /// Whether core `processor_id` of chip `(x, y)` is selected.
    pub fn is_core(&self, x: u32, y: u32, processor_id: u32) -> bool {
        self.subsets
            .get(&ChipCoord::new(x, y))
            .is_some_and(|subset| subset.contains(processor_id))
    }

    /// The subset for a chip; an empty one if the chip was never added.
    pub fn get_core_subset_for_chip(&self, x: u32, y: u32) -> Cow<'_, CoreSubset> {
        match self.subsets.get(&ChipCoord::new(x, y)) {
            Some(subset) => Cow::Borrowed(subset),
            None => Cow::Owned(CoreSubset::empty(x, y)),
        }
    }

    /// Subsets in chip insertion order.
    pub fn core_subsets(&self) -> impl Iterator<Item = &CoreSubset> {
        self.subsets.values()
    }

    /// Chips with a subset, in insertion order.
    pub fn chips(&self) -> impl Iterator<Item = ChipCoord> + '_ {
        self.subsets.keys().copied()
    }

    /// Number of chips with a subset.
    pub fn n_chips(&self) -> usize {
        self.subsets.len()
    }

    /// Total number of selected cores across all chips.
    pub fn len(&self) -> usize {
        self.subsets.values().map(CoreSubset::len).sum()
    }

    /// Whether no cores are selected on any chip.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cores selected in both `self` and `other`.
    ///
    /// Chips left with no cores are dropped.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut result = Self::new();
        for subset in self.subsets.values() {
            let Some(theirs) = other.subsets.get(&subset.coord) else {
                continue;
            };
            let common: IndexSet<u32> = subset
                .processor_ids
                .intersection(&theirs.processor_ids)
                .copied()
                .collect();
            if !common.is_empty() {
                result.add_core_subset(CoreSubset {
                    coord: subset.coord,
                    processor_ids: common,
                });
            }
        }
        result
    }
}

impl Index<(u32, u32)> for CoreSubsets {
    type Output = CoreSubset;

    /// Panics if the chip has no subset; see
    /// [`get_core_subset_for_chip`](CoreSubsets::get_core_subset_for_chip).
    fn index(&self, (x, y): (u32, u32)) -> &CoreSubset {
        &self.subsets[&ChipCoord::new(x, y)]
    }
}

impl FromIterator<CoreSubset> for CoreSubsets {
    fn from_iter<I: IntoIterator<Item = CoreSubset>>(iter: I) -> Self {
        let mut subsets = Self::new();
        subsets.add_core_subsets(iter);
        subsets
    }
}

impl From<Vec<CoreSubset>> for CoreSubsets {
    fn from(subsets: Vec<CoreSubset>) -> Self {
        subsets.into_iter().collect()
    }
}

impl From<CoreSubsets> for Vec<CoreSubset> {
    fn from(subsets: CoreSubsets) -> Self {
        subsets.subsets.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a CoreSubsets {
    type Item = &'a CoreSubset;
    type IntoIter = indexmap::map::Values<'a, ChipCoord, CoreSubset>;

    fn into_iter(self) -> Self::IntoIter {
        self.subsets.values()
    }
}

impl std::fmt::Display for CoreSubsets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for coord in self.subsets.keys() {
            write!(f, "{}", coord)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_subset_basics() {
        let mut subset = CoreSubset::new(0, 0, [1, 2, 3]);
        assert_eq!(subset.len(), 3);
        assert_eq!((subset.x(), subset.y()), (0, 0));
        assert!(subset.contains(2));

        subset.add_processor(3);
        assert_eq!(subset.len(), 3);
        subset.add_processor(4);
        assert_eq!(subset.len(), 4);

        assert_eq!(subset.processor_ids().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(subset.to_string(), "0:0:[1, 2, 3, 4]");
    }

    #[test]
    fn core_subset_equality() {
        let subset = CoreSubset::new(0, 0, [1, 2, 3]);
        assert_eq!(subset, CoreSubset::new(0, 0, [3, 2, 1]));
        assert_ne!(subset, CoreSubset::new(0, 1, [1, 2, 3]));
        assert_ne!(subset, CoreSubset::new(0, 0, [1]));

        // Equal subsets hash alike whatever order their cores were added in
        let hash = |s: &CoreSubset| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            s.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&subset), hash(&CoreSubset::new(0, 0, [3, 2, 1])));
    }

    #[test]
    fn core_subset_as_hash_key() {
        let mut set = std::collections::HashSet::new();
        set.insert(CoreSubset::new(0, 0, [1, 2, 3]));
        set.insert(CoreSubset::new(0, 0, [4, 5, 6]));
        set.insert(CoreSubset::new(0, 1, [1, 2, 3]));
        set.insert(CoreSubset::new(0, 0, [3, 2, 1]));
        set.insert(CoreSubset::new(0, 0, [1, 2, 3, 4]));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn accumulates_processors() {
        let mut subsets = CoreSubsets::new();
        subsets.add_processor(1, 1, 0);
        subsets.add_processor(1, 1, 1);
        subsets.add_processor(2, 2, 5);

        assert_eq!(subsets.len(), 3);
        assert_eq!(subsets.n_chips(), 2);
        assert!(subsets.is_chip(1, 1));
        assert!(!subsets.is_chip(3, 3));
        assert!(subsets.is_core(1, 1, 1));
        assert!(!subsets.is_core(1, 1, 9));
        assert!(!subsets.is_core(3, 3, 0));
    }

    #[test]
    fn add_and_replace() {
        let mut subsets = CoreSubsets::new();
        assert_eq!(subsets.len(), 0);
        assert!(subsets.is_empty());

        subsets.add_processor(0, 0, 1);
        assert_eq!(subsets.len(), 1);

        subsets.add_core_subset(CoreSubset::new(0, 0, [1]));
        assert_eq!(subsets.len(), 1);

        subsets.add_core_subset(CoreSubset::new(1, 0, [1, 2]));
        assert_eq!(subsets.len(), 3);
        assert!(subsets.is_chip(1, 0));
        assert!(subsets.is_core(0, 0, 1));
        assert!(!subsets.is_core(2, 0, 1));
        assert!(!subsets.is_chip(3, 1));
        assert!(!subsets.is_core(0, 0, 14));

        // Replacement drops the old cores
        subsets.add_core_subset(CoreSubset::new(1, 0, [7]));
        assert_eq!(subsets.len(), 2);
        assert!(!subsets.is_core(1, 0, 1));
    }

    #[test]
    fn repeated_processor_is_noop() {
        let mut subsets = CoreSubsets::new();
        subsets.add_processor(4, 4, 2);
        subsets.add_processor(4, 4, 2);
        assert_eq!(subsets.len(), 1);
    }

    #[test]
    fn empty_subset_counts_as_chip() {
        let mut subsets = CoreSubsets::new();
        subsets.add_core_subset(CoreSubset::empty(5, 5));
        assert!(subsets.is_chip(5, 5));
        assert_eq!(subsets.len(), 0);
        assert!(subsets.is_empty());
        assert_eq!(subsets.n_chips(), 1);
    }

    #[test]
    fn last_subset_wins_and_order_kept() {
        let subsets: CoreSubsets = vec![
            CoreSubset::new(0, 0, [1, 2, 3]),
            CoreSubset::new(0, 0, [4, 5, 6]),
            CoreSubset::new(0, 1, [1, 2, 3]),
            CoreSubset::new(0, 0, [1, 2, 3]),
            CoreSubset::new(0, 0, [1, 2, 3, 4]),
        ]
        .into_iter()
        .collect();

        assert!(subsets.contains_chip(ChipCoord::new(0, 1)));
        assert!(subsets.is_core(0, 0, 4));
        assert!(!subsets.is_core(0, 0, 6));
        assert_eq!(subsets.to_string(), "(0, 0)(0, 1)");
        assert_eq!(subsets[(0, 1)], CoreSubset::new(0, 1, [1, 2, 3]));
        assert_eq!(
            subsets.chips().collect::<Vec<_>>(),
            vec![ChipCoord::new(0, 0), ChipCoord::new(0, 1)]
        );

        for subset in &subsets {
            assert!(subset.contains(3));
        }
        for subset in subsets.core_subsets() {
            assert!(subset.contains(3));
        }
    }

    #[test]
    fn unknown_chip_gives_empty_subset() {
        let subsets = CoreSubsets::new();
        let subset = subsets.get_core_subset_for_chip(9, 9);
        assert_eq!(subset.len(), 0);
        assert_eq!((subset.x(), subset.y()), (9, 9));
        assert_eq!(subset.processor_ids().count(), 0);
    }

    #[test]
    fn known_chip_subset_is_borrowed() {
        let mut subsets = CoreSubsets::new();
        subsets.add_processor(1, 2, 3);
        assert!(matches!(subsets.get_core_subset_for_chip(1, 2), Cow::Borrowed(_)));
    }

    #[test]
    #[should_panic]
    fn index_unknown_chip_panics() {
        let subsets = CoreSubsets::new();
        let _ = &subsets[(0, 0)];
    }

    #[test]
    fn intersection() {
        let a: CoreSubsets = vec![
            CoreSubset::new(0, 0, [1, 2, 3]),
            CoreSubset::new(1, 0, [1]),
            CoreSubset::new(2, 0, [4]),
        ]
        .into();
        let b: CoreSubsets = vec![
            CoreSubset::new(0, 0, [2, 3, 4]),
            CoreSubset::new(1, 0, [2]),
        ]
        .into();

        let both = a.intersect(&b);
        assert_eq!(both.n_chips(), 1);
        assert_eq!(both.len(), 2);
        assert!(both.is_core(0, 0, 2));
        assert!(both.is_core(0, 0, 3));
        assert!(!both.is_chip(1, 0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_replaces_duplicates() {
        let json = r#"[
            {"coord": {"x": 0, "y": 0}, "processor_ids": [1, 2]},
            {"coord": {"x": 0, "y": 0}, "processor_ids": [5]}
        ]"#;
        let subsets: CoreSubsets = serde_json::from_str(json).unwrap();
        assert_eq!(subsets.n_chips(), 1);
        assert_eq!(subsets.len(), 1);
        assert!(subsets.is_core(0, 0, 5));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn len_counts_distinct_cores(
                adds in proptest::collection::vec((0u32..4, 0u32..4, 0u32..18), 0..64)
            ) {
                let mut subsets = CoreSubsets::new();
                for &(x, y, p) in &adds {
                    subsets.add_processor(x, y, p);
                }
                let distinct: std::collections::HashSet<_> = adds.iter().copied().collect();
                prop_assert_eq!(subsets.len(), distinct.len());
                for &(x, y, p) in &adds {
                    prop_assert!(subsets.is_chip(x, y));
                    prop_assert!(subsets.is_core(x, y, p));
                }
            }
        }
    }
}
