//! Row insertion planning
//!
//! Every marker is located before the workbook is touched. The plan turns
//! `(location, item count)` pairs into the row insertions needed to make
//! room for each block, and answers where each marker ends up once those
//! insertions are applied. Nothing here reads or writes a workbook.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::cell::MAX_ROWS;
use super::marker::MarkerLocation;

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("Expanding sheet '{sheet}' needs {needed} rows, more than the {MAX_ROWS} a worksheet can hold")]
    RowLimit { sheet: String, needed: u64 },
}

/// `count` new rows inserted before `position` on `sheet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowInsertion {
    pub sheet: String,
    pub position: u32,
    pub count: u32,
}

/// The full set of insertions for one commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertionPlan {
    /// Sorted by sheet, then descending position
    insertions: Vec<RowInsertion>,
}

impl InsertionPlan {
    /// Builds the plan for markers each receiving `n` items.
    ///
    /// A block of `n` items occupies the marker row plus `n - 1` new rows
    /// directly below it. Markers sharing a row share a single insertion
    /// sized for the largest block. Input order does not matter.
    pub fn build<'a, I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = (&'a MarkerLocation, usize)>,
    {
        let mut grouped: BTreeMap<(String, u32), u32> = BTreeMap::new();

        for (loc, n) in blocks {
            let extra = n.saturating_sub(1).min(u32::MAX as usize) as u32;
            let slot = grouped.entry((loc.sheet.clone(), loc.row + 1)).or_insert(0);
            *slot = (*slot).max(extra);
        }

        let mut insertions: Vec<RowInsertion> = grouped
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|((sheet, position), count)| RowInsertion {
                sheet,
                position,
                count,
            })
            .collect();

        insertions.sort_by(|a, b| a.sheet.cmp(&b.sheet).then(b.position.cmp(&a.position)));

        Self { insertions }
    }

    /// Returns the insertions in the order they must be applied
    ///
    /// Within a sheet, higher positions come first so that applying one
    /// insertion never moves the position of one still pending.
    pub fn insertions(&self) -> &[RowInsertion] {
        &self.insertions
    }

    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }

    /// Total rows added to a sheet
    pub fn added_rows(&self, sheet: &str) -> u64 {
        self.insertions
            .iter()
            .filter(|ins| ins.sheet == sheet)
            .map(|ins| ins.count as u64)
            .sum()
    }

    /// Final row of something originally at `row`, once the plan is applied
    pub fn final_row(&self, sheet: &str, row: u32) -> u32 {
        let shift: u32 = self
            .insertions
            .iter()
            .filter(|ins| ins.sheet == sheet && ins.position <= row)
            .map(|ins| ins.count)
            .sum();
        row + shift
    }

    /// Where a marker sits once the plan is applied
    pub fn relocate(&self, loc: &MarkerLocation) -> MarkerLocation {
        loc.with_row(self.final_row(&loc.sheet, loc.row))
    }

    /// Checks that no sheet grows past the worksheet row limit
    pub fn check_capacity(&self, sheet: &str, highest_row: u32) -> Result<(), PlanError> {
        let needed = highest_row as u64 + self.added_rows(sheet);
        if needed > MAX_ROWS as u64 {
            return Err(PlanError::RowLimit {
                sheet: sheet.to_string(),
                needed,
            });
        }
        Ok(())
    }

    /// Sheets touched by at least one insertion
    pub fn sheets(&self) -> Vec<&str> {
        let mut sheets: Vec<&str> = self.insertions.iter().map(|i| i.sheet.as_str()).collect();
        sheets.dedup();
        sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn loc(sheet: &str, row: u32) -> MarkerLocation {
        MarkerLocation::new(sheet, 2, row)
    }

    #[test]
    fn single_block_inserts_below_marker() {
        let main = loc("Tasks", 5);
        let plan = InsertionPlan::build([(&main, 3)]);

        assert_eq!(
            plan.insertions(),
            &[RowInsertion {
                sheet: "Tasks".to_string(),
                position: 6,
                count: 2
            }]
        );
        assert_eq!(plan.relocate(&main).row, 5);
        assert_eq!(plan.final_row("Tasks", 6), 8);
        assert_eq!(plan.final_row("Tasks", 4), 4);
    }

    #[test]
    fn zero_and_one_items_insert_nothing() {
        let a = loc("S", 3);
        let b = loc("S", 9);
        let plan = InsertionPlan::build([(&a, 0), (&b, 1)]);
        assert!(plan.is_empty());
        assert_eq!(plan.relocate(&b).row, 9);
    }

    #[test]
    fn lower_marker_shifts_by_upper_block() {
        let main = loc("Tasks", 5);
        let support = loc("Tasks", 10);
        let plan = InsertionPlan::build([(&main, 2), (&support, 1)]);

        assert_eq!(plan.relocate(&main).row, 5);
        assert_eq!(plan.relocate(&support).row, 11);
    }

    #[test]
    fn insertions_are_descending_within_a_sheet() {
        let a = loc("S", 2);
        let b = loc("S", 20);
        let c = loc("S", 8);
        let plan = InsertionPlan::build([(&a, 2), (&b, 4), (&c, 3)]);

        let positions: Vec<u32> = plan.insertions().iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![21, 9, 3]);
    }

    #[test]
    fn markers_on_one_row_share_the_largest_insertion() {
        let left = MarkerLocation::new("S", 1, 4);
        let right = MarkerLocation::new("S", 3, 4);
        let plan = InsertionPlan::build([(&left, 2), (&right, 5)]);

        assert_eq!(plan.insertions().len(), 1);
        assert_eq!(plan.insertions()[0].count, 4);
    }

    #[test]
    fn sheets_are_independent() {
        let a = loc("One", 2);
        let b = loc("Two", 5);
        let plan = InsertionPlan::build([(&a, 10), (&b, 1)]);

        assert_eq!(plan.relocate(&b).row, 5);
        assert_eq!(plan.added_rows("One"), 9);
        assert_eq!(plan.added_rows("Two"), 0);
        assert_eq!(plan.sheets(), vec!["One"]);
    }

    #[test]
    fn capacity_check_rejects_overflow() {
        let a = loc("S", 1);
        let plan = InsertionPlan::build([(&a, 10)]);

        assert!(plan.check_capacity("S", MAX_ROWS - 9).is_ok());
        assert_eq!(
            plan.check_capacity("S", MAX_ROWS - 8),
            Err(PlanError::RowLimit {
                sheet: "S".to_string(),
                needed: MAX_ROWS as u64 + 1
            })
        );
    }

    proptest! {
        #[test]
        fn plan_does_not_depend_on_marker_order(
            rows in proptest::collection::btree_set(1u32..500, 1..8),
            sizes in proptest::collection::vec(0usize..20, 8),
            seed in any::<u64>(),
        ) {
            let locs: Vec<MarkerLocation> = rows.iter().map(|r| loc("S", *r)).collect();
            let pairs: Vec<(&MarkerLocation, usize)> =
                locs.iter().zip(sizes.iter().copied()).collect();

            let mut shuffled = pairs.clone();
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();

            let forward = InsertionPlan::build(pairs.iter().copied());
            let backward = InsertionPlan::build(shuffled.iter().copied());

            prop_assert_eq!(&forward, &backward);
            for l in &locs {
                prop_assert_eq!(forward.relocate(l), backward.relocate(l));
            }
        }

        #[test]
        fn expanded_blocks_never_overlap(
            rows in proptest::collection::btree_set(1u32..200, 1..6),
            sizes in proptest::collection::vec(1usize..15, 6),
        ) {
            let locs: Vec<MarkerLocation> = rows.iter().map(|r| loc("S", *r)).collect();
            let pairs: Vec<(&MarkerLocation, usize)> =
                locs.iter().zip(sizes.iter().copied()).collect();
            let plan = InsertionPlan::build(pairs.iter().copied());

            let mut spans: Vec<(u32, u32)> = pairs
                .iter()
                .map(|(l, n)| {
                    let start = plan.relocate(l).row;
                    (start, start + *n as u32 - 1)
                })
                .collect();
            spans.sort();

            for w in spans.windows(2) {
                prop_assert!(w[0].1 < w[1].0);
            }
        }
    }
}
