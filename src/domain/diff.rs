//! Line diff between two versions of a text
//!
//! A longest-common-subsequence diff over lines. Where a run of lines is
//! replaced, the removed lines come before the added ones.

use serde::Serialize;
use thiserror::Error;

/// Upper bound on the comparison table, in cells, after the common prefix
/// and suffix are trimmed
pub const MAX_DIFF_CELLS: usize = 16_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum DiffError {
    #[error("Inputs differ over {old} x {new} lines, more than the {MAX_DIFF_CELLS} cells a diff may compare")]
    TooLarge { old: usize, new: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    Unchanged,
    Added,
    Removed,
}

impl Change {
    /// Marker shown in front of the line
    pub fn symbol(&self) -> &'static str {
        match self {
            Change::Unchanged => " ",
            Change::Added => "+",
            Change::Removed => "-",
        }
    }
}

/// One line of a diff, with its number on each side where it exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
    pub content: String,
    pub change: Change,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn of(lines: &[DiffLine]) -> Self {
        lines.iter().fold(Self::default(), |mut stats, line| {
            match line.change {
                Change::Added => stats.added += 1,
                Change::Removed => stats.removed += 1,
                Change::Unchanged => stats.unchanged += 1,
            }
            stats
        })
    }
}

struct Numbering {
    old: u32,
    new: u32,
    out: Vec<DiffLine>,
}

impl Numbering {
    fn push(&mut self, content: &str, change: Change) {
        let (old_line, new_line) = match change {
            Change::Unchanged => (Some(self.old), Some(self.new)),
            Change::Removed => (Some(self.old), None),
            Change::Added => (None, Some(self.new)),
        };
        if old_line.is_some() {
            self.old += 1;
        }
        if new_line.is_some() {
            self.new += 1;
        }
        self.out.push(DiffLine {
            old_line,
            new_line,
            content: content.to_string(),
            change,
        });
    }
}

/// Diffs `old` against `new` line by line
pub fn diff_lines(old: &str, new: &str) -> Result<Vec<DiffLine>, DiffError> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    let (n, m) = (mid_a.len(), mid_b.len());
    if n.saturating_mul(m) > MAX_DIFF_CELLS {
        return Err(DiffError::TooLarge { old: n, new: m });
    }

    // lcs[i * (m + 1) + j] is the common subsequence length of mid_a[i..] and mid_b[j..]
    let width = m + 1;
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if mid_a[i] == mid_b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut numbering = Numbering {
        old: 1,
        new: 1,
        out: Vec::with_capacity(a.len().max(b.len())),
    };
    for line in &a[..prefix] {
        numbering.push(line, Change::Unchanged);
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if mid_a[i] == mid_b[j] {
            numbering.push(mid_a[i], Change::Unchanged);
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            numbering.push(mid_a[i], Change::Removed);
            i += 1;
        } else {
            numbering.push(mid_b[j], Change::Added);
            j += 1;
        }
    }
    for line in &mid_a[i..] {
        numbering.push(line, Change::Removed);
    }
    for line in &mid_b[j..] {
        numbering.push(line, Change::Added);
    }

    for line in &a[a.len() - suffix..] {
        numbering.push(line, Change::Unchanged);
    }
    Ok(numbering.out)
}

/// `start,count` of one side of a hunk header; a single line omits the count
fn hunk_range(before: u32, count: u32) -> String {
    match count {
        0 => format!("{},0", before),
        1 => format!("{}", before + 1),
        _ => format!("{},{}", before + 1, count),
    }
}

/// Renders a diff in unified format with `context` unchanged lines around
/// each change. Identical inputs render as an empty string.
pub fn format_unified(lines: &[DiffLine], old_label: &str, new_label: &str, context: usize) -> String {
    let changed: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.change != Change::Unchanged)
        .map(|(i, _)| i)
        .collect();
    let Some(&first) = changed.first() else {
        return String::new();
    };

    // Group changes whose context windows touch
    let mut hunks = vec![(first, first)];
    for &idx in &changed[1..] {
        let last = hunks.len() - 1;
        if idx - hunks[last].1 <= 2 * context + 1 {
            hunks[last].1 = idx;
        } else {
            hunks.push((idx, idx));
        }
    }

    // Lines of each side consumed before index i
    let mut before = Vec::with_capacity(lines.len() + 1);
    let (mut old, mut new) = (0u32, 0u32);
    for line in lines {
        before.push((old, new));
        old += u32::from(line.old_line.is_some());
        new += u32::from(line.new_line.is_some());
    }

    let mut out = format!("--- {}\n+++ {}\n", old_label, new_label);
    for (first, last) in hunks {
        let start = first.saturating_sub(context);
        let end = (last + context + 1).min(lines.len());
        let hunk = &lines[start..end];
        let old_count = hunk.iter().filter(|l| l.old_line.is_some()).count() as u32;
        let new_count = hunk.iter().filter(|l| l.new_line.is_some()).count() as u32;
        let (old_before, new_before) = before[start];

        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            hunk_range(old_before, old_count),
            hunk_range(new_before, new_count)
        ));
        for line in hunk {
            out.push_str(line.change.symbol());
            out.push_str(&line.content);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(lines: &[DiffLine]) -> Vec<(Change, &str)> {
        lines.iter().map(|l| (l.change, l.content.as_str())).collect()
    }

    #[test]
    fn replaced_line_is_removed_then_added() {
        let lines = diff_lines("a\nb\nc\n", "a\nB\nc\n").unwrap();
        assert_eq!(
            changes(&lines),
            vec![
                (Change::Unchanged, "a"),
                (Change::Removed, "b"),
                (Change::Added, "B"),
                (Change::Unchanged, "c"),
            ]
        );
        assert_eq!((lines[1].old_line, lines[1].new_line), (Some(2), None));
        assert_eq!((lines[2].old_line, lines[2].new_line), (None, Some(2)));
        assert_eq!((lines[3].old_line, lines[3].new_line), (Some(3), Some(3)));
    }

    #[test]
    fn insertions_shift_new_numbers_only() {
        let lines = diff_lines("one\ntwo", "zero\none\ntwo\nthree").unwrap();
        assert_eq!(DiffStats::of(&lines), DiffStats { added: 2, removed: 0, unchanged: 2 });
        let two = lines.iter().find(|l| l.content == "two").unwrap();
        assert_eq!((two.old_line, two.new_line), (Some(2), Some(3)));
    }

    #[test]
    fn empty_sides() {
        assert!(diff_lines("", "").unwrap().is_empty());
        let lines = diff_lines("", "x\ny").unwrap();
        assert!(lines.iter().all(|l| l.change == Change::Added));
        let lines = diff_lines("x\ny", "").unwrap();
        assert!(lines.iter().all(|l| l.change == Change::Removed));
    }

    #[test]
    fn unified_hunks_carry_context() {
        let old: String = (1..=20).map(|i| format!("line {}\n", i)).collect();
        let new = old.replace("line 3\n", "line three\n").replace("line 18\n", "");
        let lines = diff_lines(&old, &new).unwrap();

        let text = format_unified(&lines, "old", "new", 3);
        assert!(text.starts_with("--- old\n+++ new\n@@ -1,6 +1,6 @@\n line 1\n"));
        assert!(text.contains("-line 3\n+line three\n"));
        assert!(text.contains("@@ -15,6 +15,5 @@\n line 15\n"));
        assert!(text.contains("-line 18\n"));
        assert!(text.ends_with(" line 20\n"));
    }

    #[test]
    fn identical_inputs_have_no_hunks() {
        let lines = diff_lines("same\n", "same\n").unwrap();
        assert_eq!(format_unified(&lines, "old", "new", 3), "");
    }

    #[test]
    fn single_line_hunk_omits_count() {
        let lines = diff_lines("a", "b").unwrap();
        assert_eq!(format_unified(&lines, "old", "new", 3), "--- old\n+++ new\n@@ -1 +1 @@\n-a\n+b\n");
    }
}
