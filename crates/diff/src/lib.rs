//! Line-based diff between two text versions.
//!
//! Classic LCS dynamic programming with a backtrack, O(m*n) time and space.
//! Good enough for editor-sized files; this is deliberately not a Myers
//! O(ND) implementation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Unchanged,
    Added,
    Removed,
}

/// One line of a unified view, in top-to-bottom order.
///
/// `old_line` is set iff the line exists in the old text (unchanged or
/// removed); `new_line` iff it exists in the new text (unchanged or added).
/// Both are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
}

/// Computes a line diff between `old_text` and `new_text`.
///
/// Splitting is on `\n`; a trailing newline therefore yields a final empty
/// line, matching how line-oriented source text is represented. Total over
/// any pair of strings.
pub fn compute_diff(old_text: &str, new_text: &str) -> Vec<DiffLine> {
    // An empty document has zero lines, not one empty line; `split` alone
    // would otherwise report a phantom removed/added blank on that side.
    let old_lines: Vec<&str> = if old_text.is_empty() {
        Vec::new()
    } else {
        old_text.split('\n').collect()
    };
    let new_lines: Vec<&str> = if new_text.is_empty() {
        Vec::new()
    } else {
        new_text.split('\n').collect()
    };
    let m = old_lines.len();
    let n = new_lines.len();

    // dp[i][j] = LCS length of old[..i] and new[..j]
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if old_lines[i - 1] == new_lines[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    // Backtrack from (m, n); ties prefer additions so insertions surface
    // before deletions in the unified view.
    let mut result = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old_lines[i - 1] == new_lines[j - 1] {
            result.push(DiffLine {
                kind: DiffKind::Unchanged,
                content: old_lines[i - 1].to_string(),
                old_line: Some(i),
                new_line: Some(j),
            });
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i][j - 1] >= dp[i - 1][j]) {
            result.push(DiffLine {
                kind: DiffKind::Added,
                content: new_lines[j - 1].to_string(),
                old_line: None,
                new_line: Some(j),
            });
            j -= 1;
        } else {
            result.push(DiffLine {
                kind: DiffKind::Removed,
                content: old_lines[i - 1].to_string(),
                old_line: Some(i),
                new_line: None,
            });
            i -= 1;
        }
    }
    result.reverse();
    result
}

/// Addition/deletion counts for summary badges.
pub fn diff_stats(diff: &[DiffLine]) -> DiffStats {
    let mut stats = DiffStats::default();
    for line in diff {
        match line.kind {
            DiffKind::Added => stats.additions += 1,
            DiffKind::Removed => stats.deletions += 1,
            DiffKind::Unchanged => {}
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(diff: &[DiffLine], keep: [DiffKind; 2]) -> String {
        diff.iter()
            .filter(|l| keep.contains(&l.kind))
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn reconstructs_both_sides() {
        let old = "fn main() {\n    println!(\"hi\");\n}";
        let new = "fn main() {\n    println!(\"hello\");\n    println!(\"bye\");\n}";
        let diff = compute_diff(old, new);
        assert_eq!(reconstruct(&diff, [DiffKind::Unchanged, DiffKind::Removed]), old);
        assert_eq!(reconstruct(&diff, [DiffKind::Unchanged, DiffKind::Added]), new);
    }

    #[test]
    fn identical_inputs_are_all_unchanged() {
        let text = "a\nb\nc";
        let diff = compute_diff(text, text);
        assert_eq!(diff.len(), 3);
        assert!(diff.iter().all(|l| l.kind == DiffKind::Unchanged));
        assert_eq!(diff[2].old_line, Some(3));
        assert_eq!(diff[2].new_line, Some(3));
    }

    #[test]
    fn empty_old_is_all_added() {
        let diff = compute_diff("", "x\ny");
        assert_eq!(diff.len(), 2);
        assert!(diff.iter().all(|l| l.kind == DiffKind::Added));
        let stats = diff_stats(&diff);
        assert_eq!(stats.additions, 2);
        assert_eq!(reconstruct(&diff, [DiffKind::Unchanged, DiffKind::Added]), "x\ny");
        assert_eq!(reconstruct(&diff, [DiffKind::Unchanged, DiffKind::Removed]), "");
    }

    #[test]
    fn empty_new_is_all_removed() {
        let diff = compute_diff("x\ny", "");
        assert_eq!(diff.len(), 2);
        assert!(diff.iter().all(|l| l.kind == DiffKind::Removed));
        let stats = diff_stats(&diff);
        assert_eq!(stats.deletions, 2);
        assert_eq!(reconstruct(&diff, [DiffKind::Unchanged, DiffKind::Removed]), "x\ny");
    }

    #[test]
    fn simple_modify_scenario() {
        let diff = compute_diff("a\nb\nc", "a\nx\nc");
        let kinds: Vec<DiffKind> = diff.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiffKind::Unchanged,
                DiffKind::Removed,
                DiffKind::Added,
                DiffKind::Unchanged
            ]
        );
        let stats = diff_stats(&diff);
        assert_eq!(stats.additions, 1);
        assert_eq!(stats.deletions, 1);
        assert_eq!(diff[1].content, "b");
        assert_eq!(diff[1].old_line, Some(2));
        assert_eq!(diff[2].content, "x");
        assert_eq!(diff[2].new_line, Some(2));
    }

    #[test]
    fn stats_match_entry_counts() {
        let diff = compute_diff("one\ntwo\nthree", "one\nthree\nfour");
        let stats = diff_stats(&diff);
        let added = diff.iter().filter(|l| l.kind == DiffKind::Added).count();
        let removed = diff.iter().filter(|l| l.kind == DiffKind::Removed).count();
        assert_eq!(stats.additions, added);
        assert_eq!(stats.deletions, removed);
        // Recomputation is stable.
        assert_eq!(diff, compute_diff("one\ntwo\nthree", "one\nthree\nfour"));
    }

    #[test]
    fn trailing_newline_is_a_real_empty_line() {
        let diff = compute_diff("a\n", "a");
        let stats = diff_stats(&diff);
        assert_eq!(stats.deletions, 1);
        assert_eq!(diff.last().map(|l| l.content.as_str()), Some(""));
    }
}
