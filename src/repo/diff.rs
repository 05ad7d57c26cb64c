//! Line-level diffing between file contents.
//!
//! Feeds `git diff`, `git show`, and the change summaries printed after
//! commits and merges.

/// What kind of diff operation on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOp {
    /// Line exists only in the "after" version.
    Add,
    /// Line exists only in the "before" version.
    Remove,
    /// Line is identical in both versions.
    Context,
}

/// A single line within a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub op: LineOp,
    pub content: String,
}

impl DiffLine {
    /// Renders the line with its unified-diff prefix.
    pub fn render(&self) -> String {
        let prefix = match self.op {
            LineOp::Add => '+',
            LineOp::Remove => '-',
            LineOp::Context => ' ',
        };
        format!("{prefix}{}", self.content)
    }
}

/// A contiguous block of changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The `@@ -a,b +c,d @@` header.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }
}

/// Insertion and deletion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffStat {
    /// Total changed lines.
    pub fn total(&self) -> usize {
        self.insertions + self.deletions
    }

    /// Accumulates another file's counts.
    pub fn add(&mut self, other: DiffStat) {
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.lines().collect()
    }
}

/// Computes the full edit script between two texts using an LCS table.
pub fn line_diff(old: &str, new: &str) -> Vec<DiffLine> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let (m, n) = (old_lines.len(), new_lines.len());

    let mut table = vec![vec![0usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            table[i][j] = if old_lines[i - 1] == new_lines[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old_lines[i - 1] == new_lines[j - 1] {
            ops.push(DiffLine {
                op: LineOp::Context,
                content: old_lines[i - 1].to_string(),
            });
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i][j - 1] >= table[i - 1][j]) {
            ops.push(DiffLine {
                op: LineOp::Add,
                content: new_lines[j - 1].to_string(),
            });
            j -= 1;
        } else {
            ops.push(DiffLine {
                op: LineOp::Remove,
                content: old_lines[i - 1].to_string(),
            });
            i -= 1;
        }
    }
    ops.reverse();
    ops
}

/// Groups the edit script into hunks with `context` unchanged lines around each change.
pub fn hunks(old: &str, new: &str, context: usize) -> Vec<DiffHunk> {
    let lines = line_diff(old, new);

    let changes: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.op != LineOp::Context)
        .map(|(i, _)| i)
        .collect();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for ci in changes {
        let start = ci.saturating_sub(context);
        let end = (ci + context + 1).min(lines.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }

    // Line numbers before each position in `lines`.
    let mut old_no = vec![0usize; lines.len() + 1];
    let mut new_no = vec![0usize; lines.len() + 1];
    for (idx, line) in lines.iter().enumerate() {
        old_no[idx + 1] = old_no[idx] + usize::from(line.op != LineOp::Add);
        new_no[idx + 1] = new_no[idx] + usize::from(line.op != LineOp::Remove);
    }

    ranges
        .into_iter()
        .map(|(start, end)| {
            let slice = &lines[start..end];
            let old_count = slice.iter().filter(|l| l.op != LineOp::Add).count();
            let new_count = slice.iter().filter(|l| l.op != LineOp::Remove).count();
            DiffHunk {
                old_start: if old_count == 0 { old_no[start] } else { old_no[start] + 1 },
                old_count,
                new_start: if new_count == 0 { new_no[start] } else { new_no[start] + 1 },
                new_count,
                lines: slice.to_vec(),
            }
        })
        .collect()
}

/// Counts inserted and deleted lines.
pub fn stat(old: &str, new: &str) -> DiffStat {
    line_diff(old, new)
        .iter()
        .fold(DiffStat::default(), |mut acc, line| {
            match line.op {
                LineOp::Add => acc.insertions += 1,
                LineOp::Remove => acc.deletions += 1,
                LineOp::Context => {}
            }
            acc
        })
}

/// The ` N files changed, X insertions(+), Y deletions(-)` summary line.
pub fn summary_line(files: usize, stat: DiffStat) -> String {
    let mut parts = vec![format!(
        " {files} file{} changed",
        if files == 1 { "" } else { "s" }
    )];
    if stat.insertions > 0 {
        parts.push(format!(
            "{} insertion{}(+)",
            stat.insertions,
            if stat.insertions == 1 { "" } else { "s" }
        ));
    }
    if stat.deletions > 0 {
        parts.push(format!(
            "{} deletion{}(-)",
            stat.deletions,
            if stat.deletions == 1 { "" } else { "s" }
        ));
    }
    parts.join(", ")
}

/// A `--stat` row: ` path | 3 ++-`.
pub fn stat_row(path: &str, width: usize, stat: DiffStat) -> String {
    format!(
        " {path:<width$} | {} {}{}",
        stat.total(),
        "+".repeat(stat.insertions),
        "-".repeat(stat.deletions)
    )
}
