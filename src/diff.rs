//! Line-level comparison between two snapshot contents.
//!
//! `diff_lines` runs Myers' shortest-edit-script algorithm over the input
//! lines; `render_unified` turns the tagged lines into a conventional unified
//! diff with context. Both are pure functions of their inputs.

/// Classification of one line in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTag {
    /// Present in both versions.
    Equal,
    /// Present only in the newer version.
    Added,
    /// Present only in the older version.
    Removed,
}

/// One tagged line of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Line classification.
    pub tag: DiffTag,
    /// Line text without its terminator.
    pub text: String,
}

impl DiffLine {
    fn equal(text: &str) -> Self {
        Self {
            tag: DiffTag::Equal,
            text: text.to_string(),
        }
    }

    fn added(text: &str) -> Self {
        Self {
            tag: DiffTag::Added,
            text: text.to_string(),
        }
    }

    fn removed(text: &str) -> Self {
        Self {
            tag: DiffTag::Removed,
            text: text.to_string(),
        }
    }
}

/// Computes a line-level diff between `old` and `new` using Myers' algorithm.
///
/// Every input line appears exactly once in the output, tagged with how it
/// moved between the two versions. Identical inputs yield all-`Equal` output.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let offset = max;
    let width = (2 * max + 1) as usize;
    let mut v = vec![0isize; width];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    // Walk the recorded frontier states backwards to recover the edit script.
    let mut lines = Vec::new();
    let (mut x, mut y) = (n, m);
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let idx = (k + offset) as usize;
        let prev_k = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            lines.push(DiffLine::equal(a[(x - 1) as usize]));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                lines.push(DiffLine::added(b[(y - 1) as usize]));
            } else {
                lines.push(DiffLine::removed(a[(x - 1) as usize]));
            }
            x = prev_x;
            y = prev_y;
        }
    }
    lines.reverse();
    lines
}

/// Renders tagged lines as a unified diff with `context` equal lines around
/// each changed region. Identical inputs render the headers and no hunks.
pub fn render_unified(
    from_label: &str,
    to_label: &str,
    lines: &[DiffLine],
    context: usize,
) -> String {
    let mut out = String::new();
    out.push_str("--- ");
    out.push_str(from_label);
    out.push('\n');
    out.push_str("+++ ");
    out.push_str(to_label);
    out.push('\n');

    let changed: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.tag != DiffTag::Equal)
        .map(|(i, _)| i)
        .collect();
    if changed.is_empty() {
        return out;
    }

    // Prefix counts of old/new lines, used for hunk headers.
    let mut prefix_old = vec![0usize; lines.len() + 1];
    let mut prefix_new = vec![0usize; lines.len() + 1];
    for (i, line) in lines.iter().enumerate() {
        prefix_old[i + 1] = prefix_old[i] + usize::from(line.tag != DiffTag::Added);
        prefix_new[i + 1] = prefix_new[i] + usize::from(line.tag != DiffTag::Removed);
    }

    for (start, end) in hunk_ranges(&changed, context, lines.len()) {
        let old_count = prefix_old[end + 1] - prefix_old[start];
        let new_count = prefix_new[end + 1] - prefix_new[start];
        let old_start = if old_count == 0 {
            prefix_old[start]
        } else {
            prefix_old[start] + 1
        };
        let new_start = if new_count == 0 {
            prefix_new[start]
        } else {
            prefix_new[start] + 1
        };
        out.push_str(&format!(
            "@@ -{old_start},{old_count} +{new_start},{new_count} @@\n"
        ));
        for line in &lines[start..=end] {
            let marker = match line.tag {
                DiffTag::Equal => ' ',
                DiffTag::Added => '+',
                DiffTag::Removed => '-',
            };
            out.push(marker);
            out.push_str(&line.text);
            out.push('\n');
        }
    }
    out
}

/// Groups changed line indices into inclusive hunk ranges, merging hunks
/// whose context windows touch or overlap.
fn hunk_ranges(changed: &[usize], context: usize, total: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = changed[0].saturating_sub(context);
    let mut end = changed[0] + context;
    for &index in &changed[1..] {
        if index.saturating_sub(context) <= end + 1 {
            end = index + context;
        } else {
            ranges.push((start, end.min(total - 1)));
            start = index.saturating_sub(context);
            end = index + context;
        }
    }
    ranges.push((start, end.min(total - 1)));
    ranges
}
