//! Wrapper around the textual diff algorithm.
//!
//! Feeds paired byte buffers through a Myers line diff and re-emits the
//! result as a flat record stream: one raw `@@` header per hunk followed by
//! origin-tagged lines. Whitespace-insensitive comparison works by diffing
//! normalized per-line keys while always emitting the original bytes.

use crate::diff::{DiffFlags, DiffOptions};
use crate::error::SiltResult;
use similar::{capture_diff_slices, Algorithm, DiffOp};
use std::borrow::Cow;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitespaceMode {
    Exact,
    /// all whitespace compares equal to nothing
    IgnoreAll,
    /// any whitespace run compares equal to any other, trailing whitespace
    /// compares equal to none
    IgnoreChange,
    /// trailing whitespace compares equal to none
    IgnoreEol,
}

#[derive(Debug, Clone)]
pub struct XdiffConfig {
    pub context_lines: u32,
    pub interhunk_lines: u32,
    pub whitespace: WhitespaceMode,
}

impl XdiffConfig {
    pub fn from_options(opts: &DiffOptions) -> Self {
        let whitespace = if opts.flags.contains(DiffFlags::IGNORE_WHITESPACE) {
            WhitespaceMode::IgnoreAll
        } else if opts.flags.contains(DiffFlags::IGNORE_WHITESPACE_CHANGE) {
            WhitespaceMode::IgnoreChange
        } else if opts.flags.contains(DiffFlags::IGNORE_WHITESPACE_EOL) {
            WhitespaceMode::IgnoreEol
        } else {
            WhitespaceMode::Exact
        };
        Self {
            context_lines: opts.context_lines,
            interhunk_lines: opts.interhunk_lines,
            whitespace,
        }
    }
}

/// one emission of the diff algorithm
#[derive(Debug, PartialEq)]
pub enum DiffRecord<'a> {
    /// raw hunk header line of the form `@@ -a,b +c,d @@`
    HunkHeader(String),
    /// one content line; `origin` is the unified diff prefix character
    /// (` `, `+` or `-`) and `eofnl` marks the final line of a buffer that
    /// is not newline terminated
    Line { origin: char, content: &'a [u8], eofnl: bool },
}

pub fn diff_buffers<'a>(
    old: &'a [u8],
    new: &'a [u8],
    config: &XdiffConfig,
    emit: &mut dyn FnMut(DiffRecord<'a>) -> SiltResult<()>,
) -> SiltResult<()> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let old_keys =
        old_lines.iter().map(|line| whitespace_key(line, config.whitespace)).collect::<Vec<_>>();
    let new_keys =
        new_lines.iter().map(|line| whitespace_key(line, config.whitespace)).collect::<Vec<_>>();

    let ops = capture_diff_slices(Algorithm::Myers, &old_keys, &new_keys);
    let hunks = assemble_hunks(&ops, config, old_lines.len(), new_lines.len());
    trace!("diff_buffers: {} ops, {} hunks", ops.len(), hunks.len());

    for hunk in &hunks {
        emit(DiffRecord::HunkHeader(hunk.header()))?;
        emit_hunk_lines(hunk, &ops, &old_lines, &new_lines, emit)?;
    }
    Ok(())
}

/// split into lines that keep their terminator; the final line may lack one
fn split_lines(buf: &[u8]) -> Vec<&[u8]> {
    let mut lines = vec![];
    let mut start = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if byte == b'\n' {
            lines.push(&buf[start..=i]);
            start = i + 1;
        }
    }
    if start < buf.len() {
        lines.push(&buf[start..]);
    }
    lines
}

fn trim_trailing_ws(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && line[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &line[..end]
}

fn whitespace_key<'a>(line: &'a [u8], mode: WhitespaceMode) -> Cow<'a, [u8]> {
    match mode {
        WhitespaceMode::Exact => Cow::Borrowed(line),
        WhitespaceMode::IgnoreEol => Cow::Borrowed(trim_trailing_ws(line)),
        WhitespaceMode::IgnoreAll => {
            Cow::Owned(line.iter().copied().filter(|byte| !byte.is_ascii_whitespace()).collect())
        }
        WhitespaceMode::IgnoreChange => {
            let trimmed = trim_trailing_ws(line);
            let mut out = Vec::with_capacity(trimmed.len());
            let mut in_run = false;
            for &byte in trimmed {
                if byte.is_ascii_whitespace() {
                    in_run = true;
                } else {
                    if in_run {
                        out.push(b' ');
                        in_run = false;
                    }
                    out.push(byte);
                }
            }
            Cow::Owned(out)
        }
    }
}

/// a hunk's line ranges (context included), half open, 0-based
struct Hunk {
    old_start: usize,
    old_end: usize,
    new_start: usize,
    new_end: usize,
}

impl Hunk {
    fn header(&self) -> String {
        let old_count = self.old_end - self.old_start;
        let new_count = self.new_end - self.new_start;
        // unified diff convention: starts are 1-based, except that an empty
        // range names the line before it; a count of one is omitted
        let old_disp = if old_count == 0 { self.old_start } else { self.old_start + 1 };
        let new_disp = if new_count == 0 { self.new_start } else { self.new_start + 1 };

        let mut header = String::new();
        write!(header, "@@ -{}", old_disp).unwrap();
        if old_count != 1 {
            write!(header, ",{}", old_count).unwrap();
        }
        write!(header, " +{}", new_disp).unwrap();
        if new_count != 1 {
            write!(header, ",{}", new_count).unwrap();
        }
        header.push_str(" @@\n");
        header
    }
}

/// contiguous run of changed lines
struct Span {
    old_start: usize,
    old_end: usize,
    new_start: usize,
    new_end: usize,
}

fn change_spans(ops: &[DiffOp]) -> Vec<Span> {
    let mut spans: Vec<Span> = vec![];
    for op in ops {
        let (old_start, old_end, new_start, new_end) = match *op {
            DiffOp::Equal { .. } => continue,
            DiffOp::Delete { old_index, old_len, new_index } => {
                (old_index, old_index + old_len, new_index, new_index)
            }
            DiffOp::Insert { old_index, new_index, new_len } => {
                (old_index, old_index, new_index, new_index + new_len)
            }
            DiffOp::Replace { old_index, old_len, new_index, new_len } => {
                (old_index, old_index + old_len, new_index, new_index + new_len)
            }
            #[allow(unreachable_patterns)]
            _ => continue,
        };
        // back to back change ops fuse into one span
        if let Some(last) = spans.last_mut() {
            if last.old_end == old_start && last.new_end == new_start {
                last.old_end = old_end;
                last.new_end = new_end;
                continue;
            }
        }
        spans.push(Span { old_start, old_end, new_start, new_end });
    }
    spans
}

fn assemble_hunks(
    ops: &[DiffOp],
    config: &XdiffConfig,
    old_len: usize,
    new_len: usize,
) -> Vec<Hunk> {
    let ctx = config.context_lines as usize;
    let interhunk = config.interhunk_lines as usize;

    // spans closer together than their surrounding context plus the
    // inter-hunk tolerance collapse into one hunk
    let mut merged: Vec<Span> = vec![];
    for span in change_spans(ops) {
        if let Some(last) = merged.last_mut() {
            if span.old_start - last.old_end <= 2 * ctx + interhunk {
                last.old_end = span.old_end;
                last.new_end = span.new_end;
                continue;
            }
        }
        merged.push(span);
    }

    merged
        .into_iter()
        .map(|span| {
            // the equal run before/after a span has the same length on both
            // sides, so clamping against one side suffices
            let lead = std::cmp::min(ctx, span.old_start);
            let tail = std::cmp::min(ctx, old_len - span.old_end);
            Hunk {
                old_start: span.old_start - lead,
                old_end: span.old_end + tail,
                new_start: span.new_start - lead,
                new_end: span.new_end + tail,
            }
        })
        .collect()
}

fn emit_hunk_lines<'a>(
    hunk: &Hunk,
    ops: &[DiffOp],
    old_lines: &[&'a [u8]],
    new_lines: &[&'a [u8]],
    emit: &mut dyn FnMut(DiffRecord<'a>) -> SiltResult<()>,
) -> SiltResult<()> {
    let mut emit_line = |origin: char, line: &'a [u8]| {
        emit(DiffRecord::Line { origin, content: line, eofnl: !line.ends_with(b"\n") })
    };

    for op in ops {
        match *op {
            DiffOp::Equal { old_index, len, .. } => {
                // context lines clip to the hunk boundary
                let start = std::cmp::max(old_index, hunk.old_start);
                let end = std::cmp::min(old_index + len, hunk.old_end);
                for i in start..end.max(start) {
                    emit_line(' ', old_lines[i])?;
                }
            }
            DiffOp::Delete { old_index, old_len, .. } => {
                if old_index >= hunk.old_start && old_index + old_len <= hunk.old_end {
                    for i in old_index..old_index + old_len {
                        emit_line('-', old_lines[i])?;
                    }
                }
            }
            DiffOp::Insert { new_index, new_len, .. } => {
                if new_index >= hunk.new_start && new_index + new_len <= hunk.new_end {
                    for i in new_index..new_index + new_len {
                        emit_line('+', new_lines[i])?;
                    }
                }
            }
            DiffOp::Replace { old_index, old_len, new_index, new_len } => {
                if old_index >= hunk.old_start && old_index + old_len <= hunk.old_end {
                    for i in old_index..old_index + old_len {
                        emit_line('-', old_lines[i])?;
                    }
                    for i in new_index..new_index + new_len {
                        emit_line('+', new_lines[i])?;
                    }
                }
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
