//! The patch engine: loads blob content for each delta in a list, applies
//! the binary policy, drives the textual diff and relays its emissions
//! through user callbacks.

use crate::attr::{AttributeSource, DiffAttr};
use crate::diff::{Delta, DeltaStatus, Diff, DiffFlags, DiffOptions};
use crate::error::{SiltError, SiltResult};
use crate::repo::Repository;
use crate::xdiff::{self, DiffRecord, XdiffConfig};

/// length of the leading chunk scanned for NUL bytes when deciding whether
/// content is binary
const BINARY_SCAN_LIMIT: usize = 8000;

/// content handed to the line callback for "no newline at end of file";
/// the leading newline terminates the unterminated content line before it
pub const NO_NEWLINE_MARKER: &[u8] = b"\n\\ No newline at end of file\n";

pub type FileCb<'a> = dyn FnMut(&Delta, f32) -> SiltResult<()> + 'a;
pub type HunkCb<'a> = dyn FnMut(&Delta, &DiffRange, &[u8]) -> SiltResult<()> + 'a;
pub type LineCb<'a> = dyn FnMut(&Delta, DiffLineOrigin, &[u8]) -> SiltResult<()> + 'a;

/// the four numbers of a hunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRange {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineOrigin {
    Context,
    Addition,
    Deletion,
    /// "no newline" marker following an added line
    AddEofNl,
    /// "no newline" marker following a deleted or context line
    DelEofNl,
    FileHdr,
    HunkHdr,
    Binary,
}

impl DiffLineOrigin {
    pub fn as_char(self) -> char {
        match self {
            DiffLineOrigin::Context => ' ',
            DiffLineOrigin::Addition => '+',
            DiffLineOrigin::Deletion => '-',
            DiffLineOrigin::AddEofNl => '>',
            DiffLineOrigin::DelEofNl => '<',
            DiffLineOrigin::FileHdr => 'F',
            DiffLineOrigin::HunkHdr => 'H',
            DiffLineOrigin::Binary => 'B',
        }
    }

    /// does this origin name actual file content (as opposed to metadata)?
    pub fn is_content(self) -> bool {
        matches!(
            self,
            DiffLineOrigin::Context | DiffLineOrigin::Addition | DiffLineOrigin::Deletion
        )
    }
}

/// parse `@@ -old_start[,old_count] +new_start[,new_count] @@`; an omitted
/// count defaults to one
pub fn parse_hunk_header(header: &[u8]) -> SiltResult<DiffRange> {
    let malformed =
        || SiltError::MalformedHunkHeader(String::from_utf8_lossy(header).into_owned());
    let s = std::str::from_utf8(header).map_err(|_| malformed())?.trim_end();
    let body =
        s.strip_prefix("@@ -").and_then(|rest| rest.strip_suffix(" @@")).ok_or_else(malformed)?;
    let (old, new) = body.split_once(" +").ok_or_else(malformed)?;
    let (old_start, old_count) = parse_range(old).ok_or_else(malformed)?;
    let (new_start, new_count) = parse_range(new).ok_or_else(malformed)?;
    Ok(DiffRange { old_start, old_count, new_start, new_count })
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    match s.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}

fn buf_is_binary(buf: &[u8]) -> bool {
    buf[..buf.len().min(BINARY_SCAN_LIMIT)].contains(&0)
}

/// per-file binary decision: the `diff` attribute wins, `ForceText`
/// overrides everything, otherwise the content heuristic decides
pub(crate) fn resolve_binary(
    attrs: &dyn AttributeSource,
    opts: &DiffOptions,
    path: &str,
    old: &[u8],
    new: &[u8],
) -> bool {
    if opts.flags.contains(DiffFlags::FORCE_TEXT) {
        return false;
    }
    match attrs.diff_attr(path) {
        DiffAttr::True => false,
        DiffAttr::False => true,
        // a named diff driver is recognized but not wired up yet
        DiffAttr::Driver(_) | DiffAttr::Unspecified => buf_is_binary(old) || buf_is_binary(new),
    }
}

fn load_buffers(repo: &Repository, delta: &Delta) -> SiltResult<(Vec<u8>, Vec<u8>)> {
    let old = match delta.status() {
        DeltaStatus::Deleted | DeltaStatus::Modified => {
            repo.read_side_bytes(delta.old_oid(), delta.old_path())?
        }
        _ => vec![],
    };
    let new = match delta.status() {
        DeltaStatus::Added | DeltaStatus::Modified => {
            repo.read_side_bytes(delta.new_oid(), delta.new_path())?
        }
        _ => vec![],
    };
    Ok((old, new))
}

impl<'r> Diff<'r> {
    /// iterate the list, invoking `file_cb` once per delta with a progress
    /// fraction and, when hunk or line callbacks are present, running the
    /// textual diff over each non-binary delta's content
    ///
    /// any callback returning `Err` aborts the traversal and propagates;
    /// the list itself stays valid
    pub fn foreach(
        &mut self,
        mut file_cb: Option<&mut FileCb<'_>>,
        mut hunk_cb: Option<&mut HunkCb<'_>>,
        mut line_cb: Option<&mut LineCb<'_>>,
    ) -> SiltResult<()> {
        let total = self.deltas.len();
        let want_content = hunk_cb.is_some() || line_cb.is_some();

        for i in 0..total {
            // blob buffers live only for this iteration of the loop
            let (old_buf, new_buf) = if want_content {
                let bufs = load_buffers(self.repo, &self.deltas[i])?;
                let binary = resolve_binary(
                    self.repo.attrs(),
                    &self.opts,
                    self.deltas[i].old_path(),
                    &bufs.0,
                    &bufs.1,
                );
                self.deltas[i].set_binary(binary);
                bufs
            } else {
                (vec![], vec![])
            };

            let delta = &self.deltas[i];
            if let Some(cb) = file_cb.as_mut() {
                cb(delta, i as f32 / total as f32)?;
            }

            if !want_content
                || delta.binary() == Some(true)
                || (old_buf.is_empty() && new_buf.is_empty())
            {
                continue;
            }

            let config = XdiffConfig::from_options(&self.opts);
            dispatch_records(delta, &old_buf, &new_buf, &config, &mut hunk_cb, &mut line_cb)?;
        }
        Ok(())
    }
}

/// translate the diff algorithm's record stream into hunk/line callbacks
fn dispatch_records(
    delta: &Delta,
    old: &[u8],
    new: &[u8],
    config: &XdiffConfig,
    hunk_cb: &mut Option<&mut HunkCb<'_>>,
    line_cb: &mut Option<&mut LineCb<'_>>,
) -> SiltResult<()> {
    xdiff::diff_buffers(old, new, config, &mut |record| match record {
        DiffRecord::HunkHeader(header) => {
            let range = parse_hunk_header(header.as_bytes())?;
            if let Some(cb) = hunk_cb.as_mut() {
                cb(delta, &range, header.as_bytes())?;
            }
            Ok(())
        }
        DiffRecord::Line { origin, content, eofnl } => {
            if let Some(cb) = line_cb.as_mut() {
                let origin = match origin {
                    ' ' => DiffLineOrigin::Context,
                    '+' => DiffLineOrigin::Addition,
                    '-' => DiffLineOrigin::Deletion,
                    other => unreachable!("unexpected line origin `{}`", other),
                };
                cb(delta, origin, content)?;
                if eofnl {
                    let marker_origin = if origin == DiffLineOrigin::Addition {
                        DiffLineOrigin::AddEofNl
                    } else {
                        DiffLineOrigin::DelEofNl
                    };
                    cb(delta, marker_origin, NO_NEWLINE_MARKER)?;
                }
            }
            Ok(())
        }
    })
}

/// diff two loose blobs without any repository context: a synthetic
/// two-sided delta (regular mode on both sides, no paths) is run through
/// the hunk/line stages directly
pub fn diff_blobs(
    old: Option<&[u8]>,
    new: Option<&[u8]>,
    opts: DiffOptions,
    mut hunk_cb: Option<&mut HunkCb<'_>>,
    mut line_cb: Option<&mut LineCb<'_>>,
) -> SiltResult<()> {
    let opts = opts.resolve();
    let (mut old, mut new) = (old.unwrap_or(b""), new.unwrap_or(b""));
    if opts.is_reversed() {
        std::mem::swap(&mut old, &mut new);
    }

    let mut delta = Delta::synthetic_blob_pair();
    let binary = if opts.flags.contains(DiffFlags::FORCE_TEXT) {
        false
    } else {
        buf_is_binary(old) || buf_is_binary(new)
    };
    delta.set_binary(binary);
    if binary || (old.is_empty() && new.is_empty()) {
        return Ok(());
    }

    let config = XdiffConfig::from_options(&opts);
    dispatch_records(&delta, old, new, &config, &mut hunk_cb, &mut line_cb)
}
