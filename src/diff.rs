//! Delta synthesis: the data model for file-level changes and the three
//! synthesizers that produce them (tree↔tree, index↔tree, workdir↔index).

mod index_diff;
mod tree_diff;
mod workdir_diff;

pub(crate) use index_diff::index_to_tree;
pub(crate) use tree_diff::tree_to_tree;
pub(crate) use workdir_diff::workdir_to_index;

use crate::hash::Oid;
use crate::obj::FileMode;
use crate::path::path_cmp;
use crate::pathspec::Pathspec;
use crate::repo::Repository;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

pub const DEFAULT_CONTEXT_LINES: u32 = 3;
pub const DEFAULT_INTERHUNK_LINES: u32 = 3;

// shared process-wide defaults; a resolved options value only ever borrows
// these, caller supplied prefixes are owned
pub const DEFAULT_SRC_PREFIX: &str = "a/";
pub const DEFAULT_DST_PREFIX: &str = "b/";

bitflags! {
    #[derive(Default)]
    pub struct DiffFlags: u32 {
        /// swap the two sides of every delta
        const REVERSE = 1 << 0;
        /// treat every file as text regardless of attributes or content
        const FORCE_TEXT = 1 << 1;
        const IGNORE_WHITESPACE = 1 << 2;
        const IGNORE_WHITESPACE_CHANGE = 1 << 3;
        const IGNORE_WHITESPACE_EOL = 1 << 4;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffOptions {
    pub flags: DiffFlags,
    pub context_lines: u32,
    pub interhunk_lines: u32,
    pub pathspec: Pathspec,
    src_prefix: Cow<'static, str>,
    dst_prefix: Cow<'static, str>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            flags: DiffFlags::default(),
            context_lines: DEFAULT_CONTEXT_LINES,
            interhunk_lines: DEFAULT_INTERHUNK_LINES,
            pathspec: Pathspec::match_all(),
            src_prefix: Cow::Borrowed(DEFAULT_SRC_PREFIX),
            dst_prefix: Cow::Borrowed(DEFAULT_DST_PREFIX),
        }
    }
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reverse(mut self, on: bool) -> Self {
        self.flags.set(DiffFlags::REVERSE, on);
        self
    }

    pub fn force_text(mut self, on: bool) -> Self {
        self.flags.set(DiffFlags::FORCE_TEXT, on);
        self
    }

    pub fn context_lines(mut self, n: u32) -> Self {
        self.context_lines = n;
        self
    }

    pub fn interhunk_lines(mut self, n: u32) -> Self {
        self.interhunk_lines = n;
        self
    }

    pub fn pathspec(mut self, pathspec: Pathspec) -> Self {
        self.pathspec = pathspec;
        self
    }

    pub fn src_prefix(&self) -> &str {
        &self.src_prefix
    }

    pub fn dst_prefix(&self) -> &str {
        &self.dst_prefix
    }

    pub fn set_src_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.src_prefix = Cow::Owned(prefix.into());
        self
    }

    pub fn set_dst_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.dst_prefix = Cow::Owned(prefix.into());
        self
    }

    /// normalization run exactly once, when a diff takes ownership of the
    /// options: prefixes are `/`-terminated and swapped for reverse diffs
    pub(crate) fn resolve(mut self) -> Self {
        self.src_prefix = terminate_prefix(self.src_prefix);
        self.dst_prefix = terminate_prefix(self.dst_prefix);
        if self.flags.contains(DiffFlags::REVERSE) {
            std::mem::swap(&mut self.src_prefix, &mut self.dst_prefix);
        }
        self
    }

    pub(crate) fn is_reversed(&self) -> bool {
        self.flags.contains(DiffFlags::REVERSE)
    }
}

fn terminate_prefix(prefix: Cow<'static, str>) -> Cow<'static, str> {
    if prefix.ends_with('/') { prefix } else { Cow::Owned(format!("{}/", prefix)) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    Ignored,
    Untracked,
}

impl DeltaStatus {
    /// single character status code; statuses without one are skipped by
    /// the compact driver
    pub fn code(self) -> Option<char> {
        match self {
            DeltaStatus::Added => Some('A'),
            DeltaStatus::Deleted => Some('D'),
            DeltaStatus::Modified => Some('M'),
            DeltaStatus::Renamed => Some('R'),
            DeltaStatus::Copied => Some('C'),
            DeltaStatus::Ignored => Some('I'),
            DeltaStatus::Untracked => Some('?'),
        }
    }

    fn reversed(self) -> Self {
        match self {
            DeltaStatus::Added => DeltaStatus::Deleted,
            DeltaStatus::Deleted => DeltaStatus::Added,
            status => status,
        }
    }
}

impl Display for DeltaStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeltaStatus::Added => "added",
            DeltaStatus::Deleted => "deleted",
            DeltaStatus::Modified => "modified",
            DeltaStatus::Renamed => "renamed",
            DeltaStatus::Copied => "copied",
            DeltaStatus::Ignored => "ignored",
            DeltaStatus::Untracked => "untracked",
        };
        write!(f, "{}", s)
    }
}

/// record of one path's transition between the two sides of a diff
///
/// a `None` mode and an unknown oid mean that side is absent; an unknown
/// oid with a present mode means the content hash was simply never computed
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    status: DeltaStatus,
    old_mode: Option<FileMode>,
    new_mode: Option<FileMode>,
    old_oid: Oid,
    new_oid: Oid,
    old_path: String,
    new_path: Option<String>,
    binary: Option<bool>,
    similarity: u8,
}

impl Delta {
    pub fn status(&self) -> DeltaStatus {
        self.status
    }

    pub fn old_mode(&self) -> Option<FileMode> {
        self.old_mode
    }

    pub fn new_mode(&self) -> Option<FileMode> {
        self.new_mode
    }

    pub fn old_oid(&self) -> Oid {
        self.old_oid
    }

    pub fn new_oid(&self) -> Oid {
        self.new_oid
    }

    pub fn old_path(&self) -> &str {
        &self.old_path
    }

    /// distinct from `old_path` only for renames and copies
    pub fn new_path(&self) -> &str {
        self.new_path.as_deref().unwrap_or(&self.old_path)
    }

    /// `None` until the binary policy has run for this delta
    pub fn binary(&self) -> Option<bool> {
        self.binary
    }

    /// reserved for rename scoring, always 0 for now
    pub fn similarity(&self) -> u8 {
        self.similarity
    }

    pub(crate) fn set_binary(&mut self, binary: bool) {
        self.binary = Some(binary);
    }

    /// the stand-in delta used when diffing loose blobs: regular mode on
    /// both sides and no paths at all
    pub(crate) fn synthetic_blob_pair() -> Self {
        Self {
            status: DeltaStatus::Modified,
            old_mode: Some(FileMode::REG),
            new_mode: Some(FileMode::REG),
            old_oid: Oid::UNKNOWN,
            new_oid: Oid::UNKNOWN,
            old_path: String::new(),
            new_path: None,
            binary: None,
            similarity: 0,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(!self.old_path.is_empty());
        match self.status {
            DeltaStatus::Added | DeltaStatus::Untracked | DeltaStatus::Ignored => {
                debug_assert!(self.old_mode.is_none() && self.old_oid.is_unknown());
                debug_assert!(self.new_mode.is_some());
            }
            DeltaStatus::Deleted => {
                debug_assert!(self.new_mode.is_none() && self.new_oid.is_unknown());
                debug_assert!(self.old_mode.is_some());
            }
            DeltaStatus::Modified => {
                debug_assert!(self.old_mode.is_some() && self.new_mode.is_some());
            }
            DeltaStatus::Renamed | DeltaStatus::Copied => {}
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffStats {
    pub added: usize,
    pub deleted: usize,
    pub modified: usize,
    pub untracked: usize,
    pub ignored: usize,
}

impl DiffStats {
    pub fn total(&self) -> usize {
        self.added + self.deleted + self.modified + self.untracked + self.ignored
    }
}

/// ordered list of deltas produced by one synthesis call, tied to the
/// repository it was computed against and the options it was computed with
pub struct Diff<'r> {
    pub(crate) repo: &'r Repository,
    pub(crate) opts: DiffOptions,
    pub(crate) deltas: Vec<Delta>,
}

impl<'r> Diff<'r> {
    pub(crate) fn new(repo: &'r Repository, opts: DiffOptions) -> Self {
        Self { repo, opts: opts.resolve(), deltas: vec![] }
    }

    pub fn repo(&self) -> &'r Repository {
        self.repo
    }

    pub fn options(&self) -> &DiffOptions {
        &self.opts
    }

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Delta> {
        self.deltas.iter()
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for delta in &self.deltas {
            match delta.status {
                DeltaStatus::Added => stats.added += 1,
                DeltaStatus::Deleted => stats.deleted += 1,
                DeltaStatus::Modified => stats.modified += 1,
                DeltaStatus::Untracked => stats.untracked += 1,
                DeltaStatus::Ignored => stats.ignored += 1,
                DeltaStatus::Renamed | DeltaStatus::Copied => {}
            }
        }
        stats
    }

    /// append a delta with only one live side (added, deleted, untracked,
    /// ignored); a reverse diff flips added and deleted before populating
    pub(crate) fn push_single(
        &mut self,
        status: DeltaStatus,
        mode: FileMode,
        oid: Oid,
        path: impl Into<String>,
    ) {
        let path = path.into();
        if !self.opts.pathspec.matches_path(&path) {
            return;
        }
        let status = if self.opts.is_reversed() { status.reversed() } else { status };
        let delta = match status {
            DeltaStatus::Deleted => Delta {
                status,
                old_mode: Some(mode),
                new_mode: None,
                old_oid: oid,
                new_oid: Oid::UNKNOWN,
                old_path: path,
                new_path: None,
                binary: None,
                similarity: 0,
            },
            _ => Delta {
                status,
                old_mode: None,
                new_mode: Some(mode),
                old_oid: Oid::UNKNOWN,
                new_oid: oid,
                old_path: path,
                new_path: None,
                binary: None,
                similarity: 0,
            },
        };
        delta.assert_invariants();
        self.deltas.push(delta);
    }

    /// append a two sided (modified) delta; a reverse diff swaps the mode
    /// and oid pairs
    pub(crate) fn push_modified(
        &mut self,
        old_mode: FileMode,
        old_oid: Oid,
        new_mode: FileMode,
        new_oid: Oid,
        path: impl Into<String>,
    ) {
        let path = path.into();
        if !self.opts.pathspec.matches_path(&path) {
            return;
        }
        let (old_mode, old_oid, new_mode, new_oid) = if self.opts.is_reversed() {
            (new_mode, new_oid, old_mode, old_oid)
        } else {
            (old_mode, old_oid, new_mode, new_oid)
        };
        let delta = Delta {
            status: DeltaStatus::Modified,
            old_mode: Some(old_mode),
            new_mode: Some(new_mode),
            old_oid,
            new_oid,
            old_path: path,
            new_path: None,
            binary: None,
            similarity: 0,
        };
        delta.assert_invariants();
        self.deltas.push(delta);
    }

    /// restore the list ordering invariant after synthesis; the sort is
    /// stable so deleted/added pairs at the same path keep emission order
    pub(crate) fn finish(&mut self) {
        self.deltas.sort_by(|a, b| path_cmp(&a.old_path, &b.old_path));
    }
}

impl<'a, 'r> IntoIterator for &'a Diff<'r> {
    type IntoIter = std::slice::Iter<'a, Delta>;
    type Item = &'a Delta;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
