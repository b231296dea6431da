use super::{DeltaStatus, Diff, DiffOptions};
use crate::error::SiltResult;
use crate::hash::{hash_file, hash_symlink, Oid};
use crate::ignore::IgnoreContext;
use crate::index::{IndexEntry, Timespec};
use crate::obj::FileMode;
use crate::path::path_cmp;
use crate::repo::Repository;
use std::cmp::Ordering;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

// metadata directories are never walked; a directory containing one deeper
// in the tree is some other repository's root
const REPO_MARKERS: [&str; 2] = [".silt", ".git"];

pub(crate) fn workdir_to_index<'r>(
    repo: &'r Repository,
    opts: DiffOptions,
) -> SiltResult<Diff<'r>> {
    trace!("workdir_to_index()");
    let workdir = repo
        .workdir()
        .ok_or_else(|| anyhow!("repository has no working directory to diff against"))?
        .to_path_buf();
    let mut diff = Diff::new(repo, opts);
    let mut synth = WorkdirSynth { repo, diff: &mut diff, cursor: 0, ignores: IgnoreContext::new() };
    synth.scan_dir(&workdir, "")?;
    synth.drain_deleted()?;
    diff.finish();
    Ok(diff)
}

/// a filesystem observation: full stat snapshot, canonical mode, and a path
/// carrying a trailing `/` for directories so it sorts the way the index
/// sorts its entries
struct WorkdirEntry {
    /// repository relative, `/`-suffixed for directories
    path: String,
    abs: PathBuf,
    mode: Option<FileMode>,
    metadata: Metadata,
}

impl WorkdirEntry {
    /// the path as stored on emitted deltas, without the sort suffix
    fn delta_path(&self) -> &str {
        self.path.strip_suffix('/').unwrap_or(&self.path)
    }
}

#[derive(Debug)]
enum Changed {
    Yes,
    No,
    Maybe,
}

struct WorkdirSynth<'a, 'r> {
    repo: &'a Repository,
    diff: &'a mut Diff<'r>,
    cursor: usize,
    ignores: IgnoreContext,
}

impl WorkdirSynth<'_, '_> {
    /// the workdir is enumerated one directory at a time; descent happens
    /// only when the index holds entries underneath the directory
    fn scan_dir(&mut self, dir: &Path, rel_prefix: &str) -> SiltResult<()> {
        trace!("WorkdirSynth::scan_dir({})", dir.display());
        let entries = self.read_dir_entries(dir, rel_prefix)?;
        self.ignores.push_dir(dir);
        for entry in &entries {
            self.process_entry(entry)?;
        }
        self.ignores.pop_dir();
        Ok(())
    }

    fn read_dir_entries(&self, dir: &Path, rel_prefix: &str) -> SiltResult<Vec<WorkdirEntry>> {
        let mut out = vec![];
        for dirent in std::fs::read_dir(dir)? {
            let dirent = dirent?;
            let name = dirent.file_name();
            // paths are utf8 throughout; anything else is not trackable
            let name = match name.to_str() {
                Some(name) => name.to_owned(),
                None => continue,
            };
            if REPO_MARKERS.contains(&name.as_str()) {
                continue;
            }
            let metadata = dirent.path().symlink_metadata()?;
            let mode = FileMode::from_metadata(&metadata);
            let mut path = format!("{}{}", rel_prefix, name);
            if metadata.is_dir() {
                path.push('/');
            }
            out.push(WorkdirEntry { path, abs: dirent.path(), mode, metadata });
        }
        out.sort_by(|a, b| path_cmp(&a.path, &b.path));
        Ok(out)
    }

    fn process_entry(&mut self, entry: &WorkdirEntry) -> SiltResult<()> {
        // anything staged that sorts before this observation is gone from disk
        self.drain_deleted_before(&entry.path);

        let index = self.repo.index();
        match index.entries().get(self.cursor) {
            Some(index_entry) if path_cmp(&index_entry.path, &entry.path) == Ordering::Equal => {
                let index_entry = index_entry.clone();
                self.cursor += 1;
                self.on_matched(index_entry, entry)
            }
            _ => self.on_unmatched(entry),
        }
    }

    fn drain_deleted_before(&mut self, path: &str) {
        let index = self.repo.index();
        while let Some(index_entry) = index.entries().get(self.cursor) {
            if path_cmp(&index_entry.path, path) != Ordering::Less {
                break;
            }
            self.diff.push_single(
                DeltaStatus::Deleted,
                index_entry.mode,
                index_entry.oid,
                index_entry.path.clone(),
            );
            self.cursor += 1;
        }
    }

    fn drain_deleted(&mut self) -> SiltResult<()> {
        let index = self.repo.index();
        while let Some(index_entry) = index.entries().get(self.cursor) {
            self.diff.push_single(
                DeltaStatus::Deleted,
                index_entry.mode,
                index_entry.oid,
                index_entry.path.clone(),
            );
            self.cursor += 1;
        }
        Ok(())
    }

    fn on_unmatched(&mut self, entry: &WorkdirEntry) -> SiltResult<()> {
        let mode = match entry.mode {
            Some(mode) => mode,
            // sockets, fifos and friends are not trackable
            None => return Ok(()),
        };
        if mode.is_tree() {
            if REPO_MARKERS.iter().any(|marker| entry.abs.join(marker).exists()) {
                // nested repository placeholder, TODO submodules
                debug!("skipping nested repository at `{}`", entry.path);
                return Ok(());
            }
            if self.repo.index().has_prefix(&entry.path) {
                return self.scan_dir(&entry.abs, &entry.path);
            }
            // nothing staged underneath: one delta covers the whole
            // directory and it is never recursed into (diverges from
            // mainline semantics, which expands untracked directories)
        }
        let status = self.classify_untracked(entry);
        trace!("WorkdirSynth::{}(`{}`)", status, entry.delta_path());
        self.diff.push_single(status, mode, Oid::UNKNOWN, entry.delta_path());
        Ok(())
    }

    fn classify_untracked(&self, entry: &WorkdirEntry) -> DeltaStatus {
        if self.ignores.is_ignored(&entry.abs, entry.metadata.is_dir()) {
            DeltaStatus::Ignored
        } else {
            DeltaStatus::Untracked
        }
    }

    fn on_matched(&mut self, old: IndexEntry, new: &WorkdirEntry) -> SiltResult<()> {
        let new_mode = match new.mode {
            Some(mode) => mode,
            None => {
                // the staged file was replaced by something untrackable
                self.diff.push_single(DeltaStatus::Deleted, old.mode, old.oid, old.path);
                return Ok(());
            }
        };

        if mode_kind(old.mode) != mode_kind(new_mode) {
            // e.g. a symlink became a regular file: present both transitions
            self.diff.push_single(DeltaStatus::Deleted, old.mode, old.oid, old.path.clone());
            self.diff.push_single(DeltaStatus::Added, new_mode, Oid::UNKNOWN, old.path);
            return Ok(());
        }

        let mut new_oid = Oid::UNKNOWN;
        let changed = match self.has_changes(&old, new, new_mode)? {
            Changed::Yes => true,
            Changed::No => false,
            Changed::Maybe => {
                // the stat cache is inconclusive, hash the content to know
                debug!("rehashing `{}` to settle a suspected change", old.path);
                new_oid = if new_mode.is_link() {
                    hash_symlink(&new.abs)?
                } else {
                    hash_file(&new.abs)?
                };
                new_oid != old.oid
            }
        };

        if changed || old.mode != new_mode {
            self.diff.push_modified(old.mode, old.oid, new_mode, new_oid, old.path);
        }
        Ok(())
    }

    /// decide whether the workdir content differs from the staged entry,
    /// preferably without hashing anything
    fn has_changes(
        &self,
        old: &IndexEntry,
        new: &WorkdirEntry,
        new_mode: FileMode,
    ) -> SiltResult<Changed> {
        if old.filesize != new.metadata.size() as u32 {
            debug!("{} changed: filesize {} -> {}", old.path, old.filesize, new.metadata.size());
            return Ok(Changed::Yes);
        }

        if old.mode != new_mode {
            // only the mode is known to differ; the content must still be
            // hashed so the delta can carry both oids
            debug!("{} suspect: filemode {} -> {}", old.path, old.mode, new_mode);
            return Ok(Changed::Maybe);
        }

        let suspect = old.ctime != Timespec::ctime(&new.metadata)
            || old.mtime != Timespec::mtime(&new.metadata)
            || old.device != new.metadata.dev() as u32
            || old.inode != new.metadata.ino() as u32
            || old.uid != new.metadata.uid()
            || old.gid != new.metadata.gid();

        if suspect {
            debug!("{} suspect: stat cache mismatch", old.path);
            Ok(Changed::Maybe)
        } else {
            Ok(Changed::No)
        }
    }
}

/// the executable bit is a mode change, everything else is a type change
fn mode_kind(mode: FileMode) -> u8 {
    match mode {
        FileMode::REG | FileMode::EXEC => 0,
        FileMode::LINK => 1,
        FileMode::TREE => 2,
        FileMode::GITLINK => 3,
    }
}
