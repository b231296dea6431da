use super::{DeltaStatus, Diff, DiffOptions};
use crate::error::SiltResult;
use crate::hash::Oid;
use crate::obj::{Tree, TreeEntry};
use crate::repo::Repository;
use std::cmp::Ordering;

pub(crate) fn tree_to_tree<'r>(
    repo: &'r Repository,
    opts: DiffOptions,
    old: Oid,
    new: Oid,
) -> SiltResult<Diff<'r>> {
    trace!("tree_to_tree(old: {}, new: {})", old, new);
    let mut diff = Diff::new(repo, opts);
    let old_tree = repo.read_tree_or_empty(old)?;
    let new_tree = repo.read_tree_or_empty(new)?;
    TreeDiffSynth { repo, diff: &mut diff, prefix: String::new() }
        .diff_trees(&old_tree, &new_tree)?;
    diff.finish();
    Ok(diff)
}

struct TreeDiffSynth<'a, 'r> {
    repo: &'a Repository,
    diff: &'a mut Diff<'r>,
    // repository relative path of the subtree being compared, appended on
    // descent and truncated on ascent
    prefix: String,
}

impl TreeDiffSynth<'_, '_> {
    fn diff_trees(&mut self, old: &Tree, new: &Tree) -> SiltResult<()> {
        let mut old_iter = old.entries().iter().peekable();
        let mut new_iter = new.entries().iter().peekable();
        // entry ordering puts a blob before a directory of the same name,
        // so a type changed path never "matches": it falls apart into a
        // deleted entry and an added entry naturally
        loop {
            match (old_iter.peek(), new_iter.peek()) {
                (None, None) => break,
                (None, Some(_)) => {
                    let entry = new_iter.next().unwrap();
                    self.on_created(entry)?;
                }
                (Some(_), None) => {
                    let entry = old_iter.next().unwrap();
                    self.on_deleted(entry)?;
                }
                (Some(old_entry), Some(new_entry)) => match old_entry.cmp(new_entry) {
                    Ordering::Less => {
                        let entry = old_iter.next().unwrap();
                        self.on_deleted(entry)?;
                    }
                    Ordering::Greater => {
                        let entry = new_iter.next().unwrap();
                        self.on_created(entry)?;
                    }
                    Ordering::Equal => {
                        let old_entry = old_iter.next().unwrap();
                        let new_entry = new_iter.next().unwrap();
                        self.on_matched(old_entry, new_entry)?;
                    }
                },
            }
        }
        Ok(())
    }

    fn on_created(&mut self, entry: &TreeEntry) -> SiltResult<()> {
        trace!("TreeDiffSynth::on_created({}{})", self.prefix, entry.name);
        self.single_sided(DeltaStatus::Added, entry)
    }

    fn on_deleted(&mut self, entry: &TreeEntry) -> SiltResult<()> {
        trace!("TreeDiffSynth::on_deleted({}{})", self.prefix, entry.name);
        self.single_sided(DeltaStatus::Deleted, entry)
    }

    fn on_matched(&mut self, old: &TreeEntry, new: &TreeEntry) -> SiltResult<()> {
        trace!("TreeDiffSynth::on_matched({}{})", self.prefix, new.name);
        if old.mode.is_tree() && new.mode.is_tree() {
            // subtrees with equal hashes hold identical content, step over
            if old.oid != new.oid {
                let old_subtree = self.repo.read_tree(old.oid)?;
                let new_subtree = self.repo.read_tree(new.oid)?;
                let len = self.descend(&new.name);
                self.diff_trees(&old_subtree, &new_subtree)?;
                self.prefix.truncate(len);
            }
        } else if old.mode.is_gitlink() || new.mode.is_gitlink() {
            // submodule contents are not diffed yet
        } else if old.oid != new.oid || old.mode != new.mode {
            let path = format!("{}{}", self.prefix, new.name);
            self.diff.push_modified(old.mode, old.oid, new.mode, new.oid, path);
        }
        Ok(())
    }

    /// emit one side of the diff for an unmatched entry; directories are
    /// expanded into a delta per contained blob
    fn single_sided(&mut self, status: DeltaStatus, entry: &TreeEntry) -> SiltResult<()> {
        if entry.mode.is_tree() {
            let subtree = self.repo.read_tree(entry.oid)?;
            let len = self.descend(&entry.name);
            for child in subtree.entries() {
                self.single_sided(status, child)?;
            }
            self.prefix.truncate(len);
        } else if entry.mode.is_gitlink() {
            // see on_matched
        } else {
            let path = format!("{}{}", self.prefix, entry.name);
            self.diff.push_single(status, entry.mode, entry.oid, path);
        }
        Ok(())
    }

    fn descend(&mut self, name: &str) -> usize {
        let len = self.prefix.len();
        self.prefix.push_str(name);
        self.prefix.push('/');
        len
    }
}
