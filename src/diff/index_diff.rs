use super::{DeltaStatus, Diff, DiffOptions};
use crate::error::SiltResult;
use crate::hash::Oid;
use crate::obj::{Tree, TreeEntry};
use crate::path::path_cmp;
use crate::repo::Repository;
use std::cmp::Ordering;

pub(crate) fn index_to_tree<'r>(
    repo: &'r Repository,
    opts: DiffOptions,
    old_tree: Oid,
) -> SiltResult<Diff<'r>> {
    trace!("index_to_tree(old_tree: {})", old_tree);
    let mut diff = Diff::new(repo, opts);
    let tree = repo.read_tree_or_empty(old_tree)?;
    let mut synth = IndexTreeSynth { repo, diff: &mut diff, cursor: 0, prefix: String::new() };
    synth.walk_tree(&tree)?;
    synth.drain_index()?;
    diff.finish();
    Ok(diff)
}

/// merge-walks the flattened blob stream of a tree against the sorted
/// index; both advance in the same global path order so a single cursor
/// into the index suffices
struct IndexTreeSynth<'a, 'r> {
    repo: &'a Repository,
    diff: &'a mut Diff<'r>,
    cursor: usize,
    prefix: String,
}

impl IndexTreeSynth<'_, '_> {
    fn walk_tree(&mut self, tree: &Tree) -> SiltResult<()> {
        for entry in tree.entries() {
            if entry.mode.is_tree() {
                let subtree = self.repo.read_tree(entry.oid)?;
                let len = self.prefix.len();
                self.prefix.push_str(&entry.name);
                self.prefix.push('/');
                self.walk_tree(&subtree)?;
                self.prefix.truncate(len);
            } else if entry.mode.is_gitlink() {
                // submodules are skipped for now
                continue;
            } else {
                self.on_tree_blob(entry)?;
            }
        }
        Ok(())
    }

    fn on_tree_blob(&mut self, entry: &TreeEntry) -> SiltResult<()> {
        let path = format!("{}{}", self.prefix, entry.name);
        self.drain_added_before(&path);

        let index = self.repo.index();
        match index.entries().get(self.cursor) {
            Some(index_entry) if path_cmp(&index_entry.path, &path) == Ordering::Equal => {
                self.cursor += 1;
                if index_entry.oid != entry.oid || index_entry.mode != entry.mode {
                    debug!("{} modified in index: {} -> {}", path, entry.oid, index_entry.oid);
                    self.diff.push_modified(
                        entry.mode,
                        entry.oid,
                        index_entry.mode,
                        index_entry.oid,
                        path,
                    );
                }
            }
            // nothing staged for this path, it exists only in the tree
            _ => self.diff.push_single(DeltaStatus::Deleted, entry.mode, entry.oid, path),
        }
        Ok(())
    }

    /// index entries sorting before `path` have no tree counterpart
    fn drain_added_before(&mut self, path: &str) {
        let index = self.repo.index();
        while let Some(index_entry) = index.entries().get(self.cursor) {
            if path_cmp(&index_entry.path, path) != Ordering::Less {
                break;
            }
            self.diff.push_single(
                DeltaStatus::Added,
                index_entry.mode,
                index_entry.oid,
                index_entry.path.clone(),
            );
            self.cursor += 1;
        }
    }

    fn drain_index(&mut self) -> SiltResult<()> {
        let index = self.repo.index();
        while let Some(index_entry) = index.entries().get(self.cursor) {
            self.diff.push_single(
                DeltaStatus::Added,
                index_entry.mode,
                index_entry.oid,
                index_entry.path.clone(),
            );
            self.cursor += 1;
        }
        Ok(())
    }
}
