use crate::attr::{AttributeSource, NoAttributes};
use crate::diff::{self, Diff, DiffOptions};
use crate::error::{SiltErrorExt, SiltResult};
use crate::hash::Oid;
use crate::index::Index;
use crate::obj::Tree;
use crate::odb::ObjectStore;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// bundles the external collaborators a diff needs: the object database,
/// the staged index, the working directory root and the attribute engine
pub struct Repository {
    odb: Rc<dyn ObjectStore>,
    workdir: Option<PathBuf>,
    index: Index,
    attrs: Box<dyn AttributeSource>,
}

impl Repository {
    pub fn new(odb: Rc<dyn ObjectStore>) -> Self {
        Self { odb, workdir: None, index: Index::default(), attrs: Box::new(NoAttributes) }
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.index = index;
        self
    }

    pub fn with_attributes(mut self, attrs: Box<dyn AttributeSource>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn odb(&self) -> &dyn ObjectStore {
        &*self.odb
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    pub fn attrs(&self) -> &dyn AttributeSource {
        &*self.attrs
    }

    pub(crate) fn read_tree(&self, oid: Oid) -> SiltResult<Tree> {
        self.odb.read_tree(oid)
    }

    /// an unknown tree oid reads as the empty tree, which makes diffs
    /// against a repository without history work out naturally
    pub(crate) fn read_tree_or_empty(&self, oid: Oid) -> SiltResult<Tree> {
        if oid.is_unknown() { Ok(Tree::default()) } else { self.odb.read_tree(oid) }
    }

    /// blob bytes for one side of a delta: from the object database when
    /// the hash is known, straight from the working directory otherwise
    ///
    /// a known hash can still miss the odb: a workdir entry hashed on
    /// suspicion carries an oid whose content exists nowhere but on disk
    pub(crate) fn read_side_bytes(&self, oid: Oid, path: &str) -> SiltResult<Vec<u8>> {
        if oid.is_known() {
            match self.odb.read_blob(oid) {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.is_not_found_err() && self.workdir.is_some() => {}
                Err(err) => return Err(err),
            }
        }
        let root = self
            .workdir()
            .ok_or_else(|| anyhow!("no working directory to read `{}` from", path))?;
        let absolute = root.join(path);
        if absolute.symlink_metadata()?.file_type().is_symlink() {
            Ok(std::fs::read_link(&absolute)?.as_os_str().as_bytes().to_vec())
        } else {
            Ok(std::fs::read(&absolute)?)
        }
    }

    /// diff two committed trees; an unknown oid stands for the empty tree
    pub fn diff_tree_to_tree(&self, opts: DiffOptions, old: Oid, new: Oid) -> SiltResult<Diff<'_>> {
        diff::tree_to_tree(self, opts, old, new)
    }

    /// diff a committed tree (old side) against the staged index (new side)
    pub fn diff_index_to_tree(&self, opts: DiffOptions, old_tree: Oid) -> SiltResult<Diff<'_>> {
        diff::index_to_tree(self, opts, old_tree)
    }

    /// diff the staged index (old side) against the working directory (new
    /// side)
    pub fn diff_workdir_to_index(&self, opts: DiffOptions) -> SiltResult<Diff<'_>> {
        diff::workdir_to_index(self, opts)
    }
}
