use crate::error::SiltResult;
use crate::hash::Oid;
use crate::obj::FileMode;
use crate::path;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: u32,
}

impl Timespec {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn ctime(metadata: &Metadata) -> Self {
        Self { sec: metadata.ctime(), nsec: metadata.ctime_nsec() as u32 }
    }

    pub fn mtime(metadata: &Metadata) -> Self {
        Self { sec: metadata.mtime(), nsec: metadata.mtime_nsec() as u32 }
    }
}

/// one staged file: a path, its blob address and a cached stat snapshot used
/// to shortcut content comparisons
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IndexEntry {
    pub ctime: Timespec,
    pub mtime: Timespec,
    pub device: u32,
    pub inode: u32,
    pub mode: FileMode,
    pub uid: u32,
    pub gid: u32,
    pub filesize: u32,
    pub oid: Oid,
    pub flags: u16,
    pub path: String,
}

impl IndexEntry {
    /// entry synthesized from tree data: the stat cache is zeroed, only the
    /// oid can be used to decide whether anything changed
    pub fn from_tree_data(mode: FileMode, path: impl Into<String>, oid: Oid) -> Self {
        Self {
            ctime: Timespec::zero(),
            mtime: Timespec::zero(),
            device: 0,
            inode: 0,
            mode,
            uid: 0,
            gid: 0,
            filesize: 0,
            oid,
            flags: 0,
            path: path.into(),
        }
    }

    /// build an entry from an on-disk file; the oid is left unknown until
    /// the content is actually hashed
    pub fn from_path(root: &Path, relative: &str) -> SiltResult<Self> {
        let absolute = root.join(relative);
        let metadata = absolute.symlink_metadata()?;
        ensure!(!metadata.is_dir(), "index entry `{}` must not be a directory", relative);
        let mode = FileMode::from_metadata(&metadata)
            .ok_or_else(|| anyhow!("`{}` is not a trackable file type", relative))?;

        Ok(Self {
            ctime: Timespec::ctime(&metadata),
            mtime: Timespec::mtime(&metadata),
            device: metadata.dev() as u32,
            inode: metadata.ino() as u32,
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            filesize: metadata.size() as u32,
            oid: Oid::UNKNOWN,
            flags: 0,
            path: relative.to_owned(),
        })
    }
}

/// the staged snapshot: a flat array of entries kept sorted by path bytes
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new(mut entries: Vec<IndexEntry>) -> Self {
        entries.sort_by(|a, b| path::path_cmp(&a.path, &b.path));
        Self { entries }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// insert keeping the sort order, replacing any entry at the same path
    pub fn add_entry(&mut self, entry: IndexEntry) {
        match self.entries.binary_search_by(|probe| path::path_cmp(&probe.path, &entry.path)) {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    pub fn remove_entry(&mut self, path: &str) -> Option<IndexEntry> {
        self.entries
            .binary_search_by(|probe| path::path_cmp(&probe.path, path))
            .ok()
            .map(|i| self.entries.remove(i))
    }

    pub fn find(&self, path: &str) -> Option<&IndexEntry> {
        self.entries
            .binary_search_by(|probe| path::path_cmp(&probe.path, path))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// is any staged path inside the directory `prefix` (which must end in `/`)?
    pub fn has_prefix(&self, prefix: &str) -> bool {
        debug_assert!(prefix.ends_with('/'));
        let i = self.entries.partition_point(|entry| entry.path.as_str() < prefix);
        self.entries.get(i).map(|entry| entry.path.starts_with(prefix)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> IndexEntry {
        IndexEntry::from_tree_data(FileMode::REG, path, Oid::UNKNOWN)
    }

    #[test]
    fn index_keeps_entries_sorted() {
        let mut index = Index::new(vec![entry("b"), entry("a")]);
        index.add_entry(entry("a/b"));
        let paths = index.entries().iter().map(|e| e.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["a", "a/b", "b"]);

        // same path replaces rather than duplicates
        index.add_entry(entry("a/b"));
        assert_eq!(index.len(), 3);

        assert!(index.find("a/b").is_some());
        assert!(index.find("a/c").is_none());
        assert_eq!(index.remove_entry("a/b").unwrap().path, "a/b");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn prefix_probe() {
        let index = Index::new(vec![entry("dir/inner"), entry("dir0"), entry("zed")]);
        assert!(index.has_prefix("dir/"));
        assert!(!index.has_prefix("di/"));
        assert!(!index.has_prefix("zed/"));
    }
}
