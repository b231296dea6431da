use crate::error::SiltResult;
use crate::hash::{hash_object, Oid};
use crate::path::path_cmp_explicit;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::fs::Metadata;
use std::io::Write;
use std::os::unix::prelude::PermissionsExt;

#[derive(Copy, PartialEq, Eq, Clone, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum FileMode {
    REG     = 0o100644,
    EXEC    = 0o100755,
    LINK    = 0o120000,
    TREE    = 0o40000,
    GITLINK = 0o160000,
}

impl Display for FileMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let n = self.as_u32();
        if f.alternate() { write!(f, "{:o}", n) } else { write!(f, "{:06o}", n) }
    }
}

impl Debug for FileMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FileMode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn is_link(self) -> bool {
        matches!(self, FileMode::LINK)
    }

    pub fn is_file(self) -> bool {
        matches!(self, FileMode::EXEC | FileMode::REG)
    }

    pub fn is_blob(self) -> bool {
        matches!(self, FileMode::EXEC | FileMode::REG | FileMode::LINK)
    }

    pub fn is_tree(self) -> bool {
        matches!(self, FileMode::TREE)
    }

    pub fn is_gitlink(self) -> bool {
        matches!(self, FileMode::GITLINK)
    }

    pub fn is_exec(self) -> bool {
        matches!(self, FileMode::EXEC)
    }

    /// `None` for bit patterns that don't name a trackable entry kind
    pub fn from_u32(u: u32) -> Option<Self> {
        match u {
            0o100644 => Some(Self::REG),
            0o100755 => Some(Self::EXEC),
            0o120000 => Some(Self::LINK),
            0o40000 => Some(Self::TREE),
            0o160000 => Some(Self::GITLINK),
            _ => None,
        }
    }

    /// canonicalize an lstat result; sockets, fifos and friends are not
    /// trackable and come back as `None`
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            Some(Self::LINK)
        } else if file_type.is_dir() {
            Some(Self::TREE)
        } else if file_type.is_file() {
            let is_executable = metadata.permissions().mode() & 0o111;
            Some(if is_executable != 0 { Self::EXEC } else { Self::REG })
        } else {
            None
        }
    }
}

/// a single name within a tree; full paths are built up during traversal
#[derive(PartialEq, Debug, Clone, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: String,
    pub oid: Oid,
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    // directories sort as if their name had a trailing slash, the same
    // convention the index uses for full paths
    fn cmp(&self, other: &Self) -> Ordering {
        path_cmp_explicit(&self.name, self.mode.is_tree(), &other.name, other.mode.is_tree())
    }
}

impl TreeEntry {
    pub fn new(mode: FileMode, name: impl Into<String>, oid: Oid) -> Self {
        Self { mode, name: name.into(), oid }
    }
}

#[derive(PartialEq, Debug, Default, Clone)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// serialized payload used for content addressing:
    /// `<octal mode> <name>\0<oid bytes>` per entry
    pub fn serialize(&self) -> SiltResult<Vec<u8>> {
        let mut buf = vec![];
        for entry in &self.entries {
            write!(buf, "{:#} {}\0", entry.mode, entry.name)?;
            buf.write_all(entry.oid.as_bytes())?;
        }
        Ok(buf)
    }

    pub fn oid(&self) -> SiltResult<Oid> {
        Ok(hash_object("tree", &self.serialize()?))
    }
}
