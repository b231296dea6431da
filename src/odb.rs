use crate::error::{SiltError, SiltResult};
use crate::hash::{hash_blob_bytes, Oid};
use crate::obj::Tree;
use std::cell::RefCell;
use std::collections::HashMap;

/// the object-database seam: the diff core only ever reads whole trees and
/// whole blob payloads
pub trait ObjectStore {
    fn read_tree(&self, oid: Oid) -> SiltResult<Tree>;
    fn read_blob(&self, oid: Oid) -> SiltResult<Vec<u8>>;
}

/// content-addressed in-memory store, enough odb for embedders and tests
#[derive(Default)]
pub struct MemoryStore {
    trees: RefCell<HashMap<Oid, Tree>>,
    blobs: RefCell<HashMap<Oid, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_blob(&self, bytes: impl Into<Vec<u8>>) -> Oid {
        let bytes = bytes.into();
        let oid = hash_blob_bytes(&bytes);
        self.blobs.borrow_mut().insert(oid, bytes);
        oid
    }

    pub fn insert_tree(&self, tree: Tree) -> SiltResult<Oid> {
        let oid = tree.oid()?;
        self.trees.borrow_mut().insert(oid, tree);
        Ok(oid)
    }
}

impl ObjectStore for MemoryStore {
    fn read_tree(&self, oid: Oid) -> SiltResult<Tree> {
        self.trees
            .borrow()
            .get(&oid)
            .cloned()
            .ok_or_else(|| SiltError::ObjectNotFound(oid).into())
    }

    fn read_blob(&self, oid: Oid) -> SiltResult<Vec<u8>> {
        self.blobs
            .borrow()
            .get(&oid)
            .cloned()
            .ok_or_else(|| SiltError::ObjectNotFound(oid).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiltResultExt;
    use crate::hash::hash_blob_bytes;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        let oid = store.insert_blob(&b"contents"[..]);
        assert_eq!(oid, hash_blob_bytes(b"contents"));
        assert_eq!(store.read_blob(oid).unwrap(), b"contents");
    }

    #[test]
    fn missing_object_is_a_not_found_error() {
        let store = MemoryStore::new();
        assert!(store.read_blob(hash_blob_bytes(b"nope")).is_not_found_err());
        assert!(store.read_tree(Oid::UNKNOWN).is_not_found_err());
    }
}
