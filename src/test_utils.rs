use crate::hash::Oid;
use crate::index::IndexEntry;
use crate::obj::{FileMode, Tree, TreeEntry};
use crate::odb::MemoryStore;
use crate::repo::Repository;
use std::collections::BTreeMap;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::rc::Rc;

/// build nested trees in `store` out of `(path, mode, content)` triples and
/// return the root tree's oid
pub fn build_tree(store: &MemoryStore, files: &[(&str, FileMode, &str)]) -> Oid {
    fn build(store: &MemoryStore, files: Vec<(String, FileMode, Vec<u8>)>) -> Oid {
        let mut blobs = vec![];
        let mut dirs: BTreeMap<String, Vec<(String, FileMode, Vec<u8>)>> = BTreeMap::new();
        for (path, mode, content) in files {
            match path.split_once('/') {
                Some((dir, rest)) => {
                    dirs.entry(dir.to_owned()).or_default().push((rest.to_owned(), mode, content))
                }
                None => blobs.push((path, mode, content)),
            }
        }

        let mut entries = vec![];
        for (name, mode, content) in blobs {
            let oid = store.insert_blob(content);
            entries.push(TreeEntry::new(mode, name, oid));
        }
        for (name, children) in dirs {
            let oid = build(store, children);
            entries.push(TreeEntry::new(FileMode::TREE, name, oid));
        }
        store.insert_tree(Tree::new(entries)).unwrap()
    }

    build(
        store,
        files
            .iter()
            .map(|(path, mode, content)| (path.to_string(), *mode, content.as_bytes().to_vec()))
            .collect(),
    )
}

/// a repository backed by an in-memory store and no working directory
pub fn mem_repo(store: &Rc<MemoryStore>) -> Repository {
    let odb: Rc<dyn crate::odb::ObjectStore> = store.clone();
    Repository::new(odb)
}

/// a repository over a throwaway working directory, with helpers to mutate
/// the filesystem and the staged index
pub struct TestRepo {
    pub store: Rc<MemoryStore>,
    pub repo: Repository,
    _tempdir: tempfile::TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let tempdir = tempfile::tempdir().unwrap();
        let store = Rc::new(MemoryStore::new());
        let odb: Rc<dyn crate::odb::ObjectStore> = store.clone();
        let repo = Repository::new(odb).with_workdir(tempdir.path().to_path_buf());
        Self { store, repo, _tempdir: tempdir }
    }

    pub fn root(&self) -> &Path {
        self.repo.workdir().unwrap()
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn mkdir(&self, relative: &str) {
        std::fs::create_dir_all(self.root().join(relative)).unwrap();
    }

    pub fn symlink(&self, relative: &str, target: &str) {
        std::os::unix::fs::symlink(target, self.root().join(relative)).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.root().join(relative)).unwrap();
    }

    pub fn chmod_exec(&self, relative: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.root().join(relative);
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    /// force the file's mtime away from whatever the index recorded, to
    /// simulate time passing between staging and re-inspection
    pub fn bump_mtime(&self, relative: &str) {
        let file = std::fs::File::options()
            .write(true)
            .open(self.root().join(relative))
            .unwrap();
        let when = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
        file.set_modified(when).unwrap();
    }

    /// stage one on-disk file: hash its content into the store and record a
    /// fresh index entry with a full stat snapshot
    pub fn stage(&mut self, relative: &str) {
        let mut entry = IndexEntry::from_path(self.root(), relative).unwrap();
        let absolute = self.root().join(relative);
        entry.oid = if entry.mode.is_link() {
            let target = std::fs::read_link(&absolute).unwrap();
            self.store.insert_blob(target.as_os_str().as_bytes().to_vec())
        } else {
            self.store.insert_blob(std::fs::read(&absolute).unwrap())
        };
        self.repo.index_mut().add_entry(entry);
    }

    pub fn stage_all(&mut self) {
        let mut paths = vec![];
        collect_files(self.root(), self.root(), &mut paths);
        for path in paths {
            self.stage(&path);
        }
    }

    pub fn unstage(&mut self, relative: &str) {
        self.repo.index_mut().remove_entry(relative);
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for dirent in std::fs::read_dir(dir).unwrap() {
        let dirent = dirent.unwrap();
        let name = dirent.file_name();
        if name == ".silt" || name == ".git" {
            continue;
        }
        let path = dirent.path();
        if path.symlink_metadata().unwrap().is_dir() {
            collect_files(root, &path, out);
        } else {
            out.push(path.strip_prefix(root).unwrap().to_str().unwrap().to_owned());
        }
    }
}
