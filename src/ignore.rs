//! Ignore-rule lookups for workdir synthesis.
//!
//! Each directory visited during a workdir walk contributes its own
//! `.gitignore`; the context is a stack mirroring the walk so rules from
//! enclosing directories keep applying underneath.

use ::ignore::gitignore::Gitignore;
use std::path::Path;

#[derive(Default)]
pub struct IgnoreContext {
    stack: Vec<Gitignore>,
}

impl IgnoreContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// compile and push the ignore file of `dir`, if any
    pub fn push_dir(&mut self, dir: &Path) {
        // parse errors are deliberately swallowed, a broken ignore file
        // must not break the diff
        let (gitignore, err) = Gitignore::new(dir.join(".gitignore"));
        if let Some(err) = err {
            debug!("ignoring malformed ignore file in `{}`: {}", dir.display(), err);
        }
        self.stack.push(gitignore);
    }

    pub fn pop_dir(&mut self) {
        self.stack.pop();
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.stack
            .iter()
            .any(|gitignore| gitignore.matched_path_or_any_parents(path, is_dir).is_ignore())
    }
}
