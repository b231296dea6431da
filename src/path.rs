//! Path ordering helpers.
//!
//! Index and tree entries must interleave in one global order for the merge
//! walks to be correct. We use git's byte-wise ordering where directories
//! compare as if they had a trailing slash, so `foo.txt` < `foo/` < `foo0`.

use std::cmp::Ordering;

// from git (read-cache.c name_compare): memcmp over the common prefix,
// shorter string first on a tie
/// *IMPORTANT*: directory paths must carry their trailing `/` for this
/// ordering to be correct; use [`path_cmp_explicit`] otherwise
pub fn path_cmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let min_len = std::cmp::min(a.len(), b.len());
    a[..min_len].cmp(&b[..min_len]).then_with(|| a.len().cmp(&b.len()))
}

/// compare two paths given out-of-band knowledge of which are directories
pub fn path_cmp_explicit(a: &str, a_is_dir: bool, b: &str, b_is_dir: bool) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let min_len = std::cmp::min(a.len(), b.len());

    a[..min_len].cmp(&b[..min_len]).then_with(|| {
        // at the end of a directory pretend there is a '/', at the end of a
        // file a null byte, so files sort before directories of the same name
        let x = if a.len() == min_len {
            if a_is_dir { b'/' } else { b'\0' }
        } else {
            a[min_len]
        };

        let y = if b.len() == min_len {
            if b_is_dir { b'/' } else { b'\0' }
        } else {
            b[min_len]
        };
        x.cmp(&y)
    })
}

/// does `path` live under `prefix` (a directory path ending in `/`)?
pub fn has_dir_prefix(path: &str, prefix: &str) -> bool {
    debug_assert!(prefix.ends_with('/'));
    path.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    #[test]
    fn files_sort_before_directories_of_same_name() {
        assert_eq!(path_cmp_explicit("x", false, "x", true), Ordering::Less);
        assert_eq!(path_cmp("foo.txt", "foo/"), Ordering::Less);
        assert_eq!(path_cmp("foo/", "foo0"), Ordering::Less);
        assert_eq!(path_cmp("foo/", "foo/a"), Ordering::Less);
    }

    #[test]
    fn dir_prefix() {
        assert!(has_dir_prefix("dir/file", "dir/"));
        assert!(!has_dir_prefix("dirt/file", "dir/"));
    }

    #[quickcheck]
    fn path_cmp_agrees_with_explicit_for_files(a: String, b: String) -> TestResult {
        // interior null bytes collide with the end-of-file sentinel and
        // cannot occur in real paths
        if a.contains('\0') || b.contains('\0') {
            return TestResult::discard();
        }
        TestResult::from_bool(path_cmp(&a, &b) == path_cmp_explicit(&a, false, &b, false))
    }
}
