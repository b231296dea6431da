use super::*;
use crate::diff::DiffOptions;
use crate::hash::{hash_blob_bytes, Oid};
use crate::odb::MemoryStore;
use crate::test_utils::{build_tree, mem_repo, TestRepo};
use std::rc::Rc;
use std::str::FromStr;

fn compact(diff: &mut Diff<'_>) -> String {
    let mut out = vec![];
    let mut emit = |_delta: &Delta, _origin: DiffLineOrigin, content: &[u8]| {
        out.extend_from_slice(content);
        Ok(())
    };
    diff.print_compact(&mut emit).unwrap();
    String::from_utf8(out).unwrap()
}

fn patch(diff: &mut Diff<'_>) -> String {
    let mut out = vec![];
    let mut emit = |_delta: &Delta, _origin: DiffLineOrigin, content: &[u8]| {
        out.extend_from_slice(content);
        Ok(())
    };
    diff.print_patch(&mut emit).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn compact_added_file() {
    let store = Rc::new(MemoryStore::new());
    let tree = build_tree(&store, &[("a.txt", FileMode::REG, "hi\n")]);
    let repo = mem_repo(&store);
    let mut diff = repo.diff_tree_to_tree(DiffOptions::new(), Oid::UNKNOWN, tree).unwrap();
    assert_eq!(compact(&mut diff), "A\ta.txt\n");
}

#[test]
fn compact_mode_transition() {
    let store = Rc::new(MemoryStore::new());
    let old = build_tree(&store, &[("run.sh", FileMode::REG, "#!/bin/sh\n")]);
    let new = build_tree(&store, &[("run.sh", FileMode::EXEC, "#!/bin/sh\n")]);
    let repo = mem_repo(&store);
    let mut diff = repo.diff_tree_to_tree(DiffOptions::new(), old, new).unwrap();
    assert_eq!(compact(&mut diff), "M\trun.sh (100644 -> 100755)\n");
}

#[test]
fn compact_added_executable_gets_a_star() {
    let store = Rc::new(MemoryStore::new());
    let tree = build_tree(&store, &[("tool", FileMode::EXEC, "#!/bin/sh\n")]);
    let repo = mem_repo(&store);
    let mut diff = repo.diff_tree_to_tree(DiffOptions::new(), Oid::UNKNOWN, tree).unwrap();
    assert_eq!(compact(&mut diff), "A\ttool*\n");
}

#[test]
fn compact_untracked_directory_gets_a_slash() {
    let t = TestRepo::new();
    t.write("sub/f", "x\n");
    let mut diff = t.repo.diff_workdir_to_index(DiffOptions::new()).unwrap();
    assert_eq!(compact(&mut diff), "?\tsub/\n");
}

#[test]
fn patch_header_for_modified_file() {
    // the exact four header lines, with abbreviated oids and the shared mode
    let store = Rc::new(MemoryStore::new());
    let repo = mem_repo(&store);
    let mut diff = crate::diff::Diff::new(&repo, DiffOptions::new());
    diff.push_modified(
        FileMode::REG,
        Oid::from_str("1111111111111111111111111111111111111111").unwrap(),
        FileMode::REG,
        Oid::from_str("2222222222222222222222222222222222222222").unwrap(),
        "a.txt",
    );
    let header = format_file_header(&diff.deltas()[0], "a/", "b/", false).unwrap();
    assert_eq!(
        header,
        "diff --git a/a.txt b/a.txt\n\
         index 1111111..2222222 100644\n\
         --- a/a.txt\n\
         +++ b/a.txt\n"
    );
}

#[test]
fn patch_output_for_content_edit() {
    let store = Rc::new(MemoryStore::new());
    let old = build_tree(&store, &[("a.txt", FileMode::REG, "hello\n")]);
    let new = build_tree(&store, &[("a.txt", FileMode::REG, "world\n")]);
    let repo = mem_repo(&store);
    let mut diff = repo.diff_tree_to_tree(DiffOptions::new(), old, new).unwrap();

    let expected = format!(
        "diff --git a/a.txt b/a.txt\n\
         index {}..{} 100644\n\
         --- a/a.txt\n\
         +++ b/a.txt\n\
         @@ -1 +1 @@\n\
         -hello\n\
         +world\n",
        hash_blob_bytes(b"hello\n").short(),
        hash_blob_bytes(b"world\n").short(),
    );
    assert_eq!(patch(&mut diff), expected);
}

#[test]
fn patch_output_for_new_file() {
    let store = Rc::new(MemoryStore::new());
    let tree = build_tree(&store, &[("f", FileMode::REG, "hi\n")]);
    let repo = mem_repo(&store);
    let mut diff = repo.diff_tree_to_tree(DiffOptions::new(), Oid::UNKNOWN, tree).unwrap();

    let expected = format!(
        "diff --git a/f b/f\n\
         new file mode 100644\n\
         index 0000000..{}\n\
         --- /dev/null\n\
         +++ b/f\n\
         @@ -0,0 +1 @@\n\
         +hi\n",
        hash_blob_bytes(b"hi\n").short(),
    );
    assert_eq!(patch(&mut diff), expected);
}

#[test]
fn patch_output_for_deleted_file() {
    let store = Rc::new(MemoryStore::new());
    let tree = build_tree(&store, &[("f", FileMode::REG, "bye\n")]);
    let repo = mem_repo(&store);
    let mut diff = repo.diff_tree_to_tree(DiffOptions::new(), tree, Oid::UNKNOWN).unwrap();

    let expected = format!(
        "diff --git a/f b/f\n\
         deleted file mode 100644\n\
         index {}..0000000\n\
         --- a/f\n\
         +++ /dev/null\n\
         @@ -1 +0,0 @@\n\
         -bye\n",
        hash_blob_bytes(b"bye\n").short(),
    );
    assert_eq!(patch(&mut diff), expected);
}

#[test]
fn patch_output_for_binary_content() {
    let store = Rc::new(MemoryStore::new());
    let old = build_tree(&store, &[("bin", FileMode::REG, "a\0b")]);
    let new = build_tree(&store, &[("bin", FileMode::REG, "c\0d")]);
    let repo = mem_repo(&store);
    let mut diff = repo.diff_tree_to_tree(DiffOptions::new(), old, new).unwrap();

    let expected = format!(
        "diff --git a/bin b/bin\n\
         index {}..{} 100644\n\
         Binary files a/bin and b/bin differ\n",
        hash_blob_bytes(b"a\0b").short(),
        hash_blob_bytes(b"c\0d").short(),
    );
    assert_eq!(patch(&mut diff), expected);
}

#[test]
fn patch_output_honors_custom_prefixes() {
    let store = Rc::new(MemoryStore::new());
    let old = build_tree(&store, &[("f", FileMode::REG, "1\n")]);
    let new = build_tree(&store, &[("f", FileMode::REG, "2\n")]);
    let repo = mem_repo(&store);
    let opts = DiffOptions::new().set_src_prefix("left").set_dst_prefix("right");
    let mut diff = repo.diff_tree_to_tree(opts, old, new).unwrap();

    let output = patch(&mut diff);
    assert!(output.starts_with("diff --git left/f right/f\n"));
    assert!(output.contains("--- left/f\n"));
    assert!(output.contains("+++ right/f\n"));
}

#[test]
fn patch_output_preserves_missing_newline_marker() {
    let store = Rc::new(MemoryStore::new());
    let old = build_tree(&store, &[("f", FileMode::REG, "a\n")]);
    let new = build_tree(&store, &[("f", FileMode::REG, "a\nb")]);
    let repo = mem_repo(&store);
    let mut diff = repo.diff_tree_to_tree(DiffOptions::new(), old, new).unwrap();

    let output = patch(&mut diff);
    assert!(output.ends_with("+b\n\\ No newline at end of file\n"));
}
