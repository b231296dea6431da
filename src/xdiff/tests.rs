use super::*;

fn config(context_lines: u32, interhunk_lines: u32, whitespace: WhitespaceMode) -> XdiffConfig {
    XdiffConfig { context_lines, interhunk_lines, whitespace }
}

/// flatten the record stream into strings: hunk headers verbatim, lines as
/// `<origin><content>`, eofnl markers as `\`
fn collect(old: &str, new: &str, config: &XdiffConfig) -> Vec<String> {
    let mut out = vec![];
    diff_buffers(old.as_bytes(), new.as_bytes(), config, &mut |record| {
        match record {
            DiffRecord::HunkHeader(header) => out.push(header),
            DiffRecord::Line { origin, content, eofnl } => {
                let mut line = String::new();
                line.push(origin);
                line.push_str(std::str::from_utf8(content).unwrap());
                out.push(line);
                if eofnl {
                    out.push("\\".to_owned());
                }
            }
        }
        Ok(())
    })
    .unwrap();
    out
}

#[test]
fn single_line_replacement() {
    let records = collect("a\nb\nc\n", "a\nx\nc\n", &config(3, 3, WhitespaceMode::Exact));
    assert_eq!(records, vec!["@@ -1,3 +1,3 @@\n", " a\n", "-b\n", "+x\n", " c\n"]);
}

#[test]
fn identical_buffers_emit_nothing() {
    assert!(collect("a\nb\n", "a\nb\n", &config(3, 3, WhitespaceMode::Exact)).is_empty());
}

#[test]
fn addition_into_empty_buffer() {
    let records = collect("", "x\ny\n", &config(3, 3, WhitespaceMode::Exact));
    assert_eq!(records, vec!["@@ -0,0 +1,2 @@\n", "+x\n", "+y\n"]);
}

#[test]
fn deletion_to_empty_buffer() {
    let records = collect("x\n", "", &config(3, 3, WhitespaceMode::Exact));
    assert_eq!(records, vec!["@@ -1 +0,0 @@\n", "-x\n"]);
}

#[test]
fn missing_trailing_newline_is_flagged() {
    let records = collect("a\n", "a\nb", &config(3, 3, WhitespaceMode::Exact));
    assert_eq!(records, vec!["@@ -1 +1,2 @@\n", " a\n", "+b", "\\"]);
}

#[test]
fn context_is_clipped_to_the_requested_amount() {
    let old = "1\n2\n3\n4\n5\n6\n7\n";
    let new = "1\n2\n3\nX\n5\n6\n7\n";
    let records = collect(old, new, &config(1, 0, WhitespaceMode::Exact));
    assert_eq!(records, vec!["@@ -3,3 +3,3 @@\n", " 3\n", "-4\n", "+X\n", " 5\n"]);
}

#[test]
fn distant_changes_split_into_two_hunks() {
    let old = "1\n2\n3\n4\n5\n6\n7\n";
    let new = "1\nX\n3\n4\n5\nY\n7\n";
    let records = collect(old, new, &config(1, 0, WhitespaceMode::Exact));
    assert_eq!(
        records,
        vec![
            "@@ -1,3 +1,3 @@\n",
            " 1\n",
            "-2\n",
            "+X\n",
            " 3\n",
            "@@ -5,3 +5,3 @@\n",
            " 5\n",
            "-6\n",
            "+Y\n",
            " 7\n",
        ]
    );
}

#[test]
fn interhunk_tolerance_fuses_nearby_hunks() {
    let old = "1\n2\n3\n4\n5\n6\n7\n";
    let new = "1\nX\n3\n4\n5\nY\n7\n";
    let records = collect(old, new, &config(1, 1, WhitespaceMode::Exact));
    assert_eq!(
        records,
        vec![
            "@@ -1,7 +1,7 @@\n",
            " 1\n",
            "-2\n",
            "+X\n",
            " 3\n",
            " 4\n",
            " 5\n",
            "-6\n",
            "+Y\n",
            " 7\n",
        ]
    );
}

#[test]
fn whitespace_change_mode_equates_runs() {
    let exact = collect("hello world\n", "hello\t \tworld\n", &config(3, 3, WhitespaceMode::Exact));
    assert!(!exact.is_empty());

    let loose =
        collect("hello world\n", "hello\t \tworld\n", &config(3, 3, WhitespaceMode::IgnoreChange));
    assert!(loose.is_empty());

    // whitespace introduced where there was none still counts
    let changed =
        collect("helloworld\n", "hello world\n", &config(3, 3, WhitespaceMode::IgnoreChange));
    assert!(!changed.is_empty());
}

#[test]
fn whitespace_eol_mode_ignores_trailing_only() {
    let records = collect("a \nb\n", "a\nb\n", &config(3, 3, WhitespaceMode::IgnoreEol));
    assert!(records.is_empty());

    let records = collect("a b\n", "ab\n", &config(3, 3, WhitespaceMode::IgnoreEol));
    assert!(!records.is_empty());
}

#[test]
fn whitespace_all_mode_ignores_everything() {
    let records = collect(" a b \n", "ab\n", &config(3, 3, WhitespaceMode::IgnoreAll));
    assert!(records.is_empty());
}

#[test]
fn whitespace_insensitive_diffs_emit_original_lines() {
    // the changed line is reported with its real bytes even though the
    // comparison ran over normalized keys
    let old = "keep  me\nchange\n";
    let new = "keep\tme\nchanged\n";
    let records = collect(old, new, &config(0, 0, WhitespaceMode::IgnoreChange));
    assert_eq!(records, vec!["@@ -2 +2 @@\n", "-change\n", "+changed\n"]);
}
