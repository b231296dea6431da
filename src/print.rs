//! Output drivers: compact name-status lines and full unified patches,
//! both thin adapters over the patch engine.

use crate::diff::{Delta, Diff};
use crate::error::SiltResult;
use crate::obj::FileMode;
use crate::patch::{DiffLineOrigin, DiffRange, LineCb};
use std::cell::RefCell;
use std::fmt::Write;

/// decoration after a path in compact output: `/` for directories, `*` for
/// executables, nothing otherwise
fn mode_suffix(mode: Option<FileMode>) -> char {
    match mode {
        Some(FileMode::TREE) => '/',
        Some(mode) if mode.is_exec() => '*',
        _ => ' ',
    }
}

impl<'r> Diff<'r> {
    /// one line per delta: `<code>\t<path>`, decorated with a mode suffix
    /// or a mode transition where that carries extra information
    pub fn print_compact(&mut self, emit: &mut LineCb<'_>) -> SiltResult<()> {
        let mut file_cb = |delta: &Delta, _progress: f32| -> SiltResult<()> {
            let code = match delta.status().code() {
                Some(code) => code,
                None => return Ok(()),
            };

            let mut line = String::new();
            if delta.old_path() != delta.new_path() {
                let old_suffix = mode_suffix(delta.old_mode());
                let new_suffix = mode_suffix(delta.new_mode());
                writeln!(
                    line,
                    "{}\t{}{} -> {}{}",
                    code,
                    delta.old_path(),
                    old_suffix,
                    delta.new_path(),
                    new_suffix
                )?;
            } else if let (Some(old_mode), Some(new_mode)) = (delta.old_mode(), delta.new_mode()) {
                if old_mode != new_mode {
                    writeln!(line, "{}\t{} ({:#} -> {:#})", code, delta.old_path(), old_mode, new_mode)?;
                } else {
                    write_single_path(&mut line, code, delta)?;
                }
            } else {
                write_single_path(&mut line, code, delta)?;
            }
            emit(delta, DiffLineOrigin::FileHdr, line.as_bytes())
        };
        self.foreach(Some(&mut file_cb), None, None)
    }

    /// byte-compatible unified patch output; headers arrive through the
    /// emit callback as `FileHdr`/`HunkHdr`/`Binary` lines, content lines
    /// come prefixed with their origin character
    pub fn print_patch(&mut self, emit: &mut LineCb<'_>) -> SiltResult<()> {
        // three callbacks share the one emit sink
        let emit = RefCell::new(emit);
        let src_prefix = self.options().src_prefix().to_owned();
        let dst_prefix = self.options().dst_prefix().to_owned();

        let mut file_cb = |delta: &Delta, _progress: f32| -> SiltResult<()> {
            let mut emit = emit.borrow_mut();
            let binary = delta.binary() == Some(true);
            let header = format_file_header(delta, &src_prefix, &dst_prefix, binary)?;
            (*emit)(delta, DiffLineOrigin::FileHdr, header.as_bytes())?;
            if binary {
                let notice = format!(
                    "Binary files {} and {} differ\n",
                    side_label(&src_prefix, delta.old_path(), delta.old_mode().is_some()),
                    side_label(&dst_prefix, delta.new_path(), delta.new_mode().is_some()),
                );
                (*emit)(delta, DiffLineOrigin::Binary, notice.as_bytes())?;
            }
            Ok(())
        };

        let mut hunk_cb = |delta: &Delta, _range: &DiffRange, header: &[u8]| -> SiltResult<()> {
            let mut emit = emit.borrow_mut();
            (*emit)(delta, DiffLineOrigin::HunkHdr, header)
        };

        let mut line_cb = |delta: &Delta, origin: DiffLineOrigin, content: &[u8]| -> SiltResult<()> {
            let mut emit = emit.borrow_mut();
            if origin.is_content() {
                let mut line = Vec::with_capacity(content.len() + 1);
                line.push(origin.as_char() as u8);
                line.extend_from_slice(content);
                (*emit)(delta, origin, &line)
            } else {
                // "no newline" markers pass through without a prefix
                (*emit)(delta, origin, content)
            }
        };

        self.foreach(Some(&mut file_cb), Some(&mut hunk_cb), Some(&mut line_cb))
    }
}

fn write_single_path(line: &mut String, code: char, delta: &Delta) -> SiltResult<()> {
    // prefer the live side's mode for the decoration
    let suffix = mode_suffix(delta.new_mode().or(delta.old_mode()));
    if suffix != ' ' {
        writeln!(line, "{}\t{}{}", code, delta.old_path(), suffix)?;
    } else {
        writeln!(line, "{}\t{}", code, delta.old_path())?;
    }
    Ok(())
}

fn side_label(prefix: &str, path: &str, present: bool) -> String {
    // an absent side prints as /dev/null with no prefix at all
    if present { format!("{}{}", prefix, path) } else { "/dev/null".to_owned() }
}

fn format_file_header(
    delta: &Delta,
    src_prefix: &str,
    dst_prefix: &str,
    binary: bool,
) -> SiltResult<String> {
    let mut header = String::new();
    writeln!(
        header,
        "diff --git {}{} {}{}",
        src_prefix,
        delta.old_path(),
        dst_prefix,
        delta.new_path()
    )?;

    let old_short = delta.old_oid().short();
    let new_short = delta.new_oid().short();
    match (delta.old_mode(), delta.new_mode()) {
        (Some(old_mode), Some(new_mode)) if old_mode == new_mode => {
            writeln!(header, "index {}..{} {:#}", old_short, new_short, old_mode)?;
        }
        (old_mode, new_mode) => {
            match (old_mode, new_mode) {
                (None, Some(new_mode)) => writeln!(header, "new file mode {:#}", new_mode)?,
                (Some(old_mode), None) => writeln!(header, "deleted file mode {:#}", old_mode)?,
                (Some(old_mode), Some(new_mode)) => {
                    writeln!(header, "old mode {:#}", old_mode)?;
                    writeln!(header, "new mode {:#}", new_mode)?;
                }
                (None, None) => {}
            }
            writeln!(header, "index {}..{}", old_short, new_short)?;
        }
    }

    if !binary {
        writeln!(header, "--- {}", side_label(src_prefix, delta.old_path(), delta.old_mode().is_some()))?;
        writeln!(header, "+++ {}", side_label(dst_prefix, delta.new_path(), delta.new_mode().is_some()))?;
    }
    Ok(header)
}

#[cfg(test)]
mod tests;
