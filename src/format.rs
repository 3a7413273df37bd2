//! Line-based dictionary format.
//!
//! ```text
//! ######## Section header ########
//!
//! greeting = Hello
//!
//! long-text =
//!     First line
//!
//!     Third line
//! ```
//!
//! A line containing `=` starts a message, lines without `=` continue the
//! current value. Comment lines start with `#`; only those with more than
//! five `#` characters are kept, as the dictionary's single comment block
//! (a later block replaces an earlier one in place).

use crate::dictionary::{Dictionary, Entry};
use crate::error::{Result, TranslatorError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Comment lines with more `#` than this are kept as the comment block.
const COMMENT_BLOCK_MIN_HASHES: usize = 6;

const MULTILINE_INDENT: &str = "    ";

/// Parse file contents into a dictionary.
pub fn parse(contents: &str, language_code: &str, path: impl Into<PathBuf>) -> Dictionary {
    let mut dictionary = Dictionary::new(language_code, path);
    let normalized = contents.replace("\r\n", "\n");

    let mut pending: Option<(String, String)> = None;

    for line in normalized.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            if line.matches('#').count() >= COMMENT_BLOCK_MIN_HASHES {
                // The pending message precedes the block. It stays pending so
                // later continuation lines still extend it in place.
                if let Some((key, value)) = &pending {
                    commit(&mut dictionary, key, value);
                }
                dictionary.set_comment(line.trim_end_matches('\n'));
            }
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                if let Some((key, value)) = pending.take() {
                    commit(&mut dictionary, &key, &value);
                }
                pending = Some((key.to_string(), value.to_string()));
            }
            None => {
                // Continuation lines before the first message have nowhere to go.
                if let Some((_, value)) = pending.as_mut() {
                    value.push_str(line);
                }
            }
        }
    }

    if let Some((key, value)) = pending {
        commit(&mut dictionary, &key, &value);
    }

    dictionary
}

fn commit(dictionary: &mut Dictionary, raw_key: &str, raw_value: &str) {
    let key = raw_key.trim_matches(' ');
    if key.is_empty() {
        return;
    }
    dictionary.insert(key, raw_value.trim_end_matches('\n'));
}

/// Serialize a dictionary into file contents.
pub fn serialize(dictionary: &Dictionary) -> String {
    let mut output = String::new();

    for entry in dictionary.entries() {
        match entry {
            Entry::Comment(text) => {
                output.push('\n');
                output.push_str(text);
                output.push_str("\n\n");
            }
            Entry::Message { key, value } => {
                let key = key.trim_matches(' ');
                if value.matches('\n').count() > 1 {
                    write_multiline(&mut output, key, value);
                } else {
                    output.push_str(&format!("{} = {}\n\n", key, value.trim_start()));
                }
            }
        }
    }

    output
}

fn write_multiline(output: &mut String, key: &str, value: &str) {
    output.push_str(&format!("{} =\n", key));

    let lines = value.split('\n').skip_while(|line| line.is_empty());
    for line in lines {
        if line.is_empty() {
            output.push('\n');
        } else {
            output.push_str(MULTILINE_INDENT);
            output.push_str(line.trim_start());
            output.push('\n');
        }
    }

    output.push('\n');
}

/// Read and parse a dictionary file.
pub fn read_dictionary(path: &Path, language_code: &str) -> Result<Dictionary> {
    let contents = fs::read_to_string(path).map_err(|e| TranslatorError::io(path, e))?;
    Ok(parse(&contents, language_code, path))
}

/// Read a dictionary file, returning `None` when it does not exist yet.
pub fn read_dictionary_if_exists(path: &Path, language_code: &str) -> Result<Option<Dictionary>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse(&contents, language_code, path))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{}: no dictionary at {}, creating new", language_code, path.display());
            Ok(None)
        }
        Err(e) => Err(TranslatorError::io(path, e)),
    }
}

/// Serialize a dictionary and write it to its path.
///
/// The file is written next to the destination first and renamed over it,
/// so the previous contents survive a failed write.
pub fn write_dictionary(dictionary: &Dictionary) -> Result<()> {
    let path = dictionary.path();
    let tmp_path = temporary_path(path);

    fs::write(&tmp_path, serialize(dictionary)).map_err(|e| TranslatorError::io(&tmp_path, e))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(TranslatorError::io(path, e));
    }

    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
