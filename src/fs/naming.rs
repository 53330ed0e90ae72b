//! Filename generation and manipulation.

use crate::error::{Error, Result};

/// Longest filename most filesystems accept, in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Values substituted into a filename template.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameFields<'a> {
    pub rkey: &'a str,
    pub handle: &'a str,
    pub text: &'a str,
    pub did: &'a str,
    pub display_name: &'a str,
}

/// Expand a template such as `{RKEY}_{HANDLE}_{TEXT}` and sanitize the result.
///
/// Unknown placeholders are left as written.
pub fn make_base_filename(format: &str, fields: &FilenameFields<'_>) -> Result<String> {
    let expanded = format
        .replace("{RKEY}", fields.rkey)
        .replace("{HANDLE}", fields.handle)
        .replace("{DID}", fields.did)
        .replace("{DISPLAY_NAME}", fields.display_name)
        .replace("{TEXT}", fields.text);

    sanitize_filename(&expanded)
}

/// Replace characters that are unsafe in a single path component.
///
/// Fails when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim_end_matches([' ', '.']).trim_start();

    if trimmed.is_empty() {
        return Err(Error::InvalidFilename(format!(
            "Filename is empty after sanitizing '{}'",
            name
        )));
    }

    Ok(trimmed.to_string())
}

/// Longest prefix of `name` that fits in `max_bytes` without splitting a character.
pub fn truncate_filename(name: &str, max_bytes: usize) -> &str {
    if name.len() <= max_bytes {
        return name;
    }

    let mut end = max_bytes;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Append an optional 1-based index and an optional extension.
///
/// `append_extension("a", Some(2), Some("jpeg"))` gives `a_2.jpeg`.
pub fn append_extension(base: &str, index: Option<usize>, extension: Option<&str>) -> String {
    let mut name = base.to_string();
    if let Some(i) = index {
        name.push_str(&format!("_{}", i));
    }
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// Full filename for a blob or side file, truncating `base` so the result
/// fits in [`MAX_FILENAME_BYTES`].
pub fn fit_filename(base: &str, index: Option<usize>, extension: Option<&str>) -> String {
    let suffix_len = append_extension("", index, extension).len();
    let room = MAX_FILENAME_BYTES.saturating_sub(suffix_len);
    let base = truncate_filename(base, room).trim_end_matches([' ', '.']);
    append_extension(base, index, extension)
}
