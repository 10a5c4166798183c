//! Line-oriented `KEY=VALUE` file editing.
//!
//! Only the first line carrying the key is touched; every other line is
//! written back byte-for-byte, comments and blank lines included.

use std::path::Path;

use crate::error::EnvFileError;

/// What [`upsert`] did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    /// An existing line was rewritten (1-based line number).
    Replaced { line: usize },
    Appended,
}

/// Set `key` to `value` in the env file at `path`, creating it if needed.
pub fn upsert(path: &Path, key: &str, value: &str) -> Result<UpsertAction, EnvFileError> {
    validate(key, value)?;

    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => return Err(io_error(path, source)),
    };

    let (updated, action) = upsert_content(&existing, key, value);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
    }
    std::fs::write(path, updated).map_err(|e| io_error(path, e))?;

    tracing::debug!(path = %path.display(), key, ?action, "env file updated");
    Ok(action)
}

/// Pure form of [`upsert`] over in-memory content.
///
/// Callers are expected to have validated `key` and `value`.
pub fn upsert_content(content: &str, key: &str, value: &str) -> (String, UpsertAction) {
    let prefix = format!("{key}=");
    let mut out = String::with_capacity(content.len() + prefix.len() + value.len() + 1);
    let mut action = None;

    for (index, line) in content.split_inclusive('\n').enumerate() {
        if action.is_none() && line.starts_with(&prefix) {
            out.push_str(&prefix);
            out.push_str(value);
            out.push_str(line_terminator(line));
            action = Some(UpsertAction::Replaced { line: index + 1 });
        } else {
            out.push_str(line);
        }
    }

    match action {
        Some(action) => (out, action),
        None => {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&prefix);
            out.push_str(value);
            out.push('\n');
            (out, UpsertAction::Appended)
        }
    }
}

/// Value of the first `key=` line, if any.
pub fn read_value(path: &Path, key: &str) -> Result<Option<String>, EnvFileError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(io_error(path, source)),
    };
    let prefix = format!("{key}=");
    Ok(content
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(str::to_owned))
}

fn validate(key: &str, value: &str) -> Result<(), EnvFileError> {
    if key.is_empty() || key.contains(['=', '\n', '\r']) {
        return Err(EnvFileError::InvalidKey(key.to_owned()));
    }
    if value.contains(['\n', '\r']) {
        return Err(EnvFileError::InvalidValue(key.to_owned()));
    }
    Ok(())
}

fn line_terminator(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn io_error(path: &Path, source: std::io::Error) -> EnvFileError {
    EnvFileError::Io {
        path: path.to_path_buf(),
        source,
    }
}
