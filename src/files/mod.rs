//! Text and path utilities
//!
//! Small line-oriented file helpers used by the lock file and the
//! `.gitignore` entry for the metadata directory.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Check whether `path` is an existing directory.
pub fn dir_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Check whether `path` is an existing regular file.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Return the zero-based index of the first line equal to `needle`.
///
/// A missing file is treated as having no lines.
pub fn line_position(path: &Path, needle: &str) -> io::Result<Option<usize>> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        if line?.trim_end_matches('\r') == needle {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

/// Check whether a file contains a line exactly equal to `needle`.
pub fn line_exists(path: &Path, needle: &str) -> io::Result<bool> {
    Ok(line_position(path, needle)?.is_some())
}

/// Append `line` to the file, creating it if needed.
///
/// A newline is inserted first when the existing content does not end
/// with one, so the appended text always starts on its own line.
pub fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let needs_separator = match fs::read(path) {
        Ok(bytes) => !bytes.is_empty() && !bytes.ends_with(b"\n"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(e),
    };

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_separator {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{}", line)?;
    file.flush()
}

/// Append `line` unless an identical line is already present.
///
/// Returns `true` if the file was modified.
pub fn ensure_line(path: &Path, line: &str) -> io::Result<bool> {
    if line_exists(path, line)? {
        return Ok(false);
    }
    append_line(path, line)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_find_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("list");

        append_line(&path, "first").unwrap();
        append_line(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert_eq!(line_position(&path, "second").unwrap(), Some(1));
        assert!(line_exists(&path, "first").unwrap());
        assert!(!line_exists(&path, "fir").unwrap());
    }

    #[test]
    fn test_append_adds_separator_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".gitignore");
        fs::write(&path, "target").unwrap();

        append_line(&path, ".dugit/").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "target\n.dugit/\n");
    }

    #[test]
    fn test_missing_file_has_no_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent");
        assert_eq!(line_position(&path, "x").unwrap(), None);
        assert!(!file_exists(&path));
    }

    #[test]
    fn test_ensure_line_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".gitignore");

        assert!(ensure_line(&path, ".dugit/").unwrap());
        assert!(!ensure_line(&path, ".dugit/").unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| *l == ".dugit/").count(), 1);
    }
}
