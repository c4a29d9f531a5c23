//! Expanding command-line arguments into a list of input files.
//!
//! Each argument may be a file, a directory (searched recursively for `.txt`
//! files) or a wildcard pattern such as `scripts/*.txt` or `docs/**/ch?.txt`.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

/// Extension picked up when a directory is given.
pub const TEXT_EXTENSION: &str = "txt";

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error("No files match '{0}'")]
    NoMatches(String),
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("Failed to read directory entry: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("No input files given")]
    Empty,
}

/// Expand arguments into an ordered, de-duplicated list of files.
pub fn collect_inputs<I, S>(args: I) -> Result<Vec<PathBuf>, InputError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        let found = if is_pattern(arg) {
            expand_pattern(arg)?
        } else {
            let path = PathBuf::from(arg);
            if path.is_dir() {
                text_files_in(&path)?
            } else if path.is_file() {
                vec![path]
            } else {
                return Err(InputError::NotFound(path));
            }
        };

        if found.is_empty() {
            return Err(InputError::NoMatches(arg.to_string()));
        }
        for path in found {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    if files.is_empty() {
        return Err(InputError::Empty);
    }
    log::debug!("Collected {} input file(s)", files.len());
    Ok(files)
}

fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

/// All `.txt` files under `dir`, sorted by path.
fn text_files_in(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(TEXT_EXTENSION)
        {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, InputError> {
    let path = Path::new(pattern);

    // Literal leading components form the directory to search from.
    let mut base = PathBuf::new();
    let mut rest = Vec::new();
    for component in path.components() {
        let text = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !is_pattern(&text) {
            base.push(component);
        } else {
            match component {
                Component::Normal(_) => rest.push(text.into_owned()),
                _ => {
                    return Err(InputError::NoMatches(pattern.to_string()));
                }
            }
        }
    }
    if base.as_os_str().is_empty() {
        base.push(".");
    }

    let recursive = rest.iter().any(|c| c.contains("**"));
    let relative_pattern = rest.join("/");
    let regex = Regex::new(&pattern_to_regex(&relative_pattern)).map_err(|source| {
        InputError::Pattern {
            pattern: pattern.to_string(),
            source,
        }
    })?;

    let mut walker = WalkDir::new(&base).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(rest.len());
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&base) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if regex.is_match(&relative) {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

/// Translate a `/`-separated wildcard pattern into an anchored regex.
///
/// `*` and `?` never cross a `/`; `**` matches any number of directories.
fn pattern_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    class.push(c);
                }
                if closed && !class.is_empty() {
                    let class = class.strip_prefix('!').map(|c| format!("^{c}")).unwrap_or(class);
                    out.push('[');
                    out.push_str(&class.replace('\\', "\\\\"));
                    out.push(']');
                } else {
                    out.push_str(&regex::escape(&format!("[{class}")));
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "text").unwrap();
        path
    }

    fn arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn translates_wildcards() {
        let re = Regex::new(&pattern_to_regex("*.txt")).unwrap();
        assert!(re.is_match("a.txt"));
        assert!(!re.is_match("sub/a.txt"));

        let re = Regex::new(&pattern_to_regex("**/ch?.txt")).unwrap();
        assert!(re.is_match("ch1.txt"));
        assert!(re.is_match("a/b/ch2.txt"));
        assert!(!re.is_match("a/ch10.txt"));

        let re = Regex::new(&pattern_to_regex("part[0-9].md")).unwrap();
        assert!(re.is_match("part3.md"));
        assert!(!re.is_match("partx.md"));

        let re = Regex::new(&pattern_to_regex("[!a]*.txt")).unwrap();
        assert!(re.is_match("b.txt"));
        assert!(!re.is_match("a.txt"));
    }

    #[test]
    fn collects_plain_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.txt");
        let b = touch(dir.path(), "nested/b.txt");
        touch(dir.path(), "nested/skip.md");

        let files = collect_inputs([arg(&a), arg(dir.path())]).unwrap();
        assert_eq!(files, vec![a, b]);
    }

    #[test]
    fn expands_patterns_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let two = touch(dir.path(), "scene2.txt");
        let one = touch(dir.path(), "scene1.txt");
        touch(dir.path(), "notes.md");
        touch(dir.path(), "deep/scene3.txt");

        let files = collect_inputs([arg(&dir.path().join("scene*.txt"))]).unwrap();
        assert_eq!(files, vec![one.clone(), two.clone()]);

        let files = collect_inputs([arg(&dir.path().join("**/*.txt"))]).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.contains(&dir.path().join("deep/scene3.txt")));
    }

    #[test]
    fn reports_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            collect_inputs([arg(&missing)]),
            Err(InputError::NotFound(_))
        ));
        assert!(matches!(
            collect_inputs([arg(&dir.path().join("*.txt"))]),
            Err(InputError::NoMatches(_))
        ));
        assert!(matches!(
            collect_inputs(Vec::<String>::new()),
            Err(InputError::Empty)
        ));
    }
}
