//! File selection: name patterns and directory enumeration.
//!
//! Selection patterns are a brace group of glob alternatives, e.g.
//! `{*.jpg,*.JPG}`; a file is selected when its name matches any
//! alternative. Matching is case-sensitive, which is why both spellings
//! are usually listed explicitly. A bare pattern without braces is
//! accepted as a group of one.

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors from parsing a selection pattern.
#[derive(Debug, Clone)]
pub enum MatchError {
    /// The pattern contains no alternatives.
    EmptyPattern,
    /// One alternative is not a valid glob.
    BadAlternative { alternative: String, reason: String },
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::EmptyPattern => write!(f, "pattern has no alternatives"),
            MatchError::BadAlternative {
                alternative,
                reason,
            } => {
                write!(f, "bad alternative '{}': {}", alternative, reason)
            }
        }
    }
}

impl std::error::Error for MatchError {}

/// A compiled brace group of glob alternatives.
///
/// Alternatives are compiled once, the way filter patterns are usually
/// pre-compiled before a scan, so matching during enumeration is a plain
/// slice walk.
#[derive(Debug, Clone)]
pub struct SelectionPattern {
    alternatives: Vec<Pattern>,
}

impl SelectionPattern {
    /// Parses `{a,b,c}` (or a bare single pattern) into compiled globs.
    pub fn parse(pattern: &str) -> Result<Self, MatchError> {
        let trimmed = pattern.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(trimmed);

        let alternatives = inner
            .split(',')
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .map(|alt| {
                Pattern::new(alt).map_err(|e| MatchError::BadAlternative {
                    alternative: alt.to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if alternatives.is_empty() {
            return Err(MatchError::EmptyPattern);
        }

        Ok(Self { alternatives })
    }

    /// True when the file name matches any alternative.
    pub fn matches(&self, file_name: &str) -> bool {
        self.alternatives.iter().any(|p| p.matches(file_name))
    }
}

/// Result of enumerating a source tree: the selected files in walk order,
/// plus per-entry problems (unreadable directories, link cycles) that the
/// caller reports without aborting.
#[derive(Debug, Default)]
pub struct Enumeration {
    pub files: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Walks `root` and collects every regular file whose name matches.
///
/// `recursive = false` limits the walk to the immediate children of the
/// root. Symlinked directories are only traversed when `follow_links` is
/// set; a directory reachable from itself through links is reported as an
/// error for that entry and never re-entered.
pub fn enumerate(
    root: &Path,
    pattern: &SelectionPattern,
    recursive: bool,
    follow_links: bool,
) -> Enumeration {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut result = Enumeration::default();

    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(follow_links)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.loop_ancestor().is_some() {
                    result.errors.push(format!("link cycle refused: {}", e));
                } else {
                    result.errors.push(e.to_string());
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if pattern.matches(&name) {
            result.files.push(entry.into_path());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").expect("Failed to write test file");
    }

    #[test]
    fn test_brace_group_matches_any_alternative() {
        let pattern = SelectionPattern::parse("{*.jpg,*.JPG}").unwrap();
        assert!(pattern.matches("photo.jpg"));
        assert!(pattern.matches("PHOTO.JPG"));
        assert!(!pattern.matches("photo.png"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let pattern = SelectionPattern::parse("{*.jpg}").unwrap();
        assert!(pattern.matches("photo.jpg"));
        assert!(!pattern.matches("PHOTO.JPG"));
    }

    #[test]
    fn test_bare_pattern_without_braces() {
        let pattern = SelectionPattern::parse("*.png").unwrap();
        assert!(pattern.matches("icon.png"));
        assert!(!pattern.matches("icon.jpg"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(
            SelectionPattern::parse("{}"),
            Err(MatchError::EmptyPattern)
        ));
        assert!(matches!(
            SelectionPattern::parse("  "),
            Err(MatchError::EmptyPattern)
        ));
    }

    #[test]
    fn test_invalid_glob_rejected() {
        assert!(matches!(
            SelectionPattern::parse("{[broken}"),
            Err(MatchError::BadAlternative { .. })
        ));
    }

    #[test]
    fn test_enumerate_top_level_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "b.png");
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "c.jpg");

        let pattern = SelectionPattern::parse("{*.jpg}").unwrap();
        let result = enumerate(dir.path(), &pattern, false, false);
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].ends_with("a.jpg"));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_enumerate_recursive() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.jpg");
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "c.jpg");
        touch(&sub, "d.txt");

        let pattern = SelectionPattern::parse("{*.jpg}").unwrap();
        let result = enumerate(dir.path(), &pattern, true, false);
        assert_eq!(result.files.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_enumerate_refuses_link_cycles() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "a.jpg");
        std::os::unix::fs::symlink(dir.path(), sub.join("loop")).unwrap();

        let pattern = SelectionPattern::parse("{*.jpg}").unwrap();
        // Terminates instead of walking the cycle forever, and reports it.
        let result = enumerate(dir.path(), &pattern, true, true);
        assert_eq!(result.files.len(), 1);
        assert!(result.errors.iter().any(|e| e.contains("link cycle")));
    }

    #[cfg(unix)]
    #[test]
    fn test_enumerate_ignores_linked_dirs_without_follow() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        touch(outside.path(), "far.jpg");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let pattern = SelectionPattern::parse("{*.jpg}").unwrap();
        let result = enumerate(dir.path(), &pattern, true, false);
        assert!(result.files.is_empty());

        let result = enumerate(dir.path(), &pattern, true, true);
        assert_eq!(result.files.len(), 1);
    }
}
