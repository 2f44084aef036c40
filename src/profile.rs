//! Run configuration profiles.
//!
//! A [`Profile`] captures everything one reorganization run needs: where to
//! look for files, which names to pick up, how to derive a date per file,
//! how to expand that date into a destination path, and how to transfer.
//! Profiles are plain values; the engine never mutates or persists them.
//!
//! A profile must pass [`Profile::validate`] before a run may be built from
//! it. Validation failure always rejects the whole run up front; there are
//! no partial runs against a half-valid profile.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the effective date of a file comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Capture timestamp embedded in the image by the camera.
    ExifOriginal,
    /// Filesystem creation timestamp.
    FileCreated,
    /// Filesystem modification timestamp.
    FileModified,
}

impl std::fmt::Display for DateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DateSource::ExifOriginal => "exif original",
            DateSource::FileCreated => "file created",
            DateSource::FileModified => "file modified",
        };
        write!(f, "{}", name)
    }
}

/// Case transform applied to one part of a destination file name.
///
/// Base name and extension are controlled independently, so `IMG_001.JPG`
/// can become `img_001.JPG`, `IMG_001.jpg`, or any other combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NameCase {
    Unchanged,
    Upper,
    Lower,
}

impl NameCase {
    /// Applies the transform to a name fragment.
    pub fn apply(self, fragment: &str) -> String {
        match self {
            NameCase::Unchanged => fragment.to_string(),
            NameCase::Upper => fragment.to_uppercase(),
            NameCase::Lower => fragment.to_lowercase(),
        }
    }
}

impl std::fmt::Display for NameCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NameCase::Unchanged => "unchanged",
            NameCase::Upper => "upper",
            NameCase::Lower => "lower",
        };
        write!(f, "{}", name)
    }
}

/// Whether a run copies files or moves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Copy,
    Move,
}

impl OperationKind {
    /// Verb used in log lines, identical under dry-run and real runs.
    pub fn verb(self) -> &'static str {
        match self {
            OperationKind::Copy => "copy",
            OperationKind::Move => "move",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.verb())
    }
}

/// Errors detected while validating a profile.
#[derive(Debug, Clone)]
pub enum ProfileError {
    /// The profile has no name; only saved, named profiles can run.
    Unnamed,
    /// The file selection pattern is empty.
    EmptyFilePattern,
    /// The file selection pattern failed to parse as a glob group.
    InvalidFilePattern { pattern: String, reason: String },
    /// The date pattern is empty.
    EmptyDatePattern,
    /// The source directory does not exist.
    SourceNotFound(PathBuf),
    /// The source path exists but is not a directory.
    SourceNotADirectory(PathBuf),
    /// Source and destination are nested inside each other while the run
    /// is recursive, which would let the run feed on its own output.
    NestedRoots { source: PathBuf, dest: PathBuf },
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Unnamed => write!(f, "Profile has no name"),
            ProfileError::EmptyFilePattern => write!(f, "File pattern is empty"),
            ProfileError::InvalidFilePattern { pattern, reason } => {
                write!(f, "Invalid file pattern '{}': {}", pattern, reason)
            }
            ProfileError::EmptyDatePattern => write!(f, "Date pattern is empty"),
            ProfileError::SourceNotFound(path) => {
                write!(f, "Source directory not found: {}", path.display())
            }
            ProfileError::SourceNotADirectory(path) => {
                write!(f, "Source is not a directory: {}", path.display())
            }
            ProfileError::NestedRoots { source, dest } => {
                write!(
                    f,
                    "Source {} and destination {} must not be nested in a recursive run",
                    source.display(),
                    dest.display()
                )
            }
        }
    }
}

impl std::error::Error for ProfileError {}

/// Configuration for one reorganization run.
///
/// A profile is either named (saved in the profile store) or a clone in
/// progress whose name is absent until it is saved under a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique name within the profile store; `None` for an unsaved clone.
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Directory scanned for candidate files.
    pub source_dir: PathBuf,
    /// Root under which the date tree is created.
    pub dest_dir: PathBuf,
    /// Glob alternation over file names, e.g. `{*.jpg,*.JPG}`.
    pub file_pattern: String,
    pub date_source: DateSource,
    /// Date-token path template, e.g. `yyyy/MM/yyyy-MM-dd`.
    pub date_pattern: String,
    pub operation: OperationKind,
    pub recursive: bool,
    pub follow_links: bool,
    pub replace_existing: bool,
    pub case_base: NameCase,
    pub case_ext: NameCase,
    /// Simulate the run without touching the filesystem. Chosen per run,
    /// never persisted.
    #[serde(skip)]
    pub dry_run: bool,
    /// Epoch seconds of the last successful run, 0 if never run.
    #[serde(default)]
    pub last_run: i64,
}

impl Profile {
    /// Creates a named profile over the given roots with the stock
    /// defaults: jpeg selection, `yyyy/MM/yyyy-MM-dd` layout, recursive
    /// copy that follows links and never overwrites.
    pub fn new(name: &str, source_dir: PathBuf, dest_dir: PathBuf) -> Self {
        Self {
            name: Some(name.to_string()),
            description: String::new(),
            source_dir,
            dest_dir,
            file_pattern: "{*.jpg,*.JPG}".to_string(),
            date_source: DateSource::ExifOriginal,
            date_pattern: "yyyy/MM/yyyy-MM-dd".to_string(),
            operation: OperationKind::Copy,
            recursive: true,
            follow_links: true,
            replace_existing: false,
            case_base: NameCase::Unchanged,
            case_ext: NameCase::Unchanged,
            dry_run: false,
            last_run: 0,
        }
    }

    /// Clones this profile into an unsaved copy: the name is cleared until
    /// the copy is saved under a new one, and the run history is reset.
    pub fn clone_unsaved(&self) -> Self {
        let mut clone = self.clone();
        clone.name = None;
        clone.last_run = 0;
        clone
    }

    /// Records a successful run at the current time.
    pub fn touch_last_run(&mut self) {
        self.last_run = chrono::Utc::now().timestamp();
    }

    /// Checks every field and the source/destination relationship.
    ///
    /// A run may only be constructed from a profile that passed this check.
    pub fn validate(&self) -> Result<(), ProfileError> {
        match &self.name {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(ProfileError::Unnamed),
        }

        if self.file_pattern.trim().is_empty() {
            return Err(ProfileError::EmptyFilePattern);
        }
        crate::file_matcher::SelectionPattern::parse(&self.file_pattern).map_err(|e| {
            ProfileError::InvalidFilePattern {
                pattern: self.file_pattern.clone(),
                reason: e.to_string(),
            }
        })?;

        if self.date_pattern.trim().is_empty() {
            return Err(ProfileError::EmptyDatePattern);
        }

        if !self.source_dir.exists() {
            return Err(ProfileError::SourceNotFound(self.source_dir.clone()));
        }
        if !self.source_dir.is_dir() {
            return Err(ProfileError::SourceNotADirectory(self.source_dir.clone()));
        }

        if self.recursive {
            let source = normalize(&self.source_dir);
            let dest = normalize(&self.dest_dir);
            if source.starts_with(&dest) || dest.starts_with(&source) {
                return Err(ProfileError::NestedRoots {
                    source: self.source_dir.clone(),
                    dest: self.dest_dir.clone(),
                });
            }
        }

        Ok(())
    }

    /// Multi-line summary shown before a run and in profile listings.
    pub fn summary(&self) -> String {
        let name = self.name.as_deref().unwrap_or("(unsaved)");
        let mut lines = vec![format!("profile      {}", name)];
        if !self.description.is_empty() {
            lines.push(format!("description  {}", self.description));
        }
        lines.push(format!("source       {}", self.source_dir.display()));
        lines.push(format!("destination  {}", self.dest_dir.display()));
        lines.push(format!("pattern      {}", self.file_pattern));
        lines.push(format!("date source  {}", self.date_source));
        lines.push(format!("date pattern {}", self.date_pattern));
        lines.push(format!(
            "operation    {}{}",
            self.operation,
            if self.dry_run { " (dry run)" } else { "" }
        ));
        lines.push(format!(
            "flags        recursive={} follow_links={} replace_existing={}",
            self.recursive, self.follow_links, self.replace_existing
        ));
        lines.push(format!(
            "name case    base={} ext={}",
            self.case_base, self.case_ext
        ));
        lines.join("\n")
    }
}

/// Resolves a path to an absolute, symlink-free form for the nesting check.
///
/// The destination may not exist yet, so unresolvable components are kept
/// verbatim on top of the deepest ancestor that does resolve.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut remainder = Vec::new();
    let mut ancestor = absolute.as_path();
    loop {
        if let Ok(canonical) = ancestor.canonicalize() {
            let mut resolved = canonical;
            for component in remainder.iter().rev() {
                resolved.push(component);
            }
            return resolved;
        }
        match (ancestor.parent(), ancestor.file_name()) {
            (Some(parent), Some(name)) => {
                remainder.push(name.to_os_string());
                ancestor = parent;
            }
            _ => return absolute,
        }
    }
}
