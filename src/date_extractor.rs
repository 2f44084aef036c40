//! Effective-date extraction for candidate files.
//!
//! Each [`DateSource`] variant maps to one extraction function; the
//! dispatch lives here so the profile model stays free of I/O. A missing
//! or unreadable date is reported as `None` and left to the caller; the
//! run treats it as a per-file error instead of quietly filing the file
//! under some other date, and no source ever falls back to another one.

use crate::profile::DateSource;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{In, Reader, Tag, Value};
use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;

impl DateSource {
    /// Extracts the effective date of `path` from this source.
    pub fn extract(self, path: &Path) -> Option<DateTime<Local>> {
        match self {
            DateSource::ExifOriginal => exif_original(path),
            DateSource::FileCreated => file_created(path),
            DateSource::FileModified => file_modified(path),
        }
    }
}

/// Reads the embedded capture timestamp, preferring `DateTimeOriginal`
/// and falling back to the plain `DateTime` tag within the same read.
fn exif_original(path: &Path) -> Option<DateTime<Local>> {
    let file = fs::File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;

    // Take the raw ASCII bytes; display_value() quotes the string.
    let raw = match &field.value {
        Value::Ascii(values) if !values.is_empty() => String::from_utf8(values[0].clone()).ok()?,
        _ => return None,
    };
    parse_exif_datetime(&raw)
}

/// Parses the EXIF `YYYY:MM:DD hh:mm:ss` form as local time.
fn parse_exif_datetime(value: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), "%Y:%m:%d %H:%M:%S").ok()?;
    Local
        .from_local_datetime(&naive)
        .single()
        .or_else(|| Local.from_local_datetime(&naive).earliest())
}

/// Filesystem creation timestamp. Unavailable on filesystems or platforms
/// without a birth time, which the run surfaces per file.
fn file_created(path: &Path) -> Option<DateTime<Local>> {
    fs::metadata(path)
        .ok()?
        .created()
        .ok()
        .map(system_time_to_local)
}

/// Filesystem modification timestamp.
fn file_modified(path: &Path) -> Option<DateTime<Local>> {
    fs::metadata(path)
        .ok()?
        .modified()
        .ok()
        .map(system_time_to_local)
}

fn system_time_to_local(time: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use tempfile::TempDir;

    #[test]
    fn test_file_modified_reads_current_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.jpg");
        fs::write(&path, b"x").unwrap();

        let date = DateSource::FileModified.extract(&path).expect("mtime");
        assert_eq!(date.year(), Local::now().year());
    }

    #[test]
    fn test_file_sources_unavailable_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.jpg");
        assert_eq!(DateSource::FileModified.extract(&path), None);
        assert_eq!(DateSource::FileCreated.extract(&path), None);
    }

    #[test]
    fn test_exif_unavailable_for_non_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.jpg");
        fs::write(&path, b"plain text, no metadata").unwrap();
        assert_eq!(DateSource::ExifOriginal.extract(&path), None);
    }

    #[test]
    fn test_parse_exif_datetime() {
        let parsed = parse_exif_datetime("2021:07:04 10:30:00").expect("parse");
        assert_eq!(parsed.year(), 2021);
        assert_eq!(parsed.month(), 7);
        assert_eq!(parsed.day(), 4);

        assert!(parse_exif_datetime("2021-07-04 10:30:00").is_none());
        assert!(parse_exif_datetime("").is_none());
    }
}
