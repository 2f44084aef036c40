//! Date-pattern template expansion.
//!
//! A template like `yyyy/MM/yyyy-MM-dd` is a `/`-separated path whose
//! segments mix literal text with date tokens: `yyyy` (4-digit year),
//! `yy` (2-digit year), `MM` (2-digit month) and `dd` (2-digit day).
//! Anything the token vocabulary does not recognize passes through
//! unchanged, so new templates never hard-fail on unknown text.

use crate::profile::NameCase;
use chrono::{DateTime, Datelike, Local};
use regex::Regex;
use std::path::PathBuf;

/// A date-pattern template with its token scanner compiled once.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    tokens: Regex,
}

impl PathTemplate {
    /// Compiles the token scanner for `template`.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            // Longest alternative first, so `yyyy` is never read as two `yy`.
            tokens: Regex::new("yyyy|yy|MM|dd").expect("Invalid date token alternation"),
        }
    }

    /// Expands the template against `date` and appends the transformed
    /// file name, yielding a path relative to the destination root.
    ///
    /// Each `/`-separated segment of the expanded template becomes one
    /// directory level; base name and extension are case-folded
    /// independently.
    pub fn expand(
        &self,
        date: DateTime<Local>,
        base_name: &str,
        extension: Option<&str>,
        case_base: NameCase,
        case_ext: NameCase,
    ) -> PathBuf {
        let expanded = self
            .tokens
            .replace_all(&self.template, |caps: &regex::Captures| match &caps[0] {
                "yyyy" => format!("{:04}", date.year()),
                "yy" => format!("{:02}", date.year().rem_euclid(100)),
                "MM" => format!("{:02}", date.month()),
                "dd" => format!("{:02}", date.day()),
                other => other.to_string(),
            });

        let mut path = PathBuf::new();
        for segment in expanded.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }

        let file_name = match extension {
            Some(ext) => format!("{}.{}", case_base.apply(base_name), case_ext.apply(ext)),
            None => case_base.apply(base_name),
        };
        path.push(file_name);
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_expand_nested_date_tree() {
        let template = PathTemplate::new("yyyy/MM/yyyy-MM-dd");
        let path = template.expand(
            date(2021, 7, 4),
            "IMG_0001",
            Some("jpg"),
            NameCase::Unchanged,
            NameCase::Unchanged,
        );
        assert_eq!(path, PathBuf::from("2021/07/2021-07-04/IMG_0001.jpg"));
    }

    #[test]
    fn test_two_digit_tokens_are_padded() {
        let template = PathTemplate::new("yy/MM/dd");
        let path = template.expand(
            date(2003, 2, 9),
            "a",
            Some("jpg"),
            NameCase::Unchanged,
            NameCase::Unchanged,
        );
        assert_eq!(path, PathBuf::from("03/02/09/a.jpg"));
    }

    #[test]
    fn test_unrecognized_text_passes_through() {
        let template = PathTemplate::new("photos-yyyy/QQ");
        let path = template.expand(
            date(2021, 7, 4),
            "a",
            Some("jpg"),
            NameCase::Unchanged,
            NameCase::Unchanged,
        );
        assert_eq!(path, PathBuf::from("photos-2021/QQ/a.jpg"));
    }

    #[test]
    fn test_case_folding_is_independent() {
        let template = PathTemplate::new("yyyy");
        let d = date(2021, 7, 4);

        let path = template.expand(d, "IMG_001", Some("JPG"), NameCase::Lower, NameCase::Unchanged);
        assert_eq!(path, PathBuf::from("2021/img_001.JPG"));

        let path = template.expand(d, "IMG_001", Some("JPG"), NameCase::Unchanged, NameCase::Lower);
        assert_eq!(path, PathBuf::from("2021/IMG_001.jpg"));

        let path = template.expand(d, "img_001", Some("jpg"), NameCase::Upper, NameCase::Upper);
        assert_eq!(path, PathBuf::from("2021/IMG_001.JPG"));
    }

    #[test]
    fn test_file_without_extension_keeps_bare_name() {
        let template = PathTemplate::new("yyyy");
        let path = template.expand(
            date(2021, 7, 4),
            "README",
            None,
            NameCase::Lower,
            NameCase::Unchanged,
        );
        assert_eq!(path, PathBuf::from("2021/readme"));
    }
}
