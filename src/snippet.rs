use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOLDER: &str = "misc";
pub const DEFAULT_NAME: &str = "Untitled Snippet";
pub const DEFAULT_LANGUAGE: &str = "go";

/// A snippet of code in a language, nested within a folder and tagged
/// with metadata. Serde names match the snippets.json schema written by
/// earlier releases, so existing stores load unchanged (`title` is the
/// display name).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    #[serde(default)]
    pub tags: Vec<String>,
    pub folder: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(rename = "title")]
    pub name: String,
    pub file: String,
    pub language: String,
}

impl Snippet {
    pub fn placeholder(default_language: &str) -> Self {
        Self {
            tags: Vec::new(),
            folder: DEFAULT_FOLDER.to_string(),
            date: Utc::now(),
            favorite: false,
            name: DEFAULT_NAME.to_string(),
            file: format!("{DEFAULT_NAME}.{default_language}"),
            language: default_language.to_string(),
        }
    }

    /// Path of the backing file relative to the snippet home,
    /// `<folder>/<file>`.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.folder).join(&self.file)
    }

    /// Pre-migration layout kept the file directly under the home
    /// directory as `<folder>-<file>`.
    pub fn legacy_path(&self) -> PathBuf {
        PathBuf::from(&self.file)
    }

    /// `folder/name.language`, the label used by `list` output and
    /// fuzzy lookup.
    pub fn label(&self) -> String {
        format!("{}/{}.{}", self.folder, self.name, self.language)
    }

    /// The haystack used when filtering the snippet list.
    pub fn filter_key(&self) -> String {
        format!(
            "{}/{}\n+{}\n{}",
            self.folder,
            self.name,
            self.tags.join("+"),
            self.language
        )
    }
}

/// A grouping key over snippets. Folders are derived from the snippets
/// present, never persisted independently.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Folder(pub String);

impl Folder {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits `folder/name.language` into its parts, falling back to the
/// defaults for whatever is missing.
///
///   notes/hello.rs -> (notes, hello, rs)
///   hello.rs       -> (misc, hello, rs)
///   notes/hello    -> (notes, hello, <default>)
pub fn parse_name(input: &str, default_language: &str) -> (String, String, String) {
    let (folder, remaining) = match input.split_once('/') {
        Some((folder, rest)) => (folder.to_string(), rest),
        None => (DEFAULT_FOLDER.to_string(), input),
    };

    let (name, language) = match remaining.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => {
            (name.to_string(), ext.to_string())
        }
        _ => (remaining.to_string(), default_language.to_string()),
    };

    let name = if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    };

    (folder, name, language)
}

/// Compact relative age for list subtitles: "just now", "3m ago",
/// "2d ago", and so on.
pub fn relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - date).num_seconds();
    if seconds < 5 {
        return "just now".to_string();
    }
    if seconds < 60 {
        return "moments ago".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }
    let weeks = days / 7;
    if weeks < 5 {
        return format!("{weeks}w ago");
    }
    let months = days / 30;
    if months < 12 {
        return format!("{months}mo ago");
    }
    format!("{}y ago", days / 365)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn parse_name_full() {
        let (folder, name, language) = parse_name("notes/hello.rs", "go");
        assert_eq!(folder, "notes");
        assert_eq!(name, "hello");
        assert_eq!(language, "rs");
    }

    #[test]
    fn parse_name_without_folder() {
        let (folder, name, language) = parse_name("hello.rs", "go");
        assert_eq!(folder, DEFAULT_FOLDER);
        assert_eq!(name, "hello");
        assert_eq!(language, "rs");
    }

    #[test]
    fn parse_name_without_extension() {
        let (folder, name, language) = parse_name("notes/hello", "go");
        assert_eq!(folder, "notes");
        assert_eq!(name, "hello");
        assert_eq!(language, "go");
    }

    #[test]
    fn parse_name_empty_falls_back_to_defaults() {
        let (folder, name, language) = parse_name("", "py");
        assert_eq!(folder, DEFAULT_FOLDER);
        assert_eq!(name, DEFAULT_NAME);
        assert_eq!(language, "py");
    }

    #[test]
    fn snippet_json_round_trip_uses_title_key() {
        let snippet = Snippet::placeholder("go");
        let json = serde_json::to_string(&snippet).unwrap();
        assert!(json.contains("\"title\""));
        assert!(!json.contains("\"name\""));
        let back: Snippet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snippet);
    }

    #[test]
    fn relative_date_magnitudes() {
        let now = Utc::now();
        assert_eq!(relative_date(now, now), "just now");
        assert_eq!(relative_date(now - Duration::seconds(30), now), "moments ago");
        assert_eq!(relative_date(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_date(now - Duration::hours(3), now), "3h ago");
        assert_eq!(relative_date(now - Duration::days(2), now), "2d ago");
        assert_eq!(relative_date(now - Duration::weeks(2), now), "2w ago");
        assert_eq!(relative_date(now - Duration::days(90), now), "3mo ago");
        assert_eq!(relative_date(now - Duration::days(800), now), "2y ago");
    }
}
