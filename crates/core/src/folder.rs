//! Folder identifier extraction from workflow result URLs.
//!
//! The workflow webhook answers with the URL of the external folder it
//! created, e.g. `https://drive.google.com/drive/folders/<id>?usp=sharing`.
//! The poller only needs the `<id>` part.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Regex pattern capturing the id that follows `folders/`, up to the next
/// path, query or fragment delimiter.
pub const FOLDER_ID_PATTERN: &str = r"folders/([^/?#\s]+)";

static FOLDER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FOLDER_ID_PATTERN).expect("valid regex"));

/// Base URL used when rebuilding a folder link from a bare id.
pub const FOLDER_URL_BASE: &str = "https://drive.google.com/drive/folders";

/// Extract the folder id from a result URL.
///
/// Fails closed: a URL without a `folders/<id>` segment is an error, never
/// an empty id.
pub fn extract_folder_id(url: &str) -> Result<String, CoreError> {
    FOLDER_ID_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Could not extract a folder id from result URL '{url}'"
            ))
        })
}

/// Canonical folder link for an id.
pub fn folder_url(folder_id: &str) -> String {
    format!("{FOLDER_URL_BASE}/{folder_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_folder_id() {
        let id = extract_folder_id("https://drive.google.com/drive/folders/F1").unwrap();
        assert_eq!(id, "F1");
    }

    #[test]
    fn stops_at_query_string() {
        let id = extract_folder_id(
            "https://drive.google.com/drive/folders/1AbC-d_E?usp=sharing",
        )
        .unwrap();
        assert_eq!(id, "1AbC-d_E");
    }

    #[test]
    fn stops_at_next_path_segment() {
        let id =
            extract_folder_id("https://drive.google.com/drive/u/0/folders/XYZ/view").unwrap();
        assert_eq!(id, "XYZ");
    }

    #[test]
    fn stops_at_fragment() {
        let id = extract_folder_id("https://drive.google.com/drive/folders/abc#grid").unwrap();
        assert_eq!(id, "abc");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let id = extract_folder_id("  https://drive.google.com/drive/folders/F1\n").unwrap();
        assert_eq!(id, "F1");
    }

    #[test]
    fn url_without_folders_segment_fails() {
        let err = extract_folder_id("https://drive.google.com/file/d/abc/view").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn empty_id_fails_instead_of_returning_empty() {
        assert!(extract_folder_id("https://drive.google.com/drive/folders/").is_err());
        assert!(extract_folder_id("https://drive.google.com/drive/folders//x").is_err());
    }

    #[test]
    fn folder_url_round_trips_through_extraction() {
        let url = folder_url("F9");
        assert_eq!(extract_folder_id(&url).unwrap(), "F9");
    }
}
