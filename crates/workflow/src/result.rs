//! Decoding of the workflow's success body.

use serde::Deserialize;

use crate::error::SubmitError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultBody {
    #[serde(default)]
    result_url: Option<String>,
}

/// Extract the results folder URL from a 2xx body.
///
/// Accepts `{"resultUrl": "<url>"}` or, when the body is not JSON, the body
/// itself as a literal URL.
pub fn parse_result_body(body: &str) -> Result<String, SubmitError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(SubmitError::EmptyResponse);
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let parsed: ResultBody =
            serde_json::from_value(value).map_err(|_| SubmitError::MissingResultUrl)?;
        return parsed
            .result_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(SubmitError::MissingResultUrl);
    }

    if looks_like_url(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(SubmitError::MissingResultUrl)
    }
}

fn looks_like_url(s: &str) -> bool {
    (s.starts_with("https://") || s.starts_with("http://")) && !s.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_result_url() {
        let url = parse_result_body(r#"{"resultUrl":"https://drive.google.com/drive/folders/F1"}"#)
            .unwrap();
        assert_eq!(url, "https://drive.google.com/drive/folders/F1");
    }

    #[test]
    fn plain_text_url() {
        let url = parse_result_body("https://drive.google.com/drive/folders/F1\n").unwrap();
        assert_eq!(url, "https://drive.google.com/drive/folders/F1");
    }

    #[test]
    fn empty_body() {
        assert!(matches!(parse_result_body("  "), Err(SubmitError::EmptyResponse)));
    }

    #[test]
    fn json_without_result_url() {
        assert!(matches!(
            parse_result_body(r#"{"message":"Workflow was started"}"#),
            Err(SubmitError::MissingResultUrl)
        ));
        assert!(matches!(
            parse_result_body(r#"{"resultUrl":""}"#),
            Err(SubmitError::MissingResultUrl)
        ));
        assert!(matches!(
            parse_result_body("[1,2]"),
            Err(SubmitError::MissingResultUrl)
        ));
    }

    #[test]
    fn prose_is_not_a_url() {
        assert!(matches!(
            parse_result_body("Accepted"),
            Err(SubmitError::MissingResultUrl)
        ));
    }
}
