//! Generation request payload and its validation rules.

use crate::error::CoreError;
use crate::image::IMAGE_MIME_PREFIX;
use crate::session::validate_session_name;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Content type accepted for the instructions document.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// An uploaded file held in memory until it is forwarded to the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Everything the user submitted for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Source image.
    pub image: Option<Attachment>,
    /// Detailed instructions as a PDF.
    pub document: Option<Attachment>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl GenerationRequest {
    /// Trimmed description, `None` when blank.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    /// Trimmed name, `None` when blank.
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Check the request before anything is sent.
    ///
    /// At least one of image or description is required. Attachments must
    /// carry the expected content types.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.image.is_none() && self.description().is_none() {
            return Err(CoreError::Validation(
                "Please provide at least an image or a description".to_string(),
            ));
        }

        if let Some(image) = &self.image {
            if !image.content_type.starts_with(IMAGE_MIME_PREFIX) {
                return Err(CoreError::Validation(format!(
                    "Source image must be an image file (JPG, PNG, WebP), got '{}'",
                    image.content_type
                )));
            }
            if image.bytes.is_empty() {
                return Err(CoreError::Validation("Source image is empty".to_string()));
            }
        }

        if let Some(document) = &self.document {
            if document.content_type != PDF_CONTENT_TYPE {
                return Err(CoreError::Validation(format!(
                    "Instructions must be a PDF file, got '{}'",
                    document.content_type
                )));
            }
        }

        if let Some(description) = self.description() {
            let len = description.chars().count();
            if len > MAX_DESCRIPTION_LENGTH {
                return Err(CoreError::Validation(format!(
                    "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters (got {len})"
                )));
            }
        }

        if let Some(name) = self.name() {
            validate_session_name(name)?;
        }

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> Attachment {
        Attachment::new("source.png", "image/png", vec![0x89, 0x50])
    }

    #[test]
    fn description_only_is_valid() {
        let req = GenerationRequest {
            description: Some("blue variant".into()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn image_only_is_valid() {
        let req = GenerationRequest {
            image: Some(png()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn missing_image_and_description_is_rejected() {
        let req = GenerationRequest {
            name: Some("only a name".into()),
            description: Some("   ".into()),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("at least an image or a description"));
    }

    #[test]
    fn non_image_upload_is_rejected() {
        let req = GenerationRequest {
            image: Some(Attachment::new("notes.txt", "text/plain", vec![1])),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_image_is_rejected() {
        let req = GenerationRequest {
            image: Some(Attachment::new("a.png", "image/png", Vec::new())),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn non_pdf_document_is_rejected() {
        let req = GenerationRequest {
            image: Some(png()),
            document: Some(Attachment::new("brief.docx", "application/msword", vec![1])),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn description_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_DESCRIPTION_LENGTH);
        let req = GenerationRequest {
            description: Some(at_limit),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        let over = "a".repeat(MAX_DESCRIPTION_LENGTH + 1);
        let req = GenerationRequest {
            description: Some(over),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn accessors_trim_and_drop_blank_values() {
        let req = GenerationRequest {
            name: Some("  ".into()),
            description: Some(" blue ".into()),
            ..Default::default()
        };
        assert_eq!(req.name(), None);
        assert_eq!(req.description(), Some("blue"));
    }
}
