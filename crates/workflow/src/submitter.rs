//! Multipart submission to the workflow webhook.
//!
//! [`WorkflowSubmitter`] builds the `image`, `pdf`, `name`, `description`
//! parts (absent parts omitted) and performs exactly one `POST`. The request
//! is abandoned when the ceiling elapses or the caller's
//! [`CancellationToken`] fires, whichever comes first.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use spijker_core::submission::{Attachment, GenerationRequest};
use tokio_util::sync::CancellationToken;

use crate::error::SubmitError;
use crate::result::parse_result_body;

/// Client-side ceiling for one submission.
pub const DEFAULT_WORKFLOW_TIMEOUT: Duration = Duration::from_secs(600);

/// Where and how long to wait.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub webhook_url: String,
    pub timeout: Duration,
}

impl WorkflowConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            timeout: DEFAULT_WORKFLOW_TIMEOUT,
        }
    }
}

/// Posts generation requests to the workflow webhook.
#[derive(Debug, Clone)]
pub struct WorkflowSubmitter {
    client: reqwest::Client,
    config: WorkflowConfig,
}

impl WorkflowSubmitter {
    pub fn new(config: WorkflowConfig) -> Result<Self, SubmitError> {
        if config.webhook_url.trim().is_empty() {
            return Err(SubmitError::Config("webhook URL must not be empty".into()));
        }
        if config.timeout.is_zero() {
            return Err(SubmitError::Config("timeout must be greater than zero".into()));
        }
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Submit one run and return the results folder URL.
    ///
    /// The caller is expected to have validated `request` already.
    pub async fn submit(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, SubmitError> {
        let form = build_form(request)?;
        let limit = self.config.timeout;

        tracing::info!(
            url = %self.config.webhook_url,
            has_image = request.image.is_some(),
            has_document = request.document.is_some(),
            "Submitting generation to workflow",
        );

        let exchange = async {
            let response = self
                .client
                .post(&self.config.webhook_url)
                .multipart(form)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SubmitError::HttpStatus(status.as_u16()));
            }
            let body = response.text().await?;
            parse_result_body(&body)
        };

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(SubmitError::Cancelled),
            outcome = tokio::time::timeout(limit, exchange) => {
                outcome.unwrap_or(Err(SubmitError::TimedOut(limit)))
            }
        };

        match &result {
            Ok(url) => tracing::info!(result_url = %url, "Workflow accepted generation"),
            Err(e) => tracing::warn!(error = %e, "Workflow submission failed"),
        }
        result
    }
}

/// Build the multipart payload. Blank text parts are omitted.
pub fn build_form(request: &GenerationRequest) -> Result<Form, SubmitError> {
    let mut form = Form::new();
    if let Some(image) = &request.image {
        form = form.part("image", file_part(image)?);
    }
    if let Some(document) = &request.document {
        form = form.part("pdf", file_part(document)?);
    }
    if let Some(name) = request.name() {
        form = form.text("name", name.to_string());
    }
    if let Some(description) = request.description() {
        form = form.text("description", description.to_string());
    }
    Ok(form)
}

fn file_part(attachment: &Attachment) -> Result<Part, SubmitError> {
    Part::bytes(attachment.bytes.clone())
        .file_name(attachment.file_name.clone())
        .mime_str(&attachment.content_type)
        .map_err(|e| SubmitError::Config(format!("invalid content type: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_webhook_url_is_rejected() {
        assert!(matches!(
            WorkflowSubmitter::new(WorkflowConfig::new(" ")),
            Err(SubmitError::Config(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = WorkflowConfig {
            webhook_url: "http://localhost/hook".into(),
            timeout: Duration::ZERO,
        };
        assert!(WorkflowSubmitter::new(config).is_err());
    }

    #[test]
    fn default_timeout_is_ten_minutes() {
        let submitter = WorkflowSubmitter::new(WorkflowConfig::new("http://localhost/hook")).unwrap();
        assert_eq!(submitter.timeout(), Duration::from_secs(600));
    }

    #[test]
    fn invalid_attachment_content_type_fails_form_build() {
        let request = GenerationRequest {
            image: Some(Attachment::new("a.png", "not a mime", vec![1])),
            ..Default::default()
        };
        assert!(matches!(build_form(&request), Err(SubmitError::Config(_))));
    }
}
