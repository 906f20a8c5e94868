//! Submission transport from the form controller to the enquiry endpoint.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::models::{Attachment, EnquiryAccepted};

/// One entry of a multipart submission.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadPart {
    Text { name: String, value: String },
    File { name: String, attachment: Attachment },
}

impl PayloadPart {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        PayloadPart::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("enquiry rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Sends a built payload and returns the server's acceptance.
#[async_trait]
pub trait EnquiryTransport: Send + Sync {
    async fn send(&self, parts: Vec<PayloadPart>) -> Result<EnquiryAccepted, TransportError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Posts the payload as `multipart/form-data`.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/enquiry", base_url.trim_end_matches('/')),
        }
    }

    fn form(parts: Vec<PayloadPart>) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for part in parts {
            form = match part {
                PayloadPart::Text { name, value } => form.text(name, value),
                PayloadPart::File { name, attachment } => {
                    let file = Part::stream(attachment.data)
                        .file_name(attachment.file_name)
                        .mime_str(&attachment.content_type)?;
                    form.part(name, file)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl EnquiryTransport for HttpTransport {
    async fn send(&self, parts: Vec<PayloadPart>) -> Result<EnquiryAccepted, TransportError> {
        let form = Self::form(parts)?;
        let response = self.client.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_default();
            error!("Enquiry submission rejected ({}): {}", status, message);
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let accepted: EnquiryAccepted = response.json().await?;
        info!("Enquiry {} accepted", accepted.enquiry_id);
        Ok(accepted)
    }
}
