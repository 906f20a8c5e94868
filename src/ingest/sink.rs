//! Append-only row sink for accepted enquiries.
//!
//! The production sink is a Google Sheet. A service-account assertion (RS256
//! JWT) is exchanged for an OAuth access token, which then authorizes a
//! `values:append` call on the configured range.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SheetsConfig;
use crate::models::EnquiryRow;

const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to sign service account assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("sink request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token exchange rejected with status {status}: {body}")]
    TokenRejected { status: u16, body: String },
    #[error("append rejected with status {status}: {body}")]
    AppendRejected { status: u16, body: String },
}

/// Destination for accepted enquiries.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Append one row. Any error means the row was not recorded.
    async fn append(&self, row: &EnquiryRow) -> Result<(), SinkError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google Sheets row sink.
pub struct SheetsSink {
    config: SheetsConfig,
    client: reqwest::Client,
}

impl SheetsSink {
    pub fn new(config: SheetsConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn signed_assertion(&self) -> Result<String, SinkError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.config.service_account_email,
            scope: SHEETS_SCOPE,
            aud: TOKEN_URI,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.config.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    async fn access_token(&self) -> Result<String, SinkError> {
        let assertion = self.signed_assertion()?;
        let response = self
            .client
            .post(TOKEN_URI)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::TokenRejected { status, body });
        }

        let token: TokenResponse = response.json().await?;
        debug!("Obtained sheets access token");
        Ok(token.access_token)
    }
}

#[async_trait]
impl RowSink for SheetsSink {
    async fn append(&self, row: &EnquiryRow) -> Result<(), SinkError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/{}/values/{}:append",
            SHEETS_API, self.config.spreadsheet_id, self.config.range
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": [row.to_values()] }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::AppendRejected { status, body });
        }

        info!("Appended enquiry row to range {}", self.config.range);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "google-sheets"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Enquiry;
    use std::time::Duration;

    #[tokio::test]
    async fn bad_private_key_fails_before_any_request() {
        let sink = SheetsSink::new(SheetsConfig {
            service_account_email: "intake@project.iam.gserviceaccount.com".into(),
            private_key: "not a pem key".into(),
            spreadsheet_id: "sheet-123".into(),
            range: "Sheet1!A:Z".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let row = EnquiryRow::from_enquiry(&Enquiry::default(), Utc::now());
        let err = sink.append(&row).await.unwrap_err();
        assert!(matches!(err, SinkError::Signing(_)), "{err}");
        assert_eq!(sink.name(), "google-sheets");
    }
}
