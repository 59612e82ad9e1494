//! BackendApiClient - Direct REST API implementation of the gateway.
//!
//! Talks to the inference backend over JSON-over-HTTP, except the PDF
//! upload which is a multipart request. No retries; every failure maps to
//! a single `Backend` error variant.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, multipart};
use serde::{Deserialize, Serialize};
use snapgpt_core::config::BackendConfig;
use snapgpt_core::error::{Result, SnapGptError};
use snapgpt_core::gateway::{BackendGateway, PdfUpload};
use snapgpt_core::session::InlineImage;

const PDF_FORM_FIELD: &str = "pdf";
const PDF_MIME_TYPE: &str = "application/pdf";
const ERROR_BODY_LIMIT: usize = 300;

/// Gateway implementation that talks to the backend HTTP API.
#[derive(Clone)]
pub struct BackendApiClient {
    client: Client,
    base_url: String,
}

impl BackendApiClient {
    /// Creates a new client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a client from the resolved runtime configuration.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<ChatApiResponse> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|err| request_error(path, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(path, status, &body_text));
        }

        response
            .json()
            .await
            .map_err(|err| SnapGptError::backend(format!("{path}: malformed response: {err}")))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatTurnRequest<'a> {
    text: &'a str,
    session_id: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PdfQuestionRequest<'a> {
    text: &'a str,
    pdf_text: &'a str,
    model: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetRequest<'a> {
    session_id: &'a str,
}

#[derive(Deserialize)]
struct ChatApiResponse {
    response: String,
}

#[derive(Deserialize)]
struct UploadPdfResponse {
    text: String,
    analysis: String,
}

#[async_trait]
impl BackendGateway for BackendApiClient {
    async fn send_chat_turn(
        &self,
        session_id: &str,
        text: &str,
        model: &str,
        image: Option<&InlineImage>,
    ) -> Result<String> {
        let request = ChatTurnRequest {
            text,
            session_id,
            model,
            image: image.map(InlineImage::to_data_url),
        };
        let response = self.post_json("/api/chat", &request).await?;
        Ok(response.response)
    }

    async fn send_pdf_question(
        &self,
        question: &str,
        pdf_text: &str,
        model: &str,
    ) -> Result<String> {
        let request = PdfQuestionRequest {
            text: question,
            pdf_text,
            model,
        };
        let response = self.post_json("/api/pdf_question", &request).await?;
        Ok(response.response)
    }

    async fn upload_pdf(&self, file: Vec<u8>, file_name: &str) -> Result<PdfUpload> {
        let path = "/api/upload_pdf";
        let part = multipart::Part::bytes(file)
            .file_name(file_name.to_string())
            .mime_str(PDF_MIME_TYPE)
            .map_err(|err| SnapGptError::internal(format!("invalid upload part: {err}")))?;
        let form = multipart::Form::new().part(PDF_FORM_FIELD, part);

        let response = self
            .client
            .post(self.endpoint(path))
            .multipart(form)
            .send()
            .await
            .map_err(|err| request_error(path, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(path, status, &body_text));
        }

        let parsed: UploadPdfResponse = response
            .json()
            .await
            .map_err(|err| SnapGptError::backend(format!("{path}: malformed response: {err}")))?;

        Ok(PdfUpload {
            text: parsed.text,
            analysis: parsed.analysis,
        })
    }

    async fn reset_session(&self, session_id: &str) -> Result<()> {
        let path = "/api/reset";
        let response = self
            .client
            .post(self.endpoint(path))
            .json(&ResetRequest { session_id })
            .send()
            .await
            .map_err(|err| request_error(path, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(path, status, &body_text));
        }

        // Acknowledgement body is ignored.
        Ok(())
    }
}

fn request_error(path: &str, err: &reqwest::Error) -> SnapGptError {
    SnapGptError::backend(format!("{path}: request failed: {err}"))
}

fn map_http_error(path: &str, status: StatusCode, body: &str) -> SnapGptError {
    let mut detail = body.trim().to_string();
    if detail.len() > ERROR_BODY_LIMIT {
        detail.truncate(ERROR_BODY_LIMIT);
        detail.push_str("...");
    }
    if detail.is_empty() {
        SnapGptError::backend(format!("{path}: HTTP {status}"))
    } else {
        SnapGptError::backend(format!("{path}: HTTP {status}: {detail}"))
    }
}
