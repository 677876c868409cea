use crate::error::{AdbError, Result};
use crate::llm::types::*;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_UPLOAD_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta/files";

/// Files at or below this size are sent inline instead of through the Files API.
pub const INLINE_LIMIT_BYTES: u64 = 15 * 1024 * 1024;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Inlines small statements and uploads larger ones. The file is read once.
    pub async fn prepare_document(&self, path: &Path) -> Result<StatementDocument> {
        let file = LocalFile::read(path).await?;
        if file.bytes.len() as u64 <= INLINE_LIMIT_BYTES {
            Ok(StatementDocument::Inline(file.into_inline()))
        } else {
            Ok(StatementDocument::Remote(self.upload_file(file).await?))
        }
    }

    pub async fn inline_document(&self, path: &Path) -> Result<InlineDocument> {
        Ok(LocalFile::read(path).await?.into_inline())
    }

    pub async fn upload_document(&self, path: &Path) -> Result<RemoteDocument> {
        let file = LocalFile::read(path).await?;
        self.upload_file(file).await
    }

    async fn upload_file(&self, file: LocalFile) -> Result<RemoteDocument> {
        let upload_url = self.start_upload(&file).await?;
        let LocalFile {
            display_name,
            mime_type,
            bytes,
        } = file;
        let uploaded = self.send_bytes(&upload_url, bytes).await?;
        debug!("Uploaded {} as {}", display_name, uploaded.name);

        let state = self.wait_until_active(&uploaded).await?;
        Ok(RemoteDocument {
            uri: uploaded.uri,
            name: uploaded.name,
            display_name,
            mime_type,
            state,
        })
    }

    /// Opens a resumable upload session and returns its upload URL.
    async fn start_upload(&self, file: &LocalFile) -> Result<String> {
        let start_url = format!("{}?key={}", GEMINI_UPLOAD_URL, self.api_key);
        let metadata = json!({ "file": { "display_name": file.display_name } });

        let res = self
            .client
            .post(&start_url)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", file.bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", &file.mime_type)
            .header("Content-Type", "application/json")
            .json(&metadata)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await?;
            return Err(AdbError::ExtractionFailed(format!(
                "Upload init failed (status {}): {}",
                status, error_text
            )));
        }

        res.headers()
            .get("x-goog-upload-url")
            .ok_or_else(|| AdbError::ExtractionFailed("No upload URL in headers".to_string()))?
            .to_str()
            .map(str::to_string)
            .map_err(|e| AdbError::ExtractionFailed(e.to_string()))
    }

    async fn send_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> Result<UploadedFile> {
        let res = self
            .client
            .post(upload_url)
            .header("Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await?;
            return Err(AdbError::ExtractionFailed(format!(
                "File upload failed (status {}): {}",
                status, error_text
            )));
        }

        let envelope: FileEnvelope = res.json().await?;
        Ok(envelope.file)
    }

    /// Polls the Files API until the upload can be referenced by a request.
    async fn wait_until_active(&self, uploaded: &UploadedFile) -> Result<String> {
        let mut state = uploaded.state();
        loop {
            match state {
                FileState::Active => return Ok("ACTIVE".to_string()),
                FileState::Failed => {
                    return Err(AdbError::ExtractionFailed(format!(
                        "Files API failed to process {}",
                        uploaded.name
                    )))
                }
                FileState::Processing => sleep(self.poll_interval).await,
            }

            let check_url = format!("{}/{}?key={}", self.base_url, uploaded.name, self.api_key);
            let body: serde_json::Value = self.client.get(&check_url).send().await?.json().await?;
            state = FileState::from_status_body(&body);
        }
    }

    pub async fn generate_content(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
        response_schema: Option<serde_json::Value>,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: messages,
            system_instruction: Some(Content::user(system_prompt)),
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema,
                temperature: 0.0,
            },
        };

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(AdbError::ExtractionFailed(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;

        let part = body
            .candidates
            .ok_or_else(|| AdbError::ExtractionFailed("No candidates returned".to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| AdbError::ExtractionFailed("Empty candidates list".to_string()))?
            .content
            .parts
            .into_iter()
            .next()
            .ok_or_else(|| AdbError::ExtractionFailed("No parts in content".to_string()))?;

        match part {
            Part::Text { text } => Ok(text),
            _ => Err(AdbError::ExtractionFailed(
                "Model returned non-text content".to_string(),
            )),
        }
    }
}

/// A statement read from disk, ready to inline or upload.
struct LocalFile {
    display_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl LocalFile {
    async fn read(path: &Path) -> Result<Self> {
        let display_name = file_name(path)?;
        let bytes = fs::read(path).await?;
        Ok(Self {
            display_name,
            mime_type: mime_type(path),
            bytes,
        })
    }

    fn into_inline(self) -> InlineDocument {
        debug!("Inlining {} ({} bytes)", self.display_name, self.bytes.len());
        InlineDocument {
            display_name: self.display_name,
            mime_type: self.mime_type,
            data: STANDARD.encode(self.bytes),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    uri: String,
    name: String,
    #[serde(default)]
    state: Option<String>,
}

impl UploadedFile {
    fn state(&self) -> FileState {
        FileState::parse(self.state.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileState {
    Processing,
    Active,
    Failed,
}

impl FileState {
    fn parse(state: Option<&str>) -> Self {
        match state {
            Some("ACTIVE") => FileState::Active,
            Some("FAILED") => FileState::Failed,
            _ => FileState::Processing,
        }
    }

    /// The status endpoint answers either with a bare file or wrapped in `file`.
    fn from_status_body(body: &serde_json::Value) -> Self {
        let file = body.get("file").unwrap_or(body);
        Self::parse(file.get("state").and_then(|v| v.as_str()))
    }
}

fn mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| AdbError::ExtractionFailed("Invalid file name".to_string()))
}
