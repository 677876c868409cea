use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractionEvent {
    Starting { document: String },
    Attempting { model: String, attempt: usize },
    ProcessingResponse { model: String },
    FallingBack { model: String, error: String },
    Success { model: String, observations: usize },
    Failed { reason: String },
}

/// A file already uploaded through the Files API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub uri: String,
    pub name: String,
    pub display_name: String,
    pub mime_type: String,
    pub state: String,
}

/// A small file sent base64-encoded inside the request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineDocument {
    pub display_name: String,
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone)]
pub enum StatementDocument {
    Remote(RemoteDocument),
    Inline(InlineDocument),
}

impl StatementDocument {
    pub fn display_name(&self) -> &str {
        match self {
            StatementDocument::Remote(doc) => &doc.display_name,
            StatementDocument::Inline(doc) => &doc.display_name,
        }
    }

    fn to_part(&self) -> Part {
        match self {
            StatementDocument::Remote(doc) => Part::FileData {
                file_data: FileData {
                    mime_type: doc.mime_type.clone(),
                    file_uri: doc.uri.clone(),
                },
            },
            StatementDocument::Inline(doc) => Part::InlineData {
                inline_data: Blob {
                    mime_type: doc.mime_type.clone(),
                    data: doc.data.clone(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: Blob },
    FileData { file_data: FileData },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn user_with_document(text: impl Into<String>, document: &StatementDocument) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![document.to_part(), Part::Text { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}
