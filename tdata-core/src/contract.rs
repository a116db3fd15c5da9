//! # contract: capability interfaces consumed by the pipeline
//!
//! The two external collaborators of tdata are expressed here as traits:
//!
//! - [`Partitioner`]: turns a PDF document into a finite sequence of typed [`Element`]s.
//! - [`CompletionClient`]: a single synchronous-looking chat completion call.
//!
//! Both are constructed by the caller and passed into the stages that need them, with a
//! lifecycle of one pipeline run. Concrete HTTP implementations live in the CLI crate;
//! tests use the `mockall` mocks generated below (`MockPartitioner`, `MockCompletionClient`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// One unit of extracted document content.
///
/// `category_hint` is the structural type reported by the partition engine ("Title",
/// "Table", "NarrativeText", ...). It is informational only: classification looks at
/// `text` alone. `metadata` (page, coordinates, ...) is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub category_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Element {
    /// Convenience constructor for a bare text element.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn page_number(&self) -> Option<u64> {
        self.metadata.get("page_number").and_then(|v| v.as_u64())
    }
}

/// Options forwarded to the partition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionOptions {
    /// Resolution strategy; `hi_res` runs layout detection and OCR.
    pub strategy: String,
    pub extract_images: bool,
    pub extract_image_block_types: Vec<String>,
    /// Directory that receives extracted image/table assets.
    pub image_output_dir: PathBuf,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            strategy: "hi_res".to_string(),
            extract_images: true,
            extract_image_block_types: vec!["Image".to_string(), "Table".to_string()],
            image_output_dir: PathBuf::from("images"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error("failed to read document {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("partition request failed: {0}")]
    Transport(String),
    #[error("partition service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to decode partition response: {0}")]
    Decode(String),
}

/// Trait for the PDF layout/OCR engine.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Partitioner: Send + Sync {
    /// Partition a document into elements, in document order.
    async fn partition(
        &self,
        document: &Path,
        options: &PartitionOptions,
    ) -> Result<Vec<Element>, PartitionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single chat completion call: role-tagged messages, model and output budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Transport or API failure of the completion service. Never retried by the core.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("completion quota exceeded: {0}")]
    Quota(String),
    #[error("failed to decode completion response: {0}")]
    Decode(String),
    #[error("completion response contained no choices")]
    EmptyReply,
}

/// Trait for the LLM chat completion service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the messages and return the text of the first choice.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}
