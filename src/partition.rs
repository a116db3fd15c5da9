//! Partition client for the hosted Unstructured API.
//!
//! Uploads the PDF as multipart form data and returns the element list. When image
//! extraction is enabled the service inlines image and table blocks as base64; those
//! payloads are written to the image output directory and replaced by an `image_path`
//! in the element metadata.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tdata_core::contract::{Element, PartitionError, PartitionOptions, Partitioner};
use tracing::{debug, info, warn};

pub struct UnstructuredClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl UnstructuredClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, PartitionError> {
        let client = Client::builder().build().map_err(|e| {
            PartitionError::Transport(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
        })
    }

    fn form(
        &self,
        document: &Path,
        bytes: Vec<u8>,
        options: &PartitionOptions,
    ) -> Result<Form, PartitionError> {
        let file_name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| PartitionError::Transport(e.to_string()))?;
        let mut form = Form::new()
            .part("files", part)
            .text("strategy", options.strategy.clone());
        if options.extract_images && !options.extract_image_block_types.is_empty() {
            let block_types = serde_json::to_string(&options.extract_image_block_types)
                .map_err(|e| PartitionError::Decode(e.to_string()))?;
            form = form.text("extract_image_block_types", block_types);
        }
        Ok(form)
    }
}

#[async_trait]
impl Partitioner for UnstructuredClient {
    async fn partition(
        &self,
        document: &Path,
        options: &PartitionOptions,
    ) -> Result<Vec<Element>, PartitionError> {
        let bytes = tokio::fs::read(document)
            .await
            .map_err(|source| PartitionError::Io {
                path: document.to_path_buf(),
                source,
            })?;
        info!(
            document = %document.display(),
            size = bytes.len(),
            strategy = %options.strategy,
            "Submitting document for partitioning"
        );

        let mut request = self
            .client
            .post(&self.api_url)
            .header("accept", "application/json")
            .multipart(self.form(document, bytes, options)?);
        if let Some(key) = &self.api_key {
            request = request.header("unstructured-api-key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| PartitionError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PartitionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut elements: Vec<Element> = resp
            .json()
            .await
            .map_err(|e| PartitionError::Decode(e.to_string()))?;
        info!(elements = elements.len(), "Partition response received");

        if options.extract_images {
            let written = write_image_blocks(&mut elements, &options.image_output_dir).await?;
            debug!(
                images = written,
                dir = %options.image_output_dir.display(),
                "Extracted image blocks"
            );
        }
        Ok(elements)
    }
}

/// Move inlined base64 image payloads out of the metadata and onto disk.
async fn write_image_blocks(
    elements: &mut [Element],
    dir: &Path,
) -> Result<usize, PartitionError> {
    let mut written = 0usize;
    for (index, element) in elements.iter_mut().enumerate() {
        let Some(metadata) = element.metadata.as_object_mut() else {
            continue;
        };
        let Some(payload) = metadata.remove("image_base64") else {
            continue;
        };
        let Some(encoded) = payload.as_str() else {
            continue;
        };
        let decoded = match general_purpose::STANDARD.decode(encoded) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, index, "Skipping undecodable image payload");
                continue;
            }
        };

        let extension = metadata
            .get("image_mime_type")
            .and_then(|m| m.as_str())
            .and_then(|m| m.strip_prefix("image/"))
            .unwrap_or("jpg")
            .to_string();
        let page = metadata
            .get("page_number")
            .and_then(|p| p.as_u64())
            .unwrap_or(0);
        let kind = element.category_hint.to_lowercase();
        let kind = if kind.is_empty() {
            "image".to_string()
        } else {
            kind
        };
        let path: PathBuf = dir.join(format!("{kind}-{page}-{}.{extension}", index + 1));

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| PartitionError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        tokio::fs::write(&path, &decoded)
            .await
            .map_err(|source| PartitionError::Io {
                path: path.clone(),
                source,
            })?;
        metadata.insert(
            "image_path".to_string(),
            serde_json::Value::String(path.to_string_lossy().into_owned()),
        );
        written += 1;
    }
    Ok(written)
}
