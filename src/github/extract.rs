// src/github/extract.rs
// =============================================================================
// This module turns a tree entry into the text of the file.
//
// GitHub offers two ways to get a file:
// 1. download_url: the raw bytes, served as-is
// 2. the API url: a JSON envelope with the bytes base64-encoded
//
// Either way we end with bytes that may or may not be UTF-8. Non-UTF-8 means
// "binary file", which is NOT the same thing as "couldn't fetch it".
//
// Nothing in here returns an error: failures become FileContent::Unavailable
// and get logged, so one bad file never stops a walk.
// =============================================================================

use super::api::{read_json, ContentLocator, GitHubClient, TreeEntry};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::warn;

/// Result of extracting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// The file decoded cleanly as UTF-8
    Text(String),
    /// We got the bytes, but they are not text
    Binary,
    /// The bytes could not be fetched (or the envelope made no sense)
    Unavailable,
}

// GET {api url} for a file returns this (plus fields we don't need)
#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    content: Option<String>,
    encoding: Option<String>,
}

impl GitHubClient {
    // Fetches and decodes the content of a file entry
    //
    // Parameters:
    //   entry: a file entry from list_directory
    //
    // Returns: Text, Binary or Unavailable (never an error)
    pub async fn extract(&self, entry: &TreeEntry) -> FileContent {
        match &entry.locator {
            ContentLocator::Download(url) => self.extract_raw(&entry.path, url).await,
            ContentLocator::Api(url) => self.extract_envelope(entry, url).await,
        }
    }

    async fn extract_raw(&self, path: &str, url: &str) -> FileContent {
        let response = match self.fetcher.get(url, &[]).await {
            Ok(response) => response,
            Err(e) => {
                warn!(path, error = %e, "Failed to download file");
                return FileContent::Unavailable;
            }
        };

        match response.bytes().await {
            Ok(bytes) => decode_text(bytes.to_vec()),
            Err(e) => {
                warn!(path, error = %e, "Failed to read file body");
                FileContent::Unavailable
            }
        }
    }

    // The listing's encoding stands in when the envelope leaves it out
    async fn extract_envelope(&self, entry: &TreeEntry, url: &str) -> FileContent {
        let path = entry.path.as_str();
        let envelope: ContentEnvelope = match self.fetcher.get(url, &[]).await {
            Ok(response) => match read_json(url, response).await {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(path, error = %e, "Unexpected content envelope");
                    return FileContent::Unavailable;
                }
            },
            Err(e) => {
                warn!(path, error = %e, "Failed to get file content");
                return FileContent::Unavailable;
            }
        };

        let encoding = envelope.encoding.or_else(|| entry.encoding_hint.clone());
        match (envelope.content, encoding.as_deref()) {
            (Some(content), Some("base64")) => match decode_base64(&content) {
                Some(bytes) => decode_text(bytes),
                None => {
                    warn!(path, "Content is not valid base64");
                    FileContent::Unavailable
                }
            },
            (_, encoding) => {
                warn!(path, ?encoding, "Unable to decode content");
                FileContent::Unavailable
            }
        }
    }
}

// GitHub wraps base64 content at 60 columns, so strip whitespace first
fn decode_base64(content: &str) -> Option<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact).ok()
}

fn decode_text(bytes: Vec<u8>) -> FileContent {
    match String::from_utf8(bytes) {
        Ok(text) => FileContent::Text(text),
        Err(_) => FileContent::Binary,
    }
}
