//! Decoder implementations
//!
//! Each decoder handles a specific response format.

use super::types::{DecoderFormat, Payload, ResponseDecoder};
use crate::error::{Error, Result};
use crate::http::Response;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;

// ============================================================================
// Raw / Text Decoders
// ============================================================================

/// Returns the body bytes as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl ResponseDecoder<Bytes> for RawDecoder {
    fn decode(&self, response: Response) -> Result<Bytes> {
        Ok(response.body)
    }
}

/// Decodes the body as UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl ResponseDecoder<String> for TextDecoder {
    fn decode(&self, response: Response) -> Result<String> {
        response.text()
    }
}

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional record path extraction.
///
/// `JsonDecoder::new()` yields `serde_json::Value`; `JsonDecoder::typed()`
/// deserializes into any `T`.
#[derive(Debug, Clone)]
pub struct JsonDecoder<T = Value> {
    /// Dot path to the part of the document to keep
    record_path: Option<String>,
    _target: PhantomData<fn() -> T>,
}

impl JsonDecoder<Value> {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self::typed()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self::typed().path(path)
    }
}

impl Default for JsonDecoder<Value> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JsonDecoder<T> {
    /// Create a decoder deserializing into `T`
    pub fn typed() -> Self {
        Self {
            record_path: None,
            _target: PhantomData,
        }
    }

    /// Keep only the value at `path` (`data.items`, `$.results[0]`)
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.record_path = Some(path.into());
        self
    }
}

impl<T: DeserializeOwned> ResponseDecoder<T> for JsonDecoder<T> {
    fn decode(&self, response: Response) -> Result<T> {
        let value: Value = response.json()?;
        let value = match &self.record_path {
            Some(path) => extract_simple_path(&value, path)
                .ok_or_else(|| Error::decode(format!("Path '{path}' not found in response")))?,
            None => value,
        };
        serde_json::from_value(value).map_err(|e| Error::Decode {
            message: format!("Failed to deserialize JSON: {e}"),
        })
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines decoder (one JSON object per line)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlDecoder;

impl ResponseDecoder<Vec<Value>> for JsonlDecoder {
    fn decode(&self, response: Response) -> Result<Vec<Value>> {
        let body = response.text()?;
        let mut records = Vec::new();

        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| Error::Decode {
                message: format!("Failed to parse JSONL at line {}: {e}", line_num + 1),
            })?;

            records.push(value);
        }

        Ok(records)
    }
}

// ============================================================================
// Content-Type Dispatch
// ============================================================================

/// Chooses a decoder from the response's media type.
///
/// Lookup order: an explicit registration, then any `+json` suffix as JSON,
/// then any `text/*` as text. Everything else (images included) is raw.
#[derive(Debug, Clone)]
pub struct MagicDecoder {
    formats: HashMap<String, DecoderFormat>,
}

impl Default for MagicDecoder {
    fn default() -> Self {
        let mut formats = HashMap::new();
        formats.insert("application/json".to_string(), DecoderFormat::Json);
        formats.insert("application/x-ndjson".to_string(), DecoderFormat::Jsonl);
        formats.insert("application/jsonl".to_string(), DecoderFormat::Jsonl);
        Self { formats }
    }
}

impl MagicDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `content_type` with `format`, replacing any previous mapping
    #[must_use]
    pub fn register(mut self, content_type: &str, format: DecoderFormat) -> Self {
        self.formats
            .insert(content_type.to_ascii_lowercase(), format);
        self
    }

    /// The format selected for `content_type`
    pub fn resolve(&self, content_type: Option<&str>) -> DecoderFormat {
        let Some(content_type) = content_type.map(str::to_ascii_lowercase) else {
            return DecoderFormat::Raw;
        };
        if let Some(format) = self.formats.get(&content_type) {
            return *format;
        }
        if content_type.ends_with("+json") {
            DecoderFormat::Json
        } else if content_type.starts_with("text/") {
            DecoderFormat::Text
        } else {
            DecoderFormat::Raw
        }
    }
}

impl ResponseDecoder<Payload> for MagicDecoder {
    fn decode(&self, response: Response) -> Result<Payload> {
        match self.resolve(response.content_type()) {
            DecoderFormat::Json => JsonDecoder::new().decode(response).map(Payload::Json),
            DecoderFormat::Jsonl => JsonlDecoder
                .decode(response)
                .map(|records| Payload::Json(Value::Array(records))),
            DecoderFormat::Text => TextDecoder.decode(response).map(Payload::Text),
            DecoderFormat::Raw | DecoderFormat::Auto => {
                RawDecoder.decode(response).map(Payload::Bytes)
            }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract a value using simple dot-notation path
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        // Array indexing like "data[0]" or "items[-1]"
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].strip_suffix(']')?;

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index: i64 = index_str.parse().ok()?;
            let Value::Array(arr) = current else {
                return None;
            };
            let idx = if index < 0 {
                arr.len().checked_sub(index.unsigned_abs() as usize)?
            } else {
                index as usize
            };
            current = arr.get(idx)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}
