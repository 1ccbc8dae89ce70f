//! Decoder types and traits

use super::decoders::{JsonDecoder, JsonlDecoder, MagicDecoder, RawDecoder, TextDecoder};
use crate::error::Result;
use crate::http::Response;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Turns a response into the caller-facing value
pub trait ResponseDecoder<T>: Send + Sync {
    fn decode(&self, response: Response) -> Result<T>;
}

impl<T, F> ResponseDecoder<T> for F
where
    F: Fn(Response) -> Result<T> + Send + Sync,
{
    fn decode(&self, response: Response) -> Result<T> {
        self(response)
    }
}

/// A decoded body of whichever kind the response carried
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Bytes(Bytes),
}

impl Payload {
    /// The JSON value, if this payload is JSON
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Json(value) => write!(f, "{value}"),
            Payload::Text(text) => f.write_str(text),
            Payload::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// Statically selected decoder, as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderFormat {
    /// Dispatch on `Content-Type` (default)
    #[default]
    Auto,
    /// Body bytes untouched
    Raw,
    /// UTF-8 text
    Text,
    /// A single JSON document
    Json,
    /// JSON Lines, decoded to an array
    Jsonl,
}

impl DecoderFormat {
    /// A decoder producing `Payload`s in this format
    pub fn decoder(self) -> Arc<dyn ResponseDecoder<Payload>> {
        match self {
            DecoderFormat::Auto => Arc::new(MagicDecoder::new()),
            DecoderFormat::Raw => {
                Arc::new(|r: Response| RawDecoder.decode(r).map(Payload::Bytes))
            }
            DecoderFormat::Text => {
                Arc::new(|r: Response| TextDecoder.decode(r).map(Payload::Text))
            }
            DecoderFormat::Json => {
                Arc::new(|r: Response| JsonDecoder::new().decode(r).map(Payload::Json))
            }
            DecoderFormat::Jsonl => Arc::new(|r: Response| {
                JsonlDecoder
                    .decode(r)
                    .map(|records| Payload::Json(Value::Array(records)))
            }),
        }
    }
}

impl std::str::FromStr for DecoderFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(DecoderFormat::Auto),
            "raw" => Ok(DecoderFormat::Raw),
            "text" => Ok(DecoderFormat::Text),
            "json" => Ok(DecoderFormat::Json),
            "jsonl" => Ok(DecoderFormat::Jsonl),
            other => Err(crate::error::Error::config(format!(
                "Unknown decoder format: {other}"
            ))),
        }
    }
}
