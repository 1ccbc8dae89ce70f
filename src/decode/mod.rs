//! Response decoder module
//!
//! Supports: raw bytes, text, JSON (untyped, typed, with record path),
//! JSON Lines, and content-type dispatch
//!
//! # Overview
//!
//! Decoders turn a pipeline `Response` into the value a caller sees for each
//! page. They run after the pipeline, so fresh, stale and live responses are
//! all decoded the same way. Any `Fn(Response) -> Result<T>` is a decoder.

mod decoders;
mod types;

pub use decoders::{JsonDecoder, JsonlDecoder, MagicDecoder, RawDecoder, TextDecoder};
pub use types::{DecoderFormat, Payload, ResponseDecoder};
