//! CLI commands and argument parsing

use crate::decode::DecoderFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Link-following HTTP pagination client
#[derive(Parser, Debug)]
#[command(name = "pagewise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a URL, optionally following pagination links
    Get(GetArgs),

    /// Validate a client configuration file
    Validate,
}

/// Arguments of `get`
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// URL, absolute or relative to the configured base URL
    pub url: String,

    /// Follow `next` links one page at a time
    #[arg(long)]
    pub paginate: bool,

    /// Prefetch pages concurrently (implies --paginate)
    #[arg(long)]
    pub concurrent: bool,

    /// Requests in flight with --concurrent
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Stop after this many pages (0 = unlimited)
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Query parameter, `key=value` (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Request header, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Send `Authorization: Token <token>`
    #[arg(long, conflicts_with = "bearer")]
    pub token: Option<String>,

    /// Send `Authorization: Bearer <token>`
    #[arg(long)]
    pub bearer: Option<String>,

    /// How to decode response bodies: auto, raw, text, json, jsonl
    #[arg(long, default_value = "auto")]
    pub decode: DecoderFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One compact line per page
    Json,
    /// Indented JSON
    Pretty,
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))
}
