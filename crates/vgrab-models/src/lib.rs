//! Shared data models for the vgrab service.
//!
//! This crate provides:
//! - The validated retrieval request and its raw query form
//! - Source metadata as returned to clients
//! - Source URL host policy
//! - Timestamp parsing and trim ranges
//! - Download filename helpers

pub mod filename;
pub mod metadata;
pub mod request;
pub mod source_url;
pub mod timestamp;

pub use filename::{attachment_filename, content_disposition, sanitize_filename};
pub use metadata::SourceMetadata;
pub use request::{Container, Mode, Quality, RequestError, RetrievalParams, RetrievalRequest};
pub use source_url::{HostPolicy, SourceUrlError, DEFAULT_ALLOWED_HOSTS};
pub use timestamp::{format_seconds, parse_timestamp, TimestampError, TrimRange};
