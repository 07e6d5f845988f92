//! Content pipeline for device payloads: fetch remote content and validate
//! it (size, signature, declared dimensions) before any RPC is issued.

pub mod error;
pub mod fetch;
pub mod validate;

pub use {
    error::{Error, Result},
    fetch::{ContentFetcher, ContentSource, DEFAULT_FETCH_TIMEOUT},
    validate::{ValidatedContent, ValidationError, ValidationRules, validate},
};
