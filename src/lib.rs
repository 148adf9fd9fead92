//! Quiz distractor generation and abstractive summarization.
//!
//! The distractor pipeline resolves a correct answer's word sense, gathers
//! similar senses and keeps a diverse subset chosen by Maximal Marginal
//! Relevance. The summary pipeline tokenizes text and delegates beam search
//! to an external generation service.

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod nlp;

pub use error::{SelectError, ServiceError, SummarizeError};
