//! Mise - conversational recipe recommendations
//!
//! Natural-language requests become structured filters, a two-stage hybrid
//! search (SQL filtering, then vector similarity) finds candidates, and a
//! Bayesian-average ranking orders them. A bounded session lets follow-up
//! messages refine the previous request.

pub mod chat;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod filters;
pub mod ranking;
pub mod recommend;
pub mod retrieval;
pub mod session;
pub mod storage;

pub use error::{MiseError, Result};
