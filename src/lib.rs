//! Postflow library.
//!
//! The engine behind a content-operations dashboard for two X accounts:
//! a five-state content pipeline, a research inbox with AI-generated post
//! variants, weekly analytics reconciled against tracked content by fuzzy
//! text matching, and a batched LLM generation/scoring workflow.
//!
//! The hosting shell (UI, credential entry, rendering) lives elsewhere and
//! drives this crate through its public types; all collaborators
//! (spreadsheet CSV export, REST row store, LLM completion API, social
//! search) are thin async clients with configurable base URLs.

pub mod analytics;
pub mod config;
pub mod constants;
pub mod content;
pub mod csv;
pub mod generation;
pub mod listening;
pub mod llm;
pub mod matching;
pub mod research;
pub mod sheets;
pub mod store;
pub mod week;
