//! # Newsbrief
//!
//! A CLI for AI-assisted news headline analysis.
//!
//! ## Features
//!
//! - **Headlines and search**: thin passthrough to NewsAPI for top headlines
//!   and keyword search
//! - **Structured analysis**: summary, key points, sentiment, tone and bias
//!   for any article, via the Gemini API
//! - **Robust normalization**: model completions are repaired and coerced
//!   into a fully populated record, degrading gracefully instead of failing

pub mod agent;
pub mod config;
pub mod news;
pub mod normalizer;
pub mod record;

pub use agent::Analyst;
pub use config::Config;
pub use news::NewsClient;
pub use record::{AnalysisInput, AnalysisRecord};
