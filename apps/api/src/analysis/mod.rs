// CV vs job-description analysis.
// Engine scores are authoritative; model output only contributes commentary.

pub mod engine;
pub mod handlers;
pub mod merge;
pub mod models;
pub mod prompts;
pub mod service;
