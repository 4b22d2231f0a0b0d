//! datachat - interactive data-analysis assistant
//!
//! Load a tabular file, ask natural-language questions about it through an
//! OpenAI-style chat-completion endpoint, and run the SQL snippets the model
//! suggests directly against the in-memory DataFrame.

pub mod context;
pub mod conversation;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod extract;
pub mod llm;
pub mod session;
