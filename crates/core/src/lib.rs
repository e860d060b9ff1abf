//! # Synopsis Core
//!
//! Core logic for the research synopsis generator.
//!
//! This crate contains the document pipeline and the collaborators around it:
//! - Markdown parsing and styling into a page-formatted [`document::StyledDocument`]
//! - `.docx` serialization with atomic writes
//! - Paper search, synopsis drafting and the SQLite research cache
//! - [`ResearchService`], which runs the pipeline end to end
//!
//! **No API concerns**: HTTP routing and CLI parsing belong in `api-rest` and `synopsis-cli`.

pub mod artifacts;
pub mod completion;
pub mod config;
pub mod constants;
pub mod document;
pub mod docx;
pub mod error;
pub mod markdown;
pub mod papers;
pub mod service;
pub mod store;
pub mod synopsis;

pub use completion::{CompletionService, GroqClient};
pub use config::{CompletionConfig, CoreConfig};
pub use error::{SynopsisError, SynopsisResult};
pub use markdown::MarkdownService;
pub use papers::{PaperSource, SemanticScholarSource};
pub use service::{GenerationOutcome, ResearchService};
pub use store::{ResearchRecord, ResearchStore, ResearchSummary, SqliteResearchStore};
pub use synopsis::SynopsisService;

pub use synopsis_types::{PaperRecord, ResearchQuery, Synopsis};
