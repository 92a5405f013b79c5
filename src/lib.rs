//! docent: question answering over PDF documents with local RAG
//!
//! The crate is organized around four pieces: the [`pipeline`] module owns
//! the document lifecycle (upload, validation, extraction, chunking,
//! indexing), [`index`] persists per-document flat vector indices, and
//! [`answer`] retrieves context and drives the generation model. The
//! [`commands`] module wraps these for the CLI.

pub mod answer;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod pipeline;
pub mod progress;
