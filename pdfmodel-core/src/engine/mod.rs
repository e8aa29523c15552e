//! Byte-level PDF engine
//!
//! A [`Document`](crate::Document) never parses or serializes bytes itself.
//! It hands them to a [`PdfEngine`] injected at construction time, so tests
//! and embedders can substitute their own. [`NativeEngine`] is the default.

pub mod lexer;
pub mod parser;
pub mod reader;
pub mod security;
pub mod writer;
pub mod xref;

pub use security::SecurityState;

use crate::encryption::EncryptOptions;
use crate::error::Result;
use crate::graph::Graph;
use std::fmt;

/// Parses file bytes into an object graph and serializes it back.
pub trait PdfEngine: Send + Sync + fmt::Debug {
    /// Builds the graph for `bytes`. Fails with
    /// [`PdfError::InvalidPassword`](crate::PdfError::InvalidPassword) when
    /// the file is encrypted and no credential opens it.
    fn parse(&self, bytes: &[u8], password: Option<&str>) -> Result<Graph>;

    /// Produces a complete file for `graph`, encrypted with `encrypt` when set.
    fn serialize(&self, graph: &Graph, encrypt: Option<&EncryptOptions>) -> Result<Vec<u8>>;

    fn name(&self) -> &'static str;
}

/// The built-in engine: cross-reference tables and streams, object streams,
/// damaged-file recovery and the standard security handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for NativeEngine {
    #[tracing::instrument(level = "debug", skip(self, bytes, password), fields(len = bytes.len()))]
    fn parse(&self, bytes: &[u8], password: Option<&str>) -> Result<Graph> {
        reader::read_graph(bytes, password)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(objects = graph.len()))]
    fn serialize(&self, graph: &Graph, encrypt: Option<&EncryptOptions>) -> Result<Vec<u8>> {
        writer::write_graph(graph, encrypt)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
