//! Structural edits on the object graph
//!
//! These work on a bare [`Graph`](crate::graph::Graph); the
//! [`Document`](crate::Document) methods wrap them with lifecycle checks
//! and page-count bookkeeping.

pub mod merge;
pub mod page_tree;

pub use merge::{append_document, GraphMerger};
pub use page_tree::remove_page;
