//! Lifecycle state and configuration of a [`Document`](super::Document)

use std::fmt;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a document is in its load lifecycle.
///
/// `Unloaded -> Loading -> Ready` or `Loading -> Failed`. Both terminal
/// states are final for the document handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl LoadState {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadState::Unloaded => "Unloaded",
            LoadState::Loading => "Loading",
            LoadState::Ready => "Ready",
            LoadState::Failed => "Failed",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`Document::load`](super::Document::load)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadOptions {
    /// The caller may [`save`](super::Document::save) back to the source path.
    pub update_in_place: bool,
    /// Credential for protected files. Falls back to the password set on
    /// the document, then to the empty user password.
    pub password: Option<String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_in_place(mut self, update_in_place: bool) -> Self {
        self.update_in_place = update_in_place;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// How [`Document::save`](super::Document::save) treats the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Writes go to new destinations only.
    Clean,
    /// The source file may be replaced by `save()`.
    InPlace,
}

/// Result of a completed [`Document::write`](super::Document::write)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    File(PathBuf),
    Buffer(Vec<u8>),
}

impl WriteOutcome {
    /// The serialized bytes when no destination was given.
    pub fn into_buffer(self) -> Option<Vec<u8>> {
        match self {
            WriteOutcome::Buffer(bytes) => Some(bytes),
            WriteOutcome::File(_) => None,
        }
    }
}
