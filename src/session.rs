// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! The currently loaded codebase, owned by the request loop.

use crate::packer::{Ingestor, ScanResult, serialize};
use crate::utils::error::CtxpackError;
use std::path::{Path, PathBuf};

/// A scanned codebase together with its serialized context document.
#[derive(Debug, Clone)]
pub struct LoadedCodebase {
    /// The path as the caller supplied it.
    pub project_path: PathBuf,
    pub result: ScanResult,
    pub document: String,
}

/// Holds at most one [`LoadedCodebase`].
///
/// A new load replaces the previous codebase only after it fully succeeds.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<LoadedCodebase>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&LoadedCodebase> {
        self.current.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Scan `project_path`, serialize the selection and make it current.
    ///
    /// On error the previously loaded codebase stays in place untouched.
    pub fn load(
        &mut self,
        ingestor: &Ingestor,
        project_path: &Path,
        max_tokens: usize,
    ) -> Result<&LoadedCodebase, CtxpackError> {
        let result = ingestor.scan(project_path, max_tokens)?;
        let document = serialize(&result);

        let loaded = self.current.insert(LoadedCodebase {
            project_path: project_path.to_path_buf(),
            result,
            document,
        });
        Ok(loaded)
    }

    /// Build a generation prompt that carries the loaded document, or `None`
    /// when nothing is loaded.
    pub fn prompt_with_context(&self, query: &str) -> Option<String> {
        self.current
            .as_ref()
            .map(|loaded| format!("{}\n\n## USER QUERY:\n{query}", loaded.document))
    }
}
