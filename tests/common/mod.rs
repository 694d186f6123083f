//! Common test utilities and fixtures for integration tests.

#![allow(dead_code)]

use ctxpack::llm::tokenizer::EstimatingTokenizer;
use ctxpack::packer::{Ingestor, ScanRules, ScoringWeights};
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary directory for test fixtures.
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Creates a mock project structure for testing.
pub fn create_mock_project<C: AsRef<[u8]>>(dir: &TempDir, files: &[(&str, C)]) -> PathBuf {
    let root = dir.path().to_path_buf();

    for (path, content) in files {
        let file_path = root.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    root
}

/// Content that the estimating tokenizer counts as exactly `tokens` tokens.
pub fn content_of_tokens(tokens: usize) -> String {
    let line = "abc\n";
    line.repeat(tokens)
}

/// Ingestor with default rules and weights and the `bytes / 4` tokenizer,
/// so token counts are predictable from file sizes.
pub fn estimating_ingestor() -> Ingestor {
    Ingestor::new(
        ScanRules::default(),
        ScoringWeights::default(),
        Box::new(EstimatingTokenizer),
    )
}

/// A small Python service with tests, docs, config and dependency noise.
pub fn python_project_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "src/app.py",
            "from flask import Flask\n\napp = Flask(__name__)\n\n@app.route('/')\ndef index():\n    return 'ok'\n",
        ),
        (
            "src/models.py",
            "class User:\n    def __init__(self, name):\n        self.name = name\n",
        ),
        (
            "tests/test_app.py",
            "from src.app import app\n\ndef test_index():\n    assert app\n",
        ),
        ("docs/guide.md", "# Guide\n\nRun `python -m src.app`.\n"),
        ("config/settings.yaml", "debug: true\nport: 8080\n"),
        ("README.md", "# Demo service\n"),
        ("requirements.txt", "flask==3.0\n"),
        ("node_modules/left-pad/index.js", "module.exports = () => {};\n"),
        ("__pycache__/app.cpython-312.pyc", "binary"),
        (".env", "SECRET=1\n"),
        ("poetry.lock", "[[package]]\n"),
    ]
}
