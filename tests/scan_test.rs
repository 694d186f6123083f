//! End-to-end tests for scanning, budgeted selection and serialization.

mod common;

use common::{content_of_tokens, create_mock_project, create_temp_dir, estimating_ingestor};
use ctxpack::packer::{SkipReason, serialize};
use ctxpack::session::Session;
use std::collections::BTreeSet;

fn selected_paths(result: &ctxpack::packer::ScanResult) -> Vec<&str> {
    result
        .selected_files
        .iter()
        .map(|f| f.relative_path.as_str())
        .collect()
}

fn scenario_files() -> Vec<(&'static str, String)> {
    vec![
        ("src/app.py", content_of_tokens(800)),
        ("tests/test_app.py", content_of_tokens(800)),
        ("README.md", content_of_tokens(200)),
    ]
}

#[test]
fn test_concrete_scenario_single_file_fits() {
    let dir = create_temp_dir();
    let root = create_mock_project(&dir, &scenario_files());

    let result = estimating_ingestor().scan(&root, 999).unwrap();

    assert_eq!(selected_paths(&result), ["src/app.py"]);
    assert_eq!(result.used_tokens, 800);
    assert_eq!(result.scanned_count, 3);
    assert_eq!(result.excluded_by_budget(), 2);
}

#[test]
fn test_concrete_scenario_exact_budget_admits_readme() {
    let dir = create_temp_dir();
    let root = create_mock_project(&dir, &scenario_files());

    let result = estimating_ingestor().scan(&root, 1000).unwrap();

    // README.md (score 1.0) ranks above tests/test_app.py (0.588) and fills
    // the budget exactly
    assert_eq!(selected_paths(&result), ["src/app.py", "README.md"]);
    assert_eq!(result.used_tokens, 1000);
    assert_eq!(result.scanned_count, 3);
}

#[test]
fn test_scoring_monotonicity() {
    let dir = create_temp_dir();
    let root = create_mock_project(
        &dir,
        &[
            ("tests/test_foo.py", content_of_tokens(500)),
            ("src/main.py", content_of_tokens(500)),
        ],
    );

    let result = estimating_ingestor().scan(&root, 10_000).unwrap();
    assert_eq!(selected_paths(&result), ["src/main.py", "tests/test_foo.py"]);
}

#[test]
fn test_greedy_cut_excludes_everything_after_first_miss() {
    let dir = create_temp_dir();
    let root = create_mock_project(
        &dir,
        &[
            // python 1.2 * src 1.3 * entry 1.5
            ("src/main.py", content_of_tokens(600)),
            // python 1.2 * src 1.3
            ("src/big.py", content_of_tokens(600)),
            // markdown, tiny: 1.1
            ("NOTES.md", content_of_tokens(10)),
        ],
    );

    let result = estimating_ingestor().scan(&root, 1000).unwrap();
    assert_eq!(selected_paths(&result), ["src/main.py"]);
    assert_eq!(result.scanned_count, 3);
}

#[test]
fn test_filter_completeness() {
    let dir = create_temp_dir();
    let root = create_mock_project(&dir, &common::python_project_files());

    let result = estimating_ingestor().scan(&root, 900_000).unwrap();

    let selected: BTreeSet<_> = selected_paths(&result).into_iter().collect();
    let expected: BTreeSet<_> = [
        "src/app.py",
        "src/models.py",
        "tests/test_app.py",
        "docs/guide.md",
        "config/settings.yaml",
        "README.md",
    ]
    .into_iter()
    .collect();
    assert_eq!(selected, expected);
    assert_eq!(result.scanned_count, 6);

    let reason = |path: &str| {
        result
            .skipped
            .iter()
            .find(|s| s.relative_path == path)
            .map(|s| s.reason.clone())
    };
    assert_eq!(reason(".env"), Some(SkipReason::Hidden));
    assert_eq!(reason("requirements.txt"), Some(SkipReason::UnsupportedExtension));
    assert_eq!(
        reason("poetry.lock"),
        Some(SkipReason::DeniedPattern("*.lock".into()))
    );
    assert_eq!(
        reason("node_modules"),
        Some(SkipReason::DeniedPattern("node_modules".into()))
    );
    assert_eq!(
        reason("__pycache__"),
        Some(SkipReason::DeniedPattern("__pycache__".into()))
    );
}

#[test]
fn test_selected_files_are_unique_and_ranked() {
    let dir = create_temp_dir();
    let root = create_mock_project(&dir, &common::python_project_files());

    let result = estimating_ingestor().scan(&root, 900_000).unwrap();

    let unique: BTreeSet<_> = selected_paths(&result).into_iter().collect();
    assert_eq!(unique.len(), result.selected_count());
    for pair in result.selected_files.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }
    assert_eq!(result.selected_files[0].relative_path, "src/app.py");
}

#[test]
fn test_rescan_is_deterministic() {
    let dir = create_temp_dir();
    let root = create_mock_project(&dir, &common::python_project_files());
    let ingestor = estimating_ingestor();

    let first = serialize(&ingestor.scan(&root, 900_000).unwrap());
    let second = serialize(&ingestor.scan(&root, 900_000).unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_document_lists_each_selected_file_once_in_tree_order() {
    let dir = create_temp_dir();
    let root = create_mock_project(&dir, &common::python_project_files());

    let result = estimating_ingestor().scan(&root, 900_000).unwrap();
    let document = serialize(&result);

    let tree: Vec<_> = document
        .lines()
        .skip_while(|line| *line != "### File Tree:")
        .skip(1)
        .take_while(|line| !line.is_empty())
        .map(|line| {
            let rest = line.strip_prefix("- ").unwrap();
            rest.split(" (").next().unwrap()
        })
        .collect();

    let contents: Vec<_> = document
        .lines()
        .filter_map(|line| line.strip_prefix("### \u{1f4c1} "))
        .map(|rest| rest.split(" (").next().unwrap())
        .collect();

    assert_eq!(tree, selected_paths(&result));
    assert_eq!(contents, tree);
}

#[test]
fn test_missing_path_leaves_session_unchanged() {
    let dir = create_temp_dir();
    let root = create_mock_project(&dir, &scenario_files());
    let ingestor = estimating_ingestor();

    let mut session = Session::new();
    session.load(&ingestor, &root, 999).unwrap();
    let before = session.current().unwrap().document.clone();
    let before_used = session.current().unwrap().result.used_tokens;

    let err = session
        .load(&ingestor, &root.join("does-not-exist"), 999)
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    let after = session.current().unwrap();
    assert_eq!(after.document, before);
    assert_eq!(after.result.used_tokens, before_used);
}

#[test]
fn test_oversized_file_never_starves_selection() {
    let dir = create_temp_dir();
    let root = create_mock_project(
        &dir,
        &[
            ("src/main.py", content_of_tokens(50_001)),
            ("src/util.py", content_of_tokens(100)),
        ],
    );

    let result = estimating_ingestor().scan(&root, 900_000).unwrap();
    assert_eq!(selected_paths(&result), ["src/util.py"]);
    assert!(result.skipped.iter().any(|s| s.relative_path == "src/main.py"
        && matches!(s.reason, SkipReason::TooLarge { tokens: 50_001, limit: 50_000 })));
}

#[test]
fn test_file_at_ceiling_is_kept() {
    let dir = create_temp_dir();
    let root = create_mock_project(&dir, &[("src/gen.py", content_of_tokens(50_000))]);

    let result = estimating_ingestor().scan(&root, 900_000).unwrap();
    assert_eq!(result.selected_count(), 1);
    assert_eq!(result.used_tokens, 50_000);
}
