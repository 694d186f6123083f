// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Tool catalogue and `tools/call` dispatch.

use super::prompts;
use super::protocol::{ToolResult, invalid_params};
use crate::llm::LLMClient;
use crate::packer::Ingestor;
use crate::session::{LoadedCodebase, Session};
use crate::utils::error::CtxpackError;
use crate::utils::formatting::format_number;
use serde_json::{Map, Value, json};
use std::fmt::Write as _;
use std::path::Path;

/// Prefix of every successful tool result.
pub const RESULT_PREFIX: &str = "CODEBASE ANALYSIS:\n\n";

pub const NO_CODEBASE: &str = "No codebase loaded. Use 'load_codebase' first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    LoadCodebase,
    AnalyzeArchitecture,
    SemanticSearch,
    SuggestImprovements,
    ExplainCodeflow,
    CodebaseSummary,
    AskWithContext,
}

impl Tool {
    pub const ALL: [Self; 7] = [
        Self::LoadCodebase,
        Self::AnalyzeArchitecture,
        Self::SemanticSearch,
        Self::SuggestImprovements,
        Self::ExplainCodeflow,
        Self::CodebaseSummary,
        Self::AskWithContext,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LoadCodebase => "load_codebase",
            Self::AnalyzeArchitecture => "analyze_architecture",
            Self::SemanticSearch => "semantic_search",
            Self::SuggestImprovements => "suggest_improvements",
            Self::ExplainCodeflow => "explain_codeflow",
            Self::CodebaseSummary => "codebase_summary",
            Self::AskWithContext => "ask_with_context",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::LoadCodebase => {
                "Load a codebase into the context window with relevance-based file prioritization"
            }
            Self::AnalyzeArchitecture => {
                "Get comprehensive architecture analysis of the loaded codebase"
            }
            Self::SemanticSearch => "Search the codebase semantically using natural language queries",
            Self::SuggestImprovements => {
                "Get specific improvement suggestions for the loaded codebase"
            }
            Self::ExplainCodeflow => {
                "Trace and explain how specific functionality works across the codebase"
            }
            Self::CodebaseSummary => "Get a comprehensive summary of the loaded codebase",
            Self::AskWithContext => "Ask any question with the full codebase as context",
        }
    }

    /// Sampling temperature for tools that call the generation provider.
    pub fn temperature(self) -> Option<f32> {
        match self {
            Self::LoadCodebase => None,
            Self::AnalyzeArchitecture | Self::SemanticSearch | Self::ExplainCodeflow => Some(0.2),
            Self::SuggestImprovements | Self::CodebaseSummary | Self::AskWithContext => Some(0.3),
        }
    }

    pub fn input_schema(self, default_max_tokens: usize) -> Value {
        match self {
            Self::LoadCodebase => json!({
                "type": "object",
                "properties": {
                    "project_path": {
                        "type": "string",
                        "description": "Path to the project directory to analyze"
                    },
                    "max_tokens": {
                        "type": "number",
                        "description": format!("Maximum tokens to use (default: {default_max_tokens})"),
                        "default": default_max_tokens
                    }
                },
                "required": ["project_path"]
            }),
            Self::AnalyzeArchitecture => json!({
                "type": "object",
                "properties": {
                    "focus": {
                        "type": "string",
                        "description": "Focus area: architecture, patterns, dependencies, structure, or custom query",
                        "default": "architecture"
                    }
                }
            }),
            Self::SemanticSearch => required_string("query", "Natural language description of what to find in the codebase"),
            Self::SuggestImprovements => json!({
                "type": "object",
                "properties": {
                    "area": {
                        "type": "string",
                        "description": "Focus area: performance, security, maintainability, testing, architecture, or general",
                        "default": "general"
                    }
                }
            }),
            Self::ExplainCodeflow => required_string(
                "functionality",
                "Describe the functionality to trace through the codebase",
            ),
            Self::CodebaseSummary => json!({"type": "object", "properties": {}}),
            Self::AskWithContext => required_string("question", "Your question about the codebase"),
        }
    }

    pub fn definition(self, default_max_tokens: usize) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(default_max_tokens),
        })
    }
}

fn required_string(name: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            name: {"type": "string", "description": description}
        },
        "required": [name]
    })
}

/// Tool definitions for `tools/list`. Only `load_codebase` is offered when no
/// generation provider is configured.
pub fn definitions(generation_enabled: bool, default_max_tokens: usize) -> Vec<Value> {
    Tool::ALL
        .into_iter()
        .filter(|tool| generation_enabled || *tool == Tool::LoadCodebase)
        .map(|tool| tool.definition(default_max_tokens))
        .collect()
}

/// Read-only collaborators a tool call may use.
pub struct ToolContext<'a> {
    pub ingestor: &'a Ingestor,
    pub client: Option<&'a LLMClient>,
    pub default_max_tokens: usize,
}

/// Execute one tool call against the session.
///
/// Argument problems are `-32602` protocol errors. Everything the caller can
/// act on (missing codebase, bad path, provider failure) comes back as an
/// `isError` tool result.
pub async fn call(
    ctx: &ToolContext<'_>,
    session: &mut Session,
    name: &str,
    arguments: &Value,
) -> Result<ToolResult, CtxpackError> {
    let tool = Tool::from_name(name).ok_or_else(|| invalid_params(format!("Unknown tool: {name}")))?;
    let empty = Map::new();
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(invalid_params("Tool arguments must be an object")),
    };

    tracing::debug!(tool = tool.name(), "Tool call");

    let query = match tool {
        Tool::LoadCodebase => return Ok(load_codebase(ctx, session, args)),
        Tool::AnalyzeArchitecture => {
            prompts::architecture(optional_string(args, "focus")?.unwrap_or("architecture"))
        }
        Tool::SemanticSearch => prompts::semantic_search(required_arg(args, "query")?),
        Tool::SuggestImprovements => {
            prompts::improvements(optional_string(args, "area")?.unwrap_or("general"))
        }
        Tool::ExplainCodeflow => prompts::codeflow(required_arg(args, "functionality")?),
        Tool::CodebaseSummary => prompts::SUMMARY.to_owned(),
        Tool::AskWithContext => required_arg(args, "question")?.to_owned(),
    };

    let Some(prompt) = session.prompt_with_context(&query) else {
        return Ok(ToolResult::error(NO_CODEBASE));
    };

    let Some(client) = ctx.client else {
        return Ok(ToolResult::error(
            "No generation provider configured. Set GEMINI_API_KEY and restart the server.",
        ));
    };

    let temperature = tool.temperature().unwrap_or(0.3);
    match client.generate(&prompt, temperature).await {
        Ok(text) => Ok(ToolResult::text(format!("{RESULT_PREFIX}{text}"))),
        Err(err) => {
            tracing::warn!(tool = tool.name(), error = %err, "Generation failed");
            Ok(ToolResult::error(format!("Error calling model: {err}")))
        }
    }
}

fn load_codebase(ctx: &ToolContext<'_>, session: &mut Session, args: &Map<String, Value>) -> ToolResult {
    let project_path = match args.get("project_path") {
        Some(Value::String(path)) if !path.trim().is_empty() => path.as_str(),
        _ => return ToolResult::error("Error: project_path is required"),
    };

    let max_tokens = match args.get("max_tokens") {
        None | Some(Value::Null) => ctx.default_max_tokens,
        Some(value) => match token_count(value) {
            Some(n) => n,
            None => {
                return ToolResult::error(format!(
                    "Error: max_tokens must be a non-negative integer, got {value}"
                ));
            }
        },
    };

    match session.load(ctx.ingestor, Path::new(project_path), max_tokens) {
        Ok(loaded) => ToolResult::text(format!(
            "{RESULT_PREFIX}{}",
            load_summary(loaded, ctx.client.is_some())
        )),
        Err(err) => {
            tracing::warn!(path = project_path, error = %err, "Load failed");
            ToolResult::error(format!("Error: {err}"))
        }
    }
}

/// Accepts integral JSON numbers, including `1000.0`.
fn token_count(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 {
        Some(f as usize)
    } else {
        None
    }
}

fn load_summary(loaded: &LoadedCodebase, generation_enabled: bool) -> String {
    let result = &loaded.result;
    let languages = result
        .language_breakdown()
        .into_iter()
        .map(|(lang, count)| format!("{lang}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::from("CODEBASE LOADED SUCCESSFULLY\n\n");
    let _ = writeln!(out, "**Project:** {}", result.root_path.display());
    let _ = writeln!(
        out,
        "**Files Loaded:** {} (from {} scanned)",
        result.selected_count(),
        result.scanned_count
    );
    let _ = writeln!(
        out,
        "**Tokens Used:** {} / {}",
        format_number(result.used_tokens),
        format_number(result.max_tokens)
    );
    let _ = writeln!(out, "**Languages:** {languages}");
    let _ = writeln!(out, "**Skipped:** {} files", result.skipped.len());
    out.push_str("**Prioritization:** Files ranked by relevance score\n\n");

    if generation_enabled {
        out.push_str("**Available Analysis Tools:**\n");
        for tool in Tool::ALL.into_iter().skip(1) {
            let _ = writeln!(out, "- `{}` - {}", tool.name(), tool.description());
        }
    } else {
        out.push_str("Analysis tools are unavailable: no generation provider is configured.\n");
    }

    out
}

fn required_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str, CtxpackError> {
    optional_string(args, name)?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| invalid_params(format!("Missing required argument: {name}")))
}

fn optional_string<'a>(
    args: &'a Map<String, Value>,
    name: &str,
) -> Result<Option<&'a str>, CtxpackError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(invalid_params(format!("Argument '{name}' must be a string"))),
    }
}
