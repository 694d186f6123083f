// Copyright (c) 2025-2026 the ctxpack contributors
// SPDX-License-Identifier: Apache-2.0

//! Line-delimited JSON-RPC 2.0 server.
//!
//! One request is read, handled to completion and answered before the next
//! line is read. Responses go to the writer, one JSON object per line;
//! diagnostics go through `tracing`.

pub mod prompts;
pub mod protocol;
pub mod tools;

use crate::llm::LLMClient;
use crate::packer::Ingestor;
use crate::session::Session;
use crate::utils::error::CtxpackError;
use protocol::{
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, Request, Response,
};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tools::ToolContext;

pub const SERVER_NAME: &str = "ctxpack";

/// Request loop state: the scan pipeline, the optional generation client and
/// the exclusively owned [`Session`].
pub struct Server {
    ingestor: Ingestor,
    client: Option<LLMClient>,
    session: Session,
    default_max_tokens: usize,
}

impl Server {
    pub fn new(ingestor: Ingestor, client: Option<LLMClient>, default_max_tokens: usize) -> Self {
        Self {
            ingestor,
            client,
            session: Session::new(),
            default_max_tokens,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn generation_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Serve until the reader reaches EOF.
    ///
    /// Malformed lines are answered with a parse error and the loop keeps
    /// going; only I/O failures end it early.
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<(), CtxpackError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            generation = self.generation_enabled(),
            model = self.client.as_ref().map_or("none", LLMClient::model),
            "Server ready"
        );

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one raw line. Returns `None` when no response is due.
    pub async fn handle_line(&mut self, line: &str) -> Option<Response> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "Unparseable request line");
                return Some(Response::error(Value::Null, PARSE_ERROR, "Parse error"));
            }
        };

        let id = value.get("id").cloned().filter(|id| !id.is_null());
        let request: Request = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Invalid request");
                return Some(Response::error(
                    id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    "Invalid Request",
                ));
            }
        };

        self.handle_request(request).await
    }

    pub async fn handle_request(&mut self, request: Request) -> Option<Response> {
        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "Notification");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => Response::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => Response::success(id, json!({})),
            "tools/list" => Response::success(
                id,
                json!({
                    "tools": tools::definitions(self.generation_enabled(), self.default_max_tokens)
                }),
            ),
            "tools/call" => self.call_tool(id, &request.params).await,
            other => {
                tracing::debug!(method = other, "Unknown method");
                Response::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };

        Some(response)
    }

    async fn call_tool(&mut self, id: Value, params: &Value) -> Response {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Response::from_error(id, &protocol::invalid_params("Missing tool name"));
        };
        let arguments = params.get("arguments").unwrap_or(&Value::Null);

        let ctx = ToolContext {
            ingestor: &self.ingestor,
            client: self.client.as_ref(),
            default_max_tokens: self.default_max_tokens,
        };

        match tools::call(&ctx, &mut self.session, name, arguments).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => Response::success(id, value),
                Err(e) => Response::from_error(id, &e.into()),
            },
            Err(err) => Response::from_error(id, &err),
        }
    }
}
