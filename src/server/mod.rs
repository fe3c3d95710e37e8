//! JSON-RPC Protocol Front-End
//!
//! Information Hiding:
//! - Wire framing (one JSON-RPC 2.0 message per line on stdio) internalized
//! - Tool-name routing (management tools vs. registered functions) hidden
//! - Registry mutation stays single-writer inside the server loop
//!
//! Speaks the MCP tool surface: `initialize`, `tools/list`, `tools/call`.
//! Registered functions are advertised as tools alongside the built-in
//! management tools (`register_function`, `delete_function`,
//! `list_functions`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::core::function::ExecutionOutcome;
use crate::core::orchestrator::Orchestrator;
use crate::registry::FunctionRegistry;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

pub struct McpServer {
    registry: FunctionRegistry,
    orchestrator: Orchestrator,
}

impl McpServer {
    pub fn new(registry: FunctionRegistry, orchestrator: Orchestrator) -> Self {
        Self {
            registry,
            orchestrator,
        }
    }

    /// Serve JSON-RPC over stdin/stdout until EOF.
    pub async fn run(mut self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        tracing::info!("Serving {} functions over stdio", self.registry.len());

        while let Some(line) = lines.next_line().await.context("Failed to read request")? {
            if line.trim().is_empty() {
                continue;
            }
            let response = match serde_json::from_str::<RpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => Some(RpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("parse error: {e}"),
                )),
            };
            if let Some(response) = response {
                let json = serde_json::to_string(&response)?;
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }

    /// Dispatch one request. Notifications (no id) get no response.
    pub async fn handle_request(&mut self, request: RpcRequest) -> Option<RpcResponse> {
        let id = request.id?;
        let response = match request.method.as_str() {
            "initialize" => RpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": { "listChanged": true } },
                    "serverInfo": {
                        "name": "toolsmith",
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            ),
            "tools/list" => RpcResponse::success(id, json!({ "tools": self.tool_listing() })),
            "tools/call" => self.handle_tool_call(id, request.params).await,
            "ping" => RpcResponse::success(id, json!({})),
            other => RpcResponse::failure(
                id,
                METHOD_NOT_FOUND,
                format!("method '{other}' not found"),
            ),
        };
        Some(response)
    }

    fn tool_listing(&self) -> Vec<Value> {
        let mut tools = management_tools();
        for definition in self.registry.list() {
            tools.push(json!({
                "name": definition.name,
                "description": definition.description,
                "inputSchema": definition.parameter_schema,
            }));
        }
        tools
    }

    async fn handle_tool_call(&mut self, id: Value, params: Value) -> RpcResponse {
        let name = match params.get("name").and_then(|n| n.as_str()) {
            Some(name) => name.to_string(),
            None => {
                return RpcResponse::failure(id, INVALID_PARAMS, "missing tool name");
            }
        };
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        match name.as_str() {
            "register_function" => match serde_json::from_value(arguments) {
                Ok(spec) => match self.registry.validate_and_register(spec).await {
                    Ok(definition) => tool_result(
                        id,
                        json!({
                            "registered": definition.name,
                            "language": definition.language,
                        }),
                        false,
                    ),
                    Err(e) => tool_result(id, json!({ "error": e.to_string() }), true),
                },
                Err(e) => {
                    RpcResponse::failure(id, INVALID_PARAMS, format!("invalid function spec: {e}"))
                }
            },
            "delete_function" => {
                let target = match arguments.get("name").and_then(|n| n.as_str()) {
                    Some(target) => target.to_string(),
                    None => {
                        return RpcResponse::failure(id, INVALID_PARAMS, "missing 'name' argument");
                    }
                };
                match self.registry.remove(&target).await {
                    Ok(removed) => tool_result(id, json!({ "deleted": removed }), false),
                    Err(e) => tool_result(id, json!({ "error": e.to_string() }), true),
                }
            }
            "list_functions" => {
                let functions: Vec<Value> = self
                    .registry
                    .list()
                    .into_iter()
                    .map(|d| {
                        json!({
                            "name": d.name,
                            "description": d.description,
                            "language": d.language,
                            "dependencies": d.dependencies,
                        })
                    })
                    .collect();
                tool_result(id, json!({ "functions": functions }), false)
            }
            _ => {
                let definition = match self.registry.get(&name) {
                    Some(definition) => definition.clone(),
                    None => {
                        return RpcResponse::failure(
                            id,
                            INVALID_PARAMS,
                            format!("unknown tool '{name}'"),
                        );
                    }
                };
                let outcome = self.orchestrator.execute(&definition, arguments).await;
                outcome_response(id, outcome)
            }
        }
    }
}

/// Render an execution outcome in MCP content form.
fn outcome_response(id: Value, outcome: ExecutionOutcome) -> RpcResponse {
    if outcome.is_error {
        let message = outcome.error.unwrap_or_else(|| "unknown error".to_string());
        tool_result(id, json!({ "error": message }), true)
    } else {
        tool_result(id, outcome.output.unwrap_or(Value::Null), false)
    }
}

fn tool_result(id: Value, payload: Value, is_error: bool) -> RpcResponse {
    let text = match &payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let mut result = json!({
        "content": [{ "type": "text", "text": text }],
    });
    if is_error {
        result["isError"] = json!(true);
    }
    RpcResponse::success(id, result)
}

fn management_tools() -> Vec<Value> {
    vec![
        json!({
            "name": "register_function",
            "description": "Register a new function written in python, javascript, typescript, bash, or ruby and expose it as a tool.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "language": { "type": "string" },
                    "inlineCode": { "type": "string" },
                    "codePath": { "type": "string" },
                    "entryPoint": { "type": "string" },
                    "parameterSchema": { "type": "object" },
                    "returnsDescription": { "type": "string" },
                    "dependencies": { "type": "array", "items": { "type": "string" } },
                    "timeoutMs": { "type": "number" }
                },
                "required": ["name", "description", "language", "parameterSchema"]
            }
        }),
        json!({
            "name": "delete_function",
            "description": "Delete a registered function and its stored source.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" }
                },
                "required": ["name"]
            }
        }),
        json!({
            "name": "list_functions",
            "description": "List all registered functions.",
            "inputSchema": { "type": "object", "properties": {} }
        }),
    ]
}
