//! Model Context Protocol server exposing generation as the `sop_generate` tool.
//!
//! Transport is newline-delimited JSON-RPC 2.0 over stdio: one request per
//! line in, one response per line out, nothing else on stdout.

use crate::core::generate;
use crate::core::output;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub const SERVER_NAME: &str = "sop-engine";
/// Protocol version answered when the client does not state one.
pub const MCP_VERSION: &str = "2024-11-05";
pub const GENERATE_TOOL: &str = "sop_generate";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    #[serde(rename = "jsonrpc")]
    pub _jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub params: Option<Value>,
}

pub fn json_rpc_response(id: Option<Value>, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub fn json_rpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

fn tool_text(text: String, is_error: bool) -> Value {
    let mut result = json!({ "content": [{ "type": "text", "text": text }] });
    if is_error {
        result["isError"] = Value::Bool(true);
    }
    result
}

pub struct McpServer {
    /// Target used when `targetDir` is omitted; relative targets resolve against it.
    default_dir: PathBuf,
}

impl McpServer {
    pub fn new(default_dir: PathBuf) -> Self {
        Self { default_dir }
    }

    pub fn handle_line(&mut self, line: &str) -> Option<Value> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Some(json_rpc_error(
                    None,
                    PARSE_ERROR,
                    &format!("Parse error: {}", e),
                ));
            }
        };
        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request),
            Err(e) => Some(json_rpc_error(
                id,
                INVALID_REQUEST,
                &format!("Invalid request: {}", e),
            )),
        }
    }

    pub fn handle(&mut self, request: JsonRpcRequest) -> Option<Value> {
        let method = request.method.as_str();
        let expects_response = !matches!(request.id.as_ref(), None | Some(Value::Null));

        match method {
            "initialize" => {
                let protocol_version = request
                    .params
                    .as_ref()
                    .and_then(|v| v.get("protocolVersion"))
                    .and_then(|v| v.as_str())
                    .unwrap_or(MCP_VERSION);
                Some(json_rpc_response(
                    request.id,
                    json!({
                        "protocolVersion": protocol_version,
                        "serverInfo": {
                            "name": SERVER_NAME,
                            "version": env!("CARGO_PKG_VERSION")
                        },
                        "capabilities": { "tools": {} }
                    }),
                ))
            }
            "notifications/initialized" | "initialized" => None,
            "ping" => Some(json_rpc_response(request.id, json!({}))),
            "tools/list" => Some(json_rpc_response(
                request.id,
                json!({ "tools": [generate_tool_schema()] }),
            )),
            // Served with or without a prior initialized notification.
            "tools/call" => Some(json_rpc_response(
                request.id,
                self.call_tool(request.params.as_ref()),
            )),
            _ if expects_response => Some(json_rpc_error(
                request.id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", method),
            )),
            _ => None,
        }
    }

    fn call_tool(&self, params: Option<&Value>) -> Value {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if name != GENERATE_TOOL {
            return tool_text(format!("Unknown tool: {}", name), true);
        }

        let target = match params
            .and_then(|p| p.get("arguments"))
            .and_then(|a| a.get("targetDir"))
        {
            None | Some(Value::Null) => self.default_dir.clone(),
            Some(Value::String(dir)) if dir.is_empty() => self.default_dir.clone(),
            Some(Value::String(dir)) => self.default_dir.join(dir),
            Some(other) => {
                return tool_text(
                    format!("Error: targetDir must be a string, got {}", other),
                    true,
                );
            }
        };

        match generate::generate(&target) {
            Ok(outcome) => tool_text(output::render_plain(&outcome), false),
            Err(e) => tool_text(format!("Error: {}", e), true),
        }
    }
}

fn generate_tool_schema() -> Value {
    json!({
        "name": GENERATE_TOOL,
        "description": "Generate .claude/ directory with hooks, validators, and config for a target project, and reconcile its managed .mcp.json servers",
        "inputSchema": {
            "type": "object",
            "properties": {
                "targetDir": {
                    "type": "string",
                    "description": "Path to the target project directory (absolute or relative)"
                }
            },
            "required": ["targetDir"]
        }
    })
}

/// Serves requests from `reader` until EOF.
pub fn serve<R: BufRead, W: Write>(
    server: &mut McpServer,
    reader: R,
    mut writer: W,
) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = server.handle_line(&line) {
            writeln!(writer, "{}", response)?;
            writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn request(server: &mut McpServer, value: Value) -> Option<Value> {
        server.handle_line(&value.to_string())
    }

    #[test]
    fn test_initialize_echoes_protocol_version() {
        let mut server = McpServer::new(PathBuf::from("."));
        let resp = request(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2025-06-18"}}),
        )
        .unwrap();
        assert_eq!(resp["result"]["protocolVersion"], "2025-06-18");
        assert_eq!(resp["result"]["serverInfo"]["name"], SERVER_NAME);

        let none = request(
            &mut server,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        );
        assert!(none.is_none());
    }

    #[test]
    fn test_tools_list_advertises_generate() {
        let mut server = McpServer::new(PathBuf::from("."));
        let resp = request(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        )
        .unwrap();
        let tools = resp["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], GENERATE_TOOL);
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["targetDir"]));
    }

    #[test]
    fn test_tools_call_generates_relative_target() {
        let tmp = tempdir().unwrap();
        let mut server = McpServer::new(tmp.path().to_path_buf());
        let resp = request(
            &mut server,
            json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": GENERATE_TOOL, "arguments": {"targetDir": "app"}}
            }),
        )
        .unwrap();
        let result = &resp["result"];
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Done. .claude/ is ready."));
        assert!(!text.contains('\u{1b}'));
        assert!(tmp.path().join("app/.claude/settings.json").is_file());
        assert!(tmp.path().join("app/.mcp.json").is_file());
    }

    #[test]
    fn test_unknown_tool_is_tool_error() {
        let mut server = McpServer::new(PathBuf::from("."));
        let resp = request(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"name": "nope"}}),
        )
        .unwrap();
        assert_eq!(resp["result"]["isError"], true);
        assert_eq!(resp["result"]["content"][0]["text"], "Unknown tool: nope");
    }

    #[test]
    fn test_non_string_target_dir_is_tool_error() {
        let tmp = tempdir().unwrap();
        let mut server = McpServer::new(tmp.path().to_path_buf());
        let resp = request(
            &mut server,
            json!({
                "jsonrpc": "2.0", "id": 6, "method": "tools/call",
                "params": {"name": GENERATE_TOOL, "arguments": {"targetDir": 42}}
            }),
        )
        .unwrap();
        assert_eq!(resp["result"]["isError"], true);
        let text = resp["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: targetDir must be a string"));
        assert!(!tmp.path().join(".claude").exists());
        assert!(!tmp.path().join(".mcp.json").exists());
    }

    #[test]
    fn test_protocol_errors() {
        let mut server = McpServer::new(PathBuf::from("."));
        let parse = server.handle_line("{not json").unwrap();
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert!(parse["id"].is_null());

        let missing = request(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"}),
        )
        .unwrap();
        assert_eq!(missing["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(missing["id"], 5);

        let notification = request(&mut server, json!({"jsonrpc": "2.0", "method": "whatever"}));
        assert!(notification.is_none());
    }

    #[test]
    fn test_serve_loop_writes_one_line_per_response() {
        let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n{\"jsonrpc\":\"2.0\",\"method\":\"initialized\"}\n";
        let mut out = Vec::new();
        let mut server = McpServer::new(PathBuf::from("."));
        serve(&mut server, &input[..], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let resp: Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(resp["id"], 1);
    }
}
