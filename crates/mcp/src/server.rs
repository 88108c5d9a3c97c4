//! Serving an rmcp handler over newline-delimited stdio.

use rmcp::{ServerHandler, ServiceExt};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::framing::{MAX_MESSAGE_SIZE, forward_input, forward_output};

/// Serve `handler` on the process's stdin/stdout until stdin closes.
pub async fn serve_stdio<S: ServerHandler>(handler: S) -> Result<()> {
    serve(handler, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve `handler` to one host, one JSON-RPC message per line.
///
/// Inbound lines pass through the framing check before they reach the
/// session; everything written to `writer` goes through a single task. Returns
/// once the session ends, normally because `reader` hit EOF.
pub async fn serve<S, R, W>(handler: S, reader: R, writer: W) -> Result<()>
where
    S: ServerHandler,
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (local, session) = tokio::io::duplex(MAX_MESSAGE_SIZE);
    let (from_session, to_session) = tokio::io::split(local);
    let (reject_tx, reject_rx) = mpsc::unbounded_channel();

    let input = tokio::spawn(async move {
        if let Err(e) = forward_input(reader, to_session, reject_tx).await {
            warn!(error = %e, "input stopped");
        }
    });
    let output = tokio::spawn(forward_output(from_session, reject_rx, writer));

    info!("MCP server listening");
    let outcome = run_session(handler, session).await;

    input.abort();
    let written = output.await.map_err(|e| Error::Io(std::io::Error::other(e)))?;
    outcome?;
    written?;

    info!("MCP server stopped");
    Ok(())
}

async fn run_session<S: ServerHandler>(handler: S, io: DuplexStream) -> Result<()> {
    let service = handler
        .serve(io)
        .await
        .map_err(|e| Error::Initialize(e.to_string()))?;
    info!("MCP session initialized");

    let reason = service
        .waiting()
        .await
        .map_err(|e| Error::Session(e.to_string()))?;
    debug!(?reason, "MCP session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rmcp::ErrorData;
    use rmcp::model::{
        CallToolRequestParams, CallToolResult, Content, ErrorCode, Implementation,
        ListToolsResult, PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
        Tool,
    };
    use rmcp::service::{RequestContext, RoleServer};
    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf};
    use tokio::sync::Notify;
    use tokio::task::JoinHandle;

    const INITIALIZED: &[u8] = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

    #[derive(Default)]
    struct Stub {
        release: Notify,
    }

    impl ServerHandler for Stub {
        fn get_info(&self) -> ServerInfo {
            ServerInfo {
                protocol_version: ProtocolVersion::V_2024_11_05,
                capabilities: ServerCapabilities::builder().enable_tools().build(),
                server_info: Implementation {
                    name: "stub".into(),
                    version: "0.0.0".into(),
                    ..Default::default()
                },
                instructions: None,
            }
        }

        async fn list_tools(
            &self,
            _request: Option<PaginatedRequestParams>,
            _context: RequestContext<RoleServer>,
        ) -> std::result::Result<ListToolsResult, ErrorData> {
            let mut schema = serde_json::Map::new();
            schema.insert("type".into(), json!("object"));
            let echo = Tool::new("echo", "Echo arguments", schema);
            Ok(ListToolsResult::with_all_items(vec![echo]))
        }

        async fn call_tool(
            &self,
            request: CallToolRequestParams,
            _context: RequestContext<RoleServer>,
        ) -> std::result::Result<CallToolResult, ErrorData> {
            let text = match request.name.as_ref() {
                "echo" => Value::Object(request.arguments.unwrap_or_default()).to_string(),
                "wait" => {
                    self.release.notified().await;
                    "released".to_string()
                }
                "release" => {
                    self.release.notify_one();
                    "done".to_string()
                }
                other => {
                    let text = format!("tool not found: {other}");
                    return Ok(CallToolResult::error(vec![Content::text(text)]));
                }
            };
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
    }

    /// The host end of a served session.
    struct Host {
        input: WriteHalf<DuplexStream>,
        output: Lines<BufReader<ReadHalf<DuplexStream>>>,
        server: JoinHandle<Result<()>>,
    }

    impl Host {
        fn start() -> Self {
            let (host, server) = tokio::io::duplex(64 * 1024);
            let (server_read, server_write) = tokio::io::split(server);
            let server = tokio::spawn(serve(Stub::default(), server_read, server_write));
            let (read, write) = tokio::io::split(host);
            Self {
                input: write,
                output: BufReader::new(read).lines(),
                server,
            }
        }

        async fn initialized() -> (Self, Value) {
            let mut host = Self::start();
            let params = json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "host", "version": "1"},
            });
            host.send(&request(0, "initialize", params)).await;
            let response = host.recv().await;
            host.send(INITIALIZED).await;
            (host, response)
        }

        async fn send(&mut self, line: &[u8]) {
            self.input.write_all(line).await.unwrap();
            self.input.write_all(b"\n").await.unwrap();
        }

        async fn recv(&mut self) -> Value {
            let line = tokio::time::timeout(Duration::from_secs(5), self.output.next_line())
                .await
                .expect("no response within 5s")
                .unwrap()
                .expect("output closed");
            serde_json::from_str(&line).unwrap()
        }

        async fn recv_many(&mut self, count: usize) -> Vec<Value> {
            let mut responses = Vec::with_capacity(count);
            for _ in 0..count {
                responses.push(self.recv().await);
            }
            responses
        }

        async fn close(mut self) -> Result<()> {
            self.input.shutdown().await.unwrap();
            tokio::time::timeout(Duration::from_secs(5), self.server)
                .await
                .expect("server did not stop")
                .unwrap()
        }
    }

    fn by_id(responses: &[Value], id: Value) -> &Value {
        responses
            .iter()
            .find(|r| r["id"] == id)
            .unwrap_or_else(|| panic!("no response with id {id}"))
    }

    fn request(id: i64, method: &str, params: Value) -> Vec<u8> {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
            .to_string()
            .into_bytes()
    }

    #[tokio::test]
    async fn initialize_advertises_tools() {
        let (host, response) = Host::initialized().await;

        let result = &response["result"];
        assert_eq!(response["id"], 0);
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "stub");
        assert!(result["capabilities"]["tools"].is_object());

        host.close().await.unwrap();
    }

    #[tokio::test]
    async fn lists_and_calls_tools() {
        let (mut host, _) = Host::initialized().await;
        host.send(br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).await;
        host.send(&request(2, "tools/call", json!({"name": "echo", "arguments": {"a": 1}})))
            .await;
        host.send(&request(3, "tools/call", json!({"name": "missing"}))).await;
        let responses = host.recv_many(3).await;

        assert_eq!(by_id(&responses, json!(1))["result"]["tools"][0]["name"], "echo");

        let echo = &by_id(&responses, json!(2))["result"];
        assert_ne!(echo["isError"], true);
        assert_eq!(echo["content"][0]["text"], r#"{"a":1}"#);

        let missing = &by_id(&responses, json!(3))["result"];
        assert_eq!(missing["isError"], true);
        assert_eq!(missing["content"][0]["text"], "tool not found: missing");

        host.close().await.unwrap();
    }

    #[tokio::test]
    async fn undecodable_line_does_not_end_the_session() {
        let (mut host, _) = Host::initialized().await;
        host.send(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await;
        host.send(b"\xff\xfe garbage").await;
        host.send(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#).await;
        let responses = host.recv_many(3).await;

        assert_eq!(by_id(&responses, json!(1))["result"], json!({}));
        assert_eq!(by_id(&responses, json!(2))["result"], json!({}));
        let parse = by_id(&responses, Value::Null);
        assert_eq!(parse["error"]["code"], ErrorCode::PARSE_ERROR.0);

        host.close().await.unwrap();
    }

    #[tokio::test]
    async fn oversized_line_is_rejected_and_skipped() {
        let (mut host, _) = Host::initialized().await;
        let padding = "x".repeat(MAX_MESSAGE_SIZE);
        host.send(&request(7, "ping", json!({"padding": padding}))).await;
        host.send(br#"{"jsonrpc":"2.0","id":8,"method":"ping"}"#).await;
        let responses = host.recv_many(2).await;

        let rejected = by_id(&responses, Value::Null);
        assert_eq!(rejected["error"]["code"], ErrorCode::PARSE_ERROR.0);
        assert!(
            rejected["error"]["message"]
                .as_str()
                .unwrap()
                .starts_with("message too large")
        );
        assert_eq!(by_id(&responses, json!(8))["result"], json!({}));

        host.close().await.unwrap();
    }

    #[tokio::test]
    async fn protocol_errors_are_answered() {
        let (mut host, _) = Host::initialized().await;
        host.send(b"[1, 2]").await;
        host.send(br#"{"jsonrpc":"2.0","id":4,"method":"crm/unknown"}"#).await;
        host.send(br#"{"jsonrpc":"2.0","id":5,"method":"tools/call"}"#).await;
        host.send(br#"{"jsonrpc":"2.0","id":6,"method":"ping"}"#).await;
        let responses = host.recv_many(4).await;

        let invalid = by_id(&responses, Value::Null);
        assert_eq!(invalid["error"]["code"], ErrorCode::INVALID_REQUEST.0);
        let unknown = by_id(&responses, json!(4));
        assert_eq!(unknown["error"]["code"], ErrorCode::METHOD_NOT_FOUND.0);
        let bad_params = by_id(&responses, json!(5));
        assert_eq!(bad_params["error"]["code"], ErrorCode::INVALID_PARAMS.0);
        assert_eq!(by_id(&responses, json!(6))["result"], json!({}));

        host.close().await.unwrap();
    }

    #[tokio::test]
    async fn slow_call_does_not_block_others() {
        // "wait" only finishes once "release" runs, so sequential handling would hang.
        let (mut host, _) = Host::initialized().await;
        host.send(&request(1, "tools/call", json!({"name": "wait"}))).await;
        host.send(&request(2, "tools/call", json!({"name": "release"}))).await;
        let responses = host.recv_many(2).await;

        assert_eq!(by_id(&responses, json!(1))["result"]["content"][0]["text"], "released");
        assert_eq!(by_id(&responses, json!(2))["result"]["content"][0]["text"], "done");

        host.close().await.unwrap();
    }

    #[tokio::test]
    async fn eof_before_initialize_is_an_error() {
        let host = Host::start();
        let err = host.close().await.unwrap_err();
        assert!(matches!(err, Error::Initialize(_)));
    }
}
