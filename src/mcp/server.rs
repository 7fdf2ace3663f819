//! MCP server implementation.
//!
//! Reads one JSON-RPC message per line and writes one response per line.
//! Every `tools/call` runs on its own task so a long synchronous video
//! generation never blocks other requests; responses are written by a
//! single writer task in completion order.
//!
//! When input closes, synchronous waits are stopped and every call already
//! read is allowed to answer before the server returns.

use super::protocol::*;
use super::resources::{list_resources, read_resource};
use super::tools::{call_tool, get_tools};
use crate::orchestrator::Orchestrator;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
pub(crate) const SERVER_NAME: &str = "jimeng-mcp";
pub(crate) const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound on waiting for in-flight calls after input closes.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// A running tool call. `seq` is unique per server, so a finished call
/// only ever deregisters itself.
struct InFlightCall {
    seq: u64,
    handle: JoinHandle<()>,
}

/// In-flight tool calls keyed by the serialized request id.
type InFlight = Arc<Mutex<HashMap<String, InFlightCall>>>;

/// MCP Server for the Jimeng tools.
pub struct McpServer {
    orchestrator: Arc<Orchestrator>,
    in_flight: InFlight,
    next_seq: AtomicU64,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&self) -> anyhow::Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve requests from `reader` until it is closed.
    ///
    /// When the reader closes, synchronous waits stop polling and answer
    /// with a cancellation envelope; every call already read gets its
    /// response before this returns.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!(
            credentials = self.orchestrator.has_credentials(),
            "Jimeng MCP server starting"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcRequest>(line) {
                Ok(request) => self.dispatch(request, &tx),
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    let _ = tx.send(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"));
                }
            }
        }

        self.drain().await;
        drop(tx);
        writer_task.await??;

        info!("Input closed, server stopped");
        Ok(())
    }

    fn dispatch(&self, request: JsonRpcRequest, tx: &UnboundedSender<JsonRpcResponse>) {
        match request.method.as_str() {
            "tools/call" if !request.is_notification() => self.spawn_tool_call(request, tx.clone()),
            "notifications/cancelled" => self.handle_cancelled(request.params),
            _ => {
                if let Some(response) = self.handle_request(request) {
                    let _ = tx.send(response);
                }
            }
        }
    }

    /// Handle a request that completes without touching the backend.
    fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id, request.params),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => JsonRpcResponse::from_result(request.id, &ToolsListResult { tools: get_tools() }),
            "resources/list" => JsonRpcResponse::from_result(
                request.id,
                &ResourcesListResult {
                    resources: list_resources(),
                },
            ),
            "resources/read" => self.handle_resources_read(request.id, request.params),
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    /// Handle initialize request.
    fn handle_initialize(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        if let Some(params) = params.and_then(|p| serde_json::from_value::<InitializeParams>(p).ok()) {
            info!(
                client = ?params.client_info.as_ref().map(|c| c.name.as_str()),
                protocol = ?params.protocol_version,
                "Client connected"
            );
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ListChangedCapability { list_changed: false },
                resources: ListChangedCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    /// Handle resources/read request.
    fn handle_resources_read(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ReadResourceParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e)),
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        match read_resource(&params.uri, self.orchestrator.has_credentials()) {
            Some((text, mime_type)) => JsonRpcResponse::from_result(
                id,
                &ReadResourceResult {
                    contents: vec![ResourceContents {
                        uri: params.uri,
                        mime_type: mime_type.to_string(),
                        text,
                    }],
                },
            ),
            None => JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                &format!("Unknown resource: {}", params.uri),
            ),
        }
    }

    fn spawn_tool_call(&self, request: JsonRpcRequest, tx: UnboundedSender<JsonRpcResponse>) {
        let key = request_key(request.id.as_ref());

        // Hold the lock until the handle is registered so the task cannot
        // deregister itself first.
        let mut pending = lock(&self.in_flight);
        if pending.contains_key(&key) {
            warn!(request = %key, "Rejecting tool call: request id already in flight");
            let _ = tx.send(JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                &format!("Request id {} is already in use by a running call", key),
            ));
            return;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let orchestrator = self.orchestrator.clone();
        let in_flight = self.in_flight.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let response = handle_tools_call(&orchestrator, request.id, request.params).await;
            let mut pending = lock(&in_flight);
            if pending.get(&task_key).is_some_and(|call| call.seq == seq) {
                pending.remove(&task_key);
            }
            drop(pending);
            let _ = tx.send(response);
        });
        pending.insert(key, InFlightCall { seq, handle });
    }

    fn handle_cancelled(&self, params: Option<Value>) {
        let Some(params) = params.and_then(|p| serde_json::from_value::<CancelledParams>(p).ok()) else {
            warn!("Ignoring malformed cancellation");
            return;
        };

        let key = request_key(Some(&params.request_id));
        match lock(&self.in_flight).remove(&key) {
            Some(call) => {
                call.handle.abort();
                info!(request = %key, reason = ?params.reason, "Cancelled tool call");
            }
            None => debug!(request = %key, "Cancellation for unknown or finished request"),
        }
    }

    /// Stop synchronous waits, then let every call already read finish.
    async fn drain(&self) {
        self.orchestrator.shutdown();

        let mut pending: Vec<JoinHandle<()>> = lock(&self.in_flight)
            .drain()
            .map(|(_, call)| call.handle)
            .collect();
        if pending.is_empty() {
            return;
        }

        info!("Waiting for {} in-flight tool calls", pending.len());
        let finished = tokio::time::timeout(DRAIN_TIMEOUT, async {
            for handle in pending.iter_mut() {
                let _ = handle.await;
            }
        })
        .await;

        if finished.is_err() {
            warn!("Aborting tool calls still running after {:?}", DRAIN_TIMEOUT);
            for handle in &pending {
                handle.abort();
            }
        }
    }
}

/// Handle tools/call request.
async fn handle_tools_call(
    orchestrator: &Orchestrator,
    id: Option<Value>,
    params: Option<Value>,
) -> JsonRpcResponse {
    let params: ToolCallParams = match params {
        Some(p) => match serde_json::from_value(p) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e))
            }
        },
        None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
    };

    info!(tool = %params.name, "Tool call");
    let result = call_tool(orchestrator, &params.name, params.arguments).await;
    JsonRpcResponse::from_result(id, &result)
}

async fn write_responses<W>(mut writer: W, mut rx: UnboundedReceiver<JsonRpcResponse>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_string(&response)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

fn request_key(id: Option<&Value>) -> String {
    id.map(Value::to_string).unwrap_or_default()
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, InFlightCall>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, Settings};
    use crate::generation::TaskResult;
    use crate::jimeng::testing::ScriptedApi;
    use std::time::Duration;
    use tokio::io::{DuplexStream, Lines};

    struct Harness {
        input: DuplexStream,
        output: Lines<BufReader<DuplexStream>>,
        server: tokio::task::JoinHandle<anyhow::Result<()>>,
    }

    impl Harness {
        fn start(api: Arc<ScriptedApi>, settings: Settings) -> Self {
            let creds = Credentials::new(Some("ak".into()), Some("sk".into()));
            Self::start_with(api, settings, creds)
        }

        fn start_with(api: Arc<ScriptedApi>, settings: Settings, creds: Option<Credentials>) -> Self {
            let server = McpServer::new(Orchestrator::with_api(settings, creds, api));

            let (input, server_in) = tokio::io::duplex(64 * 1024);
            let (server_out, output) = tokio::io::duplex(64 * 1024);
            let server = tokio::spawn(async move { server.serve(BufReader::new(server_in), server_out).await });

            Self {
                input,
                output: BufReader::new(output).lines(),
                server,
            }
        }

        async fn send(&mut self, message: Value) {
            let mut line = message.to_string();
            line.push('\n');
            self.input.write_all(line.as_bytes()).await.unwrap();
        }

        async fn recv(&mut self) -> Value {
            let line = tokio::time::timeout(Duration::from_secs(5), self.output.next_line())
                .await
                .expect("response in time")
                .unwrap()
                .expect("line available");
            serde_json::from_str(&line).unwrap()
        }

        /// Close the server's input but keep reading its output.
        async fn close_input(&mut self) {
            self.input.shutdown().await.unwrap();
        }

        async fn shutdown(self) {
            drop(self.input);
            self.server.await.unwrap().unwrap();
        }
    }

    fn generating() -> TaskResult {
        TaskResult {
            status: "generating".to_string(),
            ..TaskResult::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_and_lists() {
        let mut h = Harness::start(Arc::new(ScriptedApi::new()), Settings::default());

        h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "0"}
        }}))
        .await;
        let init = h.recv().await;
        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["serverInfo"]["name"], "jimeng-mcp");
        assert!(init["result"]["capabilities"]["resources"].is_object());

        h.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).await;
        h.send(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let tools = h.recv().await;
        assert_eq!(tools["id"], 2);
        assert_eq!(tools["result"]["tools"].as_array().unwrap().len(), 4);

        h.send(json!({"jsonrpc": "2.0", "id": 3, "method": "resources/read", "params": {"uri": "info://server"}})).await;
        let info = h.recv().await;
        assert!(info["result"]["contents"][0]["text"]
            .as_str()
            .unwrap()
            .contains("credentials configured"));

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let mut h = Harness::start(Arc::new(ScriptedApi::new()), Settings::default());

        h.input.write_all(b"{not json\n").await.unwrap();
        let parse = h.recv().await;
        assert_eq!(parse["error"]["code"], PARSE_ERROR);

        h.send(json!({"jsonrpc": "2.0", "id": 9, "method": "prompts/list"})).await;
        let missing = h.recv().await;
        assert_eq!(missing["error"]["code"], METHOD_NOT_FOUND);

        h.send(json!({"jsonrpc": "2.0", "id": 10, "method": "tools/call"})).await;
        let invalid = h.recv().await;
        assert_eq!(invalid["error"]["code"], INVALID_PARAMS);

        h.shutdown().await;
    }

    #[tokio::test]
    async fn test_sync_call_does_not_block_other_calls_and_can_be_cancelled() {
        let api = Arc::new(ScriptedApi::new().with_default_status(Ok(generating())));
        let mut settings = Settings::default();
        settings.video.poll_interval_secs = 1;
        settings.video.max_wait_secs = 600;
        let mut h = Harness::start(api.clone(), settings);

        h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {
            "name": "generate-video",
            "arguments": {"prompt": "a panda", "async": false}
        }}))
        .await;
        h.send(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {
            "name": "get-video-task",
            "arguments": {"task_id": "other"}
        }}))
        .await;

        let first = h.recv().await;
        assert_eq!(first["id"], 2);
        let body: Value =
            serde_json::from_str(first["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["status"], "pending");

        h.send(json!({"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {
            "requestId": 1,
            "reason": "user aborted"
        }}))
        .await;
        h.send(json!({"jsonrpc": "2.0", "id": 3, "method": "ping"})).await;
        assert_eq!(h.recv().await["id"], 3);

        let calls = api.status_calls();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(api.status_calls(), calls);
        assert_eq!(api.submit_calls(), 1);

        h.shutdown().await;
    }

    fn envelope_of(response: &Value) -> Value {
        serde_json::from_str(response["result"]["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_closing_input_ends_sync_wait_with_response() {
        let api = Arc::new(ScriptedApi::new().with_default_status(Ok(generating())));
        let mut settings = Settings::default();
        settings.video.poll_interval_secs = 1;
        settings.video.max_wait_secs = 600;
        let mut h = Harness::start(api.clone(), settings);

        h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {
            "name": "generate-video",
            "arguments": {"prompt": "a panda", "intent_sync": true}
        }}))
        .await;
        h.send(json!({"jsonrpc": "2.0", "id": 2, "method": "ping"})).await;
        assert_eq!(h.recv().await["id"], 2);

        h.close_input().await;
        let response = h.recv().await;
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["isError"], true);
        let body = envelope_of(&response);
        assert_eq!(body["message"], "Video generation cancelled");
        assert_eq!(body["task_id"], "task-default");

        tokio::time::timeout(Duration::from_secs(5), h.shutdown())
            .await
            .expect("server stops once input closes");

        let calls = api.status_calls();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(api.status_calls(), calls);
    }

    #[tokio::test]
    async fn test_calls_read_before_eof_all_answer() {
        for _ in 0..20 {
            let api = Arc::new(ScriptedApi::new());
            let mut h = Harness::start_with(api.clone(), Settings::default(), None);

            for id in 0..5 {
                h.send(json!({"jsonrpc": "2.0", "id": id, "method": "tools/call", "params": {
                    "name": "submit-video-task",
                    "arguments": {"prompt": "a white piglet running on the beach"}
                }}))
                .await;
            }
            h.close_input().await;

            let mut ids = Vec::new();
            for _ in 0..5 {
                let response = h.recv().await;
                assert_eq!(envelope_of(&response)["message"], "API key not configured");
                ids.push(response["id"].as_i64().unwrap());
            }
            ids.sort_unstable();
            assert_eq!(ids, vec![0, 1, 2, 3, 4]);
            assert_eq!(api.total_calls(), 0);

            h.shutdown().await;
        }
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_id_is_rejected() {
        let api = Arc::new(ScriptedApi::new().with_default_status(Ok(generating())));
        let mut settings = Settings::default();
        settings.video.poll_interval_secs = 1;
        settings.video.max_wait_secs = 600;
        let mut h = Harness::start(api.clone(), settings);

        let sync_call = json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {
            "name": "generate-video",
            "arguments": {"prompt": "a panda", "async": false}
        }});
        h.send(sync_call.clone()).await;
        h.send(sync_call).await;

        let rejected = h.recv().await;
        assert_eq!(rejected["id"], 7);
        assert_eq!(rejected["error"]["code"], INVALID_REQUEST);
        assert_eq!(api.submit_calls(), 1);

        h.send(json!({"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {"requestId": 7}}))
            .await;
        h.send(json!({"jsonrpc": "2.0", "id": 8, "method": "ping"})).await;
        assert_eq!(h.recv().await["id"], 8);

        let calls = api.status_calls();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(api.status_calls(), calls);

        h.shutdown().await;
    }
}
