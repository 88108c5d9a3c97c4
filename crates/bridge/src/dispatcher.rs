//! Dispatcher: tool name + arguments in, envelope out.

use std::sync::Arc;

use crm::CrmClient;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::args::Args;
use crate::registry::Registry;
use crate::schema::validate;
use crate::{Error, Result};

/// Uniform result of every invocation: `{ok, payload}` or `{ok, error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn success(payload: Value) -> Self {
        Self {
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Text sent to the host: the payload pretty-printed with two-space
    /// indentation, or the error message.
    pub fn text(&self) -> String {
        match (&self.payload, &self.error) {
            (_, Some(error)) => error.clone(),
            (Some(payload), None) => {
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
            }
            (None, None) => String::new(),
        }
    }

    pub fn into_call_result(self) -> CallToolResult {
        let content = vec![Content::text(self.text())];
        if self.ok {
            CallToolResult::success(content)
        } else {
            CallToolResult::error(content)
        }
    }
}

/// Name advertised in the initialize handshake.
pub const SERVER_NAME: &str = "crm-bridge";

/// Maps tool calls onto the CRM client.
///
/// Holds no per-call state; clones share the registry and the client.
#[derive(Clone)]
pub struct Dispatcher {
    client: CrmClient,
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(client: CrmClient) -> Self {
        Self::with_registry(client, Registry::new())
    }

    pub fn with_registry(client: CrmClient, registry: Registry) -> Self {
        Self {
            client,
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one tool call. Never fails: every error ends up in the envelope.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> Envelope {
        match self.try_dispatch(name, arguments).await {
            Ok(payload) => {
                info!(tool = name, "tool call succeeded");
                Envelope::success(payload)
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                Envelope::failure(e.to_string())
            }
        }
    }

    async fn try_dispatch(&self, name: &str, arguments: Value) -> Result<Value> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        let arguments = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => return Err(Error::invalid("arguments must be an object")),
        };
        validate(&entry.fields, &arguments).map_err(Error::InvalidArguments)?;

        (entry.handler)(self.client.clone(), Args::new(arguments)).await
    }

    /// [`dispatch`](Self::dispatch) on its own task, so a panicking handler
    /// still produces an envelope for its request.
    async fn dispatch_isolated(&self, name: &str, arguments: Value) -> Envelope {
        let this = self.clone();
        let tool = name.to_string();
        match tokio::spawn(async move { this.dispatch(&tool, arguments).await }).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(tool = name, error = %e, "tool call aborted");
                Envelope::failure(format!("internal error: {e}"))
            }
        }
    }
}

impl ServerHandler for Dispatcher {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some("Tools for the CRM API: contacts, tags, lists and more.".into()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.registry.descriptors()))
    }

    /// Never a protocol error: unknown tools and failed calls come back as
    /// results with `isError` set.
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        let envelope = self.dispatch_isolated(&request.name, arguments).await;
        Ok(envelope.into_call_result())
    }
}
