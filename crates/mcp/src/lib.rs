//! MCP (Model Context Protocol) stdio server.
//!
//! This crate serves an [`rmcp::ServerHandler`] to an MCP host over stdio, one
//! JSON-RPC message per line. Sessions are run by the official rmcp SDK; the
//! framing layer in front of it caps line size and answers lines the SDK
//! cannot decode, so one bad message never ends the session.
//!
//! # Example
//!
//! ```no_run
//! use rmcp::ServerHandler;
//! use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
//!
//! struct Hello;
//!
//! impl ServerHandler for Hello {
//!     fn get_info(&self) -> ServerInfo {
//!         ServerInfo {
//!             protocol_version: ProtocolVersion::V_2024_11_05,
//!             capabilities: ServerCapabilities::builder().enable_tools().build(),
//!             server_info: Implementation {
//!                 name: "hello".into(),
//!                 version: "0.1.0".into(),
//!                 ..Default::default()
//!             },
//!             instructions: None,
//!         }
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! mcp::serve_stdio(Hello).await
//! # }
//! ```

mod error;
mod framing;
mod server;

pub use error::{Error, Result};
pub use framing::MAX_MESSAGE_SIZE;
pub use server::{serve, serve_stdio};
