//! Tool registry and dispatcher for the CRM bridge.
//!
//! The [`Registry`] is a static catalog of tools, each pairing an input
//! schema with a handler that calls exactly one [`crm::CrmClient`] method.
//! The [`Dispatcher`] looks tools up, validates arguments, runs the handler
//! and wraps whatever happens in an [`Envelope`]. It also implements
//! [`rmcp::ServerHandler`], so it can be served directly.
//!
//! # Example
//!
//! ```no_run
//! use bridge::Dispatcher;
//! use crm::{CrmClient, Credentials, DEFAULT_TIMEOUT};
//!
//! # async fn example() -> crm::Result<()> {
//! let creds = Credentials::new("https://crm.example.com/api/v1", "user", "secret");
//! let dispatcher = Dispatcher::new(CrmClient::connect(&creds, DEFAULT_TIMEOUT)?);
//!
//! let envelope = dispatcher.dispatch("crm_list_tags", serde_json::json!({})).await;
//! println!("{}", envelope.text());
//! # Ok(())
//! # }
//! ```

mod args;
mod catalog;
mod dispatcher;
mod error;
mod registry;
mod schema;

pub use args::Args;
pub use catalog::{Category, Handler, HandlerFuture, ToolEntry};
pub use dispatcher::{Dispatcher, Envelope, SERVER_NAME};
pub use error::{Error, Result};
pub use registry::Registry;
pub use schema::{Field, FieldKind, to_json_schema, validate};
