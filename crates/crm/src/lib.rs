//! Client for the marketing-CRM REST API.
//!
//! Every operation issues exactly one HTTP request through an
//! [`HttpTransport`] and passes the response through a single normalization
//! step, so success bodies come back unmodified and every failure has the
//! same [`Error`] shape.
//!
//! # Example
//!
//! ```no_run
//! use crm::{CrmClient, Credentials, DEFAULT_TIMEOUT};
//!
//! # async fn example() -> crm::Result<()> {
//! let creds = Credentials::new("https://crm.example.com/api/v1", "user", "secret");
//! let client = CrmClient::connect(&creds, DEFAULT_TIMEOUT)?;
//!
//! let tags = client.list_tags(Vec::new()).await?;
//! println!("{tags}");
//! # Ok(())
//! # }
//! ```

mod client;
mod credentials;
mod entity;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod transport;

pub use client::{
    CampaignStatus, CrmClient, SMART_LINKS_SUGGESTION, SMART_LINKS_UNAVAILABLE, normalize,
};
pub use credentials::Credentials;
pub use entity::Entity;
pub use error::{Error, Result};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
pub use transport::{
    ApiRequest, ApiResponse, DEFAULT_TIMEOUT, HttpTransport, Method, Query, ReqwestTransport,
};
