//! In-memory transport for tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method};
use crate::{Error, Result};

#[derive(Default)]
struct State {
    requests: Vec<ApiRequest>,
    routes: Vec<(Method, String, ApiResponse)>,
    fallback: Option<ApiResponse>,
    failure: Option<String>,
}

/// Records every request and replays canned responses.
///
/// Clones share state, so a test can keep one handle while the client owns
/// another. Without configuration every request gets `200 {}`.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every unrouted request with `status` and `body`.
    pub fn respond_with(self, status: u16, body: Value) -> Self {
        self.lock().fallback = Some(ApiResponse::new(status, body.to_string()));
        self
    }

    /// Answer every unrouted request with a raw body.
    pub fn respond_raw(self, status: u16, body: impl Into<String>) -> Self {
        self.lock().fallback = Some(ApiResponse::new(status, body));
        self
    }

    /// Answer `method path` with `status` and `body`.
    pub fn route(self, method: Method, path: impl Into<String>, status: u16, body: Value) -> Self {
        self.lock()
            .routes
            .push((method, path.into(), ApiResponse::new(status, body.to_string())));
        self
    }

    /// Fail every request as if the network were unreachable.
    pub fn fail_with(self, message: impl Into<String>) -> Self {
        self.lock().failure = Some(message.into());
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.lock().requests.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the recorded requests.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        if let Some(message) = &state.failure {
            return Err(Error::Transport(message.clone()));
        }

        let routed = state
            .routes
            .iter()
            .find(|(method, path, _)| *method == request.method && *path == request.path)
            .map(|(_, _, response)| response.clone());

        Ok(routed
            .or_else(|| state.fallback.clone())
            .unwrap_or_else(|| ApiResponse::new(200, "{}")))
    }
}
