//! Line framing in front of the rmcp session.
//!
//! rmcp closes the session on the first line it cannot decode, so every
//! inbound line is read with a size cap and checked here first. Lines the
//! session would choke on are answered with a JSON-RPC error instead of being
//! forwarded.

use std::io;

use rmcp::model::{ClientJsonRpcMessage, ErrorCode};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Maximum inbound message size (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Methods this server answers. A request for one of these that does not
/// decode has bad params; any other method is unknown.
const SERVED_METHODS: &[&str] = &["initialize", "ping", "tools/list", "tools/call"];

/// One inbound line, or the size of a line that was too long to keep.
#[derive(Debug, PartialEq)]
pub(crate) enum Frame {
    Line(Vec<u8>),
    Oversized(usize),
}

/// Reads newline-delimited frames without ever buffering more than
/// `MAX_MESSAGE_SIZE + 1` bytes of a single line.
pub(crate) struct FrameReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
        }
    }

    /// Next frame with surrounding whitespace trimmed, or `None` at EOF.
    pub(crate) async fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        let mut buf = Vec::new();
        let limit = MAX_MESSAGE_SIZE as u64 + 1;
        let read = (&mut self.inner).take(limit).read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(None);
        }

        if buf.last() != Some(&b'\n') && buf.len() > MAX_MESSAGE_SIZE {
            let skipped = buf.len() + self.discard_line().await?;
            return Ok(Some(Frame::Oversized(skipped)));
        }

        let line = buf.trim_ascii();
        Ok(Some(Frame::Line(line.to_vec())))
    }

    /// Drop input up to and including the next newline.
    async fn discard_line(&mut self) -> io::Result<usize> {
        let mut skipped = 0;
        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                return Ok(skipped);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.inner.consume(end + 1);
                    return Ok(skipped + end + 1);
                }
                None => {
                    let len = available.len();
                    self.inner.consume(len);
                    skipped += len;
                }
            }
        }
    }
}

/// A JSON-RPC error written back in place of forwarding a line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rejection {
    pub id: Value,
    pub code: i32,
    pub message: String,
}

impl Rejection {
    fn new(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            id,
            code: code.0,
            message: message.into(),
        }
    }

    fn parse(message: impl Into<String>) -> Self {
        Self::new(Value::Null, ErrorCode::PARSE_ERROR, message)
    }

    pub(crate) fn to_line(&self) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": self.id,
            "error": { "code": self.code, "message": self.message },
        })
        .to_string()
    }
}

/// `Ok` when the session can decode `line`.
///
/// `Err(None)` marks a notification the session cannot decode; those are
/// dropped, never answered.
pub(crate) fn check(line: &[u8]) -> Result<(), Option<Rejection>> {
    let value: Value = serde_json::from_slice(line)
        .map_err(|e| Some(Rejection::parse(format!("parse error: {e}"))))?;
    let Value::Object(message) = &value else {
        return Err(Some(Rejection::new(
            Value::Null,
            ErrorCode::INVALID_REQUEST,
            "invalid request: expected a JSON object",
        )));
    };

    let id = message
        .get("id")
        .filter(|id| id.is_string() || id.is_number())
        .cloned();
    let method = message.get("method").and_then(Value::as_str).map(str::to_owned);

    if message.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Err(Some(Rejection::new(
            id.unwrap_or(Value::Null),
            ErrorCode::INVALID_REQUEST,
            "invalid request: jsonrpc must be \"2.0\"",
        )));
    }
    if let (Some("tools/call"), Some(id)) = (method.as_deref(), &id) {
        if let Err(problem) = check_call_params(message.get("params")) {
            return Err(Some(Rejection::new(
                id.clone(),
                ErrorCode::INVALID_PARAMS,
                format!("invalid params: {problem}"),
            )));
        }
    }

    let Err(decode_error) = serde_json::from_value::<ClientJsonRpcMessage>(value) else {
        return Ok(());
    };
    match (method, id) {
        (Some(method), None) => {
            debug!(%method, error = %decode_error, "dropping undecodable notification");
            Err(None)
        }
        (Some(method), Some(id)) if SERVED_METHODS.contains(&method.as_str()) => {
            Err(Some(Rejection::new(
                id,
                ErrorCode::INVALID_PARAMS,
                format!("invalid params: {decode_error}"),
            )))
        }
        (Some(method), Some(id)) => Err(Some(Rejection::new(
            id,
            ErrorCode::METHOD_NOT_FOUND,
            format!("method not found: {method}"),
        ))),
        (None, id) => Err(Some(Rejection::new(
            id.unwrap_or(Value::Null),
            ErrorCode::INVALID_REQUEST,
            format!("invalid request: {decode_error}"),
        ))),
    }
}

/// `tools/call` params carry the tool name and an optional argument object.
fn check_call_params(params: Option<&Value>) -> Result<(), &'static str> {
    let Some(Value::Object(params)) = params else {
        return Err("expected an object with a tool name");
    };
    if !params.get("name").is_some_and(Value::is_string) {
        return Err("name must be a string");
    }
    match params.get("arguments") {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err("arguments must be an object"),
    }
}

/// Copy checked lines from `reader` into the session, sending rejections to
/// the writer. Shuts the session input down at EOF.
pub(crate) async fn forward_input<R, W>(
    reader: R,
    mut session: W,
    rejections: mpsc::UnboundedSender<Rejection>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frames = FrameReader::new(reader);

    while let Some(frame) = frames.next_frame().await? {
        let rejection = match frame {
            Frame::Line(line) if line.is_empty() => continue,
            Frame::Line(line) => match check(&line) {
                Ok(()) => {
                    session.write_all(&line).await?;
                    session.write_all(b"\n").await?;
                    session.flush().await?;
                    continue;
                }
                Err(None) => continue,
                Err(Some(rejection)) => rejection,
            },
            Frame::Oversized(size) => Rejection::parse(format!(
                "message too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
            )),
        };

        warn!(code = rejection.code, message = %rejection.message, "rejected inbound message");
        if rejections.send(rejection).is_err() {
            break;
        }
    }

    debug!("input closed");
    session.shutdown().await
}

/// Single writer: session output and rejections, one line at a time.
pub(crate) async fn forward_output<R, W>(
    session: R,
    mut rejections: mpsc::UnboundedReceiver<Rejection>,
    mut writer: W,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(session).lines();
    let mut session_open = true;
    let mut rejections_open = true;

    while session_open || rejections_open {
        let line = tokio::select! {
            line = lines.next_line(), if session_open => match line? {
                Some(line) => line,
                None => {
                    session_open = false;
                    continue;
                }
            },
            rejection = rejections.recv(), if rejections_open => match rejection {
                Some(rejection) => rejection.to_line(),
                None => {
                    rejections_open = false;
                    continue;
                }
            },
        };

        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
