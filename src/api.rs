//! The HTTP-facing operations and wire types.
//!
//! `Gateway` holds everything a request needs: the shared application
//! context and the bearer token resolved at startup. The server binary is
//! thin glue over these methods, which keeps the whole request surface
//! testable without sockets.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::scrivener::Scrivener;
use crate::task::TaskStatus;

/// Response envelope for `/transcribe` requests.
///
/// `code` mirrors the HTTP status code; exactly one of `msg` or `status`
/// is present.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Reply {
    /// A successful submission.
    pub fn ok() -> Self {
        Self {
            code: 200,
            msg: Some("ok".to_owned()),
            status: None,
        }
    }

    /// A successful status poll. The status travels as its decimal code.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            code: 200,
            msg: None,
            status: Some(status.code().to_string()),
        }
    }

    /// A rejected request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: 400,
            msg: Some(message.into()),
            status: None,
        }
    }
}

/// Body of a `POST /transcribe` submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub task_id: u64,
    /// Path to the audio file, as seen by the server process.
    pub input_audio: String,
    /// Optional language hint; omitted or empty means auto-detect.
    #[serde(default)]
    pub language: Option<String>,
}

/// Query parameters of a `GET /transcribe` status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub task_id: u64,
}

/// The request-handling surface of the server.
#[derive(Clone)]
pub struct Gateway {
    core: Arc<Scrivener>,
    token: String,
}

impl Gateway {
    pub fn new(core: Arc<Scrivener>, token: impl Into<String>) -> Self {
        Self {
            core,
            token: token.into(),
        }
    }

    /// The shared application context.
    pub fn core(&self) -> &Arc<Scrivener> {
        &self.core
    }

    /// Validate an `Authorization` header value.
    ///
    /// The value must split into exactly two whitespace-separated tokens,
    /// and the second must equal the configured token. The scheme token is
    /// not inspected, so `Bearer <token>` and `Token <token>` both pass.
    pub fn authorize(&self, header: Option<&str>) -> bool {
        let Some(value) = header else {
            return false;
        };

        let mut parts = value.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_scheme), Some(token), None) => token == self.token,
            _ => false,
        }
    }

    /// Decide an `Authorization` header value.
    ///
    /// Returns `None` when the credential passes, otherwise the exact
    /// rejection the middleware sends back.
    pub fn auth_reply(&self, header: Option<&str>) -> Option<Reply> {
        if self.authorize(header) {
            None
        } else {
            Some(Reply::bad_request("token error"))
        }
    }

    /// Accept a submission.
    ///
    /// The input file must exist when the request arrives. Re-submitting an
    /// id that is still active is a no-op and still answers "ok": the
    /// original task keeps its state and queue position.
    pub fn submit(&self, request: &SubmitRequest) -> Reply {
        let path = Path::new(&request.input_audio);
        if !path.exists() {
            info!(
                task_id = request.task_id,
                path = %path.display(),
                "submission rejected, input file not found"
            );
            return Reply::bad_request("file not found");
        }

        if self
            .core
            .submit(request.task_id, path, request.language.clone())
        {
            info!(
                task_id = request.task_id,
                path = %path.display(),
                "task accepted"
            );
        } else {
            debug!(task_id = request.task_id, "duplicate submission ignored");
        }

        Reply::ok()
    }

    /// Answer a status poll.
    ///
    /// A terminal status is consumed by the read that observes it; any later
    /// poll for the same id reports the task as unknown.
    pub fn status(&self, task_id: u64) -> Reply {
        match self.core.status(task_id) {
            Some(status) => Reply::status(status),
            None => Reply::bad_request("task not found"),
        }
    }
}
