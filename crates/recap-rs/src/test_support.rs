//! Shared test doubles: a scriptable [`Transport`] that records every
//! request it sees.

use crate::{ChatRequest, HttpResponse, Transport};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Fake transport with a canned response sequence. Once the sequence is
/// exhausted it keeps answering with the last configured fallback.
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<serde_json::Value>>,
    fallback: Result<HttpResponse, String>,
}

impl MockTransport {
    /// Answer each call with the next scripted response; error out after.
    pub(crate) fn replying(responses: Vec<Result<HttpResponse, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            fallback: Err("mock transport: response script exhausted".to_string()),
        }
    }

    /// Answer every call with a 200 carrying the given completion text.
    pub(crate) fn always_ok(text: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fallback: Ok(HttpResponse {
                status: 200,
                body: ok_body(text),
            }),
        }
    }

    /// Every request sent so far, serialized to JSON for inspection.
    pub(crate) fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: &ChatRequest) -> Result<HttpResponse, String> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// A well-formed chat completion body carrying `text`.
pub(crate) fn ok_body(text: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"content": text}}]
    })
    .to_string()
}
