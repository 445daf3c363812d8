//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::{RequestOptions, Transport};
use crate::error::TransportError;

/// A request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub path: String,
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Replies from a per-path script. The last scripted reply for a path repeats.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Result<Value, TransportError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn reply(&self, path: &str, reply: Result<Value, TransportError>) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            method: options.method.clone(),
            query: options.query.clone(),
            body: options.body.clone(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(path);
        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(TransportError::http(404, "Not Found")),
        }
    }
}
