//! Scripted collaborators for orchestrator tests.

use crate::error::{LlmError, SearchError};
use crate::llm::CompletionModel;
use crate::models::RetrievedDocument;
use crate::search::{SearchIndex, SearchRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Search index returning fixed hits, or failing as "not ready".
#[derive(Default)]
pub struct FakeSearch {
    hits: Vec<RetrievedDocument>,
    fail: bool,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<SearchRequest>>,
}

impl FakeSearch {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn returning(hits: Vec<RetrievedDocument>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchIndex for FakeSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RetrievedDocument>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if self.fail {
            return Err(SearchError::NotReady("index still building".to_string()));
        }
        Ok(self.hits.clone())
    }
}

/// Model answering from a script; an exhausted script yields empty text.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, _model: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}
