use std::sync::Mutex;

use serde_json::Value;

use super::client::GraphApi;
use super::error::FetchError;
use super::merge::MergeSuggestions;
use super::parse::{DocumentDetail, GraphPayload};

/// In-memory `GraphApi` recording every call.
#[derive(Default)]
pub(crate) struct MockGraphApi {
    graph: Option<GraphPayload>,
    suggestions: Option<MergeSuggestions>,
    document: Option<DocumentDetail>,
    calls: Mutex<Vec<String>>,
}

impl MockGraphApi {
    pub(crate) fn with_graph(graph: Value) -> Self {
        Self {
            graph: Some(serde_json::from_value(graph).expect("valid graph payload")),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self::default()
    }

    pub(crate) fn suggestions(mut self, suggestions: MergeSuggestions) -> Self {
        self.suggestions = Some(suggestions);
        self
    }

    pub(crate) fn document(mut self, document: DocumentDetail) -> Self {
        self.document = Some(document);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn graph_response(&self) -> Result<GraphPayload, FetchError> {
        self.graph.clone().ok_or(FetchError::Status {
            status: 500,
            body: "mock failure".to_owned(),
        })
    }
}

impl GraphApi for MockGraphApi {
    fn global_hierarchy(&self, query: &str, top_k: usize) -> Result<GraphPayload, FetchError> {
        self.record(format!("hierarchy:{query}:{top_k}"));
        self.graph_response()
    }

    fn global_search(&self, query: &str, top_k: usize) -> Result<GraphPayload, FetchError> {
        self.record(format!("search:{query}:{top_k}"));
        self.graph_response()
    }

    fn collection_graph(&self, collection_id: &str) -> Result<GraphPayload, FetchError> {
        self.record(format!("collection:{collection_id}"));
        self.graph_response()
    }

    fn merge_suggestions(&self, collection_id: &str) -> Result<MergeSuggestions, FetchError> {
        self.record(format!("merge:{collection_id}"));
        self.suggestions.clone().ok_or(FetchError::Timeout)
    }

    fn document(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<DocumentDetail, FetchError> {
        self.record(format!("document:{collection_id}:{document_id}"));
        self.document.clone().ok_or(FetchError::Timeout)
    }
}
