use std::fmt;
use std::sync::Arc;

use crate::kg::{FetchError, GraphApi, GraphPayload, GraphSnapshot, ViewMode};

use super::tasks::LatestOnly;

pub(crate) const DEFAULT_TOP_K: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RetrievalMode {
    Contextual { collection_id: String },
    GlobalHierarchical,
    GlobalFlat,
}

impl RetrievalMode {
    pub(crate) fn view_mode(&self) -> ViewMode {
        match self {
            Self::GlobalHierarchical => ViewMode::Hierarchical,
            Self::Contextual { .. } | Self::GlobalFlat => ViewMode::Flat,
        }
    }

    pub(crate) fn collection_id(&self) -> Option<&str> {
        match self {
            Self::Contextual { collection_id } => Some(collection_id.as_str()),
            Self::GlobalHierarchical | Self::GlobalFlat => None,
        }
    }

    pub(crate) fn is_global(&self) -> bool {
        !matches!(self, Self::Contextual { .. })
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contextual { collection_id } => write!(f, "collection {collection_id}"),
            Self::GlobalHierarchical => f.write_str("global hierarchy"),
            Self::GlobalFlat => f.write_str("global entities"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoadReason {
    Initial,
    Search,
    Refresh,
    ModeChange,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LoadRequest {
    pub(crate) mode: RetrievalMode,
    pub(crate) query: String,
    pub(crate) top_k: usize,
    pub(crate) reason: LoadReason,
}

pub(crate) enum LoadOutcome {
    Loaded {
        request: LoadRequest,
        snapshot: GraphSnapshot,
    },
    Failed {
        request: LoadRequest,
        error: FetchError,
    },
}

/// Issues graph loads for the three retrieval modes. Only the response of the
/// latest request is ever handed back.
pub(crate) struct LoadController {
    api: Arc<dyn GraphApi>,
    slot: LatestOnly<GraphPayload>,
    pending: Option<LoadRequest>,
    has_searched: bool,
}

impl LoadController {
    pub(crate) fn new(api: Arc<dyn GraphApi>) -> Self {
        Self {
            api,
            slot: LatestOnly::new("graph-load"),
            pending: None,
            has_searched: false,
        }
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.slot.in_flight()
    }

    pub(crate) fn has_searched(&self) -> bool {
        self.has_searched
    }

    /// Normalizes a request; `None` means there is nothing to send.
    pub(crate) fn prepare(
        mode: RetrievalMode,
        query: &str,
        top_k: usize,
        reason: LoadReason,
    ) -> Option<LoadRequest> {
        let query = query.trim();
        let query = match &mode {
            RetrievalMode::Contextual { collection_id } => {
                if collection_id.trim().is_empty() {
                    return None;
                }
                String::new()
            }
            RetrievalMode::GlobalHierarchical => query.to_owned(),
            RetrievalMode::GlobalFlat => {
                if query.is_empty() {
                    return None;
                }
                query.to_owned()
            }
        };

        Some(LoadRequest {
            mode,
            query,
            top_k: top_k.max(1),
            reason,
        })
    }

    /// Starts `request`, superseding anything still in flight.
    pub(crate) fn start(&mut self, request: LoadRequest) -> u64 {
        let api = Arc::clone(&self.api);
        let job = request.clone();
        let epoch = self.slot.spawn(move || match &job.mode {
            RetrievalMode::Contextual { collection_id } => api.collection_graph(collection_id),
            RetrievalMode::GlobalHierarchical => api.global_hierarchy(&job.query, job.top_k),
            RetrievalMode::GlobalFlat => api.global_search(&job.query, job.top_k),
        });

        tracing::info!(
            epoch,
            mode = %request.mode,
            query = %request.query,
            top_k = request.top_k,
            reason = ?request.reason,
            "graph load started"
        );
        self.pending = Some(request);
        epoch
    }

    /// Drops whatever is in flight and forgets earlier searches. Used when the
    /// retrieval mode changes.
    pub(crate) fn reset(&mut self) {
        self.slot.cancel();
        self.pending = None;
        self.has_searched = false;
    }

    pub(crate) fn poll(&mut self) -> Option<LoadOutcome> {
        let result = self.slot.poll()?;
        self.finish(result)
    }

    fn finish(&mut self, result: Result<GraphPayload, FetchError>) -> Option<LoadOutcome> {
        let Some(request) = self.pending.take() else {
            tracing::warn!("graph load result without a pending request; dropped");
            return None;
        };
        self.has_searched = true;

        match result {
            Ok(payload) => {
                let (nodes, edges) = payload.into_parts();
                let snapshot = GraphSnapshot::load(nodes, edges);
                tracing::info!(
                    mode = %request.mode,
                    nodes = snapshot.node_count(),
                    edges = snapshot.edge_count(),
                    dropped_edges = snapshot.dropped_edges(),
                    "graph load finished"
                );
                Some(LoadOutcome::Loaded { request, snapshot })
            }
            Err(error) => {
                tracing::warn!(mode = %request.mode, %error, "graph load failed");
                Some(LoadOutcome::Failed { request, error })
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn wait(&mut self) -> Option<LoadOutcome> {
        let result = self.slot.wait(std::time::Duration::from_secs(5))?;
        self.finish(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::kg::mock::MockGraphApi;

    fn graph() -> serde_json::Value {
        json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "edges": [{"source": "a", "target": "b"}, {"source": "a", "target": "missing"}]
        })
    }

    #[test]
    fn flat_search_with_empty_query_sends_nothing() {
        let api = Arc::new(MockGraphApi::with_graph(graph()));
        let controller = LoadController::new(api.clone());

        let request = LoadController::prepare(RetrievalMode::GlobalFlat, "   ", 20, LoadReason::Search);

        assert!(request.is_none());
        assert!(!controller.has_searched());
        assert!(!controller.is_loading());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn contextual_requests_ignore_query_text() {
        let request = LoadController::prepare(
            RetrievalMode::Contextual {
                collection_id: "all".into(),
            },
            "breaker",
            20,
            LoadReason::Initial,
        )
        .expect("contextual is always allowed");

        assert!(request.query.is_empty());
    }

    #[test]
    fn hierarchy_allows_empty_initial_query() {
        let request = LoadController::prepare(
            RetrievalMode::GlobalHierarchical,
            "",
            DEFAULT_TOP_K,
            LoadReason::Initial,
        );
        assert!(request.is_some_and(|request| request.top_k == DEFAULT_TOP_K));
    }

    #[test]
    fn successful_load_normalizes_into_snapshot() {
        let api = Arc::new(MockGraphApi::with_graph(graph()));
        let mut controller = LoadController::new(api.clone());
        let request =
            LoadController::prepare(RetrievalMode::GlobalFlat, "relay", 20, LoadReason::Search)
                .expect("request");

        controller.start(request);
        assert!(controller.is_loading());

        match controller.wait().expect("outcome") {
            LoadOutcome::Loaded { request, snapshot } => {
                assert_eq!(request.query, "relay");
                assert_eq!(snapshot.node_count(), 2);
                assert_eq!(snapshot.edge_count(), 1);
            }
            LoadOutcome::Failed { error, .. } => panic!("unexpected failure: {error}"),
        }
        assert!(controller.has_searched());
        assert!(!controller.is_loading());
        assert_eq!(api.calls(), vec!["search:relay:20".to_owned()]);
    }

    #[test]
    fn failures_mark_searched_and_surface_request() {
        let mut controller = LoadController::new(Arc::new(MockGraphApi::failing()));
        let request = LoadController::prepare(
            RetrievalMode::Contextual {
                collection_id: "c1".into(),
            },
            "",
            20,
            LoadReason::Initial,
        )
        .expect("request");

        controller.start(request);
        match controller.wait().expect("outcome") {
            LoadOutcome::Failed { request, error } => {
                assert_eq!(request.mode.collection_id(), Some("c1"));
                assert!(matches!(error, FetchError::Status { status: 500, .. }));
            }
            LoadOutcome::Loaded { .. } => panic!("mock should fail"),
        }
        assert!(controller.has_searched());
    }

    #[test]
    fn newer_request_supersedes_pending_one() {
        let api = Arc::new(MockGraphApi::with_graph(graph()));
        let mut controller = LoadController::new(api);
        let first = LoadController::prepare(RetrievalMode::GlobalFlat, "old", 20, LoadReason::Search)
            .expect("first");
        let second =
            LoadController::prepare(RetrievalMode::GlobalFlat, "new", 20, LoadReason::Search)
                .expect("second");

        let first_epoch = controller.start(first);
        let second_epoch = controller.start(second);
        assert!(second_epoch > first_epoch);

        match controller.wait().expect("outcome") {
            LoadOutcome::Loaded { request, .. } => assert_eq!(request.query, "new"),
            LoadOutcome::Failed { error, .. } => panic!("unexpected failure: {error}"),
        }
        assert!(controller.poll().is_none());
    }

    #[test]
    fn reset_forgets_searches_and_in_flight_loads() {
        let api = Arc::new(MockGraphApi::with_graph(graph()));
        let mut controller = LoadController::new(api);
        let first = LoadController::prepare(RetrievalMode::GlobalFlat, "relay", 20, LoadReason::Search)
            .expect("first");
        controller.start(first);
        controller.wait().expect("outcome");
        assert!(controller.has_searched());

        let second =
            LoadController::prepare(RetrievalMode::GlobalHierarchical, "", 20, LoadReason::Initial)
                .expect("second");
        controller.start(second);
        controller.reset();

        assert!(!controller.has_searched());
        assert!(!controller.is_loading());
        assert!(controller.poll().is_none());
    }
}
