use std::ops::Range;
use std::sync::Arc;

use crate::kg::{DocumentDetail, GraphApi};

use super::actions::SourceRef;
use super::tasks::LatestOnly;

pub(in crate::app) enum SourceState {
    Idle,
    Loading,
    Loaded(DocumentDetail),
    Failed(String),
}

/// Document fetched for "view source", shown in its own window.
pub(in crate::app) struct SourceViewer {
    slot: LatestOnly<DocumentDetail>,
    target: Option<SourceRef>,
    state: SourceState,
    pub(in crate::app) open: bool,
}

impl SourceViewer {
    pub(in crate::app) fn new() -> Self {
        Self {
            slot: LatestOnly::new("document-detail"),
            target: None,
            state: SourceState::Idle,
            open: false,
        }
    }

    pub(in crate::app) fn show_source(&mut self, api: Arc<dyn GraphApi>, target: SourceRef) {
        let collection_id = target.collection_id.clone();
        let document_id = target.document_id.clone();
        let epoch = self
            .slot
            .spawn(move || api.document(&collection_id, &document_id));

        tracing::info!(
            epoch,
            collection_id = %target.collection_id,
            document_id = %target.document_id,
            "fetching document source"
        );
        self.target = Some(target);
        self.state = SourceState::Loading;
        self.open = true;
    }

    pub(in crate::app) fn poll(&mut self) {
        let Some(result) = self.slot.poll() else {
            return;
        };
        self.state = match result {
            Ok(detail) => SourceState::Loaded(detail),
            Err(error) => {
                tracing::warn!(%error, "document fetch failed");
                SourceState::Failed(error.user_message())
            }
        };
    }

    pub(in crate::app) fn close(&mut self) {
        self.slot.cancel();
        self.open = false;
        self.state = SourceState::Idle;
        self.target = None;
    }

    pub(in crate::app) fn target(&self) -> Option<&SourceRef> {
        self.target.as_ref()
    }

    pub(in crate::app) fn is_loading(&self) -> bool {
        matches!(self.state, SourceState::Loading)
    }

    pub(in crate::app) fn state(&self) -> &SourceState {
        &self.state
    }

    #[cfg(test)]
    pub(in crate::app) fn wait(&mut self) {
        if let Some(result) = self.slot.wait(std::time::Duration::from_secs(5)) {
            self.state = match result {
                Ok(detail) => SourceState::Loaded(detail),
                Err(error) => SourceState::Failed(error.user_message()),
            };
        }
    }
}

/// Splits `content` into runs, flagging the ones that match `snippet`
/// (ASCII case-insensitive). Ranges are byte offsets into `content`.
pub(in crate::app) fn snippet_spans(content: &str, snippet: &str) -> Vec<(Range<usize>, bool)> {
    let needle = snippet.trim().to_ascii_lowercase();
    if needle.is_empty() || content.is_empty() {
        return vec![(0..content.len(), false)];
    }

    let haystack = content.to_ascii_lowercase();
    let mut spans = Vec::new();
    let mut cursor = 0;
    for (start, matched) in haystack.match_indices(needle.as_str()) {
        if start > cursor {
            spans.push((cursor..start, false));
        }
        spans.push((start..start + matched.len(), true));
        cursor = start + matched.len();
    }
    if cursor < content.len() {
        spans.push((cursor..content.len(), false));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kg::mock::MockGraphApi;

    #[test]
    fn snippet_matches_are_flagged_case_insensitively() {
        let spans = snippet_spans("Relay R-12 trips; replace relay r-12.", "relay r-12");

        let flagged = spans
            .iter()
            .filter(|(_, hit)| *hit)
            .map(|(range, _)| range.clone())
            .collect::<Vec<_>>();
        assert_eq!(flagged, vec![0..10, 26..36]);

        let covered = spans.iter().map(|(range, _)| range.len()).sum::<usize>();
        assert_eq!(covered, "Relay R-12 trips; replace relay r-12.".len());
    }

    #[test]
    fn empty_snippet_leaves_content_plain() {
        assert_eq!(snippet_spans("body", "  "), vec![(0..4, false)]);
    }

    #[test]
    fn viewer_fetches_the_referenced_document() {
        let api = Arc::new(MockGraphApi::default().document(DocumentDetail {
            id: "d1".into(),
            title: "Guide".into(),
            content: "Relay text".into(),
        }));
        let mut viewer = SourceViewer::new();

        viewer.show_source(
            api.clone(),
            SourceRef {
                collection_id: "c 1".into(),
                document_id: "d1".into(),
                snippet: Some("relay".into()),
            },
        );
        assert!(matches!(viewer.state(), SourceState::Loading));
        viewer.wait();

        assert!(matches!(viewer.state(), SourceState::Loaded(detail) if detail.title == "Guide"));
        assert_eq!(api.calls(), vec!["document:c 1:d1".to_owned()]);
    }

    #[test]
    fn failed_fetch_is_reported_and_close_resets() {
        let mut viewer = SourceViewer::new();
        viewer.show_source(
            Arc::new(MockGraphApi::default()),
            SourceRef {
                collection_id: "c1".into(),
                document_id: "missing".into(),
                snippet: None,
            },
        );
        viewer.wait();
        assert!(matches!(viewer.state(), SourceState::Failed(_)));

        viewer.close();
        assert!(!viewer.open);
        assert!(viewer.target().is_none());
    }
}
