use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{Context, Vec2};

use crate::kg::{
    CategoryFilter, GraphApi, GraphSnapshot, MergeSuggestions, MergeTriage, NodeKind, ViewMode,
    VisibleGraph, default_expanded, visible,
};

mod actions;
mod camera;
mod graph;
mod highlight;
mod load;
mod locate;
mod physics;
mod render_utils;
mod source;
mod tasks;
mod ui;

use self::actions::{ActionOutcome, ContextMenu, NodeAction, SourceRef, resolve_action};
use self::camera::{
    Camera, FOCUS_CENTER_MS, INSPECT_ZOOM, INSPECT_ZOOM_MS, OVERVIEW_ZOOM, OVERVIEW_ZOOM_MS,
};
use self::graph::{RenderGraph, sync_render_graph};
use self::highlight::{HighlightEngine, HighlightSet};
use self::load::{LoadController, LoadOutcome, LoadReason};
use self::physics::PhysicsConfig;
use self::render_utils::CategoryPalette;
use self::source::SourceViewer;
use self::tasks::LatestOnly;
use self::ui::{ToastLevel, Toasts};

pub(crate) use self::load::{DEFAULT_TOP_K, RetrievalMode};

/// Startup configuration, resolved from the command line.
#[derive(Clone, Debug)]
pub(crate) struct ExplorerSettings {
    pub(crate) start_mode: RetrievalMode,
    pub(crate) query: String,
    pub(crate) top_k: usize,
    pub(crate) settle_ms: u64,
    pub(crate) min_node_size: f32,
    pub(crate) max_node_size: f32,
    pub(crate) auto_expand: bool,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            start_mode: RetrievalMode::GlobalHierarchical,
            query: String::new(),
            top_k: DEFAULT_TOP_K,
            settle_ms: 450,
            min_node_size: 6.0,
            max_node_size: 18.0,
            auto_expand: true,
        }
    }
}

pub struct ExplorerApp {
    model: Box<ViewModel>,
}

impl ExplorerApp {
    pub(crate) fn new(
        _cc: &eframe::CreationContext<'_>,
        api: Arc<dyn GraphApi>,
        settings: ExplorerSettings,
    ) -> Self {
        let mut model = Box::new(ViewModel::new(api, settings));
        model.start();
        Self { model }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.model.show(ctx);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SidePanel {
    Closed,
    Details,
    Triage,
}

struct ViewModel {
    settings: ExplorerSettings,
    api: Arc<dyn GraphApi>,
    loader: LoadController,
    merge_slot: LatestOnly<MergeSuggestions>,
    merge_collection: Option<String>,
    triage: MergeTriage,
    source: SourceViewer,
    mode: RetrievalMode,
    query: String,
    top_k: usize,
    collection_input: String,
    snapshot: GraphSnapshot,
    expanded: HashSet<String>,
    categories: CategoryFilter,
    visible: VisibleGraph,
    highlight_engine: HighlightEngine,
    highlight: HighlightSet,
    camera: Camera,
    palette: CategoryPalette,
    render_graph: Option<RenderGraph>,
    physics: PhysicsConfig,
    live_physics: bool,
    pending_fit_at: Option<f64>,
    dragging: Option<usize>,
    load_error: Option<String>,
    side_panel: SidePanel,
    context_menu: ContextMenu,
    toasts: Toasts,
    locator_query: String,
    last_agent_handoff: Option<(String, String)>,
    now: f64,
}

impl ViewModel {
    fn new(api: Arc<dyn GraphApi>, settings: ExplorerSettings) -> Self {
        Self {
            loader: LoadController::new(Arc::clone(&api)),
            api,
            merge_slot: LatestOnly::new("merge-suggestions"),
            merge_collection: None,
            triage: MergeTriage::default(),
            source: SourceViewer::new(),
            mode: settings.start_mode.clone(),
            query: settings.query.clone(),
            top_k: settings.top_k.max(1),
            collection_input: settings
                .start_mode
                .collection_id()
                .unwrap_or("all")
                .to_owned(),
            snapshot: GraphSnapshot::empty(),
            expanded: HashSet::new(),
            categories: CategoryFilter::default(),
            visible: VisibleGraph::default(),
            highlight_engine: HighlightEngine::default(),
            highlight: HighlightSet::default(),
            camera: Camera::default(),
            palette: CategoryPalette::default(),
            render_graph: None,
            physics: PhysicsConfig::default(),
            live_physics: true,
            pending_fit_at: None,
            dragging: None,
            load_error: None,
            side_panel: SidePanel::Closed,
            context_menu: ContextMenu::default(),
            toasts: Toasts::default(),
            locator_query: String::new(),
            last_agent_handoff: None,
            now: 0.0,
            settings,
        }
    }

    fn start(&mut self) {
        self.request_load(LoadReason::Initial);
    }

    fn notify(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toasts.push(level, message, self.now);
    }

    /// Sends the current mode/query/top-k. Returns false when there is
    /// nothing to send (flat search without a query). Selection and hover do
    /// not survive a reload.
    fn request_load(&mut self, reason: LoadReason) -> bool {
        let Some(request) =
            LoadController::prepare(self.mode.clone(), &self.query, self.top_k, reason)
        else {
            tracing::debug!(mode = %self.mode, ?reason, "load skipped; nothing to send");
            return false;
        };

        self.highlight_engine.clear();
        self.highlight = self.highlight_engine.recompute(&self.snapshot, &self.visible);
        self.context_menu.close();
        if self.side_panel == SidePanel::Details {
            self.side_panel = SidePanel::Closed;
        }
        self.loader.start(request);
        true
    }

    fn search(&mut self) -> bool {
        self.request_load(LoadReason::Search)
    }

    fn refresh(&mut self) -> bool {
        self.request_load(LoadReason::Refresh)
    }

    /// Switches retrieval mode. Categories, expansion and selection do not
    /// carry across modes.
    fn set_mode(&mut self, mode: RetrievalMode) {
        if mode == self.mode {
            return;
        }
        tracing::info!(from = %self.mode, to = %mode, "retrieval mode changed");

        self.mode = mode;
        self.categories.show_all();
        self.expanded.clear();
        self.load_error = None;
        self.highlight_engine.clear();
        self.context_menu.close();
        if self.side_panel == SidePanel::Details {
            self.side_panel = SidePanel::Closed;
        }
        if self.mode.is_global() {
            self.merge_slot.cancel();
            self.merge_collection = None;
            self.triage.clear();
            if self.side_panel == SidePanel::Triage {
                self.side_panel = SidePanel::Closed;
            }
        }

        self.snapshot = GraphSnapshot::empty();
        self.rebuild_visible();
        self.loader.reset();
        self.request_load(LoadReason::ModeChange);
    }

    fn poll_tasks(&mut self) {
        if let Some(outcome) = self.loader.poll() {
            self.apply_load_outcome(outcome);
        }

        if let Some(result) = self.merge_slot.poll() {
            self.apply_merge_result(result);
        }

        self.source.poll();
    }

    fn is_busy(&self) -> bool {
        self.loader.is_loading() || self.merge_slot.in_flight()
    }

    fn apply_load_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded { request, snapshot } => {
                if request.mode != self.mode {
                    tracing::debug!(mode = %request.mode, "ignoring graph for a previous mode");
                    return;
                }
                self.snapshot = snapshot;
                self.load_error = None;
                self.highlight_engine.clear();
                self.context_menu.close();
                if request.reason != LoadReason::Refresh {
                    self.expanded = match self.mode.view_mode() {
                        ViewMode::Hierarchical => {
                            default_expanded(&self.snapshot, self.settings.auto_expand)
                        }
                        ViewMode::Flat => HashSet::new(),
                    };
                }
                if self.side_panel == SidePanel::Details {
                    self.side_panel = SidePanel::Closed;
                }
                self.rebuild_visible();

                self.pending_fit_at = (!self.snapshot.is_empty())
                    .then(|| self.now + self.settings.settle_ms as f64 / 1000.0);

                if let Some(collection_id) = request.mode.collection_id() {
                    self.fetch_merge_suggestions(collection_id.to_owned());
                }
            }
            LoadOutcome::Failed { request, error } => {
                let message = error.user_message();
                if request.mode.is_global() {
                    self.load_error = Some(message);
                } else {
                    self.snapshot = GraphSnapshot::empty();
                    self.expanded.clear();
                    self.highlight_engine.clear();
                    self.triage.clear();
                    self.rebuild_visible();
                    self.notify(ToastLevel::Error, format!("Could not load graph: {message}"));
                }
            }
        }
    }

    fn fetch_merge_suggestions(&mut self, collection_id: String) {
        let api = Arc::clone(&self.api);
        let id = collection_id.clone();
        let epoch = self.merge_slot.spawn(move || api.merge_suggestions(&id));
        tracing::debug!(epoch, %collection_id, "fetching merge suggestions");
        self.merge_collection = Some(collection_id);
    }

    fn apply_merge_result(&mut self, result: Result<MergeSuggestions, crate::kg::FetchError>) {
        let Some(collection_id) = self.merge_collection.clone() else {
            return;
        };
        match result {
            Ok(suggestions) => {
                tracing::info!(
                    %collection_id,
                    suggestions = suggestions.suggestions.len(),
                    pending = suggestions.pending_count,
                    "merge suggestions loaded"
                );
                self.triage.install(collection_id, suggestions);
            }
            Err(error) => {
                tracing::warn!(%collection_id, %error, "merge suggestions unavailable");
                self.triage.clear();
            }
        }
    }

    fn rebuild_visible(&mut self) {
        self.visible = visible(
            &self.snapshot,
            &self.expanded,
            &self.categories,
            self.mode.view_mode(),
        );
        self.highlight = self.highlight_engine.recompute(&self.snapshot, &self.visible);
        self.dragging = None;

        let previous = self.render_graph.take();
        self.render_graph = Some(sync_render_graph(
            previous,
            &self.snapshot,
            &self.visible,
            self.settings.min_node_size,
            self.settings.max_node_size,
        ));
    }

    fn selected(&self) -> Option<usize> {
        self.highlight_engine.selected()
    }

    #[cfg(test)]
    fn selected_id(&self) -> Option<String> {
        self.selected()
            .and_then(|index| self.snapshot.node(index))
            .map(|node| node.id.clone())
    }

    fn select_node(&mut self, node: Option<usize>) {
        let node = node.filter(|&index| index < self.snapshot.node_count());
        self.highlight = self
            .highlight_engine
            .on_node_select(node, &self.snapshot, &self.visible);

        match node {
            Some(index) => {
                if let Some(position) = self
                    .render_graph
                    .as_ref()
                    .and_then(|graph| graph.world_position(index))
                {
                    self.camera.center_at(position, FOCUS_CENTER_MS);
                }
                self.camera.zoom_to(INSPECT_ZOOM, INSPECT_ZOOM_MS);
                self.side_panel = SidePanel::Details;
            }
            None => {
                self.camera.center_at(Vec2::ZERO, FOCUS_CENTER_MS);
                self.camera.zoom_to(OVERVIEW_ZOOM, OVERVIEW_ZOOM_MS);
                if self.side_panel == SidePanel::Details {
                    self.side_panel = SidePanel::Closed;
                }
            }
        }
    }

    /// Camera only; selection and highlight stay as they are.
    fn focus_node(&mut self, index: usize) {
        if let Some(position) = self
            .render_graph
            .as_ref()
            .and_then(|graph| graph.world_position(index))
        {
            self.camera.center_at(position, FOCUS_CENTER_MS);
        }
    }

    /// Primary click on a node.
    fn click_node(&mut self, index: usize) {
        self.context_menu.close();
        let Some(node) = self.snapshot.node(index) else {
            return;
        };

        let expandable = matches!(
            node.effective_kind(),
            NodeKind::Collection | NodeKind::Document
        );
        if expandable && self.mode.view_mode() == ViewMode::Hierarchical {
            let id = node.id.clone();
            self.toggle_expand(&id);
            self.select_node(Some(index));
        } else if self.selected() == Some(index) {
            self.select_node(None);
        } else {
            self.select_node(Some(index));
        }
    }

    fn click_empty(&mut self) {
        self.context_menu.close();
        if self.selected().is_some() {
            self.select_node(None);
        }
    }

    fn hover_node(&mut self, node: Option<usize>) {
        if node != self.highlight_engine.hovered_node() {
            self.highlight = self
                .highlight_engine
                .on_hover(node, &self.snapshot, &self.visible);
        }
    }

    fn hover_link(&mut self, edge: Option<usize>) {
        if edge != self.highlight_engine.hovered_link() {
            self.highlight = self
                .highlight_engine
                .on_link_hover(edge, &self.snapshot, &self.visible);
        }
    }

    fn toggle_expand(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_owned());
        }
        tracing::debug!(node_id = id, expanded = self.expanded.contains(id), "toggled expansion");
        self.rebuild_visible();
    }

    fn expand_all(&mut self) {
        self.expanded = self
            .snapshot
            .nodes()
            .iter()
            .filter(|node| {
                matches!(
                    node.effective_kind(),
                    NodeKind::Collection | NodeKind::Document
                )
            })
            .map(|node| node.id.clone())
            .collect();
        self.rebuild_visible();
    }

    fn collapse_all(&mut self) {
        self.expanded.clear();
        self.rebuild_visible();
    }

    fn set_category_active(&mut self, entity_type: &str, active: bool) {
        self.categories.set_active(entity_type, active);
        self.rebuild_visible();
    }

    fn show_all_categories(&mut self) {
        self.categories.show_all();
        self.rebuild_visible();
    }

    fn perform_action(&mut self, action: NodeAction, node: usize) {
        self.context_menu.close();
        match resolve_action(action, &self.snapshot, node, self.mode.collection_id()) {
            Some(outcome) => self.apply_outcome(outcome),
            None if action == NodeAction::ViewSource => {
                self.notify(ToastLevel::Error, "No source document is linked to this node.");
            }
            None => tracing::debug!(?action, node, "action not applicable"),
        }
    }

    fn apply_outcome(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Focus(node) => self.focus_node(node),
            ActionOutcome::HandoffToAgent { node_id, label } => {
                tracing::info!(%node_id, %label, "handing node to agent");
                self.notify(ToastLevel::Info, format!("Sent \"{label}\" to the agent."));
                self.last_agent_handoff = Some((node_id, label));
            }
            ActionOutcome::Search { query } => {
                self.query = query;
                if self.mode == RetrievalMode::GlobalFlat {
                    self.search();
                } else {
                    self.set_mode(RetrievalMode::GlobalFlat);
                }
            }
            ActionOutcome::OpenSource(source) => self.open_source(source),
            ActionOutcome::ToggleExpand(id) => self.toggle_expand(&id),
        }
    }

    fn open_source(&mut self, source: SourceRef) {
        self.source.show_source(Arc::clone(&self.api), source);
    }

    fn open_triage(&mut self) {
        self.side_panel = SidePanel::Triage;
    }

    /// Selects the graph node behind a suggested entity, by id first and then
    /// by exact label. Keeps the triage panel open.
    fn select_suggested_entity(&mut self, suggestion: usize, entity: usize) -> bool {
        let Some(entity) = self.triage.inspect(suggestion, entity).cloned() else {
            return false;
        };

        let index = self
            .snapshot
            .index_of(&entity.id)
            .or_else(|| self.snapshot.index_of_label(&entity.name));
        match index {
            Some(index) => {
                self.select_node(Some(index));
                self.side_panel = SidePanel::Triage;
                true
            }
            None => {
                self.notify(
                    ToastLevel::Info,
                    format!("\"{}\" is not in the current graph.", entity.name),
                );
                false
            }
        }
    }

    fn locate(&mut self, index: usize) {
        self.locator_query.clear();
        self.select_node(Some(index));
    }
}
