use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Collection,
    Document,
    Entity,
}

impl NodeKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "collection" => Some(Self::Collection),
            "document" => Some(Self::Document),
            "entity" => Some(Self::Entity),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Document => "document",
            Self::Entity => "entity",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Contains,
    ExtractedFrom,
    SameAs,
    Generic,
}

impl RelationKind {
    pub fn parse(value: &str) -> Self {
        let normalized = value
            .trim()
            .chars()
            .map(|ch| match ch {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect::<String>();

        match normalized.as_str() {
            "CONTAINS" => Self::Contains,
            "EXTRACTED_FROM" => Self::ExtractedFrom,
            "SAME_AS" | "FEDERATION" | "FEDERATED" | "FEDERATED_WITH" => Self::SameAs,
            _ => Self::Generic,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Contains => "CONTAINS",
            Self::ExtractedFrom => "EXTRACTED_FROM",
            Self::SameAs => "SAME_AS",
            Self::Generic => "related",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub kind: Option<NodeKind>,
    pub label: String,
    pub entity_type: Option<String>,
    pub workspace: Option<String>,
    pub description: Option<String>,
    pub collection_id: Option<String>,
    pub document_id: Option<String>,
    pub degree: usize,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: Option<NodeKind>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            entity_type: None,
            workspace: None,
            description: None,
            collection_id: None,
            document_id: None,
            degree: 0,
        }
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Kind used for shape and menu decisions; kind-less nodes behave as entities.
    pub fn effective_kind(&self) -> NodeKind {
        self.kind.unwrap_or(NodeKind::Entity)
    }

    pub fn group(&self) -> NodeGroup {
        if let Some(entity_type) = &self.entity_type {
            NodeGroup::EntityType(entity_type.clone())
        } else if let Some(kind) = self.kind {
            NodeGroup::Kind(kind)
        } else {
            NodeGroup::Unclassified
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: RelationKind,
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, relation: RelationKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation,
            label: None,
        }
    }
}

/// Legend/filter bucket a node belongs to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeGroup {
    EntityType(String),
    Kind(NodeKind),
    Unclassified,
}

impl NodeGroup {
    /// Palette key; entity types and kinds share one color space.
    pub fn key(&self) -> &str {
        match self {
            Self::EntityType(entity_type) => entity_type.as_str(),
            Self::Kind(kind) => kind.label(),
            Self::Unclassified => "unclassified",
        }
    }

    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Self::EntityType(entity_type) => Some(entity_type.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for NodeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One loaded graph with the indices every per-frame computation relies on.
#[derive(Clone, Debug, Default)]
pub struct GraphSnapshot {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    endpoints: Vec<(usize, usize)>,
    index_by_id: HashMap<String, usize>,
    incident: Vec<Vec<usize>>,
    owners: Vec<Vec<usize>>,
    groups: BTreeMap<NodeGroup, Vec<usize>>,
    dropped_edges: usize,
}

impl GraphSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ingests raw nodes and edges. Duplicate node ids keep the first
    /// occurrence; edges whose endpoints are not loaded are dropped.
    pub fn load(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut kept_nodes = Vec::with_capacity(nodes.len());
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if index_by_id.contains_key(&node.id) {
                tracing::debug!(node_id = %node.id, "dropping duplicate node");
                continue;
            }
            index_by_id.insert(node.id.clone(), kept_nodes.len());
            kept_nodes.push(node);
        }

        let node_count = kept_nodes.len();
        let mut out_degree = vec![0usize; node_count];
        let mut in_degree = vec![0usize; node_count];
        let mut incident = vec![Vec::new(); node_count];
        let mut owners = vec![Vec::new(); node_count];
        let mut kept_edges = Vec::with_capacity(edges.len());
        let mut endpoints = Vec::with_capacity(edges.len());
        let mut dropped_edges = 0usize;

        for edge in edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
            else {
                tracing::debug!(
                    source = %edge.source,
                    target = %edge.target,
                    "dropping edge with dangling endpoint"
                );
                dropped_edges += 1;
                continue;
            };

            let edge_index = kept_edges.len();
            out_degree[source] += 1;
            in_degree[target] += 1;
            incident[source].push(edge_index);
            if target != source {
                incident[target].push(edge_index);
            }

            let target_kind = kept_nodes[target].effective_kind();
            let owns = match edge.relation {
                RelationKind::Contains => target_kind == NodeKind::Document,
                RelationKind::ExtractedFrom => target_kind == NodeKind::Entity,
                RelationKind::SameAs | RelationKind::Generic => false,
            };
            if owns && !owners[target].contains(&source) {
                owners[target].push(source);
            }

            endpoints.push((source, target));
            kept_edges.push(edge);
        }

        let mut groups: BTreeMap<NodeGroup, Vec<usize>> = BTreeMap::new();
        for (index, node) in kept_nodes.iter_mut().enumerate() {
            node.degree = out_degree[index].max(in_degree[index]);
            groups.entry(node.group()).or_default().push(index);
        }

        if dropped_edges > 0 {
            tracing::debug!(dropped_edges, "ignored dangling edges during ingestion");
        }

        Self {
            nodes: kept_nodes,
            edges: kept_edges,
            endpoints,
            index_by_id,
            incident,
            owners,
            groups,
            dropped_edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    pub fn edge(&self, index: usize) -> Option<&GraphEdge> {
        self.edges.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn endpoints(&self, edge: usize) -> Option<(usize, usize)> {
        self.endpoints.get(edge).copied()
    }

    /// Edge indices touching `node`, in either direction.
    pub fn incident_edges(&self, node: usize) -> &[usize] {
        self.incident.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Hierarchy parents: collections containing a document, documents an
    /// entity was extracted from.
    pub fn owners(&self, node: usize) -> &[usize] {
        self.owners.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn groups(&self) -> &BTreeMap<NodeGroup, Vec<usize>> {
        &self.groups
    }

    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    pub fn collection_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|node| node.kind == Some(NodeKind::Collection))
            .map(|node| node.id.as_str())
    }

    /// First node whose label matches exactly, used when an id lookup misses.
    pub fn index_of_label(&self, label: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.label == label)
    }
}
