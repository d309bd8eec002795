use serde::Deserialize;
use serde_json::{Map, Value};

use super::graph::{GraphEdge, GraphNode, NodeKind, RelationKind};
use super::merge::{MergeSuggestion, MergeSuggestions, SuggestedEntity};

/// Ids arrive as strings from most endpoints and as integers from a few.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// An edge endpoint is either a bare node id or a node object carrying `id`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum EndpointRef {
    Id(RawId),
    Node { id: RawId },
}

impl EndpointRef {
    pub(super) fn endpoint_id(self) -> String {
        match self {
            Self::Id(id) | Self::Node { id } => id.into_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNode {
    id: RawId,
    #[serde(default, alias = "name", alias = "title")]
    label: Option<String>,
    #[serde(default, alias = "node_type", alias = "nodeType")]
    kind: Option<String>,
    #[serde(default, rename = "type")]
    type_tag: Option<String>,
    #[serde(default, alias = "entityType")]
    entity_type: Option<String>,
    #[serde(default)]
    workspace: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "collectionId")]
    collection_id: Option<String>,
    #[serde(default, alias = "documentId")]
    document_id: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl RawNode {
    fn property(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.properties.get(*key)? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    }

    fn into_node(self) -> GraphNode {
        // Hierarchy payloads tag nodes with `type`; entity graphs may put the
        // entity type there instead.
        let tagged_kind = self.type_tag.as_deref().and_then(NodeKind::parse);
        let kind = self
            .kind
            .as_deref()
            .or_else(|| self.properties.get("kind").and_then(Value::as_str))
            .and_then(|value| {
                let parsed = NodeKind::parse(value);
                if parsed.is_none() {
                    tracing::debug!(kind = value, "unrecognized node kind");
                }
                parsed
            })
            .or(tagged_kind);
        let entity_type = self
            .entity_type
            .clone()
            .or_else(|| self.property(&["entity_type", "entityType"]))
            .or_else(|| {
                self.type_tag
                    .clone()
                    .filter(|tag| tagged_kind.is_none() && !tag.trim().is_empty())
            });
        let workspace = self.workspace.clone().or_else(|| self.property(&["workspace"]));
        let description = self
            .description
            .clone()
            .or_else(|| self.property(&["description", "snippet"]));
        let collection_id = self
            .collection_id
            .clone()
            .or_else(|| self.property(&["collection_id", "collectionId"]));
        let document_id = self
            .document_id
            .clone()
            .or_else(|| self.property(&["document_id", "documentId", "source_id"]));
        let label_hint = self
            .label
            .clone()
            .or_else(|| self.property(&["name", "entity_name", "title"]));

        let id = self.id.into_string();
        let label = label_hint
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        GraphNode {
            id,
            kind,
            label,
            entity_type,
            workspace,
            description,
            collection_id,
            document_id,
            degree: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawEdge {
    source: EndpointRef,
    target: EndpointRef,
    #[serde(
        default,
        rename = "type",
        alias = "relation",
        alias = "relation_type",
        alias = "relationKind"
    )]
    relation: Option<String>,
    #[serde(default, alias = "description")]
    label: Option<String>,
}

impl RawEdge {
    fn into_edge(self) -> GraphEdge {
        GraphEdge {
            source: self.source.endpoint_id(),
            target: self.target.endpoint_id(),
            relation: self
                .relation
                .as_deref()
                .map(RelationKind::parse)
                .unwrap_or(RelationKind::Generic),
            label: self.label.filter(|label| !label.trim().is_empty()),
        }
    }
}

/// `{nodes, edges}` as returned by every graph endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default, alias = "links")]
    edges: Vec<RawEdge>,
}

impl GraphPayload {
    pub fn into_parts(self) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let nodes = self.nodes.into_iter().map(RawNode::into_node).collect();
        let edges = self.edges.into_iter().map(RawEdge::into_edge).collect();
        (nodes, edges)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawSuggestedEntity {
    #[serde(default, alias = "entity_id")]
    id: Option<RawId>,
    #[serde(default, alias = "entity_name")]
    name: Option<String>,
    #[serde(default, alias = "entityType")]
    entity_type: Option<String>,
}

impl RawSuggestedEntity {
    fn into_entity(self) -> Option<SuggestedEntity> {
        let id = self.id.map(RawId::into_string);
        let name = self.name.or_else(|| id.clone())?;
        Some(SuggestedEntity {
            id: id.unwrap_or_else(|| name.clone()),
            name,
            entity_type: self.entity_type,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
struct RawSuggestion {
    #[serde(default, alias = "suggestion_id")]
    id: Option<RawId>,
    #[serde(default)]
    entities: Vec<RawSuggestedEntity>,
    #[serde(default)]
    entity_ids: Vec<String>,
    #[serde(default, alias = "confidence_score")]
    confidence: Option<f32>,
    #[serde(default, alias = "merge_reason")]
    reason: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    suggested_target_entity: Option<RawSuggestedEntity>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawMergeSuggestions {
    #[serde(default)]
    suggestions: Vec<RawSuggestion>,
    #[serde(default, alias = "pendingCount")]
    pending_count: Option<usize>,
}

impl RawMergeSuggestions {
    pub(super) fn into_suggestions(self) -> MergeSuggestions {
        let counted_pending = self
            .suggestions
            .iter()
            .filter(|suggestion| {
                suggestion
                    .status
                    .as_deref()
                    .is_none_or(|status| status.eq_ignore_ascii_case("pending"))
            })
            .count();

        let suggestions = self
            .suggestions
            .into_iter()
            .enumerate()
            .map(|(position, raw)| {
                let mut entities = raw
                    .entities
                    .into_iter()
                    .filter_map(RawSuggestedEntity::into_entity)
                    .collect::<Vec<_>>();
                if entities.is_empty() {
                    entities = raw
                        .entity_ids
                        .into_iter()
                        .map(|id| SuggestedEntity {
                            name: id.clone(),
                            id,
                            entity_type: None,
                        })
                        .collect();
                }

                MergeSuggestion {
                    id: raw
                        .id
                        .map(RawId::into_string)
                        .unwrap_or_else(|| format!("suggestion-{position}")),
                    entities,
                    confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
                    reason: raw.reason,
                    target_name: raw
                        .suggested_target_entity
                        .and_then(|target| target.name),
                }
            })
            .collect();

        MergeSuggestions {
            suggestions,
            pending_count: self.pending_count.unwrap_or(counted_pending),
        }
    }
}

/// Document body shown by the source viewer.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentDetail {
    pub id: String,
    pub title: String,
    pub content: String,
}

pub(super) fn parse_document_detail(raw: Value, fallback_id: &str) -> DocumentDetail {
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| raw.get(*key).and_then(Value::as_str))
            .map(str::to_owned)
    };

    let id = raw
        .get("id")
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| fallback_id.to_owned());

    DocumentDetail {
        title: text(&["title", "name"]).unwrap_or_else(|| id.clone()),
        content: text(&["content", "text", "markdown"]).unwrap_or_default(),
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        serde_json::from_str::<GraphPayload>(json)
            .expect("valid payload")
            .into_parts()
    }

    #[test]
    fn edge_endpoints_accept_bare_ids_and_node_objects() {
        let (_, edges) = payload(
            r#"{
                "nodes": [],
                "edges": [
                    {"source": "a", "target": {"id": "b", "x": 1.0}, "type": "CONTAINS"},
                    {"source": {"id": 7}, "target": 8}
                ]
            }"#,
        );

        assert_eq!(edges[0].source, "a");
        assert_eq!(edges[0].target, "b");
        assert_eq!(edges[0].relation, RelationKind::Contains);
        assert_eq!(edges[1].source, "7");
        assert_eq!(edges[1].target, "8");
        assert_eq!(edges[1].relation, RelationKind::Generic);
    }

    #[test]
    fn node_fields_fall_back_to_properties() {
        let (nodes, _) = payload(
            r#"{
                "nodes": [{
                    "id": "breaker-7",
                    "properties": {
                        "entity_name": "Breaker 7",
                        "entity_type": "equipment",
                        "description": "110 kV feeder breaker",
                        "workspace": "north-yard"
                    }
                }],
                "links": []
            }"#,
        );

        let node = &nodes[0];
        assert_eq!(node.label, "Breaker 7");
        assert_eq!(node.entity_type.as_deref(), Some("equipment"));
        assert_eq!(node.workspace.as_deref(), Some("north-yard"));
        assert_eq!(node.description.as_deref(), Some("110 kV feeder breaker"));
        assert_eq!(node.kind, None);
    }

    #[test]
    fn hierarchy_nodes_carry_kind_and_label_defaults_to_id() {
        let (nodes, _) = payload(
            r#"{"nodes": [
                {"id": "c1", "kind": "Collection", "name": "Protection manuals"},
                {"id": "d1", "node_type": "document"},
                {"id": "x", "kind": "mystery"}
            ]}"#,
        );

        assert_eq!(nodes[0].kind, Some(NodeKind::Collection));
        assert_eq!(nodes[0].label, "Protection manuals");
        assert_eq!(nodes[1].kind, Some(NodeKind::Document));
        assert_eq!(nodes[1].label, "d1");
        assert_eq!(nodes[2].kind, None);
    }

    #[test]
    fn type_field_tags_hierarchy_kinds_or_entity_types() {
        let (nodes, _) = payload(
            r#"{"nodes": [
                {"id": "c1", "type": "collection"},
                {"id": "d1", "type": "document", "kind": "document"},
                {"id": "e1", "type": "equipment"}
            ]}"#,
        );

        assert_eq!(nodes[0].kind, Some(NodeKind::Collection));
        assert_eq!(nodes[1].kind, Some(NodeKind::Document));
        assert_eq!(nodes[2].kind, None);
        assert_eq!(nodes[2].entity_type.as_deref(), Some("equipment"));
        assert_eq!(nodes[0].entity_type, None);
    }

    #[test]
    fn merge_suggestions_fall_back_to_pending_status_count() {
        let raw: RawMergeSuggestions = serde_json::from_str(
            r#"{"suggestions": [
                {"suggestion_id": "s1", "entity_ids": ["T1", "Transformer 1"], "confidence_score": 0.92, "status": "PENDING"},
                {"suggestion_id": "s2", "entities": [{"entity_name": "Relay A", "entity_type": "device"}], "status": "ACCEPTED"}
            ]}"#,
        )
        .expect("valid suggestions");

        let suggestions = raw.into_suggestions();

        assert_eq!(suggestions.pending_count, 1);
        assert_eq!(suggestions.suggestions[0].entities.len(), 2);
        assert_eq!(suggestions.suggestions[0].entities[1].id, "Transformer 1");
        assert_eq!(suggestions.suggestions[1].entities[0].id, "Relay A");
        assert!((suggestions.suggestions[0].confidence - 0.92).abs() < 1e-6);
    }

    #[test]
    fn document_detail_reads_first_available_text_field() {
        let detail = parse_document_detail(
            serde_json::json!({"id": 42, "name": "Switching order", "text": "Open CB-12"}),
            "fallback",
        );

        assert_eq!(detail.id, "42");
        assert_eq!(detail.title, "Switching order");
        assert_eq!(detail.content, "Open CB-12");
    }
}
