mod client;
mod error;
mod graph;
mod merge;
#[cfg(test)]
pub(crate) mod mock;
mod parse;
mod visibility;

pub use client::{GraphApi, HttpGraphApi};
pub use error::FetchError;
pub use graph::{GraphEdge, GraphNode, GraphSnapshot, NodeGroup, NodeKind, RelationKind};
pub use merge::{MergeSuggestion, MergeSuggestions, MergeTriage, SuggestedEntity, badge_text};
pub use parse::{DocumentDetail, GraphPayload};
pub use visibility::{CategoryFilter, ViewMode, VisibleGraph, default_expanded, visible};
