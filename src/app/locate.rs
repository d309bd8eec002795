use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::kg::GraphSnapshot;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Snapshot nodes whose label (or id) fuzzily matches `query`, best first.
pub(in crate::app) fn locate_nodes(snapshot: &GraphSnapshot, query: &str, limit: usize) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut ranked = snapshot
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let score = fuzzy_match_score(&matcher, &node.label, query)
                .or_else(|| fuzzy_match_score(&matcher, &node.id, query).map(|score| score / 2))?;
            Some((score, index))
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(_, index)| index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kg::{GraphNode, NodeKind};

    fn snapshot() -> GraphSnapshot {
        let nodes = vec![
            GraphNode::new("n1", Some(NodeKind::Entity), "Circuit breaker"),
            GraphNode::new("n2", Some(NodeKind::Entity), "Relay R-12"),
            GraphNode::new("relay-datasheet", Some(NodeKind::Document), "Data sheet"),
        ];
        GraphSnapshot::load(nodes, Vec::new())
    }

    #[test]
    fn label_matches_rank_before_id_matches() {
        let found = locate_nodes(&snapshot(), "relay", 10);

        assert_eq!(found.first(), Some(&1));
        assert!(found.contains(&2));
        assert!(!found.contains(&0));
    }

    #[test]
    fn blank_query_finds_nothing() {
        assert!(locate_nodes(&snapshot(), "   ", 10).is_empty());
    }

    #[test]
    fn results_are_capped() {
        assert_eq!(locate_nodes(&snapshot(), "e", 1).len(), 1);
    }
}
