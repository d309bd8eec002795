const BADGE_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct SuggestedEntity {
    pub id: String,
    pub name: String,
    pub entity_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MergeSuggestion {
    pub id: String,
    pub entities: Vec<SuggestedEntity>,
    pub confidence: f32,
    pub reason: Option<String>,
    pub target_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeSuggestions {
    pub suggestions: Vec<MergeSuggestion>,
    pub pending_count: usize,
}

/// Text for the pending-merge badge; `None` hides the badge.
pub fn badge_text(pending_count: usize) -> Option<String> {
    match pending_count {
        0 => None,
        count if count > BADGE_LIMIT => Some(format!("{BADGE_LIMIT}+")),
        count => Some(count.to_string()),
    }
}

/// Triage panel state for one contextual collection.
#[derive(Clone, Debug, Default)]
pub struct MergeTriage {
    collection_id: Option<String>,
    suggestions: MergeSuggestions,
    inspected: Option<(usize, usize)>,
}

impl MergeTriage {
    pub fn collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref()
    }

    pub fn suggestions(&self) -> &[MergeSuggestion] {
        &self.suggestions.suggestions
    }

    pub fn pending_count(&self) -> usize {
        self.suggestions.pending_count
    }

    pub fn badge(&self) -> Option<String> {
        badge_text(self.pending_count())
    }

    pub fn install(&mut self, collection_id: String, suggestions: MergeSuggestions) {
        self.collection_id = Some(collection_id);
        self.suggestions = suggestions;
        self.inspected = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Marks one entity of one suggestion as inspected and returns it.
    pub fn inspect(&mut self, suggestion: usize, entity: usize) -> Option<&SuggestedEntity> {
        let found = self
            .suggestions
            .suggestions
            .get(suggestion)
            .and_then(|entry| entry.entities.get(entity))?;
        self.inspected = Some((suggestion, entity));
        Some(found)
    }

    pub fn inspected(&self) -> Option<(usize, usize)> {
        self.inspected
    }

    pub fn clear_inspection(&mut self) {
        self.inspected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(names: &[&str]) -> MergeSuggestion {
        MergeSuggestion {
            id: names.join("+"),
            entities: names
                .iter()
                .map(|name| SuggestedEntity {
                    id: (*name).to_owned(),
                    name: (*name).to_owned(),
                    entity_type: None,
                })
                .collect(),
            confidence: 0.8,
            reason: None,
            target_name: None,
        }
    }

    #[test]
    fn badge_caps_past_ten() {
        assert_eq!(badge_text(13).as_deref(), Some("10+"));
        assert_eq!(badge_text(11).as_deref(), Some("10+"));
        assert_eq!(badge_text(10).as_deref(), Some("10"));
        assert_eq!(badge_text(7).as_deref(), Some("7"));
        assert_eq!(badge_text(0), None);
    }

    #[test]
    fn inspecting_tracks_selection_and_resets_on_install() {
        let mut triage = MergeTriage::default();
        triage.install(
            "col-1".into(),
            MergeSuggestions {
                suggestions: vec![suggestion(&["T1", "Transformer 1"])],
                pending_count: 1,
            },
        );

        let inspected = triage.inspect(0, 1).map(|entity| entity.id.clone());
        assert_eq!(inspected.as_deref(), Some("Transformer 1"));
        assert_eq!(triage.inspected(), Some((0, 1)));
        assert!(triage.inspect(3, 0).is_none());
        assert_eq!(triage.inspected(), Some((0, 1)));

        triage.install("col-1".into(), MergeSuggestions::default());
        assert_eq!(triage.inspected(), None);
        assert_eq!(triage.badge(), None);
    }
}
