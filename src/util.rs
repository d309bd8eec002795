use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Cuts `label` to at most `max_chars` characters, ending with an ellipsis
/// when shortened.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    let label = label.trim();
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let keep = max_chars.saturating_sub(1);
    let mut shortened = label.chars().take(keep).collect::<String>();
    shortened.push('…');
    shortened
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_labels_are_cut_on_char_boundaries() {
        assert_eq!(truncate_label("Schaltanlage Süd", 8), "Schalta…");
        assert_eq!(truncate_label("  Relay  ", 8), "Relay");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("entity-42");
        assert_eq!((x, y), stable_pair("entity-42"));
        assert!((-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y));
    }
}
