//! Combining the previous turn's filters with the current turn's

use super::Filters;

/// Merge `previous` and `current` filters into one filter object.
///
/// - Taxonomy lists (`tags`, `dietary_tags`, `cuisine`, `ingredients`) are unioned.
/// - Scalars take the current value when present, otherwise the previous one.
/// - `main_protein` is replaced outright; when it switches to a different
///   protein the current `exclude_tags` replace the previous list, which was
///   derived from the old protein. Otherwise exclusions are unioned.
pub fn merge(previous: &Filters, current: &Filters) -> Filters {
    let protein_switched = matches!(
        (&previous.main_protein, &current.main_protein),
        (Some(before), Some(now)) if before != now
    );

    let exclude_tags = if protein_switched {
        current.exclude_tags.clone()
    } else {
        previous.exclude_tags.union(&current.exclude_tags)
    };

    Filters {
        max_time: current.max_time.or(previous.max_time),
        min_time: current.min_time.or(previous.min_time),
        difficulty: current
            .difficulty
            .clone()
            .or_else(|| previous.difficulty.clone()),
        result_limit: current.result_limit.or(previous.result_limit),
        min_rating: current.min_rating.or(previous.min_rating),
        high_protein: current.high_protein.or(previous.high_protein),
        low_fat: current.low_fat.or(previous.low_fat),
        low_carb: current.low_carb.or(previous.low_carb),
        low_calorie: current.low_calorie.or(previous.low_calorie),
        main_protein: current
            .main_protein
            .clone()
            .or_else(|| previous.main_protein.clone()),
        recipe_name: current
            .recipe_name
            .clone()
            .or_else(|| previous.recipe_name.clone()),
        tags: previous.tags.union(&current.tags),
        dietary_tags: previous.dietary_tags.union(&current.dietary_tags),
        cuisine: previous.cuisine.union(&current.cuisine),
        ingredients: previous.ingredients.union(&current.ingredients),
        exclude_tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::TagSet;

    fn set(values: &[&str]) -> TagSet {
        values.iter().collect()
    }

    fn chicken() -> Filters {
        let mut filters = Filters {
            main_protein: Some("chicken".to_string()),
            tags: set(&["mains"]),
            ..Default::default()
        };
        filters.apply_protein_exclusions();
        filters
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let mut filters = chicken();
        filters.dietary_tags = set(&["gluten free", "nut free"]);
        filters.cuisine = set(&["thai"]);
        filters.max_time = Some(30);

        assert_eq!(merge(&filters, &filters), filters);
    }

    #[test]
    fn test_lists_are_unioned_without_duplicates() {
        let previous = Filters {
            tags: set(&["mains", "soups"]),
            ..Default::default()
        };
        let current = Filters {
            tags: set(&["soups", "salads"]),
            ..Default::default()
        };

        let merged = merge(&previous, &current);
        assert_eq!(merged.tags.to_vec(), vec!["mains", "salads", "soups"]);
    }

    #[test]
    fn test_scalars_override_or_carry_over() {
        let previous = Filters {
            max_time: Some(30),
            difficulty: Some("easy".to_string()),
            low_carb: Some(true),
            ..Default::default()
        };
        let current = Filters {
            max_time: Some(15),
            ..Default::default()
        };

        let merged = merge(&previous, &current);
        assert_eq!(merged.max_time, Some(15));
        assert_eq!(merged.difficulty.as_deref(), Some("easy"));
        assert_eq!(merged.low_carb, Some(true));
    }

    #[test]
    fn test_protein_switch_replaces_exclusions() {
        let previous = chicken();
        let mut current = Filters {
            main_protein: Some("beef".to_string()),
            ..Default::default()
        };
        current.apply_protein_exclusions();

        let merged = merge(&previous, &current);
        assert_eq!(merged.main_protein.as_deref(), Some("beef"));
        assert!(merged.exclude_tags.contains("chicken"));
        assert!(!merged.exclude_tags.contains("beef"));
        assert_eq!(merged.exclude_tags, current.exclude_tags);
    }

    #[test]
    fn test_first_protein_keeps_earlier_exclusions() {
        let previous = Filters {
            exclude_tags: set(&["mushrooms"]),
            ..Default::default()
        };
        let current = chicken();

        let merged = merge(&previous, &current);
        assert!(merged.exclude_tags.contains("mushrooms"));
        assert!(merged.exclude_tags.contains("beef"));
    }

    #[test]
    fn test_protein_carries_over_when_not_restated() {
        let previous = chicken();
        let current = Filters {
            max_time: Some(20),
            ..Default::default()
        };

        let merged = merge(&previous, &current);
        assert_eq!(merged.main_protein.as_deref(), Some("chicken"));
        assert_eq!(merged.exclude_tags, previous.exclude_tags);
    }

    #[test]
    fn test_vegetarian_then_thai() {
        let previous = Filters {
            dietary_tags: set(&["vegetarian"]),
            ..Default::default()
        };
        let current = Filters {
            cuisine: set(&["thai"]),
            ..Default::default()
        };

        let merged = merge(&previous, &current);
        assert_eq!(merged.dietary_tags.to_vec(), vec!["vegetarian"]);
        assert_eq!(merged.cuisine.to_vec(), vec!["thai"]);
        assert!(merged.tags.is_empty());
        assert!(merged.main_protein.is_none());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge(&Filters::new(), &Filters::new()).is_empty());
        assert_eq!(merge(&chicken(), &Filters::new()), chicken());
        assert_eq!(merge(&Filters::new(), &chicken()), chicken());
    }
}
