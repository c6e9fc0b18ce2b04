//! Quality Filter
//!
//! Removes degenerate users and items before training:
//! - users interacting with a single item carry no train/test signal;
//!   hyperactive users (bots, resellers) bias the factorization.
//! - items bought by a single user cannot be evaluated for ranking;
//!   items bought by nearly everyone are non-discriminative.
//!
//! Boundary rule on both axes: a user/item survives iff
//! `1 < distinct_count < max` (both bounds exclusive).
//!
//! Both axis counts are computed once over the raw input and composed as an
//! intersection, so applying the user filter before the item filter (or the
//! other way round) cannot change the result.

use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::config::FilterConfig;
use crate::models::Interaction;

/// Apply both axis filters and return the surviving interactions.
pub fn clean(interactions: &[Interaction], config: &FilterConfig) -> Vec<Interaction> {
    let user_counts = distinct_item_counts(interactions);
    let item_counts = distinct_user_counts(interactions);

    let genuine_users: HashSet<i32> = user_counts
        .iter()
        .filter(|(_, &count)| count > 1 && count < config.genuine_user_max_product)
        .map(|(&user_id, _)| user_id)
        .collect();

    let recommendable_items: HashSet<i32> = item_counts
        .iter()
        .filter(|(_, &count)| count > 1 && count < config.recommendable_product_max_user)
        .map(|(&item_id, _)| item_id)
        .collect();

    let cleaned: Vec<Interaction> = interactions
        .iter()
        .filter(|interaction| {
            genuine_users.contains(&interaction.user_id)
                && recommendable_items.contains(&interaction.item_id)
        })
        .copied()
        .collect();

    info!(
        raw = interactions.len(),
        cleaned = cleaned.len(),
        genuine_users = genuine_users.len(),
        recommendable_items = recommendable_items.len(),
        "Quality filter applied"
    );

    cleaned
}

/// Distinct items per user.
fn distinct_item_counts(interactions: &[Interaction]) -> HashMap<i32, usize> {
    let mut per_user: HashMap<i32, HashSet<i32>> = HashMap::new();
    for interaction in interactions {
        per_user
            .entry(interaction.user_id)
            .or_default()
            .insert(interaction.item_id);
    }
    per_user
        .into_iter()
        .map(|(user_id, items)| (user_id, items.len()))
        .collect()
}

/// Distinct users per item.
fn distinct_user_counts(interactions: &[Interaction]) -> HashMap<i32, usize> {
    let mut per_item: HashMap<i32, HashSet<i32>> = HashMap::new();
    for interaction in interactions {
        per_item
            .entry(interaction.item_id)
            .or_default()
            .insert(interaction.user_id);
    }
    per_item
        .into_iter()
        .map(|(item_id, users)| (item_id, users.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(user_id: i32, item_id: i32) -> Interaction {
        Interaction {
            user_id,
            item_id,
            signal: 1.0,
        }
    }

    fn test_config() -> FilterConfig {
        FilterConfig {
            genuine_user_max_product: 100,
            recommendable_product_max_user: 3000,
        }
    }

    #[test]
    fn test_singleton_users_and_items_are_dropped() {
        // User 1 bought items 10, 11; user 2 only bought item 10.
        // Item 10 has two buyers; item 11 has one.
        let interactions = vec![
            interaction(1, 10),
            interaction(1, 11),
            interaction(2, 10),
        ];

        let cleaned = clean(&interactions, &test_config());

        // User 2 fails the user filter; item 11 fails the item filter.
        assert_eq!(cleaned, vec![interaction(1, 10)]);
    }

    #[test]
    fn test_upper_bounds_are_exclusive() {
        let config = FilterConfig {
            genuine_user_max_product: 3,
            recommendable_product_max_user: 3,
        };

        // User 1 has exactly 3 distinct items: at the bound, dropped.
        // User 2 has exactly 2: survives.
        let mut interactions = vec![
            interaction(1, 10),
            interaction(1, 11),
            interaction(1, 12),
            interaction(2, 10),
            interaction(2, 11),
        ];
        // Third buyer for item 10 puts it at the item bound: dropped.
        interactions.push(interaction(3, 10));
        interactions.push(interaction(3, 11));

        let cleaned = clean(&interactions, &config);

        assert!(cleaned.iter().all(|i| i.user_id != 1));
        assert!(cleaned.iter().all(|i| i.item_id != 10));
        // Item 11 has buyers {1, 2, 3} -> also at the bound, dropped.
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_lower_bound_requires_count_above_one() {
        let config = FilterConfig {
            genuine_user_max_product: 100,
            recommendable_product_max_user: 100,
        };

        let interactions = vec![
            interaction(1, 10),
            interaction(1, 11),
            interaction(2, 10),
            interaction(2, 11),
        ];

        // Everyone has exactly 2 distinct counterparts: all survive.
        let cleaned = clean(&interactions, &config);
        assert_eq!(cleaned.len(), 4);
    }

    #[test]
    fn test_duplicate_interactions_count_distinct() {
        let config = FilterConfig {
            genuine_user_max_product: 100,
            recommendable_product_max_user: 100,
        };

        // User 1 bought item 10 three times; that is still one distinct item.
        let interactions = vec![
            interaction(1, 10),
            interaction(1, 10),
            interaction(1, 10),
            interaction(2, 10),
        ];

        let cleaned = clean(&interactions, &config);
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_filter_composition_is_order_independent() {
        let config = test_config();
        let interactions = vec![
            interaction(1, 10),
            interaction(1, 11),
            interaction(2, 10),
            interaction(2, 12),
            interaction(3, 11),
            interaction(3, 12),
            interaction(4, 13),
        ];

        // clean() computes both counts over the raw input and intersects,
        // which is equivalent to either sequential order. Compare against a
        // hand-rolled items-then-users pass over the same counts.
        let user_counts = distinct_item_counts(&interactions);
        let item_counts = distinct_user_counts(&interactions);

        let items_then_users: Vec<Interaction> = interactions
            .iter()
            .filter(|i| {
                let ic = item_counts[&i.item_id];
                ic > 1 && ic < config.recommendable_product_max_user
            })
            .filter(|i| {
                let uc = user_counts[&i.user_id];
                uc > 1 && uc < config.genuine_user_max_product
            })
            .copied()
            .collect();

        assert_eq!(clean(&interactions, &config), items_then_users);
    }
}
