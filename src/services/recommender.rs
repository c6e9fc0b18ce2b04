//! Top-K Recommender
//!
//! Turns a trained factor model into one ranked item list per user and
//! persists the flattened (user, item, position) rows for inspection.
//! Ordering is by descending predicted score with ties broken by ascending
//! item id, so lists are reproducible.

use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{EvalError, Result};
use crate::models::RecommendationList;
use crate::services::trainer::ImplicitFactorModel;

/// Top-K ranked items for every user the model knows.
///
/// Each list is `min(k, rankable items)` long. Users are returned in
/// ascending id order.
pub fn top_k(model: &ImplicitFactorModel, k: usize) -> Vec<RecommendationList> {
    let mut user_ids: Vec<i32> = model.user_ids().collect();
    user_ids.sort_unstable();
    let mut item_ids: Vec<i32> = model.item_ids().collect();
    item_ids.sort_unstable();

    user_ids
        .into_iter()
        .map(|user_id| {
            let mut scored: Vec<(i32, f32)> = item_ids
                .iter()
                .filter_map(|&item_id| {
                    model.predict(user_id, item_id).map(|score| (item_id, score))
                })
                .collect();

            // Descending score, ascending item id on ties.
            scored.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });

            RecommendationList {
                user_id,
                items: scored.into_iter().take(k).map(|(item_id, _)| item_id).collect(),
            }
        })
        .collect()
}

/// Persist recommendation lists as a flat `user,item,position` table.
///
/// Position is 1-based. The table lands at `dir/recs_<name>.csv`; an
/// existing table for the same name is overwritten, never appended to.
pub fn persist_table(
    lists: &[RecommendationList],
    dir: impl AsRef<Path>,
    name: &str,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("recs_{}.csv", name));

    let mut out = Vec::new();
    for list in lists {
        for (index, item_id) in list.items.iter().enumerate() {
            writeln!(out, "{},{},{}", list.user_id, item_id, index + 1)
                .map_err(|e| EvalError::Persistence(e.to_string()))?;
        }
    }
    fs::write(&path, out)?;

    info!(
        path = %path.display(),
        users = lists.len(),
        "Persisted recommendation table"
    );
    Ok(path)
}
