//! Record Parser
//!
//! Parses raw `;`-delimited interaction lines into typed records. Malformed
//! rows are a data-quality problem, not a fatal one: they are dropped and
//! counted, never propagated.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::Interaction;

/// Ids at or above this value are treated as sentinel/garbage and dropped.
const MAX_ID: i64 = i32::MAX as i64;

/// Parse one `<user_id>;<item_id>;<rating>` line.
///
/// Returns `None` for malformed rows: fewer than three fields, non-numeric
/// ids or rating, ids out of range, or a non-positive rating.
pub fn parse_line(line: &str) -> Option<Interaction> {
    let mut fields = line.split(';');

    let user_id: i64 = fields.next()?.trim().parse().ok()?;
    let item_id: i64 = fields.next()?.trim().parse().ok()?;
    let signal: f64 = fields.next()?.trim().parse().ok()?;

    if user_id < 0 || user_id >= MAX_ID || item_id < 0 || item_id >= MAX_ID {
        return None;
    }
    if !(signal > 0.0) {
        return None;
    }

    Some(Interaction {
        user_id: user_id as i32,
        item_id: item_id as i32,
        signal,
    })
}

/// Load all well-formed interactions from a file, dropping bad rows.
pub fn load_interactions(path: impl AsRef<Path>) -> Result<Vec<Interaction>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut interactions = Vec::new();
    let mut dropped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(interaction) => interactions.push(interaction),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, path = %path.display(), "Dropped malformed interaction rows");
    }
    info!(
        loaded = interactions.len(),
        path = %path.display(),
        "Loaded interactions"
    );

    Ok(interactions)
}
