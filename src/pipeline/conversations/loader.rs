//! CSV conversation loader.
//!
//! Input is one row per message with columns `conversation_id`, `role`, `text`
//! and an optional `turn_index`. Rows are grouped into conversations in
//! ascending id order: numeric when every id is an integer, lexical otherwise.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::LoadError;
use crate::models::{Conversation, Message};

const ROLE_PLACEHOLDER: &str = "unknown";

#[derive(Debug, Deserialize)]
struct MessageRow {
    conversation_id: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    text: Option<String>,
    /// Integer or float form (`2` or `2.0`); unparseable values become `None`.
    #[serde(default, deserialize_with = "csv::invalid_option")]
    turn_index: Option<f64>,
}

/// Load conversations from a CSV file, keeping at most `max_conversations` groups.
pub fn load_conversations(
    path: &Path,
    max_conversations: Option<usize>,
) -> Result<Vec<Conversation>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut conversations = read_conversations(file)?;
    tracing::info!(
        path = %path.display(),
        count = conversations.len(),
        "Loaded conversations from file"
    );

    match max_conversations {
        Some(max) if max < conversations.len() => {
            conversations.truncate(max);
            tracing::info!(max, "Processing only the first conversations (demo limit)");
        }
        _ => tracing::info!("Processing all loaded conversations"),
    }

    Ok(conversations)
}

/// Group CSV rows from any reader into conversations.
pub fn read_conversations<R: Read>(reader: R) -> Result<Vec<Conversation>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if !headers.iter().any(|h| h == "conversation_id") {
        return Err(LoadError::MissingColumn("conversation_id"));
    }
    let has_turn_index = headers.iter().any(|h| h == "turn_index");

    // Row position keeps the sort stable for equal or missing turn indices.
    let mut groups: BTreeMap<String, Vec<(Option<f64>, usize, Message)>> = BTreeMap::new();

    for (position, row) in csv_reader.deserialize::<MessageRow>().enumerate() {
        let row = row?;
        let message = Message::new(
            row.role.unwrap_or_else(|| ROLE_PLACEHOLDER.to_string()),
            row.text.unwrap_or_default(),
        );
        groups
            .entry(row.conversation_id)
            .or_default()
            .push((row.turn_index.filter(|t| t.is_finite()), position, message));
    }

    let mut groups: Vec<_> = groups.into_iter().collect();
    let numeric_ids: Option<Vec<i64>> = groups
        .iter()
        .map(|(id, _)| id.trim().parse().ok())
        .collect();
    if let Some(ids) = numeric_ids {
        let mut keyed: Vec<_> = ids.into_iter().zip(groups).collect();
        keyed.sort_by_key(|(n, _)| *n);
        groups = keyed.into_iter().map(|(_, group)| group).collect();
    }

    let conversations = groups
        .into_iter()
        .map(|(id, mut rows)| {
            if has_turn_index {
                // Indexed rows first, ascending; unindexed rows keep file order after them.
                rows.sort_by(|(a, pa, _), (b, pb, _)| compare_turns(*a, *b).then(pa.cmp(pb)));
            }
            let messages = rows.into_iter().map(|(_, _, m)| m).collect();
            Conversation::new(id, messages)
        })
        .collect();

    Ok(conversations)
}

fn compare_turns(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
