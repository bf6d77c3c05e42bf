//! Stage 5: pack window
//!
//! Greedy selection of context groups into the byte budget, highest
//! aggregate score first, ties broken by first-seen order. A group that only
//! partially fits is truncated at a word boundary rather than dropped; if no
//! clean boundary fits, or truncation would leave nothing, the group is
//! skipped. Packing is deterministic for identical inputs and budget.

use cairn_core::{ContextGroup, PackedContext, PackedEntry};

use crate::metrics::StageMetrics;

pub fn pack_window(
    groups: Vec<ContextGroup>,
    budget: usize,
    max_sources: Option<usize>,
    metrics: &mut StageMetrics,
) -> PackedContext {
    metrics.input = groups.len();

    // priority order: aggregate score desc, first-seen index asc
    let mut ordered: Vec<(usize, ContextGroup)> = groups.into_iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| {
        priority(b).partial_cmp(&priority(a)).unwrap_or(std::cmp::Ordering::Equal).then(ia.cmp(ib))
    });

    // max_sources bounds the candidates, selected by the same priority order
    if let Some(limit) = max_sources {
        let overflow = ordered.split_off(limit.min(ordered.len()));
        metrics.dropped += overflow.len();
    }

    let mut packed = PackedContext::default();
    for (_, group) in ordered {
        let remaining = budget - packed.total_size;
        let text = if group.size() <= remaining {
            group.combined_text.clone()
        } else {
            match truncate_at_boundary(&group.combined_text, remaining) {
                Some(prefix) => {
                    metrics.truncated += 1;
                    prefix
                }
                None => {
                    metrics.dropped += 1;
                    continue;
                }
            }
        };

        let label = format!("S{}", packed.entries.len() + 1);
        packed.total_size += text.len();
        packed.entries.push(PackedEntry {
            label,
            text,
            source_id: group.source_id().to_string(),
            document_id: group.document_id.clone(),
        });
    }

    metrics.output = packed.entries.len();
    tracing::debug!(
        entries = packed.entries.len(),
        total_size = packed.total_size,
        budget,
        "packed context window"
    );
    packed
}

fn priority(group: &ContextGroup) -> f32 {
    match group.aggregate_score() {
        Some(s) if !s.is_nan() => s,
        _ => f32::NEG_INFINITY,
    }
}

/// Largest prefix of `text` with byte length <= `limit` that does not end
/// mid-word. Returns `None` when no usable prefix exists.
fn truncate_at_boundary(text: &str, limit: usize) -> Option<String> {
    if limit == 0 {
        return None;
    }

    let mut cut = limit.min(text.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }

    // a cut inside a word backs up to the last whitespace
    let splits_word = cut < text.len()
        && !text[cut..].chars().next().is_some_and(char::is_whitespace)
        && !text[..cut].chars().next_back().is_some_and(char::is_whitespace);
    if splits_word {
        match text[..cut].rfind(char::is_whitespace) {
            Some(ws) => cut = ws + text[ws..].chars().next().map_or(1, char::len_utf8),
            None => return None,
        }
    }

    let prefix = &text[..cut];
    if prefix.trim().is_empty() {
        return None;
    }
    Some(prefix.to_string())
}
