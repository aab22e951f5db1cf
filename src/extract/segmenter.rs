//! Splits one recognized blob into several trades.
//!
//! Strategies run cheapest and most specific first; the first one that yields
//! more than one validated trade wins. The fixed-chunk fallback is a heuristic
//! and its thresholds live in [`SegmentationSettings`](crate::models::SegmentationSettings).

use serde::{Deserialize, Serialize};

use super::fields::{contains_symbol, find_symbol_matches};
use super::normalizer::NormalizedText;
use super::{extract_trade, ExtractionContext};
use crate::models::TradeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStrategy {
    SymbolAnchored,
    LineGrouping,
    FixedChunk,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segmentation {
    NoSplit,
    Split {
        strategy: SegmentationStrategy,
        records: Vec<TradeRecord>,
    },
}

/// A candidate span of text, optionally with the symbol that anchored it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub seed_symbol: Option<String>,
}

type SplitFn = fn(&NormalizedText, &ExtractionContext) -> Vec<Span>;

const STRATEGIES: &[(SegmentationStrategy, SplitFn)] = &[
    (SegmentationStrategy::SymbolAnchored, split_by_symbol),
    (SegmentationStrategy::LineGrouping, split_by_line_groups),
    (SegmentationStrategy::FixedChunk, split_into_chunks),
];

pub fn segment_trades(text: &NormalizedText, ctx: &ExtractionContext) -> Segmentation {
    for (strategy, split) in STRATEGIES {
        let records: Vec<TradeRecord> = split(text, ctx)
            .iter()
            .filter_map(|span| extract_trade(&span.text, span.seed_symbol.as_deref(), ctx))
            .filter(TradeRecord::is_valid)
            .collect();

        log::debug!("{:?} produced {} valid trades", strategy, records.len());
        if records.len() > 1 {
            return Segmentation::Split {
                strategy: *strategy,
                records,
            };
        }
    }
    Segmentation::NoSplit
}

/// Each span runs from one symbol occurrence to the next
pub fn split_by_symbol(text: &NormalizedText, _ctx: &ExtractionContext) -> Vec<Span> {
    let joined = text.joined.as_str();
    let matches = find_symbol_matches(joined);

    matches
        .iter()
        .enumerate()
        .map(|(i, (range, symbol))| {
            let end = matches.get(i + 1).map(|(next, _)| next.start).unwrap_or(joined.len());
            Span {
                text: joined[range.start..end].trim().to_string(),
                seed_symbol: Some(symbol.clone()),
            }
        })
        .collect()
}

/// A new group starts at every line that mentions a symbol
pub fn split_by_line_groups(text: &NormalizedText, _ctx: &ExtractionContext) -> Vec<Span> {
    let mut groups: Vec<Vec<&str>> = Vec::new();

    for line in &text.lines {
        if contains_symbol(line) || groups.is_empty() {
            groups.push(Vec::new());
        }
        if let Some(current) = groups.last_mut() {
            current.push(line);
        }
    }

    groups
        .into_iter()
        .map(|lines| Span {
            text: lines.join(" "),
            seed_symbol: None,
        })
        .collect()
}

/// Last resort: equal runs of `max(min_chunk_lines, lines / chunk_divisor)` lines
pub fn split_into_chunks(text: &NormalizedText, ctx: &ExtractionContext) -> Vec<Span> {
    let cfg = &ctx.segmentation;
    let count = text.line_count();
    if count < cfg.min_lines_for_chunking {
        return Vec::new();
    }

    let chunk_lines = cfg.min_chunk_lines.max(count / cfg.chunk_divisor.max(1)).max(1);
    text.lines
        .chunks(chunk_lines)
        .map(|chunk| Span {
            text: chunk.join(" "),
            seed_symbol: None,
        })
        .collect()
}
