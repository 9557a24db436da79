use serde::Serialize;

use rustc_hash::FxHashSet;

use crate::eds::sources::SourceSet;
use crate::errors::*;

/// Derived index over an EDS: everything needed for O(log n) position
/// queries without touching string data. Recomputed whenever the symbol
/// sequence changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Byte offset in the backing stream where each symbol begins
    /// (the `{` of a braced symbol, the first byte of a bare run).
    /// Meaningful only in metadata-only mode.
    pub base_offsets: Vec<u64>,
    /// Number of alternatives per symbol (n entries).
    pub symbol_sizes: Vec<usize>,
    /// Length in bytes of each alternative, in global order (m entries).
    pub string_lengths: Vec<usize>,
    /// Prefix sum of `symbol_sizes`; maps `(symbol, local)` to global id.
    pub cum_set_sizes: Vec<usize>,
    /// `symbol_sizes[i] >= 2`.
    pub is_degenerate: Vec<bool>,
    /// Characters contributed by non-degenerate symbols before each symbol
    /// (n+1 entries).
    pub cum_common_positions: Vec<usize>,
    /// Alternatives belonging to degenerate symbols before each symbol
    /// (n+1 entries); numbers the "degenerate strings" used by external
    /// choice vectors.
    pub cum_degenerate_strings: Vec<usize>,
}

impl Metadata {
    pub(crate) fn from_layout(
        base_offsets: Vec<u64>,
        symbol_sizes: Vec<usize>,
        string_lengths: Vec<usize>,
    ) -> Metadata {
        let n = symbol_sizes.len();
        debug_assert_eq!(base_offsets.len(), n);
        debug_assert_eq!(string_lengths.len(), symbol_sizes.iter().sum::<usize>());

        let is_degenerate: Vec<bool> = symbol_sizes.iter().map(|&s| s >= 2).collect();

        let mut cum_set_sizes = Vec::with_capacity(n);
        let mut cum_common_positions = Vec::with_capacity(n + 1);
        let mut cum_degenerate_strings = Vec::with_capacity(n + 1);

        let mut strings = 0;
        let mut common = 0;
        let mut degenerate = 0;
        cum_common_positions.push(0);
        cum_degenerate_strings.push(0);

        for i in 0..n {
            cum_set_sizes.push(strings);
            if is_degenerate[i] {
                degenerate += symbol_sizes[i];
            } else {
                common += string_lengths[strings];
            }
            strings += symbol_sizes[i];
            cum_common_positions.push(common);
            cum_degenerate_strings.push(degenerate);
        }

        Metadata {
            base_offsets,
            symbol_sizes,
            string_lengths,
            cum_set_sizes,
            is_degenerate,
            cum_common_positions,
            cum_degenerate_strings,
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_sizes.len()
    }

    /// Total characters contributed by non-degenerate symbols.
    pub fn common_chars(&self) -> usize {
        *self.cum_common_positions.last().unwrap_or(&0)
    }

    /// Global string id of alternative `local` at `symbol`.
    pub fn global_id(&self, symbol: usize, local: usize) -> usize {
        self.cum_set_sizes[symbol] + local
    }

    /// Decode an absolute degenerate string number into
    /// `(symbol, local alternative index)`.
    pub fn decode_degenerate(&self, number: usize) -> Result<(usize, usize)> {
        let n = self.symbol_count();
        let total = self.cum_degenerate_strings[n];
        if number >= total {
            return Err(Error::OutOfRange {
                what: "degenerate string number",
                value: number,
                bound: total,
            });
        }

        // last symbol whose cumulative count is <= number
        let symbol = self
            .cum_degenerate_strings
            .partition_point(|&c| c <= number)
            - 1;
        let local = number - self.cum_degenerate_strings[symbol];
        debug_assert!(self.is_degenerate[symbol]);
        debug_assert!(local < self.symbol_sizes[symbol]);
        Ok((symbol, local))
    }
}

/// Aggregates derived from the metadata index. "Context length" is the
/// length of a non-degenerate symbol's single alternative.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub min_context_length: usize,
    pub max_context_length: usize,
    pub avg_context_length: f64,
    pub num_degenerate_symbols: usize,
    pub num_common_chars: usize,
    pub num_degenerate_chars: usize,
    pub num_empty_strings: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStatistics {
    pub num_paths: usize,
    pub max_paths_per_string: usize,
    pub avg_paths_per_string: f64,
}

pub(crate) fn compute_statistics(meta: &Metadata) -> Statistics {
    let mut stats = Statistics::default();
    let mut min_context = usize::MAX;
    let mut total_context = 0;
    let mut context_blocks = 0;

    for i in 0..meta.symbol_count() {
        let first = meta.cum_set_sizes[i];
        if meta.is_degenerate[i] {
            stats.num_degenerate_symbols += 1;
            for g in first..first + meta.symbol_sizes[i] {
                stats.num_degenerate_chars += meta.string_lengths[g];
            }
        } else {
            let len = meta.string_lengths[first];
            min_context = min_context.min(len);
            stats.max_context_length = stats.max_context_length.max(len);
            total_context += len;
            context_blocks += 1;
            stats.num_common_chars += len;
        }
        for g in first..first + meta.symbol_sizes[i] {
            if meta.string_lengths[g] == 0 {
                stats.num_empty_strings += 1;
            }
        }
    }

    if context_blocks > 0 {
        stats.min_context_length = min_context;
        stats.avg_context_length = total_context as f64 / context_blocks as f64;
    }
    stats
}

pub(crate) fn compute_source_statistics(sources: &[SourceSet]) -> SourceStatistics {
    let mut distinct = FxHashSet::default();
    let mut max_paths = 0;
    let mut total_paths = 0;

    for set in sources {
        match set {
            SourceSet::Universal => {
                distinct.insert(0);
            }
            SourceSet::Paths(p) => {
                distinct.extend(p.iter().copied());
            }
        }
        max_paths = max_paths.max(set.len());
        total_paths += set.len();
    }

    SourceStatistics {
        num_paths: distinct.len(),
        max_paths_per_string: max_paths,
        avg_paths_per_string: if sources.is_empty() {
            0.0
        } else {
            total_paths as f64 / sources.len() as f64
        },
    }
}
