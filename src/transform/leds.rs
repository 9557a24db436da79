use log::debug;
use rayon::prelude::*;

use crate::eds::{Eds, MergedSymbol, SourceSet};
use crate::errors::*;

/// Safety bound on merge waves; a fixed point is normally reached in at
/// most n waves.
const MAX_WAVES: usize = 10_000;

/// Check the l-EDS predicate: every internal non-degenerate symbol has
/// length >= `context_length` and no two consecutive symbols are both
/// degenerate. The first and last symbol may be shorter than the floor.
/// `context_length == 0` is trivially satisfied.
pub fn is_leds(eds: &Eds, context_length: usize) -> bool {
    if context_length == 0 {
        return true;
    }
    let meta = eds.metadata();
    let n = eds.len();

    for i in 0..n {
        if !meta.is_degenerate[i] && i > 0 && i < n - 1 {
            let len = meta.string_lengths[meta.cum_set_sizes[i]];
            if len < context_length {
                return false;
            }
        }
        if i + 1 < n && meta.is_degenerate[i] && meta.is_degenerate[i + 1] {
            return false;
        }
    }
    true
}

/// EDS → l-EDS by iterative linear (source-aware) merging. Requires a
/// source annotation; alternatives whose paths never intersect are
/// filtered out of every merged symbol.
pub fn eds_to_leds_linear(eds: Eds, context_length: usize, threads: usize) -> Result<Eds> {
    if !eds.has_sources() {
        return Err(Error::InvalidParameter(
            "linear l-EDS transformation requires a source annotation".into(),
        ));
    }
    converge(eds, context_length, threads)
}

/// EDS → l-EDS by iterative cartesian merging. Refuses instances with a
/// source annotation; use the linear driver for those.
pub fn eds_to_leds_cartesian(eds: Eds, context_length: usize, threads: usize) -> Result<Eds> {
    if eds.has_sources() {
        return Err(Error::InvalidParameter(
            "cartesian l-EDS transformation cannot be used with sources".into(),
        ));
    }
    converge(eds, context_length, threads)
}

/// Iterate merge waves until the predicate holds or no admissible pair
/// remains. Reaching a fixed point short of the floor is not an error;
/// the result is as close to an l-EDS as achievable.
fn converge(mut eds: Eds, context_length: usize, threads: usize) -> Result<Eds> {
    if context_length == 0 {
        return Err(Error::InvalidParameter(
            "context length must be greater than 0".into(),
        ));
    }

    let pool = if threads > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| Error::InvalidParameter(format!("worker pool: {e}")))?,
        )
    } else {
        None
    };

    for wave in 0..MAX_WAVES {
        if is_leds(&eds, context_length) {
            return Ok(eds);
        }

        let pairs = select_merge_pairs(&eds, context_length);
        if pairs.is_empty() {
            return Ok(eds);
        }
        debug!("wave {wave}: merging {} pairs over {} symbols", pairs.len(), eds.len());

        let merged: Result<Vec<MergedSymbol>> = match &pool {
            Some(pool) => pool.install(|| {
                pairs
                    .par_iter()
                    .map(|&pos| eds.merge_pair(pos))
                    .collect()
            }),
            None => pairs.iter().map(|&pos| eds.merge_pair(pos)).collect(),
        };

        eds = recombine(&eds, &pairs, merged?)?;
    }

    Err(Error::NoConvergence(MAX_WAVES))
}

/// Greedy left-to-right selection of non-overlapping adjacent pairs whose
/// merge would help satisfy the predicate: one side is an internal common
/// block shorter than the floor, or both sides are degenerate. The result
/// is deterministic for a given input.
fn select_merge_pairs(eds: &Eds, context_length: usize) -> Vec<usize> {
    let n = eds.len();
    if n < 2 {
        return Vec::new();
    }
    let meta = eds.metadata();

    let internal_short = |i: usize| {
        !meta.is_degenerate[i]
            && i > 0
            && i < n - 1
            && meta.string_lengths[meta.cum_set_sizes[i]] < context_length
    };

    let mut used = vec![false; n];
    let mut pairs = Vec::new();
    for i in 0..n - 1 {
        if used[i] || used[i + 1] {
            continue;
        }
        let admissible = internal_short(i)
            || internal_short(i + 1)
            || (meta.is_degenerate[i] && meta.is_degenerate[i + 1]);
        if admissible {
            pairs.push(i);
            used[i] = true;
            used[i + 1] = true;
        }
    }
    pairs
}

/// Assemble a new EDS from the original positions and the wave's merged
/// symbols; the consumed right-hand positions are skipped. The result is
/// always a full-mode instance.
fn recombine(eds: &Eds, pairs: &[usize], merged: Vec<MergedSymbol>) -> Result<Eds> {
    let n = eds.len();
    let mut slots: Vec<Option<MergedSymbol>> = (0..n).map(|_| None).collect();
    for (&pos, symbol) in pairs.iter().zip(merged) {
        slots[pos] = Some(symbol);
    }

    let mut symbols = Vec::with_capacity(n - pairs.len());
    let mut sources: Option<Vec<SourceSet>> = eds.has_sources().then(Vec::new);

    let mut i = 0;
    while i < n {
        if let Some(m) = slots[i].take() {
            symbols.push(m.alts);
            if let Some(out) = sources.as_mut() {
                out.extend(m.sources.expect("linear merge carries sources"));
            }
            i += 2;
        } else {
            symbols.push(eds.read_symbol(i)?);
            if let Some(out) = sources.as_mut() {
                out.extend(eds.symbol_sources(i).unwrap().iter().cloned());
            }
            i += 1;
        }
    }

    match sources {
        Some(sources) => Eds::from_symbols_with_sources(symbols, sources),
        None => Ok(Eds::from_symbols(symbols)),
    }
}
