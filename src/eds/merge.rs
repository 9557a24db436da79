use crate::eds::parse::ScannedEds;
use crate::eds::{Eds, SourceSet, Symbol};
use crate::errors::*;

/// A combined symbol produced by merging two adjacent positions.
pub(crate) struct MergedSymbol {
    pub alts: Symbol,
    pub sources: Option<Vec<SourceSet>>,
}

impl Eds {
    /// Combine the symbols at `pos1` and `pos1 + 1` into one. Without
    /// sources this is the cartesian product in left-outer iteration
    /// order; with sources, pairs whose source intersection is empty are
    /// filtered out and surviving alternatives carry the intersection.
    pub(crate) fn merge_pair(&self, pos1: usize) -> Result<MergedSymbol> {
        let pos2 = pos1 + 1;
        let left = self.read_symbol(pos1)?;
        let right = self.read_symbol(pos2)?;

        let concat = |a: &[u8], b: &[u8]| {
            let mut joined = Vec::with_capacity(a.len() + b.len());
            joined.extend_from_slice(a);
            joined.extend_from_slice(b);
            joined
        };

        match (self.symbol_sources(pos1), self.symbol_sources(pos2)) {
            (Some(left_sources), Some(right_sources)) => {
                // linear merge
                let mut alts = Vec::new();
                let mut sources = Vec::new();
                for (a, sa) in left.iter().zip(left_sources) {
                    for (b, sb) in right.iter().zip(right_sources) {
                        if let Some(both) = sa.intersect(sb) {
                            alts.push(concat(a, b));
                            sources.push(both);
                        }
                    }
                }
                if alts.is_empty() {
                    return Err(Error::EmptyMerge { pos1, pos2 });
                }
                Ok(MergedSymbol {
                    alts,
                    sources: Some(sources),
                })
            }
            _ => {
                // cartesian merge
                let mut alts = Vec::with_capacity(left.len() * right.len());
                for a in &left {
                    for b in &right {
                        alts.push(concat(a, b));
                    }
                }
                Ok(MergedSymbol { alts, sources: None })
            }
        }
    }

    /// Produce a new EDS with symbols `pos1` and `pos2 = pos1 + 1`
    /// replaced by their combination; everything else is copied verbatim
    /// and all metadata is recomputed. The input is not mutated.
    ///
    /// The merged symbol inherits `pos1`'s base offset as a nominal value;
    /// in a metadata-only result it only becomes meaningful again once the
    /// merged EDS is written out and re-loaded.
    pub fn merge_adjacent(&self, pos1: usize, pos2: usize) -> Result<Eds> {
        if pos2 != pos1 + 1 {
            return Err(Error::InvalidParameter(format!(
                "positions must be adjacent: {pos2} != {pos1} + 1"
            )));
        }
        if pos2 >= self.len() {
            return Err(Error::OutOfRange {
                what: "merge position",
                value: pos2,
                bound: self.len(),
            });
        }

        let merged = self.merge_pair(pos1)?;
        let meta = self.metadata();

        let mut base_offsets = Vec::with_capacity(self.len() - 1);
        let mut symbol_sizes = Vec::with_capacity(self.len() - 1);
        let mut string_lengths = Vec::with_capacity(self.cardinality());

        for i in 0..self.len() {
            if i == pos2 {
                continue;
            }
            base_offsets.push(meta.base_offsets[i]);
            if i == pos1 {
                symbol_sizes.push(merged.alts.len());
                string_lengths.extend(merged.alts.iter().map(Vec::len));
            } else {
                symbol_sizes.push(meta.symbol_sizes[i]);
                let first = meta.cum_set_sizes[i];
                string_lengths
                    .extend_from_slice(&meta.string_lengths[first..first + meta.symbol_sizes[i]]);
            }
        }

        let stream = self.store.reopen()?;
        let symbols = match &self.store {
            super::store::SymbolStore::Full(sets) => {
                let mut new_sets = Vec::with_capacity(self.len() - 1);
                new_sets.extend_from_slice(&sets[..pos1]);
                new_sets.push(merged.alts.clone());
                new_sets.extend_from_slice(&sets[pos2 + 1..]);
                Some(new_sets)
            }
            super::store::SymbolStore::Stream { .. } => None,
        };

        let mut result = Eds::assemble(
            ScannedEds {
                symbols,
                base_offsets,
                symbol_sizes,
                string_lengths,
            },
            stream,
        );

        if let Some(all_sources) = self.sources() {
            let merged_sources = merged.sources.expect("linear merge carries sources");
            let skip_from = meta.cum_set_sizes[pos1];
            let skip_to = meta.cum_set_sizes[pos2] + meta.symbol_sizes[pos2];
            let mut sources = Vec::with_capacity(result.cardinality());
            sources.extend_from_slice(&all_sources[..skip_from]);
            sources.extend(merged_sources);
            sources.extend_from_slice(&all_sources[skip_to..]);
            result.attach_sources(sources)?;
        }

        Ok(result)
    }
}
