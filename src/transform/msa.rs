use std::collections::BTreeSet;
use std::io::Read;

use needletail::*;

use rustc_hash::FxHashMap;

use crate::eds::{Eds, SourceSet, Symbol};
use crate::errors::*;

/// Convert a multiple sequence alignment (FASTA with `-` gaps) to an EDS
/// with source annotation. Columns where every row agrees and no row has
/// a gap are common; maximal common runs become single-alternative
/// symbols with universal sources, maximal variant runs become degenerate
/// symbols whose alternatives are the distinct gap-stripped row slices in
/// first-appearance order, each annotated with the 1-indexed rows that
/// exhibit it.
pub fn msa_to_eds<'r>(reader: impl Read + Send + 'r) -> Result<Eds> {
    let rows = read_alignment(reader)?;
    build(&rows, None)
}

/// Convert an MSA directly to an l-EDS: internal common runs shorter than
/// `context_length` are folded into the neighboring variant regions, so
/// every surviving internal common symbol satisfies the length floor.
pub fn msa_to_leds<'r>(reader: impl Read + Send + 'r, context_length: usize) -> Result<Eds> {
    if context_length == 0 {
        return Err(Error::InvalidParameter(
            "context length must be greater than 0".into(),
        ));
    }
    let rows = read_alignment(reader)?;
    build(&rows, Some(context_length))
}

fn read_alignment<'r>(reader: impl Read + Send + 'r) -> Result<Vec<Vec<u8>>> {
    let mut fastx = parse_fastx_reader(reader).map_err(|e| Error::InvalidInput {
        format: "MSA",
        reason: e.to_string(),
    })?;

    let mut rows: Vec<Vec<u8>> = Vec::new();
    while let Some(record) = fastx.next() {
        let record = record.map_err(|e| Error::InvalidInput {
            format: "MSA",
            reason: e.to_string(),
        })?;
        rows.push(record.seq().into_owned());
    }

    if rows.is_empty() {
        return Err(Error::InvalidInput {
            format: "MSA",
            reason: "no aligned sequences".into(),
        });
    }
    let width = rows[0].len();
    if rows.iter().any(|r| r.len() != width) {
        return Err(Error::InvalidInput {
            format: "MSA",
            reason: "aligned sequences have unequal lengths".into(),
        });
    }
    Ok(rows)
}

struct Region {
    start: usize,
    end: usize,
    common: bool,
}

fn build(rows: &[Vec<u8>], context_length: Option<usize>) -> Result<Eds> {
    let reference = &rows[0];
    let width = reference.len();

    let mut regions: Vec<Region> = Vec::new();
    for i in 0..width {
        let b = reference[i];
        let common = b != b'-' && rows.iter().all(|r| r[i] == b);
        match regions.last_mut() {
            Some(r) if r.common == common => r.end = i + 1,
            _ => regions.push(Region {
                start: i,
                end: i + 1,
                common,
            }),
        }
    }

    if let Some(l) = context_length {
        // demote short internal common runs, then coalesce variant runs;
        // the first and last run keep their standing regardless of length
        let last = regions.len().saturating_sub(1);
        for (idx, r) in regions.iter_mut().enumerate() {
            if r.common && r.end - r.start < l && idx != 0 && idx != last {
                r.common = false;
            }
        }
        let mut coalesced: Vec<Region> = Vec::new();
        for r in regions {
            match coalesced.last_mut() {
                Some(prev) if !prev.common && !r.common => prev.end = r.end,
                _ => coalesced.push(r),
            }
        }
        regions = coalesced;
    }

    let mut symbols: Vec<Symbol> = Vec::new();
    let mut sources: Vec<SourceSet> = Vec::new();

    for region in &regions {
        if region.common {
            symbols.push(vec![reference[region.start..region.end].to_vec()]);
            sources.push(SourceSet::Universal);
        } else {
            let mut order: Symbol = Vec::new();
            let mut paths: Vec<BTreeSet<u32>> = Vec::new();
            let mut index: FxHashMap<Vec<u8>, usize> = FxHashMap::default();

            for (row_id, row) in rows.iter().enumerate() {
                let variant: Vec<u8> = row[region.start..region.end]
                    .iter()
                    .copied()
                    .filter(|&b| b != b'-')
                    .collect();
                let at = *index.entry(variant.clone()).or_insert_with(|| {
                    order.push(variant);
                    paths.push(BTreeSet::new());
                    order.len() - 1
                });
                paths[at].insert(row_id as u32 + 1);
            }

            symbols.push(order);
            sources.extend(paths.into_iter().map(SourceSet::Paths));
        }
    }

    Eds::from_symbols_with_sources(symbols, sources)
}
